//! Error Types for TBOND Protocol
//!
//! Every failure aborts the triggering operation with no partial state
//! mutation and is surfaced to the caller verbatim. Each variant carries a
//! stable code for logging and indexing.

use thiserror::Error;

use crate::types::{Address, Amount, RoundId, Stage, Tick};

/// Result type alias for TBOND operations
pub type TBondResult<T> = Result<T, TBondError>;

/// Main error enum for all TBOND protocol errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TBondError {
    // ============ Registry Errors ============
    /// A round already exists under this key
    #[error("round {} already exists", hex::encode(.key))]
    AlreadyExists { key: RoundId },

    /// No round exists under this key
    #[error("round {} not found", hex::encode(.key))]
    NotFound { key: RoundId },

    /// No staking venue is registered at this address
    #[error("staking venue {} not registered", hex::encode(.venue))]
    VenueNotFound { venue: Address },

    // ============ Authorization Errors ============
    /// Caller is not the owner (or lacks creation rights)
    #[error("caller {} is not the owner", hex::encode(.caller))]
    NotOwner { caller: Address },

    /// Mint attempted by an account other than the token's minter
    #[error("mint not authorized for {}", hex::encode(.caller))]
    MintUnauthorized { caller: Address },

    /// Burn attempted by an account other than the token's minter
    #[error("burn not authorized for {}", hex::encode(.caller))]
    BurnUnauthorized { caller: Address },

    /// Signature does not verify against the order owner
    #[error("invalid signature")]
    InvalidSignature,

    // ============ Lifecycle Errors ============
    /// `setup` was already performed
    #[error("round already initialized")]
    AlreadyInitialized,

    /// Round has not been set up
    #[error("round not initialized")]
    Uninitialized,

    /// Seed or aggregate deposit below the round minimum
    #[error("deposit {amount} below minimum {minimum}")]
    BelowMinimumDeposit { amount: Amount, minimum: Amount },

    /// Operation not allowed in the current stage
    #[error("{operation} not allowed in stage {stage:?}")]
    WrongStage { operation: &'static str, stage: Stage },

    /// Deadline for this operation has not been reached
    #[error("too early: tick {now}, ready at {ready_at}")]
    TooEarly { now: Tick, ready_at: Tick },

    // ============ Order Errors ============
    /// Order deadline has passed
    #[error("order expired: tick {now}, deadline {deadline}")]
    Expired { now: Tick, deadline: Tick },

    /// Order nonce is not the maker's current nonce
    #[error("invalid nonce: current {expected}, got {actual}")]
    InvalidNonce { expected: u64, actual: u64 },

    /// Taker commitment does not match the order and caller
    #[error("commitment does not match order")]
    InvalidOrder,

    // ============ Amount Errors ============
    /// Insufficient balance for operation
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    /// Insufficient allowance granted to the spender
    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance { available: Amount, requested: Amount },

    /// Zero amount not allowed
    #[error("zero amount")]
    ZeroAmount,

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ Input Validation Errors ============
    /// Invalid input parameter
    #[error("invalid {param}: {reason}")]
    InvalidInput { param: &'static str, reason: &'static str },

    /// Invalid address (e.g., zero address)
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },
}

impl TBondError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyExists { .. } => "E001_ALREADY_EXISTS",
            Self::NotFound { .. } => "E002_NOT_FOUND",
            Self::VenueNotFound { .. } => "E003_VENUE_NOT_FOUND",
            Self::NotOwner { .. } => "E010_NOT_OWNER",
            Self::MintUnauthorized { .. } => "E011_MINT_UNAUTH",
            Self::BurnUnauthorized { .. } => "E012_BURN_UNAUTH",
            Self::InvalidSignature => "E013_INVALID_SIGNATURE",
            Self::AlreadyInitialized => "E020_ALREADY_INITIALIZED",
            Self::Uninitialized => "E021_UNINITIALIZED",
            Self::BelowMinimumDeposit { .. } => "E022_BELOW_MINIMUM_DEPOSIT",
            Self::WrongStage { .. } => "E023_WRONG_STAGE",
            Self::TooEarly { .. } => "E024_TOO_EARLY",
            Self::Expired { .. } => "E030_EXPIRED",
            Self::InvalidNonce { .. } => "E031_INVALID_NONCE",
            Self::InvalidOrder => "E032_INVALID_ORDER",
            Self::InsufficientBalance { .. } => "E040_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E041_INSUFFICIENT_ALLOWANCE",
            Self::ZeroAmount => "E042_ZERO_AMOUNT",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::InvalidInput { .. } => "E090_INVALID_INPUT",
            Self::InvalidAddress { .. } => "E091_INVALID_ADDRESS",
        }
    }

    /// Returns true if the caller can retry with corrected inputs
    /// (a later tick, a fresh nonce, more funds or a different key).
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Overflow | Self::Underflow | Self::DivisionByZero
        )
    }
}
