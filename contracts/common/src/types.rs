//! Core Types for TBOND Protocol
//!
//! This module defines the fundamental data structures shared by the
//! bond manager, exchange and factory contracts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{bond, fees};
use crate::errors::TBondResult;
use crate::math::mul_div;

/// Type alias for addresses (32-byte public key or account hash)
pub type Address = [u8; 32];

/// Type alias for round identifiers (also the round's custody address)
pub type RoundId = [u8; 32];

/// Token amount in base units
pub type Amount = u128;

/// Logical time unit driving all deadlines
pub type Tick = u64;

/// The all-zero address, never a valid account
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Derive a well-known system address from a fixed label
pub fn system_address(label: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

// ============ Round Types ============

/// Lifecycle stage of a bond round
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Stage {
    /// Created by the factory, not yet set up
    #[default]
    None = 0,
    /// Accepting deposits
    Fundraising = 1,
    /// Principal committed to the staking venue
    Staking = 2,
    /// Waiting out the venue's withdrawal delay
    Unstaking = 3,
    /// Principal returned, redemptions open
    Ended = 4,
}

impl Stage {
    /// The only stage this one may advance to
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::None => Some(Stage::Fundraising),
            Stage::Fundraising => Some(Stage::Staking),
            Stage::Staking => Some(Stage::Unstaking),
            Stage::Unstaking => Some(Stage::Ended),
            Stage::Ended => None,
        }
    }

    /// Returns true if `to` is the immediate successor of this stage
    pub fn can_advance_to(self, to: Stage) -> bool {
        self.next() == Some(to)
    }
}

/// Principal returned per bond token, fixed once at withdrawal.
///
/// Stored as the exact ratio so that payouts are computed with a single
/// truncating division.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ExchangeRate {
    /// Principal received from the staking venue
    pub principal_returned: Amount,
    /// Bond token supply at withdrawal
    pub supply_at_withdraw: Amount,
}

impl ExchangeRate {
    /// Principal paid for burning `bond_amount`, truncated in the protocol's favor
    pub fn payout(&self, bond_amount: Amount) -> TBondResult<Amount> {
        mul_div(bond_amount, self.principal_returned, self.supply_at_withdraw)
    }

    /// Rate scaled by one principal unit, for display
    pub fn per_token(&self) -> TBondResult<Amount> {
        self.payout(crate::constants::token::ONE_PRINCIPAL)
    }
}

/// Read-only aggregate view of a round
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct RoundInfo {
    /// Principal the round aims to raise (informational)
    pub target_amount: Amount,
    /// `stake` would pass its stage, deadline and minimum checks now
    pub can_stake: bool,
    /// `unstake` would pass its stage and deadline checks now
    pub can_unstake: bool,
    /// `withdraw` would pass its stage and deadline checks now
    pub can_withdraw: bool,
    /// Current stage
    pub stage: Stage,
    /// Outstanding bond tokens
    pub total_supply: Amount,
    /// Ticks between staking and unstake eligibility
    pub staking_period: Tick,
}

/// Arguments to `setup`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct SetupParams {
    /// Ticks from setup until `stake` is allowed
    pub fundraising_period: Tick,
    /// Ticks from staking until `unstake` is allowed
    pub staking_period: Tick,
    /// Informational fundraising goal
    pub target_amount: Amount,
    /// Recipient of the staking incentive
    pub incentive_to: Address,
}

// ============ Configuration ============

/// Per-round economic parameters
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ManagerConfig {
    /// Owner seed at setup and aggregate minimum before staking
    pub minimum_deposit: Amount,
    /// Incentive minted at staking, in basis points of post-seed deposits
    pub incentive_bps: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            minimum_deposit: bond::MIN_DEPOSIT,
            incentive_bps: fees::INCENTIVE_BPS,
        }
    }
}
