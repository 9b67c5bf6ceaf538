//! Protocol Constants
//!
//! All magic numbers and default configuration values for the TBOND protocol.
//! Amounts are expressed in base units of the asset they describe.

/// Token Metadata
pub mod token {
    /// Principal asset name
    pub const PRINCIPAL_NAME: &str = "Tokamak Network Token";
    /// Principal asset symbol
    pub const PRINCIPAL_SYMBOL: &str = "TON";
    /// Principal decimal places
    pub const PRINCIPAL_DECIMALS: u8 = 18;

    /// Wrapped principal name
    pub const WRAPPED_NAME: &str = "Wrapped TON";
    /// Wrapped principal symbol
    pub const WRAPPED_SYMBOL: &str = "WTON";
    /// Wrapped principal decimal places
    pub const WRAPPED_DECIMALS: u8 = 27;

    /// Bond token decimal places (same as principal)
    pub const BOND_DECIMALS: u8 = 18;

    /// One principal with decimals (1 TON = 10^18 base units)
    pub const ONE_PRINCIPAL: u128 = 1_000_000_000_000_000_000;

    /// One wrapped principal with decimals (1 WTON = 10^27 base units)
    pub const ONE_WRAPPED: u128 = ONE_PRINCIPAL * WRAPPED_SCALE;

    /// Wrapped units per principal unit
    pub const WRAPPED_SCALE: u128 = 1_000_000_000;
}

/// Bond round parameters
pub mod bond {
    use super::token::ONE_PRINCIPAL;

    /// Owner seed at setup, also the aggregate minimum required to stake
    pub const MIN_DEPOSIT: u128 = 1_000 * ONE_PRINCIPAL;
}

/// Fee Configuration (in basis points, 100 = 1%)
pub mod fees {
    /// Staking incentive minted to the incentive recipient (0.3%)
    pub const INCENTIVE_BPS: u64 = 30;

    /// Basis points denominator
    pub const BPS_DENOMINATOR: u64 = 10_000;
}

/// Staking venue parameters
pub mod staking {
    /// Ticks between `unstake` and `withdraw` eligibility at the reference venue
    pub const UNSTAKE_DELAY_TICKS: u64 = 93_046;
}

/// Exchange domain defaults
pub mod exchange {
    /// Typed-data domain name
    pub const DOMAIN_NAME: &str = "TBond Exchange";

    /// Typed-data domain version
    pub const DOMAIN_VERSION: &str = "1.0";

    /// Chain id of a local development network
    pub const DEFAULT_CHAIN_ID: u64 = 31_337;

    /// Typed-data prefix bytes
    pub const TYPED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];
}

/// Labels hashed into well-known system account addresses
pub mod system {
    /// Account allowed to issue principal into the in-memory ledger
    pub const PRINCIPAL_ISSUER: &str = "tbond/principal-issuer";

    /// Account holding the principal that backs wrapped principal
    pub const WRAP_RESERVE: &str = "tbond/wrap-reserve";

    /// Default exchange account
    pub const EXCHANGE: &str = "tbond/exchange";
}
