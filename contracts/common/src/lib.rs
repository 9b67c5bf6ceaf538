//! TBOND Common Library
//!
//! Shared types, constants, and utilities for all TBOND contracts.
//! This crate provides the foundation for the bond manager, the exchange
//! and the factory.
//!
//! ## Key Features
//!
//! - **Typed Errors**: One error enum with stable codes for every failure
//! - **Event Log**: Serializable protocol events stamped with the tick
//! - **Wide Math**: 256-bit intermediate `mul_div` for 18/27 decimal amounts
//! - **Token Ledgers**: Balances, allowances and minter-restricted supply
//! - **Wrapped Principal**: 1 principal = 10^9 wrapped units, fully backed
//! - **Staking Venue**: Narrow custody/yield interface plus a simulated venue
//! - **Clock**: Injected tick source so deadlines are testable

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod validation;
pub mod clock;
pub mod ledger;
pub mod staking;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use clock::*;
pub use ledger::*;
pub use staking::*;
