//! TBOND Factory
//!
//! Creates and indexes bond rounds, and hosts the whole protocol in process.
//!
//! ## Components
//!
//! - **Factory**: Owner-gated creation of [`BondManager`] rounds keyed by
//!   `H(creator, name, symbol)`, plus a 1-based creation index
//! - **Protocol**: Single-threaded host owning the clock, the principal and
//!   wrapped ledgers, the staking venues, the factory and the exchange. Every
//!   operation runs to completion against `&mut self`, so calls are
//!   serialized by the borrow checker.
//!
//! [`BondManager`]: tbond_manager::BondManager

pub mod factory;
pub mod protocol;


pub use factory::*;
pub use protocol::*;
