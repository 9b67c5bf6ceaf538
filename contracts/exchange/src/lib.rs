//! TBOND Exchange
//!
//! Lets a bond holder (maker) pre-sign an offer to sell bond tokens of one
//! round for wrapped principal, and lets any taker settle it in one atomic
//! call without the maker sending a transaction.
//!
//! ## Key Features
//!
//! - **Typed-Data Signing**: Ed25519 over a domain-separated order digest
//! - **One Live Order per Maker**: An order is valid only while its nonce is
//!   the maker's current nonce; creating, cancelling or filling advances it
//! - **Taker Commitments**: The taker proves the exact fill terms with a hash
//!   bound to their own address, so a copied fill cannot be front-run
//! - **Atomic Settlement**: Both legs are validated before either moves

pub mod signing;
pub mod order;
pub mod nonce;
pub mod exchange;

pub use signing::*;
pub use order::*;
pub use nonce::*;
pub use exchange::*;
