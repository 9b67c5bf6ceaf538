//! Validation Helpers for TBOND Protocol
//!
//! Reusable guard clauses shared by the bond manager, exchange and factory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tbond_common::check;
//!
//! check!(amount > 0, TBondError::ZeroAmount);
//! require_reached(now, round.fundraising_deadline)?;
//! ```

use crate::{
    errors::{TBondError, TBondResult},
    types::{Address, Amount, Stage, Tick, ZERO_ADDRESS},
};

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
///
/// # Examples
///
/// ```rust,ignore
/// check!(amount > 0, TBondError::ZeroAmount);
///
/// check!(
///     held >= minimum,
///     TBondError::BelowMinimumDeposit { amount: held, minimum }
/// );
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

// ============ Common Guards ============

/// Amount must be non-zero
pub fn require_positive(amount: Amount) -> TBondResult<()> {
    check!(amount > 0, TBondError::ZeroAmount);
    Ok(())
}

/// Caller must be the current owner; a renounced owner matches nobody
pub fn require_owner(caller: &Address, owner: Option<&Address>) -> TBondResult<()> {
    check!(
        owner == Some(caller),
        TBondError::NotOwner { caller: *caller }
    );
    Ok(())
}

/// Round must be in `expected`.
///
/// A round that was never set up reports `Uninitialized` rather than a stage
/// mismatch.
pub fn require_stage(operation: &'static str, current: Stage, expected: Stage) -> TBondResult<()> {
    check!(current != Stage::None || expected == Stage::None, TBondError::Uninitialized);
    check!(
        current == expected,
        TBondError::WrongStage { operation, stage: current }
    );
    Ok(())
}

/// Tick-gated operations succeed on or after `ready_at`
pub fn require_reached(now: Tick, ready_at: Tick) -> TBondResult<()> {
    check!(now >= ready_at, TBondError::TooEarly { now, ready_at });
    Ok(())
}

/// Orders are fillable up to and including `deadline`
pub fn require_not_expired(now: Tick, deadline: Tick) -> TBondResult<()> {
    check!(now <= deadline, TBondError::Expired { now, deadline });
    Ok(())
}

/// Address must not be the zero address
pub fn require_non_zero_address(address: &Address, reason: &'static str) -> TBondResult<()> {
    check!(*address != ZERO_ADDRESS, TBondError::InvalidAddress { reason });
    Ok(())
}
