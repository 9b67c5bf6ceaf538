//! Maker nonce registry
//!
//! Each maker has a single counter starting at 0. Only an order signed
//! under the current value is fillable or cancellable.

use std::collections::BTreeMap;

use tbond_common::{
    errors::{TBondError, TBondResult},
    types::Address,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonceRegistry {
    nonces: BTreeMap<Address, u64>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nonce of `owner`
    pub fn current(&self, owner: &Address) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    /// Fail with `InvalidNonce` unless `nonce` is current for `owner`
    pub fn require_current(&self, owner: &Address, nonce: u64) -> TBondResult<()> {
        let expected = self.current(owner);
        if nonce != expected {
            return Err(TBondError::InvalidNonce { expected, actual: nonce });
        }
        Ok(())
    }

    /// Advance `owner`'s nonce, invalidating every order signed so far
    pub fn advance(&mut self, owner: &Address) -> TBondResult<u64> {
        let next = self
            .current(owner)
            .checked_add(1)
            .ok_or(TBondError::Overflow)?;
        self.nonces.insert(*owner, next);
        Ok(next)
    }
}
