//! Staking Venue
//!
//! The narrow interface through which a round commits its principal for
//! yield, plus a deterministic simulated venue used by hosts and tests.
//!
//! ## Protocol
//!
//! 1. `stake` pulls principal the round has approved to the venue
//! 2. `unstake` starts the venue's fixed withdrawal delay
//! 3. `withdraw` returns principal plus yield once the delay has elapsed

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::staking::UNSTAKE_DELAY_TICKS;
use crate::errors::{TBondError, TBondResult};
use crate::ledger::TokenLedger;
use crate::math::{apply_bps, safe_add, tick_add};
use crate::types::{Address, Amount, Tick};

/// External principal-custody and yield venue
pub trait StakingVenue {
    /// Venue account on the principal ledger
    fn address(&self) -> Address;

    /// Ticks between `unstake` and `withdraw` eligibility
    fn withdrawal_delay(&self) -> Tick;

    /// Pull `amount` of principal approved by `round`; returns the committed amount
    fn stake(
        &mut self,
        principal: &mut TokenLedger,
        round: &Address,
        amount: Amount,
        now: Tick,
    ) -> TBondResult<Amount>;

    /// Request the round's position back; returns the pending amount
    fn unstake(&mut self, round: &Address, now: Tick) -> TBondResult<Amount>;

    /// Pay the pending amount to `round`; returns the principal returned
    fn withdraw(
        &mut self,
        principal: &mut TokenLedger,
        round: &Address,
        now: Tick,
    ) -> TBondResult<Amount>;
}

// ============ Simulated Venue ============

/// One round's position at the simulated venue
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize,
    BorshDeserialize,
)]
pub struct VenuePosition {
    /// Principal committed
    pub staked: Amount,
    /// Principal plus yield awaiting withdrawal
    pub pending: Amount,
    /// First tick at which `withdraw` succeeds, once unstaked
    pub withdrawable_at: Option<Tick>,
}

/// Venue paying a fixed yield from a reserve funded by the host.
///
/// The venue's own principal balance beyond what rounds have staked is the
/// yield reserve; a withdrawal the reserve cannot cover fails with
/// `InsufficientBalance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedVenue {
    address: Address,
    yield_bps: u64,
    withdrawal_delay: Tick,
    positions: BTreeMap<Address, VenuePosition>,
}

impl SimulatedVenue {
    /// Venue with the reference withdrawal delay
    pub fn new(address: Address, yield_bps: u64) -> Self {
        Self::with_delay(address, yield_bps, UNSTAKE_DELAY_TICKS)
    }

    pub fn with_delay(address: Address, yield_bps: u64, withdrawal_delay: Tick) -> Self {
        Self {
            address,
            yield_bps,
            withdrawal_delay,
            positions: BTreeMap::new(),
        }
    }

    pub fn yield_bps(&self) -> u64 {
        self.yield_bps
    }

    pub fn position(&self, round: &Address) -> Option<&VenuePosition> {
        self.positions.get(round)
    }

    fn position_mut(&mut self, round: &Address) -> TBondResult<&mut VenuePosition> {
        self.positions.get_mut(round).ok_or(TBondError::InvalidInput {
            param: "round",
            reason: "no position at venue",
        })
    }
}

impl StakingVenue for SimulatedVenue {
    fn address(&self) -> Address {
        self.address
    }

    fn withdrawal_delay(&self) -> Tick {
        self.withdrawal_delay
    }

    fn stake(
        &mut self,
        principal: &mut TokenLedger,
        round: &Address,
        amount: Amount,
        now: Tick,
    ) -> TBondResult<Amount> {
        if amount == 0 {
            return Err(TBondError::ZeroAmount);
        }
        let current = self.positions.get(round).copied().unwrap_or_default();
        if current.withdrawable_at.is_some() {
            return Err(TBondError::InvalidInput {
                param: "round",
                reason: "position is unstaking",
            });
        }
        let staked = safe_add(current.staked, amount)?;

        principal.transfer_from(&self.address, round, &self.address, amount)?;
        self.positions.insert(*round, VenuePosition { staked, ..current });

        log::debug!(
            "venue {} staked {} for round {} at tick {}",
            hex::encode(&self.address[..4]),
            amount,
            hex::encode(&round[..4]),
            now
        );
        Ok(amount)
    }

    fn unstake(&mut self, round: &Address, now: Tick) -> TBondResult<Amount> {
        let yield_bps = self.yield_bps;
        let delay = self.withdrawal_delay;
        let position = self.position_mut(round)?;
        if position.withdrawable_at.is_some() {
            return Err(TBondError::InvalidInput {
                param: "round",
                reason: "position already unstaking",
            });
        }

        let reward = apply_bps(position.staked, yield_bps)?;
        let pending = safe_add(position.staked, reward)?;
        let withdrawable_at = tick_add(now, delay)?;

        position.pending = pending;
        position.withdrawable_at = Some(withdrawable_at);
        Ok(pending)
    }

    fn withdraw(
        &mut self,
        principal: &mut TokenLedger,
        round: &Address,
        now: Tick,
    ) -> TBondResult<Amount> {
        let address = self.address;
        let position = self.position_mut(round)?;
        let ready_at = position.withdrawable_at.ok_or(TBondError::InvalidInput {
            param: "round",
            reason: "position not unstaked",
        })?;
        if now < ready_at {
            return Err(TBondError::TooEarly { now, ready_at });
        }

        let pending = position.pending;
        principal.transfer(&address, round, pending)?;
        self.positions.remove(round);
        Ok(pending)
    }
}
