//! Order settlement
//!
//! The exchange holds no funds and stores no orders. Makers approve the
//! exchange on their round's bond ledger, takers approve it on the wrapped
//! principal ledger, and a fill moves both legs in one call.

use std::collections::BTreeMap;

use tbond_common::{
    check,
    errors::{TBondError, TBondResult},
    events::{EventLog, TBondEvent},
    ledger::TokenLedger,
    types::{Address, Amount, RoundId, Tick},
    validation::{require_not_expired, require_owner, require_positive},
};

use crate::nonce::NonceRegistry;
use crate::order::{Order, SignedOrder};
use crate::signing::{verify_order_signature, ExchangeDomain, OrderSigner};

/// Access to each round's bond ledger by round id
pub trait BondTokens {
    fn bond_token_mut(&mut self, round: &RoundId) -> TBondResult<&mut TokenLedger>;
}

impl BondTokens for BTreeMap<RoundId, TokenLedger> {
    fn bond_token_mut(&mut self, round: &RoundId) -> TBondResult<&mut TokenLedger> {
        self.get_mut(round).ok_or(TBondError::NotFound { key: *round })
    }
}

/// Signed-order exchange for bond tokens against wrapped principal
#[derive(Debug, Clone)]
pub struct Exchange {
    domain: ExchangeDomain,
    separator: [u8; 32],
    nonces: NonceRegistry,
    events: EventLog,
}

impl Exchange {
    pub fn new(domain: ExchangeDomain) -> Self {
        let separator = domain.separator();
        Self {
            domain,
            separator,
            nonces: NonceRegistry::new(),
            events: EventLog::new(),
        }
    }

    /// Exchange account; the spender makers and takers approve
    pub fn address(&self) -> &Address {
        &self.domain.verifying_contract
    }

    pub fn domain(&self) -> &ExchangeDomain {
        &self.domain
    }

    pub fn nonce_of(&self, owner: &Address) -> u64 {
        self.nonces.current(owner)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Advance the caller's nonce, invalidating every order they signed
    pub fn update_nonce(&mut self, caller: &Address, now: Tick) -> TBondResult<u64> {
        let nonce = self.nonces.advance(caller)?;
        self.events.emit(TBondEvent::NonceUpdated {
            owner: *caller,
            nonce,
            tick: now,
        });
        Ok(nonce)
    }

    /// Advance the maker's nonce and sign a fresh order under it.
    ///
    /// The returned order is the maker's only valid one.
    pub fn create_order(
        &mut self,
        signer: &OrderSigner,
        round: RoundId,
        bond_amount: Amount,
        counter_amount: Amount,
        deadline: Tick,
        now: Tick,
    ) -> TBondResult<SignedOrder> {
        require_positive(bond_amount)?;
        require_positive(counter_amount)?;
        require_not_expired(now, deadline)?;

        let owner = signer.address();
        let nonce = self.update_nonce(&owner, now)?;
        let order = Order {
            owner,
            round,
            bond_amount,
            counter_amount,
            nonce,
            deadline,
        };
        let signature = signer.sign(&self.domain, &order);

        log::debug!("order {} by {} for round {}", nonce, signer.address_hex(), hex::encode(round));
        Ok(SignedOrder { order, signature })
    }

    /// Cancel the maker's current order
    pub fn cancel_order(
        &mut self,
        caller: &Address,
        order: &Order,
        signature: &[u8],
        now: Tick,
    ) -> TBondResult<()> {
        require_owner(caller, Some(&order.owner))?;
        self.nonces.require_current(&order.owner, order.nonce)?;
        verify_order_signature(&self.separator, order, signature)?;

        self.nonces.advance(&order.owner)?;
        self.events.emit(TBondEvent::OrderCancelled {
            owner: order.owner,
            nonce: order.nonce,
            tick: now,
        });
        Ok(())
    }

    /// Settle `order` for the caller.
    ///
    /// Checks, in order: deadline, nonce, maker signature, taker commitment.
    /// Then both legs are validated before either moves.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_order(
        &mut self,
        caller: &Address,
        order: &Order,
        signature: &[u8],
        commitment: &[u8; 32],
        bonds: &mut dyn BondTokens,
        wrapped: &mut TokenLedger,
        now: Tick,
    ) -> TBondResult<()> {
        // 1. Deadline
        require_not_expired(now, order.deadline)?;

        // 2. Maker's current nonce
        self.nonces.require_current(&order.owner, order.nonce)?;

        // 3. Maker signature
        verify_order_signature(&self.separator, order, signature)?;

        // 4. Commitment bound to the caller
        check!(order.commitment(caller) == *commitment, TBondError::InvalidOrder);

        // 5. Both legs must be able to move
        let exchange = self.domain.verifying_contract;
        let bond = bonds.bond_token_mut(&order.round)?;
        bond.check_transfer_from(&exchange, &order.owner, order.bond_amount)?;
        wrapped.check_transfer_from(&exchange, caller, order.counter_amount)?;

        // 6. Settle
        bond.transfer_from(&exchange, &order.owner, caller, order.bond_amount)?;
        wrapped.transfer_from(&exchange, caller, &order.owner, order.counter_amount)?;
        self.nonces.advance(&order.owner)?;

        self.events.emit(TBondEvent::OrderExecuted {
            maker: order.owner,
            taker: *caller,
            round: order.round,
            bond_amount: order.bond_amount,
            counter_amount: order.counter_amount,
            nonce: order.nonce,
            tick: now,
        });
        log::info!(
            "order {} filled: {} bond of {} for {} wrapped",
            order.nonce,
            order.bond_amount,
            hex::encode(order.round),
            order.counter_amount
        );
        Ok(())
    }
}
