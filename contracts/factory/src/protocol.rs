//! Protocol Host
//!
//! Owns every piece of protocol state and drives operations against the
//! current tick. Rounds are reached through the factory by key; staking
//! venues are registered by address and bound to rounds at creation.

use std::collections::BTreeMap;

use tbond_common::{
    clock::{Clock, ManualClock},
    errors::{TBondError, TBondResult},
    ledger::Ledgers,
    staking::StakingVenue,
    types::{Address, Amount, ManagerConfig, RoundId, RoundInfo, SetupParams, Stage, Tick},
};
use tbond_exchange::{Exchange, ExchangeDomain, Order, OrderSigner, SignedOrder};
use tbond_manager::BondManager;

use crate::factory::Factory;

pub struct Protocol<C: Clock = ManualClock> {
    clock: C,
    ledgers: Ledgers,
    venues: BTreeMap<Address, Box<dyn StakingVenue>>,
    factory: Factory,
    exchange: Exchange,
}

impl Protocol<ManualClock> {
    /// Host starting at tick 0 with default configuration
    pub fn new(factory_owner: Address) -> Self {
        Self::with_config(
            factory_owner,
            ManualClock::new(0),
            ManagerConfig::default(),
            ExchangeDomain::default(),
        )
    }
}

impl<C: Clock> Protocol<C> {
    pub fn with_config(
        factory_owner: Address,
        clock: C,
        config: ManagerConfig,
        domain: ExchangeDomain,
    ) -> Self {
        Self {
            clock,
            ledgers: Ledgers::new(),
            venues: BTreeMap::new(),
            factory: Factory::with_config(factory_owner, config),
            exchange: Exchange::new(domain),
        }
    }

    // ============ Accessors ============

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> Tick {
        self.clock.current_tick()
    }

    pub fn ledgers(&self) -> &Ledgers {
        &self.ledgers
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut Factory {
        &mut self.factory
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn round(&self, key: &RoundId) -> TBondResult<&BondManager> {
        self.factory.lookup(key)
    }

    pub fn venue(&self, address: &Address) -> TBondResult<&dyn StakingVenue> {
        self.venues
            .get(address)
            .map(|venue| venue.as_ref())
            .ok_or(TBondError::VenueNotFound { venue: *address })
    }

    pub fn principal_balance(&self, holder: &Address) -> Amount {
        self.ledgers.principal.balance_of(holder)
    }

    pub fn wrapped_balance(&self, holder: &Address) -> Amount {
        self.ledgers.wrapped.balance_of(holder)
    }

    pub fn bond_balance(&self, round: &RoundId, holder: &Address) -> TBondResult<Amount> {
        Ok(self.factory.lookup(round)?.balance_of(holder))
    }

    // ============ Ledgers and Venues ============

    /// Make a venue available to new rounds; returns its address
    pub fn register_venue(&mut self, venue: Box<dyn StakingVenue>) -> TBondResult<Address> {
        let address = venue.address();
        if self.venues.contains_key(&address) {
            return Err(TBondError::InvalidInput {
                param: "venue",
                reason: "venue already registered",
            });
        }
        self.venues.insert(address, venue);
        log::debug!("venue {} registered", hex::encode(address));
        Ok(address)
    }

    pub fn issue_principal(&mut self, to: &Address, amount: Amount) -> TBondResult<()> {
        self.ledgers.issue_principal(to, amount)
    }

    /// Top up a venue's yield reserve
    pub fn fund_venue(&mut self, venue: &Address, amount: Amount) -> TBondResult<()> {
        self.venue(venue)?;
        self.ledgers.issue_principal(venue, amount)
    }

    pub fn wrap(&mut self, holder: &Address, principal: Amount) -> TBondResult<Amount> {
        self.ledgers.wrap(holder, principal)
    }

    pub fn unwrap(&mut self, holder: &Address, wrapped: Amount) -> TBondResult<Amount> {
        self.ledgers.unwrap(holder, wrapped)
    }

    pub fn approve_principal(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.ledgers.principal.approve(owner, spender, amount);
    }

    pub fn approve_wrapped(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.ledgers.wrapped.approve(owner, spender, amount);
    }

    pub fn approve_bond(
        &mut self,
        round: &RoundId,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> TBondResult<()> {
        self.factory.lookup_mut(round)?.bond_token_mut().approve(owner, spender, amount);
        Ok(())
    }

    pub fn transfer_bond(
        &mut self,
        round: &RoundId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TBondResult<()> {
        self.factory.lookup_mut(round)?.bond_token_mut().transfer(from, to, amount)
    }

    // ============ Factory ============

    pub fn grant_creator(&mut self, caller: &Address, creator: Address) -> TBondResult<()> {
        let now = self.now();
        self.factory.grant_creator(caller, creator, now)
    }

    pub fn revoke_creator(&mut self, caller: &Address, creator: &Address) -> TBondResult<()> {
        let now = self.now();
        self.factory.revoke_creator(caller, creator, now)
    }

    /// Create a round bound to a registered venue
    pub fn create_round(
        &mut self,
        caller: &Address,
        venue: &Address,
        name: &str,
        symbol: &str,
    ) -> TBondResult<RoundId> {
        let now = self.now();
        self.venue(venue)?;
        self.factory.create(caller, *venue, name, symbol, now)
    }

    // ============ Round Lifecycle ============

    pub fn setup(
        &mut self,
        caller: &Address,
        round: &RoundId,
        params: SetupParams,
    ) -> TBondResult<()> {
        let now = self.now();
        self.factory.lookup_mut(round)?.setup(caller, &mut self.ledgers, now, params)
    }

    pub fn deposit_ton(
        &mut self,
        caller: &Address,
        round: &RoundId,
        amount: Amount,
    ) -> TBondResult<Amount> {
        let now = self.now();
        self.factory.lookup_mut(round)?.deposit_ton(caller, &mut self.ledgers, now, amount)
    }

    pub fn deposit_wton(
        &mut self,
        caller: &Address,
        round: &RoundId,
        amount: Amount,
    ) -> TBondResult<Amount> {
        let now = self.now();
        self.factory.lookup_mut(round)?.deposit_wton(caller, &mut self.ledgers, now, amount)
    }

    pub fn deposit_both(
        &mut self,
        caller: &Address,
        round: &RoundId,
        principal: Amount,
        wrapped: Amount,
    ) -> TBondResult<Amount> {
        let now = self.now();
        self.factory
            .lookup_mut(round)?
            .deposit_both(caller, &mut self.ledgers, now, principal, wrapped)
    }

    /// Anyone may trigger staking once the round is eligible
    pub fn stake(&mut self, round: &RoundId) -> TBondResult<Amount> {
        let now = self.now();
        let manager = self.factory.lookup_mut(round)?;
        let venue = Self::venue_mut(&mut self.venues, manager.venue())?;
        manager.stake(&mut self.ledgers, venue, now)
    }

    pub fn unstake(&mut self, round: &RoundId) -> TBondResult<Amount> {
        let now = self.now();
        let manager = self.factory.lookup_mut(round)?;
        let venue = Self::venue_mut(&mut self.venues, manager.venue())?;
        manager.unstake(venue, now)
    }

    pub fn withdraw(&mut self, round: &RoundId) -> TBondResult<Amount> {
        let now = self.now();
        let manager = self.factory.lookup_mut(round)?;
        let venue = Self::venue_mut(&mut self.venues, manager.venue())?;
        manager.withdraw(&mut self.ledgers, venue, now)
    }

    pub fn claim(
        &mut self,
        caller: &Address,
        round: &RoundId,
        bond_amount: Amount,
    ) -> TBondResult<Amount> {
        let now = self.now();
        self.factory.lookup_mut(round)?.claim(caller, &mut self.ledgers, now, bond_amount)
    }

    pub fn refund(
        &mut self,
        caller: &Address,
        round: &RoundId,
        bond_amount: Amount,
    ) -> TBondResult<Amount> {
        let now = self.now();
        self.factory.lookup_mut(round)?.refund(caller, &mut self.ledgers, now, bond_amount)
    }

    pub fn info(&self, round: &RoundId) -> TBondResult<RoundInfo> {
        Ok(self.factory.lookup(round)?.info(self.now()))
    }

    pub fn stage(&self, round: &RoundId) -> TBondResult<Stage> {
        Ok(self.factory.lookup(round)?.stage())
    }

    pub fn set_incentive_to(
        &mut self,
        caller: &Address,
        round: &RoundId,
        recipient: Address,
    ) -> TBondResult<()> {
        let now = self.now();
        self.factory.lookup_mut(round)?.set_incentive_to(caller, recipient, now)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        round: &RoundId,
        new_owner: Address,
    ) -> TBondResult<()> {
        let now = self.now();
        self.factory.lookup_mut(round)?.transfer_ownership(caller, new_owner, now)
    }

    pub fn renounce_ownership(&mut self, caller: &Address, round: &RoundId) -> TBondResult<()> {
        let now = self.now();
        self.factory.lookup_mut(round)?.renounce_ownership(caller, now)
    }

    fn venue_mut<'a>(
        venues: &'a mut BTreeMap<Address, Box<dyn StakingVenue>>,
        address: &Address,
    ) -> TBondResult<&'a mut dyn StakingVenue> {
        match venues.get_mut(address) {
            Some(venue) => Ok(venue.as_mut()),
            None => Err(TBondError::VenueNotFound { venue: *address }),
        }
    }

    // ============ Exchange ============

    pub fn update_nonce(&mut self, caller: &Address) -> TBondResult<u64> {
        let now = self.now();
        self.exchange.update_nonce(caller, now)
    }

    /// Sign a fresh order for an existing round
    pub fn create_order(
        &mut self,
        signer: &OrderSigner,
        round: &RoundId,
        bond_amount: Amount,
        counter_amount: Amount,
        deadline: Tick,
    ) -> TBondResult<SignedOrder> {
        let now = self.now();
        self.factory.lookup(round)?;
        self.exchange
            .create_order(signer, *round, bond_amount, counter_amount, deadline, now)
    }

    pub fn cancel_order(
        &mut self,
        caller: &Address,
        order: &Order,
        signature: &[u8],
    ) -> TBondResult<()> {
        let now = self.now();
        self.exchange.cancel_order(caller, order, signature, now)
    }

    /// Settle an order against the round's bond ledger and the wrapped ledger
    pub fn execute_order(
        &mut self,
        caller: &Address,
        order: &Order,
        signature: &[u8],
        commitment: &[u8; 32],
    ) -> TBondResult<()> {
        let now = self.now();
        self.exchange.execute_order(
            caller,
            order,
            signature,
            commitment,
            &mut self.factory,
            &mut self.ledgers.wrapped,
            now,
        )
    }
}
