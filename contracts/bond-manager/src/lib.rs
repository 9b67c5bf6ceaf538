//! Bond Manager - Per-Round Lifecycle for TBOND
//!
//! A round raises principal during a fundraising window, commits the pooled
//! principal to a staking venue for a fixed period, and after unwinding lets
//! holders redeem their bond tokens for principal plus a pro-rata share of
//! the yield.
//!
//! ## Stages
//!
//! `None --setup--> Fundraising --stake--> Staking --unstake--> Unstaking --withdraw--> Ended`
//!
//! Stages only move forward and none is re-entered.
//!
//! ## Core Operations
//!
//! - **setup**: Owner seeds the round with the minimum deposit
//! - **deposit_ton / deposit_wton / deposit_both**: Pull approved principal
//!   (or wrapped principal, normalized by 10^9) and mint bond tokens 1:1
//! - **stake**: Forward all held principal to the venue, mint the incentive
//! - **unstake**: Start the venue's withdrawal delay
//! - **withdraw**: Pull principal plus yield back and fix the exchange rate
//! - **claim / refund**: Burn bond tokens for principal
//!
//! ## Atomicity
//!
//! Every operation validates all of its preconditions, including ledger
//! balances and allowances, before the first state change. A failed call
//! leaves the round, the ledgers and the event log untouched.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use tbond_common::{
    check,
    errors::{TBondError, TBondResult},
    events::{EventLog, TBondEvent},
    ledger::{Ledgers, TokenLedger},
    math::{calculate_incentive, safe_add, safe_sub, tick_add, wrapped_to_principal},
    staking::StakingVenue,
    types::{
        Address, Amount, ExchangeRate, ManagerConfig, RoundId, RoundInfo, SetupParams, Stage,
        Tick,
    },
    validation::{
        require_non_zero_address, require_owner, require_positive, require_reached,
        require_stage,
    },
};

// ============ Round State ============

/// Mutable lifecycle state of one round
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct RoundState {
    /// Current stage
    pub stage: Stage,
    /// First tick at which `stake` is allowed
    pub fundraising_deadline: Tick,
    /// Ticks between staking and unstake eligibility
    pub staking_period: Tick,
    /// First tick at which `unstake` is allowed
    pub staking_deadline: Tick,
    /// First tick at which `withdraw` is allowed
    pub withdraw_ready_tick: Tick,
    /// Informational fundraising goal
    pub target_amount: Amount,
    /// Owner seed taken at setup
    pub seed_amount: Amount,
    /// Principal-equivalent held before staking
    pub total_principal_held: Amount,
    /// Recipient of the staking incentive
    pub incentive_to: Address,
    /// Set exactly once, by `withdraw`
    pub exchange_rate: Option<ExchangeRate>,
}

/// One bond round: its owner, venue binding, bond token and lifecycle
#[derive(Debug, Clone)]
pub struct BondManager {
    id: RoundId,
    owner: Option<Address>,
    venue: Address,
    config: ManagerConfig,
    state: RoundState,
    bond: TokenLedger,
    events: EventLog,
}

impl BondManager {
    /// Create a round in stage `None`.
    ///
    /// The round id doubles as the round's custody address on every ledger,
    /// and as the only account allowed to mint or burn its bond token.
    pub fn new(
        id: RoundId,
        owner: Address,
        venue: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            id,
            owner: Some(owner),
            venue,
            config,
            state: RoundState::default(),
            bond: TokenLedger::bond(name, symbol, id),
            events: EventLog::new(),
        }
    }

    // ============ Views ============

    pub fn id(&self) -> &RoundId {
        &self.id
    }

    /// Custody address of the round
    pub fn address(&self) -> &Address {
        &self.id
    }

    pub fn owner(&self) -> Option<&Address> {
        self.owner.as_ref()
    }

    pub fn venue(&self) -> &Address {
        &self.venue
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn minimum_deposit(&self) -> Amount {
        self.config.minimum_deposit
    }

    pub fn total_principal_held(&self) -> Amount {
        self.state.total_principal_held
    }

    pub fn exchange_rate(&self) -> Option<&ExchangeRate> {
        self.state.exchange_rate.as_ref()
    }

    pub fn incentive_to(&self) -> &Address {
        &self.state.incentive_to
    }

    pub fn bond_token(&self) -> &TokenLedger {
        &self.bond
    }

    /// Mutable bond ledger for holder transfers and approvals.
    /// Mint and burn still require the round as caller.
    pub fn bond_token_mut(&mut self) -> &mut TokenLedger {
        &mut self.bond
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.bond.balance_of(holder)
    }

    pub fn total_supply(&self) -> Amount {
        self.bond.total_supply()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Aggregate view; `can_*` flags mirror the checks the operation would run at `now`
    pub fn info(&self, now: Tick) -> RoundInfo {
        let state = &self.state;
        RoundInfo {
            target_amount: state.target_amount,
            can_stake: state.stage == Stage::Fundraising
                && now >= state.fundraising_deadline
                && state.total_principal_held >= self.config.minimum_deposit,
            can_unstake: state.stage == Stage::Staking && now >= state.staking_deadline,
            can_withdraw: state.stage == Stage::Unstaking && now >= state.withdraw_ready_tick,
            stage: state.stage,
            total_supply: self.bond.total_supply(),
            staking_period: state.staking_period,
        }
    }

    // ============ Setup ============

    /// Seed the round and open fundraising.
    ///
    /// The owner must have approved at least `minimum_deposit` principal to
    /// the round; exactly `minimum_deposit` is pulled and minted back as bond.
    pub fn setup(
        &mut self,
        caller: &Address,
        ledgers: &mut Ledgers,
        now: Tick,
        params: SetupParams,
    ) -> TBondResult<()> {
        // 1. Only once
        check!(self.state.stage == Stage::None, TBondError::AlreadyInitialized);

        // 2. Only the owner
        require_owner(caller, self.owner.as_ref())?;
        require_non_zero_address(&params.incentive_to, "incentive recipient cannot be zero")?;

        // 3. Seed must be approved and funded
        let round = self.id;
        let seed = self.config.minimum_deposit;
        let funded = ledgers
            .principal
            .allowance(caller, &round)
            .min(ledgers.principal.balance_of(caller));
        check!(
            funded >= seed,
            TBondError::BelowMinimumDeposit { amount: funded, minimum: seed }
        );

        let fundraising_deadline = tick_add(now, params.fundraising_period)?;

        // 4. Effects
        ledgers.principal.transfer_from(&round, caller, &round, seed)?;
        self.bond.mint(&round, caller, seed)?;

        self.state = RoundState {
            fundraising_deadline,
            staking_period: params.staking_period,
            target_amount: params.target_amount,
            seed_amount: seed,
            total_principal_held: seed,
            incentive_to: params.incentive_to,
            ..RoundState::default()
        };
        self.advance_stage("setup", Stage::Fundraising)?;

        self.events.emit(TBondEvent::RoundSetup {
            round,
            owner: *caller,
            seed,
            fundraising_deadline,
            staking_period: params.staking_period,
            target_amount: params.target_amount,
            tick: now,
        });
        log::info!(
            "round {} set up: seed {}, fundraising until tick {}",
            hex::encode(round),
            seed,
            fundraising_deadline
        );
        Ok(())
    }

    // ============ Deposits ============

    /// Deposit approved principal; returns bond tokens minted
    pub fn deposit_ton(
        &mut self,
        caller: &Address,
        ledgers: &mut Ledgers,
        now: Tick,
        amount: Amount,
    ) -> TBondResult<Amount> {
        self.deposit_both(caller, ledgers, now, amount, 0)
    }

    /// Deposit approved wrapped principal; mints `amount / 10^9` bond tokens
    pub fn deposit_wton(
        &mut self,
        caller: &Address,
        ledgers: &mut Ledgers,
        now: Tick,
        amount: Amount,
    ) -> TBondResult<Amount> {
        self.deposit_both(caller, ledgers, now, 0, amount)
    }

    /// Deposit principal and wrapped principal in one call.
    ///
    /// Wrapped deposits are unwrapped immediately so the round only ever
    /// holds principal. Sub-unit wrapped dust is burned; only a deposit that
    /// mints nothing is rejected.
    pub fn deposit_both(
        &mut self,
        caller: &Address,
        ledgers: &mut Ledgers,
        now: Tick,
        principal: Amount,
        wrapped: Amount,
    ) -> TBondResult<Amount> {
        let stage = self.state.stage;
        check!(
            stage == Stage::Fundraising,
            TBondError::WrongStage { operation: "deposit", stage }
        );

        let from_wrapped = wrapped_to_principal(wrapped);
        let minted = safe_add(principal, from_wrapped)?;
        require_positive(minted)?;
        let held = safe_add(self.state.total_principal_held, minted)?;

        let round = self.id;
        if principal > 0 {
            ledgers.principal.check_transfer_from(&round, caller, principal)?;
        }
        if wrapped > 0 {
            ledgers.wrapped.check_transfer_from(&round, caller, wrapped)?;
        }

        if principal > 0 {
            ledgers.principal.transfer_from(&round, caller, &round, principal)?;
        }
        if wrapped > 0 {
            ledgers.wrapped.transfer_from(&round, caller, &round, wrapped)?;
            ledgers.unwrap(&round, wrapped)?;
        }
        self.bond.mint(&round, caller, minted)?;
        self.state.total_principal_held = held;

        self.events.emit(TBondEvent::Deposited {
            round,
            depositor: *caller,
            principal,
            wrapped,
            minted,
            tick: now,
        });
        log::debug!("round {} deposit {} by {}", hex::encode(round), minted, hex::encode(caller));
        Ok(minted)
    }

    // ============ Stage Transitions ============

    /// Commit all held principal to the venue and mint the incentive.
    ///
    /// Returns the incentive minted to `incentive_to`.
    pub fn stake(
        &mut self,
        ledgers: &mut Ledgers,
        venue: &mut dyn StakingVenue,
        now: Tick,
    ) -> TBondResult<Amount> {
        // 1. Stage and deadline
        require_stage("stake", self.state.stage, Stage::Fundraising)?;
        require_reached(now, self.state.fundraising_deadline)?;

        // 2. Aggregate minimum
        let held = self.state.total_principal_held;
        let minimum = self.config.minimum_deposit;
        check!(
            held >= minimum,
            TBondError::BelowMinimumDeposit { amount: held, minimum }
        );
        self.require_venue(venue)?;

        // 3. Incentive on post-seed deposits
        let incentive =
            calculate_incentive(held, self.state.seed_amount, self.config.incentive_bps)?;
        let total_supply = safe_add(self.bond.total_supply(), incentive)?;
        let staking_deadline = tick_add(now, self.state.staking_period)?;

        let round = self.id;
        let venue_address = venue.address();
        ledgers.principal.check_transfer(&round, held)?;

        // 4. Effects
        ledgers.principal.approve(&round, &venue_address, held);
        if let Err(err) = venue.stake(&mut ledgers.principal, &round, held, now) {
            ledgers.principal.approve(&round, &venue_address, 0);
            return Err(err);
        }
        let recipient = self.state.incentive_to;
        self.bond.mint(&round, &recipient, incentive)?;

        self.advance_stage("stake", Stage::Staking)?;
        self.state.staking_deadline = staking_deadline;

        self.events.emit(TBondEvent::Staked {
            round,
            venue: venue_address,
            amount: held,
            staking_deadline,
            tick: now,
        });
        self.events.emit(TBondEvent::IncentiveMinted {
            round,
            recipient,
            amount: incentive,
            total_supply,
            tick: now,
        });
        log::info!(
            "round {} staked {} (incentive {}), unstake from tick {}",
            hex::encode(round),
            held,
            incentive,
            staking_deadline
        );
        Ok(incentive)
    }

    /// Start the venue's withdrawal delay; returns the pending amount
    pub fn unstake(&mut self, venue: &mut dyn StakingVenue, now: Tick) -> TBondResult<Amount> {
        require_stage("unstake", self.state.stage, Stage::Staking)?;
        require_reached(now, self.state.staking_deadline)?;
        self.require_venue(venue)?;

        let withdraw_ready_tick = tick_add(now, venue.withdrawal_delay())?;
        let pending = venue.unstake(&self.id, now)?;

        self.advance_stage("unstake", Stage::Unstaking)?;
        self.state.withdraw_ready_tick = withdraw_ready_tick;

        self.events.emit(TBondEvent::Unstaked {
            round: self.id,
            pending,
            withdraw_ready_tick,
            tick: now,
        });
        log::info!(
            "round {} unstaking {}, withdraw from tick {}",
            hex::encode(self.id),
            pending,
            withdraw_ready_tick
        );
        Ok(pending)
    }

    /// Pull principal plus yield back and fix the exchange rate.
    ///
    /// The rate uses the principal actually received on the ledger, not the
    /// venue's reported figure.
    pub fn withdraw(
        &mut self,
        ledgers: &mut Ledgers,
        venue: &mut dyn StakingVenue,
        now: Tick,
    ) -> TBondResult<Amount> {
        require_stage("withdraw", self.state.stage, Stage::Unstaking)?;
        require_reached(now, self.state.withdraw_ready_tick)?;
        self.require_venue(venue)?;

        let round = self.id;
        let before = ledgers.principal.balance_of(&round);
        venue.withdraw(&mut ledgers.principal, &round, now)?;
        let received = safe_sub(ledgers.principal.balance_of(&round), before)?;

        let total_supply = self.bond.total_supply();
        self.state.exchange_rate = Some(ExchangeRate {
            principal_returned: received,
            supply_at_withdraw: total_supply,
        });
        self.advance_stage("withdraw", Stage::Ended)?;

        self.events.emit(TBondEvent::Withdrawn {
            round,
            principal_returned: received,
            total_supply,
            tick: now,
        });
        log::info!(
            "round {} ended: {} principal for {} bond",
            hex::encode(round),
            received,
            total_supply
        );
        Ok(received)
    }

    fn require_venue(&self, venue: &dyn StakingVenue) -> TBondResult<()> {
        check!(
            venue.address() == self.venue,
            TBondError::InvalidInput { param: "venue", reason: "not the venue bound to this round" }
        );
        Ok(())
    }

    /// Move to the immediate successor stage; stages never skip or repeat
    fn advance_stage(&mut self, operation: &'static str, to: Stage) -> TBondResult<()> {
        let stage = self.state.stage;
        check!(
            stage.can_advance_to(to),
            TBondError::WrongStage { operation, stage }
        );
        self.state.stage = to;
        Ok(())
    }

    // ============ Redemption ============

    /// Burn `bond_amount` of the caller's bond tokens for principal.
    ///
    /// Pays 1:1 during fundraising and `bond_amount * exchange_rate`
    /// (truncated) once ended. Rejected while principal is at the venue.
    pub fn claim(
        &mut self,
        caller: &Address,
        ledgers: &mut Ledgers,
        now: Tick,
        bond_amount: Amount,
    ) -> TBondResult<Amount> {
        require_positive(bond_amount)?;

        let stage = self.state.stage;
        let payout = match (stage, self.state.exchange_rate) {
            (Stage::None, _) => return Err(TBondError::Uninitialized),
            (Stage::Fundraising, _) => bond_amount,
            (Stage::Ended, Some(rate)) => rate.payout(bond_amount)?,
            _ => return Err(TBondError::WrongStage { operation: "claim", stage }),
        };

        let round = self.id;
        self.bond.check_transfer(caller, bond_amount)?;
        ledgers.principal.check_transfer(&round, payout)?;
        let held = if stage == Stage::Fundraising {
            safe_sub(self.state.total_principal_held, bond_amount)?
        } else {
            self.state.total_principal_held
        };

        self.bond.burn(&round, caller, bond_amount)?;
        ledgers.principal.transfer(&round, caller, payout)?;
        self.state.total_principal_held = held;

        self.events.emit(TBondEvent::Claimed {
            round,
            holder: *caller,
            bond_amount,
            payout,
            tick: now,
        });
        log::debug!(
            "round {} claim {} -> {} by {}",
            hex::encode(round),
            bond_amount,
            payout,
            hex::encode(caller)
        );
        Ok(payout)
    }

    /// `claim` restricted to fundraising, so depositors can exit before staking
    pub fn refund(
        &mut self,
        caller: &Address,
        ledgers: &mut Ledgers,
        now: Tick,
        bond_amount: Amount,
    ) -> TBondResult<Amount> {
        require_stage("refund", self.state.stage, Stage::Fundraising)?;
        self.claim(caller, ledgers, now, bond_amount)
    }

    // ============ Owner Operations ============

    /// Change the incentive recipient; only while fundraising
    pub fn set_incentive_to(
        &mut self,
        caller: &Address,
        recipient: Address,
        now: Tick,
    ) -> TBondResult<()> {
        require_owner(caller, self.owner.as_ref())?;
        require_stage("set_incentive_to", self.state.stage, Stage::Fundraising)?;
        require_non_zero_address(&recipient, "incentive recipient cannot be zero")?;

        self.state.incentive_to = recipient;
        self.events.emit(TBondEvent::IncentiveRecipientChanged {
            round: self.id,
            recipient,
            tick: now,
        });
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
        now: Tick,
    ) -> TBondResult<()> {
        require_owner(caller, self.owner.as_ref())?;
        require_non_zero_address(&new_owner, "new owner cannot be zero")?;

        self.owner = Some(new_owner);
        self.events.emit(TBondEvent::OwnershipTransferred {
            round: self.id,
            previous_owner: *caller,
            new_owner: Some(new_owner),
            tick: now,
        });
        Ok(())
    }

    /// Give up ownership for good; owner-gated calls fail afterwards
    pub fn renounce_ownership(&mut self, caller: &Address, now: Tick) -> TBondResult<()> {
        require_owner(caller, self.owner.as_ref())?;

        self.owner = None;
        self.events.emit(TBondEvent::OwnershipTransferred {
            round: self.id,
            previous_owner: *caller,
            new_owner: None,
            tick: now,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbond_common::constants::token::{ONE_PRINCIPAL, ONE_WRAPPED};
    use tbond_common::events::EventType;
    use tbond_common::staking::SimulatedVenue;

    const P: Amount = ONE_PRINCIPAL;
    const W: Amount = ONE_WRAPPED;
    const FUNDRAISING_PERIOD: Tick = 100;
    const STAKING_PERIOD: Tick = 1_000;
    const DELAY: Tick = 93_046;

    fn round_id() -> RoundId {
        [0xAA; 32]
    }

    fn owner() -> Address {
        [1u8; 32]
    }

    fn user1() -> Address {
        [2u8; 32]
    }

    fn user2() -> Address {
        [3u8; 32]
    }

    fn incentive() -> Address {
        [4u8; 32]
    }

    fn venue_address() -> Address {
        [0xBB; 32]
    }

    struct TestContext {
        manager: BondManager,
        ledgers: Ledgers,
        venue: SimulatedVenue,
    }

    fn create_test_context() -> TestContext {
        let mut ledgers = Ledgers::new();
        for who in [owner(), user1(), user2()] {
            ledgers.issue_principal(&who, 100_000 * P).unwrap();
        }
        // yield reserve
        ledgers.issue_principal(&venue_address(), 10_000 * P).unwrap();

        TestContext {
            manager: BondManager::new(
                round_id(),
                owner(),
                venue_address(),
                "TBOND-1",
                "TBOND",
                ManagerConfig::default(),
            ),
            ledgers,
            venue: SimulatedVenue::new(venue_address(), 500),
        }
    }

    fn params() -> SetupParams {
        SetupParams {
            fundraising_period: FUNDRAISING_PERIOD,
            staking_period: STAKING_PERIOD,
            target_amount: 50_000 * P,
            incentive_to: incentive(),
        }
    }

    fn setup_round(ctx: &mut TestContext) {
        ctx.ledgers.principal.approve(&owner(), &round_id(), 1_000 * P);
        ctx.manager.setup(&owner(), &mut ctx.ledgers, 0, params()).unwrap();
    }

    fn deposit_ton(ctx: &mut TestContext, who: Address, amount: Amount) {
        ctx.ledgers.principal.approve(&who, &round_id(), amount);
        ctx.manager.deposit_ton(&who, &mut ctx.ledgers, 1, amount).unwrap();
    }

    fn deposit_wton(ctx: &mut TestContext, who: Address, wrapped: Amount) {
        ctx.ledgers.wrap(&who, wrapped / W * P).unwrap();
        ctx.ledgers.wrapped.approve(&who, &round_id(), wrapped);
        ctx.manager.deposit_wton(&who, &mut ctx.ledgers, 1, wrapped).unwrap();
    }

    /// Seed 1000, user1 5000 P + 5000 W, user2 2000 P then 2000 W
    fn fund_scenario(ctx: &mut TestContext) {
        setup_round(ctx);
        ctx.ledgers.wrap(&user1(), 5_000 * P).unwrap();
        ctx.ledgers.principal.approve(&user1(), &round_id(), 5_000 * P);
        ctx.ledgers.wrapped.approve(&user1(), &round_id(), 5_000 * W);
        ctx.manager
            .deposit_both(&user1(), &mut ctx.ledgers, 1, 5_000 * P, 5_000 * W)
            .unwrap();
        deposit_ton(ctx, user2(), 2_000 * P);
        deposit_wton(ctx, user2(), 2_000 * W);
    }

    fn run_to_ended(ctx: &mut TestContext) {
        ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD).unwrap();
        ctx.manager.unstake(&mut ctx.venue, FUNDRAISING_PERIOD + STAKING_PERIOD).unwrap();
        ctx.manager
            .withdraw(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD + STAKING_PERIOD + DELAY)
            .unwrap();
    }

    // ============ Setup ============

    #[test]
    fn test_setup_below_minimum() {
        let mut ctx = create_test_context();
        ctx.ledgers.principal.approve(&owner(), &round_id(), 100 * P);

        let result = ctx.manager.setup(&owner(), &mut ctx.ledgers, 0, params());
        assert_eq!(
            result,
            Err(TBondError::BelowMinimumDeposit { amount: 100 * P, minimum: 1_000 * P })
        );
        assert_eq!(ctx.manager.stage(), Stage::None);
        assert_eq!(ctx.ledgers.principal.balance_of(&round_id()), 0);
        assert!(!ctx.manager.events().has_events());
    }

    #[test]
    fn test_setup_exact_minimum() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);

        assert_eq!(ctx.manager.stage(), Stage::Fundraising);
        assert_eq!(ctx.manager.balance_of(&owner()), 1_000 * P);
        assert_eq!(ctx.manager.total_principal_held(), 1_000 * P);
        assert_eq!(ctx.manager.state().fundraising_deadline, FUNDRAISING_PERIOD);
        assert_eq!(ctx.ledgers.principal.balance_of(&round_id()), 1_000 * P);
    }

    #[test]
    fn test_setup_pulls_only_the_seed() {
        let mut ctx = create_test_context();
        ctx.ledgers.principal.approve(&owner(), &round_id(), 5_000 * P);
        ctx.manager.setup(&owner(), &mut ctx.ledgers, 0, params()).unwrap();

        assert_eq!(ctx.manager.total_supply(), 1_000 * P);
        assert_eq!(ctx.ledgers.principal.allowance(&owner(), &round_id()), 4_000 * P);
    }

    #[test]
    fn test_setup_not_owner() {
        let mut ctx = create_test_context();
        ctx.ledgers.principal.approve(&user1(), &round_id(), 1_000 * P);
        let result = ctx.manager.setup(&user1(), &mut ctx.ledgers, 0, params());
        assert!(matches!(result, Err(TBondError::NotOwner { .. })));
    }

    #[test]
    fn test_setup_twice() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        ctx.ledgers.principal.approve(&owner(), &round_id(), 1_000 * P);
        let result = ctx.manager.setup(&owner(), &mut ctx.ledgers, 5, params());
        assert_eq!(result, Err(TBondError::AlreadyInitialized));
    }

    // ============ Deposits ============

    #[test]
    fn test_deposit_before_setup() {
        let mut ctx = create_test_context();
        ctx.ledgers.principal.approve(&user1(), &round_id(), 10 * P);
        let result = ctx.manager.deposit_ton(&user1(), &mut ctx.ledgers, 0, 10 * P);
        assert_eq!(
            result,
            Err(TBondError::WrongStage { operation: "deposit", stage: Stage::None })
        );
    }

    #[test]
    fn test_deposit_requires_allowance() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        ctx.ledgers.principal.approve(&user1(), &round_id(), 10 * P);

        let result = ctx.manager.deposit_ton(&user1(), &mut ctx.ledgers, 1, 20 * P);
        assert!(matches!(result, Err(TBondError::InsufficientAllowance { .. })));
        assert_eq!(ctx.manager.balance_of(&user1()), 0);
    }

    #[test]
    fn test_deposit_both_is_atomic() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        ctx.ledgers.principal.approve(&user1(), &round_id(), 10 * P);
        // no wrapped balance or allowance

        let result = ctx.manager.deposit_both(&user1(), &mut ctx.ledgers, 1, 10 * P, 10 * W);
        assert!(matches!(result, Err(TBondError::InsufficientAllowance { .. })));
        assert_eq!(ctx.ledgers.principal.allowance(&user1(), &round_id()), 10 * P);
        assert_eq!(ctx.manager.total_principal_held(), 1_000 * P);
    }

    #[test]
    fn test_deposit_zero_and_dust() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        assert_eq!(
            ctx.manager.deposit_ton(&user1(), &mut ctx.ledgers, 1, 0),
            Err(TBondError::ZeroAmount)
        );
        assert_eq!(
            ctx.manager.deposit_wton(&user1(), &mut ctx.ledgers, 1, 999_999_999),
            Err(TBondError::ZeroAmount)
        );
    }

    #[test]
    fn test_wrapped_deposit_normalizes() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        deposit_wton(&mut ctx, user1(), 3_000 * W);

        assert_eq!(ctx.manager.balance_of(&user1()), 3_000 * P);
        assert_eq!(ctx.ledgers.wrapped.balance_of(&round_id()), 0);
        assert_eq!(ctx.ledgers.principal.balance_of(&round_id()), 4_000 * P);
    }

    #[test]
    fn test_deposit_both_with_wrapped_dust() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        ctx.ledgers.wrap(&user1(), P).unwrap();
        ctx.ledgers.principal.approve(&user1(), &round_id(), 500 * P);
        ctx.ledgers.wrapped.approve(&user1(), &round_id(), 5);

        let minted = ctx
            .manager
            .deposit_both(&user1(), &mut ctx.ledgers, 1, 500 * P, 5)
            .unwrap();

        // the dust is pulled and burned without minting
        assert_eq!(minted, 500 * P);
        assert_eq!(ctx.manager.balance_of(&user1()), 500 * P);
        assert_eq!(ctx.ledgers.wrapped.balance_of(&user1()), W - 5);
        assert_eq!(ctx.ledgers.wrapped.balance_of(&round_id()), 0);
        assert_eq!(ctx.ledgers.wrapped.total_supply(), W - 5);
        assert_eq!(ctx.manager.total_principal_held(), 1_500 * P);
        assert_eq!(ctx.ledgers.principal.balance_of(&round_id()), 1_500 * P);
    }

    // ============ Stake ============

    #[test]
    fn test_scenario_incentive() {
        let mut ctx = create_test_context();
        fund_scenario(&mut ctx);
        assert_eq!(ctx.manager.total_principal_held(), 15_000 * P);

        let minted = ctx
            .manager
            .stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD)
            .unwrap();

        assert_eq!(minted, 42 * P);
        assert_eq!(ctx.manager.balance_of(&incentive()), 42 * P);
        assert_eq!(ctx.manager.total_supply(), 15_042 * P);
        assert_eq!(ctx.manager.stage(), Stage::Staking);
        assert_eq!(ctx.manager.state().staking_deadline, FUNDRAISING_PERIOD + STAKING_PERIOD);
        assert_eq!(ctx.ledgers.principal.balance_of(&round_id()), 0);
        assert_eq!(ctx.venue.position(&round_id()).unwrap().staked, 15_000 * P);
    }

    #[test]
    fn test_stake_too_early() {
        let mut ctx = create_test_context();
        fund_scenario(&mut ctx);
        let result = ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD - 1);
        assert_eq!(
            result,
            Err(TBondError::TooEarly { now: FUNDRAISING_PERIOD - 1, ready_at: FUNDRAISING_PERIOD })
        );
    }

    #[test]
    fn test_stake_below_minimum_after_refund() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        deposit_ton(&mut ctx, user1(), 500 * P);
        ctx.manager.refund(&owner(), &mut ctx.ledgers, 2, 1_000 * P).unwrap();

        let result = ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD);
        assert_eq!(
            result,
            Err(TBondError::BelowMinimumDeposit { amount: 500 * P, minimum: 1_000 * P })
        );
        assert_eq!(ctx.manager.stage(), Stage::Fundraising);
    }

    #[test]
    fn test_stake_seed_only_mints_no_incentive() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        let minted = ctx
            .manager
            .stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD)
            .unwrap();
        assert_eq!(minted, 0);
        assert_eq!(ctx.manager.total_supply(), 1_000 * P);
    }

    #[test]
    fn test_stake_before_setup() {
        let mut ctx = create_test_context();
        let result = ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, 0);
        assert_eq!(result, Err(TBondError::Uninitialized));
    }

    #[test]
    fn test_stake_rejects_other_venue() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        let mut other = SimulatedVenue::new([0xCC; 32], 0);
        let result = ctx.manager.stake(&mut ctx.ledgers, &mut other, FUNDRAISING_PERIOD);
        assert!(matches!(result, Err(TBondError::InvalidInput { .. })));
    }

    #[test]
    fn test_deposit_after_stake() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD).unwrap();

        ctx.ledgers.principal.approve(&user1(), &round_id(), 10 * P);
        let result =
            ctx.manager.deposit_ton(&user1(), &mut ctx.ledgers, FUNDRAISING_PERIOD, 10 * P);
        assert!(matches!(result, Err(TBondError::WrongStage { stage: Stage::Staking, .. })));
    }

    // ============ Unstake / Withdraw ============

    #[test]
    fn test_unstake_deadline() {
        let mut ctx = create_test_context();
        fund_scenario(&mut ctx);
        ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD).unwrap();

        let deadline = FUNDRAISING_PERIOD + STAKING_PERIOD;
        let early = ctx.manager.unstake(&mut ctx.venue, deadline - 1);
        assert!(matches!(early, Err(TBondError::TooEarly { .. })));

        let pending = ctx.manager.unstake(&mut ctx.venue, deadline).unwrap();
        assert_eq!(pending, 15_750 * P);
        assert_eq!(ctx.manager.stage(), Stage::Unstaking);
        assert_eq!(ctx.manager.state().withdraw_ready_tick, deadline + DELAY);
    }

    #[test]
    fn test_withdraw_fixes_exchange_rate() {
        let mut ctx = create_test_context();
        fund_scenario(&mut ctx);
        ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD).unwrap();
        let unstaked_at = FUNDRAISING_PERIOD + STAKING_PERIOD;
        ctx.manager.unstake(&mut ctx.venue, unstaked_at).unwrap();

        let early = ctx.manager.withdraw(&mut ctx.ledgers, &mut ctx.venue, unstaked_at + DELAY - 1);
        assert!(matches!(early, Err(TBondError::TooEarly { .. })));
        assert!(ctx.manager.exchange_rate().is_none());

        let received = ctx
            .manager
            .withdraw(&mut ctx.ledgers, &mut ctx.venue, unstaked_at + DELAY)
            .unwrap();
        assert_eq!(received, 15_750 * P);
        assert_eq!(
            ctx.manager.exchange_rate(),
            Some(&ExchangeRate { principal_returned: 15_750 * P, supply_at_withdraw: 15_042 * P })
        );
        assert_eq!(ctx.manager.stage(), Stage::Ended);

        let again = ctx.manager.withdraw(&mut ctx.ledgers, &mut ctx.venue, unstaked_at + DELAY);
        assert!(matches!(again, Err(TBondError::WrongStage { stage: Stage::Ended, .. })));
    }

    // ============ Claim / Refund ============

    #[test]
    fn test_claim_before_stake_is_identity() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        deposit_ton(&mut ctx, user1(), 700 * P);
        let before = ctx.ledgers.principal.balance_of(&user1());

        let paid = ctx.manager.claim(&user1(), &mut ctx.ledgers, 2, 700 * P).unwrap();

        assert_eq!(paid, 700 * P);
        assert_eq!(ctx.ledgers.principal.balance_of(&user1()), before + 700 * P);
        assert_eq!(ctx.manager.balance_of(&user1()), 0);
        assert_eq!(ctx.manager.total_principal_held(), 1_000 * P);
    }

    #[test]
    fn test_refund_returns_seed() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        let paid = ctx.manager.refund(&owner(), &mut ctx.ledgers, 1, 1_000 * P).unwrap();
        assert_eq!(paid, 1_000 * P);
        assert_eq!(ctx.manager.total_supply(), 0);
        assert_eq!(ctx.ledgers.principal.balance_of(&owner()), 100_000 * P);
    }

    #[test]
    fn test_claim_insufficient_balance() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);
        let result = ctx.manager.claim(&user1(), &mut ctx.ledgers, 1, P);
        assert_eq!(result, Err(TBondError::InsufficientBalance { available: 0, requested: P }));
    }

    #[test]
    fn test_claim_while_committed() {
        let mut ctx = create_test_context();
        fund_scenario(&mut ctx);
        ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD).unwrap();

        let result = ctx.manager.claim(&user1(), &mut ctx.ledgers, FUNDRAISING_PERIOD, P);
        assert_eq!(
            result,
            Err(TBondError::WrongStage { operation: "claim", stage: Stage::Staking })
        );

        ctx.manager.unstake(&mut ctx.venue, FUNDRAISING_PERIOD + STAKING_PERIOD).unwrap();
        let result =
            ctx.manager.refund(&user1(), &mut ctx.ledgers, FUNDRAISING_PERIOD + STAKING_PERIOD, P);
        assert_eq!(
            result,
            Err(TBondError::WrongStage { operation: "refund", stage: Stage::Unstaking })
        );
    }

    #[test]
    fn test_claim_uninitialized() {
        let mut ctx = create_test_context();
        assert_eq!(
            ctx.manager.claim(&user1(), &mut ctx.ledgers, 0, P),
            Err(TBondError::Uninitialized)
        );
    }

    #[test]
    fn test_claims_after_withdraw_never_exceed_returned() {
        let mut ctx = create_test_context();
        fund_scenario(&mut ctx);
        run_to_ended(&mut ctx);
        let returned = ctx.manager.exchange_rate().unwrap().principal_returned;

        let mut paid = 0;
        for holder in [owner(), user1(), user2(), incentive()] {
            let balance = ctx.manager.balance_of(&holder);
            paid += ctx.manager.claim(&holder, &mut ctx.ledgers, 200_000, balance).unwrap();
        }

        assert!(paid <= returned);
        assert_eq!(ctx.manager.total_supply(), 0);
        assert_eq!(ctx.ledgers.principal.balance_of(&round_id()), returned - paid);
        assert_eq!(ctx.manager.events().filter_by_type(EventType::Claimed).len(), 4);
    }

    #[test]
    fn test_claim_after_withdraw_pays_rate() {
        let mut ctx = create_test_context();
        fund_scenario(&mut ctx);
        run_to_ended(&mut ctx);

        let paid = ctx.manager.claim(&user1(), &mut ctx.ledgers, 200_000, 10_000 * P).unwrap();
        // 10000 * 15750 / 15042
        assert_eq!(paid, 10_000 * P * 15_750 / 15_042);
        assert!(paid > 10_000 * P);
    }

    // ============ Owner Operations ============

    #[test]
    fn test_set_incentive_to() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);

        let result = ctx.manager.set_incentive_to(&user1(), user1(), 1);
        assert!(matches!(result, Err(TBondError::NotOwner { .. })));

        ctx.manager.set_incentive_to(&owner(), user2(), 1).unwrap();
        assert_eq!(ctx.manager.incentive_to(), &user2());

        ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD).unwrap();
        let result = ctx.manager.set_incentive_to(&owner(), user1(), FUNDRAISING_PERIOD);
        assert!(matches!(result, Err(TBondError::WrongStage { .. })));
    }

    #[test]
    fn test_set_incentive_to_before_setup() {
        let mut ctx = create_test_context();

        let result = ctx.manager.set_incentive_to(&owner(), user2(), 0);
        assert_eq!(result, Err(TBondError::Uninitialized));
        assert!(ctx.manager.events().is_empty());

        // setup's recipient is the one that takes effect
        setup_round(&mut ctx);
        assert_eq!(ctx.manager.incentive_to(), &params().incentive_to);
    }

    #[test]
    fn test_stages_cannot_skip() {
        let mut ctx = create_test_context();
        assert_eq!(
            ctx.manager.advance_stage("withdraw", Stage::Ended),
            Err(TBondError::WrongStage { operation: "withdraw", stage: Stage::None })
        );

        setup_round(&mut ctx);
        assert_eq!(
            ctx.manager.advance_stage("setup", Stage::Fundraising),
            Err(TBondError::WrongStage { operation: "setup", stage: Stage::Fundraising })
        );
        assert_eq!(ctx.manager.stage(), Stage::Fundraising);
    }

    #[test]
    fn test_ownership_transfer_and_renounce() {
        let mut ctx = create_test_context();

        ctx.manager.transfer_ownership(&owner(), user1(), 0).unwrap();
        assert_eq!(ctx.manager.owner(), Some(&user1()));
        assert!(matches!(
            ctx.manager.transfer_ownership(&owner(), owner(), 0),
            Err(TBondError::NotOwner { .. })
        ));

        ctx.manager.renounce_ownership(&user1(), 0).unwrap();
        assert_eq!(ctx.manager.owner(), None);

        ctx.ledgers.principal.approve(&user1(), &round_id(), 1_000 * P);
        let result = ctx.manager.setup(&user1(), &mut ctx.ledgers, 0, params());
        assert!(matches!(result, Err(TBondError::NotOwner { .. })));
        assert_eq!(
            ctx.manager.events().filter_by_type(EventType::OwnershipTransferred).len(),
            2
        );
    }

    // ============ Info ============

    #[test]
    fn test_info_flags() {
        let mut ctx = create_test_context();
        setup_round(&mut ctx);

        let info = ctx.manager.info(FUNDRAISING_PERIOD - 1);
        assert!(!info.can_stake);
        assert_eq!(info.stage, Stage::Fundraising);
        assert_eq!(info.target_amount, 50_000 * P);
        assert_eq!(info.staking_period, STAKING_PERIOD);

        assert!(ctx.manager.info(FUNDRAISING_PERIOD).can_stake);

        ctx.manager.stake(&mut ctx.ledgers, &mut ctx.venue, FUNDRAISING_PERIOD).unwrap();
        let deadline = FUNDRAISING_PERIOD + STAKING_PERIOD;
        assert!(!ctx.manager.info(deadline - 1).can_unstake);
        assert!(ctx.manager.info(deadline).can_unstake);

        ctx.manager.unstake(&mut ctx.venue, deadline).unwrap();
        assert!(!ctx.manager.info(deadline + DELAY - 1).can_withdraw);
        assert!(ctx.manager.info(deadline + DELAY).can_withdraw);
        assert_eq!(ctx.manager.info(deadline).total_supply, 1_000 * P);
    }
}
