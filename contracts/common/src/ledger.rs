//! Token Ledgers
//!
//! In-memory fungible token bookkeeping for the three asset kinds the
//! protocol touches: principal, wrapped principal and per-round bond tokens.
//!
//! ## Key Features
//!
//! - **Allowances**: Two-step approve then `transfer_from` by the spender
//! - **Mint Authorization**: Only the token's minter can mint or burn
//! - **Supply Tracking**: Total, cumulative minted/burned and holder count
//! - **Pre-checks**: `check_*` helpers validate a leg without mutating, so
//!   multi-leg operations can validate everything before the first effect
//! - **Wrapped Principal**: `Ledgers::wrap`/`unwrap` keep every wrapped unit
//!   backed by principal held in the wrap reserve

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{system, token};
use crate::errors::{TBondError, TBondResult};
use crate::math::{principal_to_wrapped, safe_add, safe_sub, wrapped_to_principal};
use crate::types::{system_address, Address, Amount};

// ============================================================================
// Types
// ============================================================================

/// Static token description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenMetadata {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Token supply state
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize,
    BorshDeserialize,
)]
pub struct TokenSupply {
    /// Outstanding supply
    pub total_supply: Amount,
    /// Total minted (cumulative)
    pub total_minted: Amount,
    /// Total burned (cumulative)
    pub total_burned: Amount,
    /// Number of accounts with a non-zero balance
    pub holder_count: u64,
}

impl TokenSupply {
    /// Calculate circulating supply from the cumulative counters
    pub fn circulating(&self) -> Amount {
        self.total_minted.saturating_sub(self.total_burned)
    }
}

/// Balances, allowances and supply of one fungible token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLedger {
    metadata: TokenMetadata,
    minter: Option<Address>,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
    supply: TokenSupply,
}

impl TokenLedger {
    /// Create an empty ledger. Without a minter the supply is fixed at zero.
    pub fn new(metadata: TokenMetadata, minter: Option<Address>) -> Self {
        Self {
            metadata,
            minter,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            supply: TokenSupply::default(),
        }
    }

    /// Principal ledger issued by the well-known issuer account
    pub fn principal() -> Self {
        Self::new(
            TokenMetadata::new(
                token::PRINCIPAL_NAME,
                token::PRINCIPAL_SYMBOL,
                token::PRINCIPAL_DECIMALS,
            ),
            Some(system_address(system::PRINCIPAL_ISSUER)),
        )
    }

    /// Wrapped principal ledger minted by the wrap reserve
    pub fn wrapped() -> Self {
        Self::new(
            TokenMetadata::new(token::WRAPPED_NAME, token::WRAPPED_SYMBOL, token::WRAPPED_DECIMALS),
            Some(system_address(system::WRAP_RESERVE)),
        )
    }

    /// Bond token for one round, minted only by the round itself
    pub fn bond(name: impl Into<String>, symbol: impl Into<String>, round: Address) -> Self {
        Self::new(
            TokenMetadata::new(name, symbol, token::BOND_DECIMALS),
            Some(round),
        )
    }

    // ============ Views ============

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn minter(&self) -> Option<&Address> {
        self.minter.as_ref()
    }

    pub fn supply(&self) -> &TokenSupply {
        &self.supply
    }

    pub fn total_supply(&self) -> Amount {
        self.supply.total_supply
    }

    pub fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    // ============ Allowances ============

    /// Set the amount `spender` may pull from `owner`
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), amount);
        }
    }

    /// Raise an existing allowance
    pub fn increase_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        added: Amount,
    ) -> TBondResult<Amount> {
        let updated = safe_add(self.allowance(owner, spender), added)?;
        self.approve(owner, spender, updated);
        Ok(updated)
    }

    // ============ Pre-checks ============

    /// Validate that `from` can send `amount`
    pub fn check_transfer(&self, from: &Address, amount: Amount) -> TBondResult<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TBondError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Validate that `spender` can pull `amount` from `from`
    pub fn check_transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        amount: Amount,
    ) -> TBondResult<()> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(TBondError::InsufficientAllowance {
                available: allowed,
                requested: amount,
            });
        }
        self.check_transfer(from, amount)
    }

    // ============ Transfers ============

    /// Move `amount` from `from` to `to`
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> TBondResult<()> {
        self.check_transfer(from, amount)?;
        if amount == 0 || from == to {
            return Ok(());
        }
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Spend `spender`'s allowance to move `amount` from `from` to `to`
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TBondResult<()> {
        self.check_transfer_from(spender, from, amount)?;
        let remaining = self.allowance(from, spender) - amount;
        self.transfer(from, to, amount)?;
        self.approve(from, spender, remaining);
        Ok(())
    }

    // ============ Supply ============

    /// Create `amount` for `to`; `caller` must be the minter
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> TBondResult<()> {
        if self.minter.as_ref() != Some(caller) {
            return Err(TBondError::MintUnauthorized { caller: *caller });
        }
        let new_total = safe_add(self.supply.total_supply, amount)?;
        if amount == 0 {
            return Ok(());
        }
        self.credit(to, amount)?;
        self.supply.total_supply = new_total;
        self.supply.total_minted = self.supply.total_minted.saturating_add(amount);
        Ok(())
    }

    /// Destroy `amount` held by `from`; `caller` must be the minter
    pub fn burn(&mut self, caller: &Address, from: &Address, amount: Amount) -> TBondResult<()> {
        if self.minter.as_ref() != Some(caller) {
            return Err(TBondError::BurnUnauthorized { caller: *caller });
        }
        self.check_transfer(from, amount)?;
        if amount == 0 {
            return Ok(());
        }
        self.debit(from, amount)?;
        self.supply.total_supply = safe_sub(self.supply.total_supply, amount)?;
        self.supply.total_burned = self.supply.total_burned.saturating_add(amount);
        Ok(())
    }

    fn credit(&mut self, to: &Address, amount: Amount) -> TBondResult<()> {
        let current = self.balance_of(to);
        let updated = safe_add(current, amount)?;
        if current == 0 {
            self.supply.holder_count += 1;
        }
        self.balances.insert(*to, updated);
        Ok(())
    }

    fn debit(&mut self, from: &Address, amount: Amount) -> TBondResult<()> {
        let updated = safe_sub(self.balance_of(from), amount)?;
        if updated == 0 {
            self.balances.remove(from);
            self.supply.holder_count = self.supply.holder_count.saturating_sub(1);
        } else {
            self.balances.insert(*from, updated);
        }
        Ok(())
    }
}

// ============================================================================
// Principal + Wrapped Principal
// ============================================================================

/// The principal and wrapped principal ledgers.
///
/// Wrapped principal is fully backed: every wrapped unit in circulation is
/// matched by principal held at the wrap reserve, at 10^9 wrapped units per
/// principal unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledgers {
    pub principal: TokenLedger,
    pub wrapped: TokenLedger,
    reserve: Address,
}

impl Default for Ledgers {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledgers {
    pub fn new() -> Self {
        Self {
            principal: TokenLedger::principal(),
            wrapped: TokenLedger::wrapped(),
            reserve: system_address(system::WRAP_RESERVE),
        }
    }

    /// Account holding the principal that backs wrapped principal
    pub fn reserve(&self) -> &Address {
        &self.reserve
    }

    /// Issue new principal to `to` (host faucet)
    pub fn issue_principal(&mut self, to: &Address, amount: Amount) -> TBondResult<()> {
        let issuer = system_address(system::PRINCIPAL_ISSUER);
        self.principal.mint(&issuer, to, amount)
    }

    /// Lock `principal` from `holder` and mint the wrapped equivalent
    pub fn wrap(&mut self, holder: &Address, principal: Amount) -> TBondResult<Amount> {
        let wrapped = principal_to_wrapped(principal)?;
        self.principal.check_transfer(holder, principal)?;
        safe_add(self.wrapped.total_supply(), wrapped)?;

        self.principal.transfer(holder, &self.reserve, principal)?;
        self.wrapped.mint(&self.reserve, holder, wrapped)?;
        Ok(wrapped)
    }

    /// Burn `wrapped` from `holder` and release the backing principal.
    ///
    /// Sub-unit dust (less than 10^9 wrapped units) is burned without payout.
    pub fn unwrap(&mut self, holder: &Address, wrapped: Amount) -> TBondResult<Amount> {
        let principal = wrapped_to_principal(wrapped);
        self.wrapped.check_transfer(holder, wrapped)?;
        self.principal.check_transfer(&self.reserve, principal)?;

        self.wrapped.burn(&self.reserve, holder, wrapped)?;
        self.principal.transfer(&self.reserve, holder, principal)?;
        Ok(principal)
    }
}
