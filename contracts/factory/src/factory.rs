//! Round Factory
//!
//! Deterministic creation and lookup of bond rounds. A round's key is
//! `sha256(creator || name || symbol)` with borsh-style length prefixes on
//! the strings, and the key is also the round's address and bond minter.

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use tbond_common::{
    check,
    errors::{TBondError, TBondResult},
    events::{EventLog, TBondEvent},
    ledger::TokenLedger,
    types::{Address, ManagerConfig, RoundId, Stage, Tick},
    validation::{require_non_zero_address, require_owner},
};
use tbond_exchange::BondTokens;
use tbond_manager::BondManager;

/// One row of the factory's creation index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoundListing {
    /// 1-based creation index
    pub index: usize,
    pub key: RoundId,
    pub owner: Option<Address>,
    pub venue: Address,
    pub name: String,
    pub symbol: String,
    pub stage: Stage,
}

/// Registry of bond rounds
#[derive(Debug, Clone)]
pub struct Factory {
    owner: Address,
    creators: BTreeSet<Address>,
    rounds: BTreeMap<RoundId, BondManager>,
    index: Vec<RoundId>,
    config: ManagerConfig,
    events: EventLog,
}

impl Factory {
    /// Factory with the default round configuration
    pub fn new(owner: Address) -> Self {
        Self::with_config(owner, ManagerConfig::default())
    }

    pub fn with_config(owner: Address, config: ManagerConfig) -> Self {
        Self {
            owner,
            creators: BTreeSet::new(),
            rounds: BTreeMap::new(),
            index: Vec::new(),
            config,
            events: EventLog::new(),
        }
    }

    /// Registry key for `(creator, name, symbol)`
    pub fn key_of(creator: &Address, name: &str, symbol: &str) -> RoundId {
        let mut hasher = Sha256::new();
        hasher.update(creator);
        hasher.update((name.len() as u32).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update((symbol.len() as u32).to_le_bytes());
        hasher.update(symbol.as_bytes());
        let result = hasher.finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&result);
        key
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The factory owner is always a creator
    pub fn is_creator(&self, who: &Address) -> bool {
        *who == self.owner || self.creators.contains(who)
    }

    // ============ Creation Rights ============

    pub fn grant_creator(
        &mut self,
        caller: &Address,
        creator: Address,
        now: Tick,
    ) -> TBondResult<()> {
        require_owner(caller, Some(&self.owner))?;
        require_non_zero_address(&creator, "creator cannot be zero")?;

        if self.creators.insert(creator) {
            self.events.emit(TBondEvent::CreatorGranted { creator, tick: now });
        }
        Ok(())
    }

    /// Revoke creation rights; rounds already created are unaffected
    pub fn revoke_creator(
        &mut self,
        caller: &Address,
        creator: &Address,
        now: Tick,
    ) -> TBondResult<()> {
        require_owner(caller, Some(&self.owner))?;

        if self.creators.remove(creator) {
            self.events.emit(TBondEvent::CreatorRevoked { creator: *creator, tick: now });
        }
        Ok(())
    }

    // ============ Rounds ============

    /// Create a round owned by the caller and bound to `venue`.
    ///
    /// The new bond token starts with zero supply.
    pub fn create(
        &mut self,
        caller: &Address,
        venue: Address,
        name: &str,
        symbol: &str,
        now: Tick,
    ) -> TBondResult<RoundId> {
        let key = Self::key_of(caller, name, symbol);
        check!(!self.rounds.contains_key(&key), TBondError::AlreadyExists { key });
        check!(self.is_creator(caller), TBondError::NotOwner { caller: *caller });
        check!(
            !name.is_empty() && !symbol.is_empty(),
            TBondError::InvalidInput { param: "name", reason: "name and symbol are required" }
        );
        require_non_zero_address(&venue, "venue cannot be zero")?;

        let manager = BondManager::new(key, *caller, venue, name, symbol, self.config);
        self.rounds.insert(key, manager);
        self.index.push(key);

        self.events.emit(TBondEvent::RoundCreated {
            round: key,
            creator: *caller,
            venue,
            name: name.to_string(),
            symbol: symbol.to_string(),
            tick: now,
        });
        log::info!(
            "round #{} {} ({}) created by {}",
            self.index.len(),
            hex::encode(key),
            symbol,
            hex::encode(caller)
        );
        Ok(key)
    }

    pub fn lookup(&self, key: &RoundId) -> TBondResult<&BondManager> {
        self.rounds.get(key).ok_or(TBondError::NotFound { key: *key })
    }

    pub fn lookup_mut(&mut self, key: &RoundId) -> TBondResult<&mut BondManager> {
        self.rounds.get_mut(key).ok_or(TBondError::NotFound { key: *key })
    }

    /// Number of rounds created so far
    pub fn round_count(&self) -> usize {
        self.index.len()
    }

    /// Key of the `n`-th round created, counting from 1
    pub fn by_index(&self, n: usize) -> TBondResult<RoundId> {
        n.checked_sub(1)
            .and_then(|i| self.index.get(i))
            .copied()
            .ok_or(TBondError::InvalidInput { param: "index", reason: "no round at index" })
    }

    /// All rounds in creation order
    pub fn listings(&self) -> Vec<RoundListing> {
        self.index
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                self.rounds.get(key).map(|round| RoundListing {
                    index: i + 1,
                    key: *key,
                    owner: round.owner().copied(),
                    venue: *round.venue(),
                    name: round.bond_token().name().to_string(),
                    symbol: round.bond_token().symbol().to_string(),
                    stage: round.stage(),
                })
            })
            .collect()
    }
}

impl BondTokens for Factory {
    fn bond_token_mut(&mut self, round: &RoundId) -> TBondResult<&mut TokenLedger> {
        self.lookup_mut(round).map(BondManager::bond_token_mut)
    }
}
