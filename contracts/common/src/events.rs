//! Protocol Events for TBOND
//!
//! Events are recorded after an operation succeeds and can be indexed
//! off-chain for building UIs, analytics, and notifications. A failed
//! operation never leaves an event behind.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, RoundId, Tick};

/// Event types for indexing and filtering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Registry Events (0x01 - 0x1F)
    RoundCreated = 0x01,
    CreatorGranted = 0x02,
    CreatorRevoked = 0x03,

    // Round Lifecycle Events (0x20 - 0x3F)
    RoundSetup = 0x20,
    Deposited = 0x21,
    Staked = 0x22,
    IncentiveMinted = 0x23,
    Unstaked = 0x24,
    Withdrawn = 0x25,
    Claimed = 0x26,

    // Round Admin Events (0x40 - 0x5F)
    IncentiveRecipientChanged = 0x40,
    OwnershipTransferred = 0x41,

    // Exchange Events (0x60 - 0x7F)
    NonceUpdated = 0x60,
    OrderCancelled = 0x61,
    OrderExecuted = 0x62,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TBondEvent {
    // ============ Registry Events ============

    /// Emitted when the factory instantiates a round
    RoundCreated {
        round: RoundId,
        creator: Address,
        venue: Address,
        name: String,
        symbol: String,
        tick: Tick,
    },

    /// Emitted when the factory owner grants creation rights
    CreatorGranted {
        creator: Address,
        tick: Tick,
    },

    /// Emitted when the factory owner revokes creation rights
    CreatorRevoked {
        creator: Address,
        tick: Tick,
    },

    // ============ Round Lifecycle Events ============

    /// Emitted when the owner seeds the round and opens fundraising
    RoundSetup {
        round: RoundId,
        owner: Address,
        seed: Amount,
        fundraising_deadline: Tick,
        staking_period: Tick,
        target_amount: Amount,
        tick: Tick,
    },

    /// Emitted on every deposit, in either or both asset forms
    Deposited {
        round: RoundId,
        depositor: Address,
        principal: Amount,
        wrapped: Amount,
        minted: Amount,
        tick: Tick,
    },

    /// Emitted when held principal is forwarded to the staking venue
    Staked {
        round: RoundId,
        venue: Address,
        amount: Amount,
        staking_deadline: Tick,
        tick: Tick,
    },

    /// Emitted with the single incentive mint at staking
    IncentiveMinted {
        round: RoundId,
        recipient: Address,
        amount: Amount,
        total_supply: Amount,
        tick: Tick,
    },

    /// Emitted when the venue starts its withdrawal delay
    Unstaked {
        round: RoundId,
        pending: Amount,
        withdraw_ready_tick: Tick,
        tick: Tick,
    },

    /// Emitted when principal returns and the exchange rate is fixed
    Withdrawn {
        round: RoundId,
        principal_returned: Amount,
        total_supply: Amount,
        tick: Tick,
    },

    /// Emitted when bond tokens are burned for principal
    Claimed {
        round: RoundId,
        holder: Address,
        bond_amount: Amount,
        payout: Amount,
        tick: Tick,
    },

    // ============ Round Admin Events ============

    /// Emitted when the incentive recipient changes
    IncentiveRecipientChanged {
        round: RoundId,
        recipient: Address,
        tick: Tick,
    },

    /// Emitted on ownership transfer; `new_owner` is `None` after renouncing
    OwnershipTransferred {
        round: RoundId,
        previous_owner: Address,
        new_owner: Option<Address>,
        tick: Tick,
    },

    // ============ Exchange Events ============

    /// Emitted when a maker advances their nonce
    NonceUpdated {
        owner: Address,
        nonce: u64,
        tick: Tick,
    },

    /// Emitted when a maker cancels their current order
    OrderCancelled {
        owner: Address,
        nonce: u64,
        tick: Tick,
    },

    /// Emitted when an order settles
    OrderExecuted {
        maker: Address,
        taker: Address,
        round: RoundId,
        bond_amount: Amount,
        counter_amount: Amount,
        nonce: u64,
        tick: Tick,
    },
}

impl TBondEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::RoundCreated { .. } => EventType::RoundCreated,
            Self::CreatorGranted { .. } => EventType::CreatorGranted,
            Self::CreatorRevoked { .. } => EventType::CreatorRevoked,
            Self::RoundSetup { .. } => EventType::RoundSetup,
            Self::Deposited { .. } => EventType::Deposited,
            Self::Staked { .. } => EventType::Staked,
            Self::IncentiveMinted { .. } => EventType::IncentiveMinted,
            Self::Unstaked { .. } => EventType::Unstaked,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::Claimed { .. } => EventType::Claimed,
            Self::IncentiveRecipientChanged { .. } => EventType::IncentiveRecipientChanged,
            Self::OwnershipTransferred { .. } => EventType::OwnershipTransferred,
            Self::NonceUpdated { .. } => EventType::NonceUpdated,
            Self::OrderCancelled { .. } => EventType::OrderCancelled,
            Self::OrderExecuted { .. } => EventType::OrderExecuted,
        }
    }

    /// Get the tick when the event occurred
    pub fn tick(&self) -> Tick {
        match self {
            Self::RoundCreated { tick, .. }
            | Self::CreatorGranted { tick, .. }
            | Self::CreatorRevoked { tick, .. }
            | Self::RoundSetup { tick, .. }
            | Self::Deposited { tick, .. }
            | Self::Staked { tick, .. }
            | Self::IncentiveMinted { tick, .. }
            | Self::Unstaked { tick, .. }
            | Self::Withdrawn { tick, .. }
            | Self::Claimed { tick, .. }
            | Self::IncentiveRecipientChanged { tick, .. }
            | Self::OwnershipTransferred { tick, .. }
            | Self::NonceUpdated { tick, .. }
            | Self::OrderCancelled { tick, .. }
            | Self::OrderExecuted { tick, .. } => *tick,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events emitted by one component
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TBondEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: TBondEvent) {
        log::trace!("event {:?} at tick {}", event.event_type(), event.tick());
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[TBondEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<TBondEvent> {
        self.events
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&TBondEvent> {
        self.events.last()
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&TBondEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events were emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = TBondEvent::Staked {
            round: [1u8; 32],
            venue: [2u8; 32],
            amount: 15_000,
            staking_deadline: 200,
            tick: 100,
        };

        assert_eq!(event.event_type(), EventType::Staked);
        assert_eq!(event.tick(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = TBondEvent::OwnershipTransferred {
            round: [1u8; 32],
            previous_owner: [2u8; 32],
            new_owner: None,
            tick: 7,
        };

        let bytes = event.to_bytes();
        let restored = TBondEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(TBondEvent::NonceUpdated {
            owner: [2u8; 32],
            nonce: 1,
            tick: 10,
        });
        log.emit(TBondEvent::OrderCancelled {
            owner: [2u8; 32],
            nonce: 1,
            tick: 11,
        });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::OrderCancelled).len(), 1);
        assert_eq!(log.last().map(|e| e.tick()), Some(11));

        log.clear();
        assert!(log.is_empty());
    }
}
