//! Orders and taker commitments

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use tbond_common::types::{Address, Amount, RoundId, Tick};

use crate::signing::{encode_word, hash_parts, ORDER_TYPE};

/// A maker's offer to sell `bond_amount` of one round's bond token for
/// `counter_amount` of wrapped principal. Never stored by the exchange;
/// only its nonce is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Order {
    /// Maker address (Ed25519 verifying key)
    pub owner: Address,
    /// Round whose bond token is sold
    pub round: RoundId,
    /// Bond tokens the maker delivers
    pub bond_amount: Amount,
    /// Wrapped principal the taker pays
    pub counter_amount: Amount,
    /// Maker nonce the order was signed under
    pub nonce: u64,
    /// Last tick at which the order can fill
    pub deadline: Tick,
}

impl Order {
    /// Typed-data struct hash
    pub fn struct_hash(&self) -> [u8; 32] {
        hash_parts(&[
            &hash_parts(&[ORDER_TYPE.as_bytes()]),
            &self.owner,
            &self.round,
            &encode_word(self.bond_amount),
            &encode_word(self.counter_amount),
            &encode_word(self.nonce as u128),
            &encode_word(self.deadline as u128),
        ])
    }

    /// Commitment `taker` must present to fill this order
    pub fn commitment(&self, taker: &Address) -> [u8; 32] {
        taker_commitment(
            taker,
            &self.round,
            self.bond_amount,
            self.counter_amount,
            self.deadline,
            self.nonce,
        )
    }
}

/// `H(taker, round, bondAmount, counterAmount, deadline, nonce)`, word-encoded
pub fn taker_commitment(
    taker: &Address,
    round: &RoundId,
    bond_amount: Amount,
    counter_amount: Amount,
    deadline: Tick,
    nonce: u64,
) -> [u8; 32] {
    hash_parts(&[
        taker,
        round,
        &encode_word(bond_amount),
        &encode_word(counter_amount),
        &encode_word(deadline as u128),
        &encode_word(nonce as u128),
    ])
}

/// An order plus the maker's detached signature, as distributed off-chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SignedOrder {
    pub order: Order,
    pub signature: Vec<u8>,
}
