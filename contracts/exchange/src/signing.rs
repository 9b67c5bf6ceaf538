//! Typed-Data Signing
//!
//! Orders are signed over a canonical encoding: every field is a 32-byte
//! big-endian word, strings are hashed, and the struct hash is combined with
//! a domain separator bound to the exchange's name, version, chain and
//! address:
//!
//! `digest = H(0x19 0x01 || domainSeparator || H(typeHash || fields...))`
//!
//! A maker's address is their Ed25519 verifying key, so recovering the
//! signer amounts to verifying the signature against `order.owner`.

use borsh::{BorshDeserialize, BorshSerialize};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use tbond_common::{
    constants::{exchange, system},
    errors::{TBondError, TBondResult},
    types::{system_address, Address},
};

use crate::order::Order;

/// Canonical type string of the domain struct
pub const DOMAIN_TYPE: &str =
    "Domain(string name,string version,uint256 chainId,bytes32 verifyingContract)";

/// Canonical type string of the order struct
pub const ORDER_TYPE: &str =
    "Order(bytes32 owner,bytes32 round,uint256 bondAmount,uint256 counterAmount,uint256 nonce,uint256 deadline)";

// ============ Encoding ============

/// SHA-256 of the concatenation of `parts`
pub fn hash_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// 32-byte big-endian word for an unsigned integer
pub fn encode_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

// ============ Domain ============

/// Domain tag binding signatures to one exchange deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ExchangeDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    /// Address of the exchange; also the spender makers and takers approve
    pub verifying_contract: Address,
}

impl Default for ExchangeDomain {
    fn default() -> Self {
        Self::new(exchange::DEFAULT_CHAIN_ID, system_address(system::EXCHANGE))
    }
}

impl ExchangeDomain {
    /// Domain with the protocol's name and version
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: exchange::DOMAIN_NAME.to_string(),
            version: exchange::DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn separator(&self) -> [u8; 32] {
        hash_parts(&[
            &hash_parts(&[DOMAIN_TYPE.as_bytes()]),
            &hash_parts(&[self.name.as_bytes()]),
            &hash_parts(&[self.version.as_bytes()]),
            &encode_word(self.chain_id as u128),
            &self.verifying_contract,
        ])
    }

    /// Digest a maker signs for `order` under this domain
    pub fn digest(&self, order: &Order) -> [u8; 32] {
        typed_digest(&self.separator(), order)
    }
}

/// Digest for `order` under a precomputed domain separator
pub fn typed_digest(separator: &[u8; 32], order: &Order) -> [u8; 32] {
    hash_parts(&[&exchange::TYPED_DATA_PREFIX, separator, &order.struct_hash()])
}

/// Verify `signature` over `order` against `order.owner`.
///
/// Any malformed key or signature is reported as `InvalidSignature`.
pub fn verify_order_signature(
    separator: &[u8; 32],
    order: &Order,
    signature: &[u8],
) -> TBondResult<()> {
    let verifying_key =
        VerifyingKey::from_bytes(&order.owner).map_err(|_| TBondError::InvalidSignature)?;
    let signature_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| TBondError::InvalidSignature)?;
    let signature = Signature::from_bytes(&signature_bytes);

    verifying_key
        .verify(&typed_digest(separator, order), &signature)
        .map_err(|_| TBondError::InvalidSignature)
}

// ============ Signer ============

/// A maker's signing key
#[derive(Clone)]
pub struct OrderSigner {
    signing_key: SigningKey,
}

impl OrderSigner {
    /// Generate a new random key
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Maker address (the verifying key bytes)
    pub fn address(&self) -> Address {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn address_hex(&self) -> String {
        hex::encode(self.address())
    }

    /// Sign `order` under `domain`
    pub fn sign(&self, domain: &ExchangeDomain, order: &Order) -> Vec<u8> {
        self.signing_key.sign(&domain.digest(order)).to_bytes().to_vec()
    }
}

impl std::fmt::Debug for OrderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSigner")
            .field("address", &self.address_hex())
            .finish()
    }
}
