/// Address derivation for program-owned accounts
///
/// Every escrow vault, market reserve and associated token account lives at an
/// address computed from public seeds plus the program id. Two callers that
/// know the same seeds always land on the same address without asking the
/// ledger first.
///
/// Derived addresses are SHA-256 digests that are NOT valid Ed25519 points, so
/// no private key can ever sign for them. User addresses are Ed25519 public
/// keys, which keeps the two spaces disjoint.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_core::OsRng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};

/// Maximum number of seeds, bump included
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes
pub const MAX_SEED_LEN: usize = 32;

const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Fixed seed tags
pub mod tags {
    pub const ESCROW_STATE: &[u8] = b"escrow-state";
    pub const ESCROW_VAULT: &[u8] = b"escrow-vault";
    pub const MARKET_STATE: &[u8] = b"market-state";
    pub const TOKEN_RESERVE: &[u8] = b"token-reserve";
    pub const BASE_RESERVE: &[u8] = b"base-reserve";
    pub const ASSOCIATED_ACCOUNT: &[u8] = b"associated-account";
    pub const BASE_MINT: &[u8] = b"base-mint";
}

// ============================================================================
// ADDRESS
// ============================================================================

/// Opaque 32-byte ledger key, shown as lowercase hex
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fresh wallet-style address backed by a throwaway Ed25519 key
    pub fn new_unique() -> Self {
        SigningKey::generate(&mut OsRng).verifying_key().into()
    }

    /// True when the bytes decompress to an Ed25519 point
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }

    /// First 8 hex chars, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| LedgerError::InvalidArgument(format!("address is not hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            LedgerError::InvalidArgument(format!("address must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// DERIVATION
// ============================================================================

fn validate_seeds(seeds: &[&[u8]]) -> LedgerResult<()> {
    if seeds.len() >= MAX_SEEDS {
        return Err(LedgerError::InvalidArgument(format!(
            "too many seeds: {} (max {} including bump)",
            seeds.len(),
            MAX_SEEDS
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(LedgerError::InvalidArgument(format!(
            "seed of {} bytes exceeds {} bytes",
            seed.len(),
            MAX_SEED_LEN
        )));
    }
    Ok(())
}

fn hash_candidate(seeds: &[&[u8]], bump: u8, program_id: &Address) -> Address {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_bytes());
    hasher.update(DERIVATION_MARKER);
    Address(hasher.finalize().into())
}

/// Find the canonical derived address for `seeds` under `program_id`.
///
/// Bumps are tried from 255 downward; the first off-curve digest wins and is
/// returned with its bump.
pub fn derive_address(seeds: &[&[u8]], program_id: &Address) -> LedgerResult<(Address, u8)> {
    validate_seeds(seeds)?;
    for bump in (0..=u8::MAX).rev() {
        let candidate = hash_candidate(seeds, bump, program_id);
        if !candidate.is_on_curve() {
            debug!(address = %candidate.short(), bump, "derived address");
            return Ok((candidate, bump));
        }
    }
    Err(LedgerError::AddressDerivation)
}

/// Recompute a derived address from a stored bump
pub fn create_derived_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &Address,
) -> LedgerResult<Address> {
    validate_seeds(seeds)?;
    let candidate = hash_candidate(seeds, bump, program_id);
    if candidate.is_on_curve() {
        return Err(LedgerError::InvalidArgument(format!(
            "bump {} yields an on-curve address",
            bump
        )));
    }
    Ok(candidate)
}

/// Address of `owner`'s token account for `mint`
pub fn associated_account_address(
    owner: &Address,
    mint: &Address,
    program_id: &Address,
) -> LedgerResult<Address> {
    derive_address(
        &[tags::ASSOCIATED_ACCOUNT, owner.as_ref(), mint.as_ref()],
        program_id,
    )
    .map(|(address, _)| address)
}
