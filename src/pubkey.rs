//! Solana account identifiers and program-address derivation.

use crate::error::{TldError, TldResult};
use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

pub const PUBKEY_BYTES: usize = 32;
pub const MAX_SEED_LEN: usize = 32;
pub const MAX_SEEDS: usize = 16;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// 32-byte Solana account address
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, failing unless it is exactly 32 bytes
    pub fn try_from_slice(bytes: &[u8]) -> TldResult<Self> {
        let arr: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
            TldError::InvalidAccountIdentifier(format!(
                "expected {} bytes, got {}",
                PUBKEY_BYTES,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }

    fn hash_seeds(seeds: &[&[u8]], program_id: &Pubkey) -> TldResult<Pubkey> {
        if seeds.len() > MAX_SEEDS {
            return Err(TldError::DerivationError(format!(
                "too many seeds: {}",
                seeds.len()
            )));
        }

        let mut hasher = Sha256::new();
        for seed in seeds {
            if seed.len() > MAX_SEED_LEN {
                return Err(TldError::DerivationError(format!(
                    "seed of {} bytes exceeds {}",
                    seed.len(),
                    MAX_SEED_LEN
                )));
            }
            hasher.update(seed);
        }
        hasher.update(program_id.as_bytes());
        hasher.update(PDA_MARKER);

        Ok(Pubkey(hasher.finalize().into()))
    }

    /// Hash seeds with the program id; rejects points on the ed25519 curve
    pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> TldResult<Pubkey> {
        let key = Self::hash_seeds(seeds, program_id)?;
        if key.is_on_curve() {
            return Err(TldError::DerivationError(
                "derived address lies on the ed25519 curve".to_string(),
            ));
        }
        Ok(key)
    }

    /// Search bump seeds from 255 downwards for the first off-curve address
    pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> TldResult<(Pubkey, u8)> {
        let mut bump = u8::MAX;

        while bump > 0 {
            let bump_seed = [bump];
            let mut with_bump: Vec<&[u8]> = seeds.to_vec();
            with_bump.push(&bump_seed);
            let key = Self::hash_seeds(&with_bump, program_id)?;

            if !key.is_on_curve() {
                return Ok((key, bump));
            }
            bump -= 1;
        }

        Err(TldError::DerivationError(format!(
            "no viable bump seed for program {}",
            program_id
        )))
    }
}

impl FromStr for Pubkey {
    type Err = TldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TldError::InvalidAccountIdentifier(format!("{}: {}", s, e)))?;
        Self::try_from_slice(&bytes)
            .map_err(|_| TldError::InvalidAccountIdentifier(s.to_string()))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Anything a public operation accepts as an account: a parsed key or its base58 text
pub trait ToPubkey {
    fn to_pubkey(&self) -> TldResult<Pubkey>;
}

impl ToPubkey for Pubkey {
    fn to_pubkey(&self) -> TldResult<Pubkey> {
        Ok(*self)
    }
}

impl ToPubkey for &Pubkey {
    fn to_pubkey(&self) -> TldResult<Pubkey> {
        Ok(**self)
    }
}

impl ToPubkey for str {
    fn to_pubkey(&self) -> TldResult<Pubkey> {
        self.trim().parse()
    }
}

impl ToPubkey for &str {
    fn to_pubkey(&self) -> TldResult<Pubkey> {
        (*self).to_pubkey()
    }
}

impl ToPubkey for String {
    fn to_pubkey(&self) -> TldResult<Pubkey> {
        self.as_str().to_pubkey()
    }
}

impl ToPubkey for &String {
    fn to_pubkey(&self) -> TldResult<Pubkey> {
        self.as_str().to_pubkey()
    }
}

#[cfg(test)]
pub(crate) fn unique_pubkey() -> Pubkey {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);

    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut bytes = [0u8; PUBKEY_BYTES];
    bytes[..8].copy_from_slice(&n.to_be_bytes());
    bytes[31] = 0xaa;
    Pubkey(bytes)
}
