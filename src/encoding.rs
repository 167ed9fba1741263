//! Fixed-length lowercase hex text for blocks, public keys and signatures.
//!
//! The text layout mirrors the binary one: a public key is its 256 zero
//! commitments followed by its 256 one commitments, and a signature is its
//! 256 preimages, each block as 64 hex characters with no separators.
//! Decoders accept upper or lower case but nothing else, and only at the
//! exact length.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::block::{Block, BLOCK_SIZE};
use crate::error::FormatError;
use crate::lamport::{PublicKey, Signature, PUBLIC_KEY_BYTES, SIGNATURE_BYTES};

pub const BLOCK_HEX_LEN: usize = 2 * BLOCK_SIZE;
pub const PUBLIC_KEY_HEX_LEN: usize = 2 * PUBLIC_KEY_BYTES;
pub const SIGNATURE_HEX_LEN: usize = 2 * SIGNATURE_BYTES;

fn decode_exact<const N: usize>(s: &str) -> Result<[u8; N], FormatError> {
    let expected = 2 * N;
    if s.len() != expected {
        debug!(expected, actual = s.len(), "rejecting hex input of wrong length");
        return Err(FormatError::Length {
            expected,
            actual: s.len(),
        });
    }
    let mut bytes = [0u8; N];
    hex::decode_to_slice(s, &mut bytes).map_err(|err| {
        debug!(%err, "rejecting malformed hex input");
        FormatError::from(err)
    })?;
    Ok(bytes)
}

impl Block {
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Block, FormatError> {
        decode_exact::<BLOCK_SIZE>(s).map(Block::from)
    }
}

impl PublicKey {
    /// Zero commitments then one commitments, [`PUBLIC_KEY_HEX_LEN`]
    /// characters in all.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<PublicKey, FormatError> {
        decode_exact::<PUBLIC_KEY_BYTES>(s).map(|bytes| PublicKey::from(&bytes))
    }
}

impl Signature {
    /// Every preimage in order, [`SIGNATURE_HEX_LEN`] characters in all.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Signature, FormatError> {
        decode_exact::<SIGNATURE_BYTES>(s).map(|bytes| Signature::from(&bytes))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Block {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Block::from_hex(s)
    }
}

impl FromStr for PublicKey {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::from_hex(s)
    }
}

impl FromStr for Signature {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::from_hex(s)
    }
}
