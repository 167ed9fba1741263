use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

/// Size in bytes of a [`Block`], which is also the Blake 3 output size.
pub const BLOCK_SIZE: usize = 32;

/// A fixed 32-byte value. Secrets, commitments, message digests and
/// signature entries are all blocks; which role a block plays is decided
/// by where it sits, not by its type.
///
/// Equality is constant-time.
#[derive(Clone, Copy, Default, Zeroize)]
pub struct Block([u8; BLOCK_SIZE]);

impl Block {
    /// Copies `bytes` into a new block.
    ///
    /// Callers are expected to pass exactly [`BLOCK_SIZE`] bytes. Shorter
    /// input is zero-filled at the end and longer input is truncated,
    /// silently.
    pub fn from_bytes(bytes: &[u8]) -> Block {
        let mut block = Block::default();
        let len = bytes.len().min(BLOCK_SIZE);
        block.0[..len].copy_from_slice(&bytes[..len]);
        block
    }

    /// Draws a fresh block from `rng`.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Block, rand::Error> {
        let mut block = Block::default();
        block.fill_from(rng)?;
        Ok(block)
    }

    pub(crate) fn fill_from<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), rand::Error> {
        rng.try_fill_bytes(&mut self.0)
    }

    /// Hashes arbitrary bytes down to a block.
    pub fn digest(data: &[u8]) -> Block {
        Block(*blake3::hash(data).as_bytes())
    }

    /// The hash of this block.
    pub fn hash(&self) -> Block {
        Block::digest(&self.0)
    }

    /// Whether this block hashes to `target`.
    ///
    /// Directional: if `y = x.hash()` then `x.is_preimage(&y)` holds but
    /// `y.is_preimage(&x)` does not.
    pub fn is_preimage(&self, target: &Block) -> bool {
        self.hash().ct_eq(target).into()
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }
}

impl From<[u8; BLOCK_SIZE]> for Block {
    fn from(bytes: [u8; BLOCK_SIZE]) -> Self {
        Block(bytes)
    }
}

impl From<Block> for [u8; BLOCK_SIZE] {
    fn from(block: Block) -> Self {
        block.0
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ConstantTimeEq for Block {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl ConditionallySelectable for Block {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut out = [0u8; BLOCK_SIZE];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::conditional_select(&a.0[i], &b.0[i], choice);
        }
        Block(out)
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Block {}
