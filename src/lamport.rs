use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::block::{Block, BLOCK_SIZE};
use crate::error::Result;

/// Number of bit positions signed, one per bit of a 32-byte digest.
pub const POSITIONS: usize = BLOCK_SIZE * 8;

/// Size of [`PublicKey::to_bytes`].
pub const PUBLIC_KEY_BYTES: usize = 2 * POSITIONS * BLOCK_SIZE;

/// Size of [`Signature::to_bytes`].
pub const SIGNATURE_BYTES: usize = POSITIONS * BLOCK_SIZE;

/// The thing that gets signed: a 32-byte digest of some application
/// content.
///
/// Signing and verification hash the message once more before reading its
/// bits, so a message is already a digest and gets digested again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message(Block);

impl Message {
    /// Digests arbitrary content into a message.
    pub fn from_bytes<A: AsRef<[u8]>>(content: A) -> Message {
        Message(Block::digest(content.as_ref()))
    }

    /// Digests the UTF-8 encoding of `s` into a message.
    pub fn from_string(s: &str) -> Message {
        Message::from_bytes(s)
    }

    pub fn as_block(&self) -> &Block {
        &self.0
    }

    fn signing_digest(&self) -> Block {
        self.0.hash()
    }
}

impl From<Block> for Message {
    fn from(block: Block) -> Self {
        Message(block)
    }
}

/// Bit `index` of `bytes`, reading byte 0 first and the most significant
/// bit of each byte first.
fn bit_of_byteslice(index: usize, bytes: &[u8]) -> Choice {
    let byte = bytes[index.div_euclid(8)];
    bit_of_byte(index.rem_euclid(8), byte)
}

fn bitmask_for(index: usize) -> u8 {
    0b1000_0000 >> index.rem_euclid(8)
}

fn bit_of_byte(index: usize, byte: u8) -> Choice {
    (byte & bitmask_for(index)).ct_eq(&bitmask_for(index))
}

/// A secret key is what you generate and keep in order to sign one message.
/// Its commitments form the [`PublicKey`] you hand out.
///
/// Both preimage sequences are wiped when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    zero_pre: [Block; POSITIONS],
    one_pre: [Block; POSITIONS],
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey").finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Creates the [`PublicKey`] associated with this [`SecretKey`].
    pub fn public_key(&self) -> PublicKey {
        let mut public_key = PublicKey {
            zero_hashes: [Block::default(); POSITIONS],
            one_hashes: [Block::default(); POSITIONS],
        };
        for (i, (zero, one)) in self.zero_pre.iter().zip(self.one_pre.iter()).enumerate() {
            public_key.zero_hashes[i] = zero.hash();
            public_key.one_hashes[i] = one.hash();
        }
        public_key
    }

    /// Signs the message, producing a [`Signature`] which another party would
    /// be able to [`PublicKey::verify`] with the [`PublicKey`] of this key.
    ///
    /// Signing a second, different message with the same key gives away
    /// enough preimages to forge; see [`SecretKey::sign_once`].
    pub fn sign(&self, message: &Message) -> Signature {
        let digest = message.signing_digest();
        let mut preimages = [Block::default(); POSITIONS];
        for (i, preimage) in preimages.iter_mut().enumerate() {
            let bit = bit_of_byteslice(i, digest.as_bytes());
            *preimage = Block::conditional_select(&self.zero_pre[i], &self.one_pre[i], bit);
        }
        Signature { preimages }
    }

    /// Signs the message and consumes the key, which is wiped on return.
    pub fn sign_once(self, message: &Message) -> Signature {
        self.sign(message)
    }
}

/// The public key associated with a given [`SecretKey`]: the hash of every
/// secret preimage, in the same positions.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublicKey {
    zero_hashes: [Block; POSITIONS],
    one_hashes: [Block; POSITIONS],
}

impl PublicKey {
    /// Commitments revealed against a `0` digest bit.
    pub fn zero_hashes(&self) -> &[Block; POSITIONS] {
        &self.zero_hashes
    }

    /// Commitments revealed against a `1` digest bit.
    pub fn one_hashes(&self) -> &[Block; POSITIONS] {
        &self.one_hashes
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_BYTES] {
        self.into()
    }

    /// Checks every position before answering and only ever reports a
    /// single boolean.
    pub fn verify(&self, message: &Message, signature: &Signature) -> bool {
        let digest = message.signing_digest();
        let valid = signature
            .preimages
            .iter()
            .enumerate()
            .fold(Choice::from(1), |acc, (i, preimage)| {
                let bit = bit_of_byteslice(i, digest.as_bytes());
                let commitment =
                    Block::conditional_select(&self.zero_hashes[i], &self.one_hashes[i], bit);
                acc & preimage.hash().ct_eq(&commitment)
            });
        valid.into()
    }
}

impl From<&[u8; PUBLIC_KEY_BYTES]> for PublicKey {
    fn from(value: &[u8; PUBLIC_KEY_BYTES]) -> Self {
        let (zero, one) = value.split_at(PUBLIC_KEY_BYTES / 2);
        let mut public_key = PublicKey {
            zero_hashes: [Block::default(); POSITIONS],
            one_hashes: [Block::default(); POSITIONS],
        };
        for (slot, chunk) in public_key.zero_hashes.iter_mut().zip(zero.chunks_exact(BLOCK_SIZE)) {
            *slot = Block::from_bytes(chunk);
        }
        for (slot, chunk) in public_key.one_hashes.iter_mut().zip(one.chunks_exact(BLOCK_SIZE)) {
            *slot = Block::from_bytes(chunk);
        }
        public_key
    }
}

impl From<&PublicKey> for [u8; PUBLIC_KEY_BYTES] {
    fn from(value: &PublicKey) -> Self {
        let mut out = [0u8; PUBLIC_KEY_BYTES];
        let blocks = value.zero_hashes.iter().chain(value.one_hashes.iter());
        for (chunk, block) in out.chunks_exact_mut(BLOCK_SIZE).zip(blocks) {
            chunk.copy_from_slice(block.as_bytes());
        }
        out
    }
}

/// The result of [`SecretKey::sign`]ing a message: one revealed preimage
/// per position.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Signature {
    preimages: [Block; POSITIONS],
}

impl Signature {
    pub fn preimages(&self) -> &[Block; POSITIONS] {
        &self.preimages
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_BYTES] {
        self.into()
    }
}

impl From<&[u8; SIGNATURE_BYTES]> for Signature {
    fn from(value: &[u8; SIGNATURE_BYTES]) -> Self {
        let mut preimages = [Block::default(); POSITIONS];
        for (slot, chunk) in preimages.iter_mut().zip(value.chunks_exact(BLOCK_SIZE)) {
            *slot = Block::from_bytes(chunk);
        }
        Signature { preimages }
    }
}

impl From<&Signature> for [u8; SIGNATURE_BYTES] {
    fn from(value: &Signature) -> Self {
        let mut out = [0u8; SIGNATURE_BYTES];
        for (chunk, block) in out.chunks_exact_mut(BLOCK_SIZE).zip(value.preimages.iter()) {
            chunk.copy_from_slice(block.as_bytes());
        }
        out
    }
}

/// Generates a key pair using the operating system random number
/// generator.
pub fn generate_key() -> Result<(SecretKey, PublicKey)> {
    generate_key_with(&mut OsRng)
}

/// Generates a key pair drawing all 512 secrets from `rng`, zero
/// preimages first.
pub fn generate_key_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<(SecretKey, PublicKey)> {
    let mut secret = SecretKey {
        zero_pre: [Block::default(); POSITIONS],
        one_pre: [Block::default(); POSITIONS],
    };
    for block in secret.zero_pre.iter_mut().chain(secret.one_pre.iter_mut()) {
        if let Err(err) = block.fill_from(rng) {
            debug!(%err, "randomness source failed during key generation");
            return Err(err.into());
        }
    }
    let public_key = secret.public_key();
    debug!(positions = POSITIONS, "generated one-time key pair");
    Ok((secret, public_key))
}

pub fn sign(message: &Message, secret: &SecretKey) -> Signature {
    secret.sign(message)
}

pub fn verify(message: &Message, public_key: &PublicKey, signature: &Signature) -> bool {
    public_key.verify(message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy exhausted",
            )))
        }
    }

    impl CryptoRng for BrokenRng {}

    fn flip_byte(block: &Block, byte: usize, mask: u8) -> Block {
        let mut bytes = *block.as_bytes();
        bytes[byte] ^= mask;
        Block::from(bytes)
    }

    #[test]
    fn test_bit_of_byteslice() {
        assert!(!bool::from(bit_of_byteslice(0, b"\x00\x00")));
        assert!(bool::from(bit_of_byteslice(0, b"\x80\x00")));
        assert!(!bool::from(bit_of_byteslice(7, b"\x80\x00")));
        assert!(!bool::from(bit_of_byteslice(9, b"\xFF\x80")));
        assert!(bool::from(bit_of_byteslice(9, b"\x00\x40")));
        assert!(bool::from(bit_of_byteslice(15, b"\x00\x01")));
    }

    #[test]
    fn test_bit_of_byte() {
        assert!(bool::from(bit_of_byte(0, 0b10000000)));
        assert!(!bool::from(bit_of_byte(0, 0b01000000)));
        assert!(bool::from(bit_of_byte(7, 0b00000001)));
    }

    #[test]
    fn end_to_end() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, public_key) = generate_key()?;
        let message = Message::from_string("Hello, world!");

        let signature = sign(&message, &secret);
        assert!(verify(&message, &public_key, &signature));

        let faulty_message = Message::from_string("Hello, not world!");
        assert!(!verify(&faulty_message, &public_key, &signature));

        let faulty_signature = secret.sign(&faulty_message);
        assert!(!public_key.verify(&message, &faulty_signature));

        assert!(public_key.verify(&faulty_message, &faulty_signature));
        Ok(())
    }

    #[test]
    fn message_one_scenario() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let message = Message::from_string("1");
        assert_eq!(message.as_block(), &Block::digest(b"1"));

        let (secret, public_key) = generate_key()?;
        let signature = sign(&message, &secret);
        assert!(verify(&message, &public_key, &signature));
        assert_eq!(public_key.to_hex().len(), 32768);
        assert_eq!(signature.to_hex().len(), 16384);
        Ok(())
    }

    #[test]
    fn public_key_commits_to_secret() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, public_key) = generate_key_with(&mut StdRng::seed_from_u64(3))?;
        for i in 0..POSITIONS {
            assert!(secret.zero_pre[i].is_preimage(&public_key.zero_hashes()[i]));
            assert!(secret.one_pre[i].is_preimage(&public_key.one_hashes()[i]));
        }
        assert_eq!(secret.public_key(), public_key);
        Ok(())
    }

    #[test]
    fn secrets_are_distinct() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, _) = generate_key()?;
        let mut all: Vec<[u8; BLOCK_SIZE]> = secret
            .zero_pre
            .iter()
            .chain(secret.one_pre.iter())
            .map(|block| *block.as_bytes())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 2 * POSITIONS);
        Ok(())
    }

    #[test]
    fn seeded_generation_is_reproducible() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (_, first) = generate_key_with(&mut StdRng::seed_from_u64(11))?;
        let (_, second) = generate_key_with(&mut StdRng::seed_from_u64(11))?;
        let (_, other) = generate_key_with(&mut StdRng::seed_from_u64(12))?;
        assert_eq!(first, second);
        assert_ne!(first, other);
        Ok(())
    }

    #[test]
    fn broken_rng_is_a_randomness_error() {
        assert!(matches!(
            generate_key_with(&mut BrokenRng),
            Err(Error::Randomness(_))
        ));
    }

    #[test]
    fn reveals_follow_double_hashed_digest() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let (secret, _) = generate_key_with(&mut StdRng::seed_from_u64(5))?;
        let message = Message::from_string("which half?");
        let signature = secret.sign(&message);
        let digest = message.as_block().hash();
        for i in 0..POSITIONS {
            let byte = digest.as_bytes()[i / 8];
            let expected = if byte & (0x80 >> (i % 8)) != 0 {
                secret.one_pre[i]
            } else {
                secret.zero_pre[i]
            };
            assert_eq!(signature.preimages()[i], expected);
        }
        Ok(())
    }

    #[test]
    fn signing_is_deterministic() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, _) = generate_key()?;
        let message = Message::from_string("same every time");
        assert_eq!(secret.sign(&message), secret.sign(&message));
        Ok(())
    }

    #[test]
    fn wrong_key_is_rejected() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, _) = generate_key()?;
        let (_, other_public_key) = generate_key()?;
        let message = Message::from_string("1");
        assert!(!verify(&message, &other_public_key, &sign(&message, &secret)));
        Ok(())
    }

    #[test]
    fn sign_once_consumes_the_key() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, public_key) = generate_key()?;
        let message = Message::from_string("only this one");
        let signature = secret.sign_once(&message);
        assert!(public_key.verify(&message, &signature));
        Ok(())
    }

    #[test]
    fn secret_key_debug_is_redacted() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, _) = generate_key_with(&mut StdRng::seed_from_u64(8))?;
        let rendered = format!("{:?}", secret);
        assert_eq!(rendered, "SecretKey { .. }");
        assert!(!rendered.contains(&secret.zero_pre[0].to_hex()));
        Ok(())
    }

    #[test]
    fn binary_encodings_keep_layout() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (secret, public_key) = generate_key_with(&mut StdRng::seed_from_u64(21))?;
        let bytes = public_key.to_bytes();
        assert_eq!(&bytes[..BLOCK_SIZE], public_key.zero_hashes()[0].as_bytes());
        assert_eq!(
            &bytes[PUBLIC_KEY_BYTES / 2..PUBLIC_KEY_BYTES / 2 + BLOCK_SIZE],
            public_key.one_hashes()[0].as_bytes()
        );
        assert_eq!(PublicKey::from(&bytes), public_key);

        let signature = secret.sign(&Message::from_string("bytes"));
        assert_eq!(Signature::from(&signature.to_bytes()), signature);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256, .. ProptestConfig::default()
        })]

        #[test]
        fn really_works(s in "\\PC*") {
            let (secret, public_key) = generate_key()?;
            let message = Message::from_string(&s);

            let signature = secret.sign(&message);
            assert!(public_key.verify(&message, &signature));
        }

        #[test]
        fn any_flipped_byte_is_caught(
            seed in any::<u64>(),
            position in 0..POSITIONS,
            byte in 0..BLOCK_SIZE,
            mask in 1u8..=255,
        ) {
            let (secret, public_key) = generate_key_with(&mut StdRng::seed_from_u64(seed))?;
            let message = Message::from_string("tamper with me");
            let mut signature = secret.sign(&message);
            prop_assert!(public_key.verify(&message, &signature));

            signature.preimages[position] = flip_byte(&signature.preimages[position], byte, mask);
            prop_assert!(!public_key.verify(&message, &signature));
        }
    }
}
