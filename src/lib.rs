//! Lamport one-time signatures over Blake 3.
//!
//! A [`SecretKey`] is 256 pairs of random 32-byte preimages and its
//! [`PublicKey`] is the hash of each of them. Signing a [`Message`] reveals
//! one preimage from each pair, picked by the bits of the message's hash;
//! verifying hashes every revealed preimage and compares it against the
//! matching commitment.
//!
//! ```
//! use blake3_one_time_signatures::{generate_key, sign, verify, Message, PublicKey};
//!
//! let message = Message::from_string("1");
//! let (secret, public_key) = generate_key()?;
//! let signature = sign(&message, &secret);
//! assert!(verify(&message, &public_key, &signature));
//!
//! let published = public_key.to_hex();
//! assert_eq!(published.parse::<PublicKey>()?, public_key);
//! # Ok::<(), blake3_one_time_signatures::Error>(())
//! ```
//!
//! Each key pair must sign at most one message. Nothing here tracks whether
//! a key has been used; [`SecretKey::sign_once`] consumes the key for
//! callers who want the compiler to enforce it.

pub mod block;
pub mod encoding;
pub mod error;
pub mod lamport;

pub use block::{Block, BLOCK_SIZE};
pub use encoding::{BLOCK_HEX_LEN, PUBLIC_KEY_HEX_LEN, SIGNATURE_HEX_LEN};
pub use error::{Error, FormatError, Result};
pub use lamport::{
    generate_key, generate_key_with, sign, verify, Message, PublicKey, SecretKey, Signature,
    POSITIONS, PUBLIC_KEY_BYTES, SIGNATURE_BYTES,
};
