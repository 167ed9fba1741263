use thiserror::Error;

/// Everything that can go wrong in this crate.
///
/// Signing, verification, hashing and encoding never fail. A signature
/// that does not verify is a plain `false` from [`crate::verify`], not an
/// error.
#[derive(Error, Debug)]
pub enum Error {
    /// The randomness source could not supply the bytes for a new key.
    #[error("randomness source failed: {0}")]
    Randomness(#[from] rand::Error),

    /// Hex text handed to a decoder was malformed.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Rejection reasons for hex text given to the decoders.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The input does not have the exact length of the encoding.
    #[error("hex string is {actual} characters, expected {expected}")]
    Length {
        /// Length the encoding requires.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// The input has the right length but is not hex.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, Error>;
