use crypto_utils::Base58Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HdNodeError>;

#[derive(Debug, Error)]
pub enum HdNodeError {
    #[error("seed does not produce a valid master key")]
    InvalidSeed,
    #[error("operation requires a private key but the node is public-only")]
    NoPrivateKey,
    #[error("curve {curve} does not support {mode} derivation")]
    UnsupportedDerivation {
        curve: &'static str,
        mode: &'static str,
    },
    #[error("hardened index {0:#010x} cannot be derived from a public key")]
    HardenedNotAllowedForPublic(u32),
    #[error("no valid child key found starting at index {0:#010x}")]
    DerivationExhausted(u32),
    #[error("unknown curve {0:?}")]
    UnknownCurve(String),
    #[error("extended key checksum mismatch")]
    ChecksumMismatch,
    #[error("extended key payload has length {0}, expected 78")]
    MalformedLength(usize),
    #[error("unknown extended key version {0:#010x}")]
    UnknownVersion(u32),
    #[error("output buffer holds {available} bytes, {needed} required")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("invalid character {0:?} in extended key")]
    InvalidEncoding(char),
    #[error("key data is not valid for the curve")]
    InvalidKeyData,
    #[error("root key with non-zero parent fingerprint or child number")]
    InvalidRoot,
    #[error("depth {0} does not fit the extended key format")]
    DepthOutOfRange(u32),
    #[error("invalid derivation path")]
    InvalidDerivationPath,
    #[error("curve arithmetic failed: {0}")]
    Curve(#[from] secp256k1::Error),
    #[error("ed25519 failure: {0}")]
    Signature(#[from] ed25519_dalek::SignatureError),
}

impl From<Base58Error> for HdNodeError {
    fn from(e: Base58Error) -> Self {
        match e {
            Base58Error::InvalidChecksum => HdNodeError::ChecksumMismatch,
            Base58Error::InvalidLength => HdNodeError::MalformedLength(0),
            Base58Error::InvalidCharacter(c) => HdNodeError::InvalidEncoding(c),
        }
    }
}
