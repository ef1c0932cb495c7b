//! Hashing, HMAC and Base58Check primitives shared by the HD derivation core.

pub mod base58;
pub mod hash;
pub mod hmac;

pub use base58::Base58Error;
