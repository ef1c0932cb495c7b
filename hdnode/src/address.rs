//! Legacy pay-to-pubkey-hash address encoding.

use crypto_utils::{base58::base58_check_encode, hash::hash160};

/// `Base58Check(version ‖ HASH160(pubkey))`
pub fn p2pkh_address(public_key: &[u8; 33], version: u8) -> String {
    let mut payload = [0u8; 21];
    payload[0] = version;
    payload[1..].copy_from_slice(&hash160(public_key));
    base58_check_encode(&payload)
}
