//! Extended key text format.
//!
//! `version(4) ‖ depth(1) ‖ parent fingerprint(4) ‖ child number(4) ‖ chain code(32) ‖ key(33)`,
//! big-endian, Base58Check encoded. The version bytes identify both the curve and
//! whether the key field holds a private key (`0x00 ‖ k`) or a public key.

use crate::{
    curve::{CurveInfo, ED25519, SECP256K1},
    error::{HdNodeError, Result},
    node::HdNode,
};
use crypto_utils::base58::{base58_check_decode, base58_check_encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Public,
    Private,
}

// Version bytes for serialization
pub const VERSION_MAINNET_PRIVATE: u32 = 0x0488_ADE4;
pub const VERSION_MAINNET_PUBLIC: u32 = 0x0488_B21E;
pub const VERSION_TESTNET_PRIVATE: u32 = 0x0435_8394;
pub const VERSION_TESTNET_PUBLIC: u32 = 0x0435_87CF;
// No registered prefixes exist for ed25519; these sit next to the secp256k1 ones.
pub const VERSION_ED25519_MAINNET_PRIVATE: u32 = 0x0488_ADE5;
pub const VERSION_ED25519_MAINNET_PUBLIC: u32 = 0x0488_B21F;
pub const VERSION_ED25519_TESTNET_PRIVATE: u32 = 0x0435_8395;
pub const VERSION_ED25519_TESTNET_PUBLIC: u32 = 0x0435_87D0;

/// Length of the binary payload, without checksum.
pub const EXTENDED_KEY_LEN: usize = 78;

/// Longest Base58 text of a payload plus its 4-byte checksum: ⌈82 · log₅₈ 256⌉.
pub const MAX_SERIALIZED_LEN: usize = 112;

#[derive(Debug)]
pub struct VersionEntry {
    pub version: u32,
    pub network: Network,
    pub kind: KeyKind,
    pub curve: &'static CurveInfo,
}

static VERSIONS: [VersionEntry; 8] = [
    VersionEntry {
        version: VERSION_MAINNET_PRIVATE,
        network: Network::Mainnet,
        kind: KeyKind::Private,
        curve: &SECP256K1,
    },
    VersionEntry {
        version: VERSION_MAINNET_PUBLIC,
        network: Network::Mainnet,
        kind: KeyKind::Public,
        curve: &SECP256K1,
    },
    VersionEntry {
        version: VERSION_TESTNET_PRIVATE,
        network: Network::Testnet,
        kind: KeyKind::Private,
        curve: &SECP256K1,
    },
    VersionEntry {
        version: VERSION_TESTNET_PUBLIC,
        network: Network::Testnet,
        kind: KeyKind::Public,
        curve: &SECP256K1,
    },
    VersionEntry {
        version: VERSION_ED25519_MAINNET_PRIVATE,
        network: Network::Mainnet,
        kind: KeyKind::Private,
        curve: &ED25519,
    },
    VersionEntry {
        version: VERSION_ED25519_MAINNET_PUBLIC,
        network: Network::Mainnet,
        kind: KeyKind::Public,
        curve: &ED25519,
    },
    VersionEntry {
        version: VERSION_ED25519_TESTNET_PRIVATE,
        network: Network::Testnet,
        kind: KeyKind::Private,
        curve: &ED25519,
    },
    VersionEntry {
        version: VERSION_ED25519_TESTNET_PUBLIC,
        network: Network::Testnet,
        kind: KeyKind::Public,
        curve: &ED25519,
    },
];

pub fn lookup_version(version: u32) -> Option<&'static VersionEntry> {
    VERSIONS.iter().find(|e| e.version == version)
}

pub fn version_for(curve: &CurveInfo, network: Network, kind: KeyKind) -> Result<u32> {
    VERSIONS
        .iter()
        .find(|e| e.curve == curve && e.network == network && e.kind == kind)
        .map(|e| e.version)
        .ok_or_else(|| HdNodeError::UnknownCurve(curve.name.to_string()))
}

impl HdNode {
    /// Serialize with explicit version bytes. `use_public` selects the key field.
    pub fn serialize(&self, version: u32, use_public: bool) -> Result<String> {
        let depth = u8::try_from(self.depth).map_err(|_| HdNodeError::DepthOutOfRange(self.depth))?;
        if !use_public && !self.has_private_key() {
            return Err(HdNodeError::NoPrivateKey);
        }

        let mut payload = Zeroizing::new([0u8; EXTENDED_KEY_LEN]);
        payload[0..4].copy_from_slice(&version.to_be_bytes());
        payload[4] = depth;
        payload[5..9].copy_from_slice(&self.fingerprint.to_be_bytes());
        payload[9..13].copy_from_slice(&self.child_num.to_be_bytes());
        payload[13..45].copy_from_slice(&self.chain_code);
        if use_public {
            payload[45..78].copy_from_slice(&self.public_key);
        } else {
            payload[46..78].copy_from_slice(&self.private_key);
        }
        Ok(base58_check_encode(&payload[..]))
    }

    /// Serialize into a caller-provided buffer, returning the number of bytes written.
    ///
    /// The buffer must hold [`MAX_SERIALIZED_LEN`] bytes whatever the key.
    pub fn serialize_into(&self, version: u32, use_public: bool, out: &mut [u8]) -> Result<usize> {
        if out.len() < MAX_SERIALIZED_LEN {
            return Err(HdNodeError::BufferTooSmall {
                needed: MAX_SERIALIZED_LEN,
                available: out.len(),
            });
        }
        let text = Zeroizing::new(self.serialize(version, use_public)?);
        out[..text.len()].copy_from_slice(text.as_bytes());
        Ok(text.len())
    }

    pub fn serialize_public(&self, network: Network) -> Result<String> {
        let version = version_for(self.curve, network, KeyKind::Public)?;
        self.serialize(version, true)
    }

    pub fn serialize_private(&self, network: Network) -> Result<String> {
        let version = version_for(self.curve, network, KeyKind::Private)?;
        self.serialize(version, false)
    }

    /// Parse an extended key. The curve and key kind come from the version bytes.
    pub fn deserialize(s: &str) -> Result<Self> {
        // Base58 decoding is quadratic; no valid key is longer than this.
        if s.len() > MAX_SERIALIZED_LEN {
            return Err(HdNodeError::MalformedLength(s.len()));
        }
        let data =Zeroizing::new(base58_check_decode(s)?);
        if data.len() != EXTENDED_KEY_LEN {
            return Err(HdNodeError::MalformedLength(data.len()));
        }

        let version = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let Some(entry) = lookup_version(version) else {
            debug!(version, "rejecting extended key with unknown version");
            return Err(HdNodeError::UnknownVersion(version));
        };

        let depth = data[4] as u32;
        let fingerprint = u32::from_be_bytes([data[5], data[6], data[7], data[8]]);
        let child_num = u32::from_be_bytes([data[9], data[10], data[11], data[12]]);
        if depth == 0 && (fingerprint != 0 || child_num != 0) {
            return Err(HdNodeError::InvalidRoot);
        }
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        match entry.kind {
            KeyKind::Private => {
                if data[45] != 0 {
                    debug!(version, "private version with a public key field");
                    return Err(HdNodeError::InvalidKeyData);
                }
                let mut private_key = Zeroizing::new([0u8; 32]);
                private_key.copy_from_slice(&data[46..78]);
                HdNode::from_xprv(
                    depth,
                    fingerprint,
                    child_num,
                    &chain_code,
                    &private_key,
                    entry.curve.name,
                )
            }
            KeyKind::Public => {
                let mut public_key = [0u8; 33];
                public_key.copy_from_slice(&data[45..78]);
                HdNode::from_xpub(
                    depth,
                    fingerprint,
                    child_num,
                    &chain_code,
                    &public_key,
                    entry.curve.name,
                )
            }
        }
    }
}
