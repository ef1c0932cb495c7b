use crate::{
    curve::{CurveFamily, CurveInfo, get_curve_by_name},
    error::{HdNodeError, Result},
};
use crypto_utils::hash::hash160;
use ed25519_dalek::{SigningKey, VerifyingKey};
use secp256k1::{PublicKey, SecretKey};
use std::fmt;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Index offset for hardened children (index >= 0x80000000) i.e., 0x80000000 = 2³¹
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Prefix byte of an edwards public key in the 33-byte key field.
pub(crate) const ED25519_PUBKEY_PREFIX: u8 = 0x00;

pub fn is_hardened(index: u32) -> bool {
    index & HARDENED_OFFSET != 0
}

/// One node of the derivation tree.
///
/// A node is either private (`private_key` non-zero, `public_key` derived from it)
/// or public-only (`private_key` all zero). Derivation mutates the node in place;
/// clone it first if the parent is still needed. Key material is wiped on drop.
///
/// The fields are raw and unchecked. Constructors validate key material; code
/// that writes `private_key` directly must call [`HdNode::fill_public_key`] and
/// keep the key in range.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct HdNode {
    pub depth: u32,
    /// Fingerprint of the parent node, 0 for a master node.
    pub fingerprint: u32,
    pub child_num: u32,
    pub chain_code: [u8; 32],
    pub private_key: [u8; 32],
    pub public_key: [u8; 33],
    #[zeroize(skip)]
    pub curve: &'static CurveInfo,
}

impl HdNode {
    /// Build a public-only node from its serialized parts.
    pub fn from_xpub(
        depth: u32,
        fingerprint: u32,
        child_num: u32,
        chain_code: &[u8; 32],
        public_key: &[u8; 33],
        curve: &str,
    ) -> Result<Self> {
        let curve = get_curve_by_name(curve)?;
        validate_public_key(curve, public_key)?;
        Ok(HdNode {
            depth,
            fingerprint,
            child_num,
            chain_code: *chain_code,
            private_key: [0u8; 32],
            public_key: *public_key,
            curve,
        })
    }

    /// Build a private node from its serialized parts. The public key is computed.
    pub fn from_xprv(
        depth: u32,
        fingerprint: u32,
        child_num: u32,
        chain_code: &[u8; 32],
        private_key: &[u8; 32],
        curve: &str,
    ) -> Result<Self> {
        let curve = get_curve_by_name(curve)?;
        let valid = match curve.params() {
            Some(params) => params.is_valid_scalar(private_key),
            None => private_key.iter().any(|&b| b != 0),
        };
        if !valid {
            return Err(HdNodeError::InvalidKeyData);
        }
        let mut node = HdNode {
            depth,
            fingerprint,
            child_num,
            chain_code: *chain_code,
            private_key: *private_key,
            public_key: [0u8; 33],
            curve,
        };
        node.fill_public_key();
        Ok(node)
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.iter().any(|&b| b != 0)
    }

    /// Recompute `public_key` from `private_key`.
    ///
    /// Does nothing on a public-only node: the existing public key is kept as is.
    /// An out-of-range secp256k1 key also leaves it unchanged, with a warning.
    pub fn fill_public_key(&mut self) {
        if !self.has_private_key() {
            return;
        }
        match self.curve.family {
            CurveFamily::Weierstrass(_) => match SecretKey::from_slice(&self.private_key) {
                Ok(sk) => self.public_key = PublicKey::from_secret_key_global(&sk).serialize(),
                Err(err) => warn!(
                    curve = self.curve.name,
                    %err,
                    "private key out of range, public key not refreshed"
                ),
            },
            CurveFamily::Edwards => {
                let sk = SigningKey::from_bytes(&self.private_key);
                self.public_key[0] = ED25519_PUBKEY_PREFIX;
                self.public_key[1..].copy_from_slice(sk.verifying_key().as_bytes());
            }
        }
    }

    /// This node's own fingerprint: the first 4 bytes of HASH160(public key).
    /// Children carry it in their `fingerprint` field.
    pub fn fingerprint_of(&self) -> u32 {
        let id = hash160(&self.public_key);
        u32::from_be_bytes([id[0], id[1], id[2], id[3]])
    }

    /// Public key as a curve point, for Weierstrass curves.
    pub fn public_point(&self) -> Result<PublicKey> {
        if self.curve.is_edwards() {
            return Err(HdNodeError::UnsupportedDerivation {
                curve: self.curve.name,
                mode: "point",
            });
        }
        Ok(PublicKey::from_slice(&self.public_key)?)
    }

    pub(crate) fn secret_key(&self) -> Result<SecretKey> {
        if !self.has_private_key() {
            return Err(HdNodeError::NoPrivateKey);
        }
        Ok(SecretKey::from_slice(&self.private_key)?)
    }

    /// Drop the private key, turning this node into its public-only view.
    pub fn neuter(&mut self) {
        self.private_key.zeroize();
    }
}

pub(crate) fn validate_public_key(curve: &CurveInfo, public_key: &[u8; 33]) -> Result<()> {
    match curve.family {
        CurveFamily::Weierstrass(_) => {
            PublicKey::from_slice(public_key).map_err(|_| HdNodeError::InvalidKeyData)?;
        }
        CurveFamily::Edwards => {
            if public_key[0] != ED25519_PUBKEY_PREFIX {
                return Err(HdNodeError::InvalidKeyData);
            }
            let mut point = [0u8; 32];
            point.copy_from_slice(&public_key[1..]);
            VerifyingKey::from_bytes(&point).map_err(|_| HdNodeError::InvalidKeyData)?;
        }
    }
    Ok(())
}

impl fmt::Debug for HdNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdNode")
            .field("curve", &self.curve.name)
            .field("depth", &self.depth)
            .field("fingerprint", &format_args!("{:08x}", self.fingerprint))
            .field("child_num", &format_args!("{:#x}", self.child_num))
            .field("public_key", &hex::encode(self.public_key))
            .field("private", &self.has_private_key())
            .finish_non_exhaustive()
    }
}
