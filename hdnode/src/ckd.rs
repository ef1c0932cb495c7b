//! Child key derivation.
//!
//! Weierstrass curves follow BIP32: `I = HMAC-SHA512(chain_code, data)`, the child
//! key is `IL + k_par (mod n)` on the private side and `IL·G + K_par` on the public
//! side. Edwards curves follow SLIP-0010: hardened private derivation only, and the
//! child key is `IL` itself.
//!
//! All derivations mutate the node in place. On error the node is left untouched.

use crate::{
    address::p2pkh_address,
    curve::{CurveFamily, WeierstrassParams, get_curve_by_name},
    error::{HdNodeError, Result},
    node::{HARDENED_OFFSET, HdNode, is_hardened},
};
use crypto_utils::hmac::hmac_sha512;
use secp256k1::{PublicKey, SECP256K1, Scalar};
use tracing::{trace, warn};
use zeroize::Zeroizing;

/// Upper bound on candidate indices tried when `IL` yields an invalid key.
/// The chance of needing even a second attempt is below 2⁻¹²⁷.
pub const MAX_CKD_ATTEMPTS: u32 = 32;

fn split(i: &[u8; 64]) -> (Zeroizing<[u8; 32]>, [u8; 32]) {
    let mut il = Zeroizing::new([0u8; 32]);
    let mut ir = [0u8; 32];
    il.copy_from_slice(&i[..32]);
    ir.copy_from_slice(&i[32..]);
    (il, ir)
}

/// Next index to try after `current` produced an invalid key. Never crosses
/// into the other half of the index space.
fn next_candidate(requested: u32, current: u32) -> Result<u32> {
    let next = current
        .checked_add(1)
        .filter(|&n| is_hardened(n) == is_hardened(requested))
        .filter(|&n| n - requested < MAX_CKD_ATTEMPTS)
        .ok_or(HdNodeError::DerivationExhausted(requested))?;
    warn!(requested, skipped = current, next, "invalid child key, trying next index");
    Ok(next)
}

/// `IL + parent (mod n)`, or `None` when BIP32 declares the index invalid.
fn tweak_private(
    params: &WeierstrassParams,
    parent: &[u8; 32],
    il: &[u8; 32],
) -> Result<Option<Zeroizing<[u8; 32]>>> {
    if !params.is_below_order(il) {
        return Ok(None);
    }
    let tweak = Scalar::from_be_bytes(*il).map_err(|_| secp256k1::Error::InvalidTweak)?;
    let parent = secp256k1::SecretKey::from_slice(parent)?;
    Ok(parent
        .add_tweak(&tweak)
        .ok()
        .map(|child| Zeroizing::new(child.secret_bytes())))
}

/// `IL·G + parent`, or `None` when BIP32 declares the index invalid.
fn tweak_public(
    params: &WeierstrassParams,
    parent: &PublicKey,
    il: &[u8; 32],
) -> Result<Option<PublicKey>> {
    if !params.is_below_order(il) {
        return Ok(None);
    }
    let tweak = Scalar::from_be_bytes(*il).map_err(|_| secp256k1::Error::InvalidTweak)?;
    Ok(parent.add_exp_tweak(SECP256K1, &tweak).ok())
}

/// Run `attempt` on `index`, then on the following indices, until it yields a
/// value. Returns the value and the index that produced it.
fn first_valid<T>(
    index: u32,
    mut attempt: impl FnMut(u32) -> Result<Option<T>>,
) -> Result<(T, u32)> {
    let mut i = index;
    loop {
        if let Some(found) = attempt(i)? {
            return Ok((found, i));
        }
        i = next_candidate(index, i)?;
    }
}

/// Never skips a candidate on its own; only invalid keys do.
fn no_skip(_: u32) -> bool {
    false
}

/// Public derivation of the child at `index` (or the first valid one after it).
/// Candidates for which `skip` holds are treated as invalid.
/// Returns the child point, its chain code and the index actually used.
fn derive_public_child(
    params: &WeierstrassParams,
    chain_code: &[u8; 32],
    parent_bytes: &[u8; 33],
    parent_point: &PublicKey,
    index: u32,
    skip: impl Fn(u32) -> bool,
) -> Result<(PublicKey, [u8; 32], u32)> {
    let ((child, ir), used) = first_valid(index, |i| {
        if skip(i) {
            return Ok(None);
        }
        let digest = hmac_sha512(chain_code, &[parent_bytes, &i.to_be_bytes()]);
        let (il, ir) = split(&digest);
        Ok(tweak_public(params, parent_point, &il)?.map(|child| (child, ir)))
    })?;
    Ok((child, ir, used))
}

impl HdNode {
    /// Master node for `curve`: `I = HMAC-SHA512(curve domain, seed)`,
    /// private key `IL`, chain code `IR`.
    pub fn from_seed(seed: &[u8], curve: &str) -> Result<Self> {
        let curve = get_curve_by_name(curve)?;
        let digest = hmac_sha512(curve.bip32_name.as_bytes(), &[seed]);
        let (il, ir) = split(&digest);
        if let Some(params) = curve.params() {
            if !params.is_valid_scalar(&il) {
                return Err(HdNodeError::InvalidSeed);
            }
        }
        let mut node = HdNode {
            depth: 0,
            fingerprint: 0,
            child_num: 0,
            chain_code: ir,
            private_key: *il,
            public_key: [0u8; 33],
            curve,
        };
        node.fill_public_key();
        trace!(curve = curve.name, "derived master node from seed");
        Ok(node)
    }

    /// Replace this node with its child at `index` (CKDpriv).
    ///
    /// If `index` yields an invalid key the next index is used instead;
    /// `child_num` records the index actually used.
    pub fn private_ckd(&mut self, index: u32) -> Result<()> {
        self.private_ckd_skipping(index, no_skip)
    }

    fn private_ckd_skipping(&mut self, index: u32, skip: impl Fn(u32) -> bool) -> Result<()> {
        if !self.has_private_key() {
            return Err(HdNodeError::NoPrivateKey);
        }
        let curve = self.curve;
        let hardened = is_hardened(index);
        let depth = self
            .depth
            .checked_add(1)
            .ok_or(HdNodeError::DepthOutOfRange(self.depth))?;

        let (private_key, chain_code, used) = match &curve.family {
            CurveFamily::Edwards => {
                if !hardened {
                    return Err(HdNodeError::UnsupportedDerivation {
                        curve: curve.name,
                        mode: "non-hardened",
                    });
                }
                let digest = hmac_sha512(
                    &self.chain_code,
                    &[&[0u8], &self.private_key, &index.to_be_bytes()],
                );
                let (il, ir) = split(&digest);
                (il, ir, index)
            }
            CurveFamily::Weierstrass(params) => {
                let ((child, ir), used) = first_valid(index, |i| {
                    if skip(i) {
                        return Ok(None);
                    }
                    let digest = if hardened {
                        hmac_sha512(
                            &self.chain_code,
                            &[&[0u8], &self.private_key, &i.to_be_bytes()],
                        )
                    } else {
                        hmac_sha512(&self.chain_code, &[&self.public_key, &i.to_be_bytes()])
                    };
                    let (il, ir) = split(&digest);
                    Ok(tweak_private(params, &self.private_key, &il)?.map(|child| (child, ir)))
                })?;
                (child, ir, used)
            }
        };

        self.fingerprint = self.fingerprint_of();
        self.depth = depth;
        self.child_num = used;
        self.chain_code = chain_code;
        self.private_key = *private_key;
        self.fill_public_key();
        trace!(curve = curve.name, depth, child_num = used, "private child derived");
        Ok(())
    }

    /// Hardened private derivation: `private_ckd(index | 2³¹)`.
    pub fn private_ckd_prime(&mut self, index: u32) -> Result<()> {
        self.private_ckd(index | HARDENED_OFFSET)
    }

    /// Replace this node with its public child at `index` (CKDpub).
    ///
    /// Only the public key is used; the result is always public-only.
    pub fn public_ckd(&mut self, index: u32) -> Result<()> {
        self.public_ckd_skipping(index, no_skip)
    }

    fn public_ckd_skipping(&mut self, index: u32, skip: impl Fn(u32) -> bool) -> Result<()> {
        if is_hardened(index) {
            return Err(HdNodeError::HardenedNotAllowedForPublic(index));
        }
        let curve = self.curve;
        let params = curve.params().ok_or(HdNodeError::UnsupportedDerivation {
            curve: curve.name,
            mode: "public",
        })?;
        let depth = self
            .depth
            .checked_add(1)
            .ok_or(HdNodeError::DepthOutOfRange(self.depth))?;
        let parent = PublicKey::from_slice(&self.public_key)?;
        let (child, chain_code, used) = derive_public_child(
            params,
            &self.chain_code,
            &self.public_key,
            &parent,
            index,
            skip,
        )?;

        self.fingerprint = self.fingerprint_of();
        self.depth = depth;
        self.child_num = used;
        self.chain_code = chain_code;
        self.neuter();
        self.public_key = child.serialize();
        trace!(curve = curve.name, depth, child_num = used, "public child derived");
        Ok(())
    }

    /// Address of the public child at `index`, without building the child node.
    ///
    /// `parent_point` must be this node's public key in point form; scanners
    /// parse it once and reuse it for every index. The result equals
    /// `public_ckd(index)` followed by [`HdNode::address`].
    pub fn public_ckd_address_optimized(
        &self,
        parent_point: &PublicKey,
        index: u32,
        version: u8,
    ) -> Result<String> {
        if is_hardened(index) {
            return Err(HdNodeError::HardenedNotAllowedForPublic(index));
        }
        let params = self.curve.params().ok_or(HdNodeError::UnsupportedDerivation {
            curve: self.curve.name,
            mode: "public",
        })?;
        let (child, _, _) = derive_public_child(
            params,
            &self.chain_code,
            &self.public_key,
            parent_point,
            index,
            no_skip,
        )?;
        Ok(p2pkh_address(&child.serialize(), version))
    }

    /// P2PKH address of this node's public key.
    pub fn address(&self, version: u8) -> String {
        p2pkh_address(&self.public_key, version)
    }
}
