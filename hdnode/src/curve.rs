//! Registry of the curves a node can live on.
//!
//! Every other module branches on [`CurveFamily`] rather than on the curve name:
//! Weierstrass curves carry their parameters, edwards curves carry nothing.

use crate::error::{HdNodeError, Result};

pub const SECP256K1_NAME: &str = "secp256k1";
pub const ED25519_NAME: &str = "ed25519";

/// Parameters the derivation engine needs from a short Weierstrass curve.
#[derive(Debug, PartialEq, Eq)]
pub struct WeierstrassParams {
    /// Group order, big-endian.
    pub order: [u8; 32],
}

impl WeierstrassParams {
    pub fn is_below_order(&self, scalar: &[u8; 32]) -> bool {
        scalar[..] < self.order[..]
    }

    /// True when `scalar` is in `1..order`, i.e. usable as a private key.
    pub fn is_valid_scalar(&self, scalar: &[u8; 32]) -> bool {
        scalar.iter().any(|&b| b != 0) && self.is_below_order(scalar)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CurveFamily {
    Weierstrass(WeierstrassParams),
    /// Hardened, private-only derivation.
    Edwards,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CurveInfo {
    pub name: &'static str,
    /// HMAC key used to turn a seed into a master node.
    pub bip32_name: &'static str,
    pub family: CurveFamily,
}

impl CurveInfo {
    pub fn params(&self) -> Option<&WeierstrassParams> {
        match &self.family {
            CurveFamily::Weierstrass(params) => Some(params),
            CurveFamily::Edwards => None,
        }
    }

    pub fn is_edwards(&self) -> bool {
        matches!(self.family, CurveFamily::Edwards)
    }
}

pub static SECP256K1: CurveInfo = CurveInfo {
    name: SECP256K1_NAME,
    bip32_name: "Bitcoin seed",
    family: CurveFamily::Weierstrass(WeierstrassParams {
        order: [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c,
            0xd0, 0x36, 0x41, 0x41,
        ],
    }),
};

pub static ED25519: CurveInfo = CurveInfo {
    name: ED25519_NAME,
    bip32_name: "ed25519 seed",
    family: CurveFamily::Edwards,
};

static CURVES: [&CurveInfo; 2] = [&SECP256K1, &ED25519];

pub fn get_curve_by_name(name: &str) -> Result<&'static CurveInfo> {
    CURVES
        .iter()
        .copied()
        .find(|c| c.name == name)
        .ok_or_else(|| HdNodeError::UnknownCurve(name.to_string()))
}
