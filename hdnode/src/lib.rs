//! Hierarchical deterministic key derivation over secp256k1 and ed25519.
//!
//! A [`HdNode`] is created from a seed ([`HdNode::from_seed`]) or an extended
//! key ([`HdNode::deserialize`]), walked down the tree in place with
//! [`HdNode::private_ckd`] / [`HdNode::public_ckd`], then serialized or used to
//! sign. Ed25519 nodes only support hardened private derivation.

pub mod address;
#[cfg(feature = "cache")]
pub mod cache;
pub mod ckd;
pub mod curve;
pub mod derivation;
pub mod error;
pub mod extended_key;
pub mod node;
pub mod sign;

#[cfg(feature = "cache")]
pub use cache::{CacheConfig, DerivationCache};
pub use curve::{CurveFamily, CurveInfo, get_curve_by_name};
pub use derivation::DerivationPath;
pub use error::{HdNodeError, Result};
pub use extended_key::{KeyKind, Network};
pub use node::{HARDENED_OFFSET, HdNode};
pub use sign::Signature;
