//! Signing with a node's private key.
//!
//! Weierstrass nodes produce compact recoverable ECDSA signatures over a SHA-256
//! digest. Edwards nodes produce Ed25519 signatures; the recovery byte is
//! always 0 for them and carries no meaning.

use crate::{
    curve::CurveFamily,
    error::{HdNodeError, Result},
    node::HdNode,
};
use crypto_utils::hash::sha256;
use ed25519_dalek::{Signer as _, SigningKey};
use secp256k1::{Message, SECP256K1};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// `r ‖ s` for ECDSA, `R ‖ S` for Ed25519.
    pub bytes: [u8; 64],
    /// ECDSA public key recovery id (0..=3).
    pub recovery_id: u8,
}

impl HdNode {
    /// Sign `message`.
    ///
    /// ECDSA signs `SHA-256(message)`; Ed25519 signs the message itself, the
    /// scheme hashes internally.
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        if !self.has_private_key() {
            return Err(HdNodeError::NoPrivateKey);
        }
        match self.curve.family {
            CurveFamily::Weierstrass(_) => self.sign_digest(&sha256(message)),
            CurveFamily::Edwards => self.sign_ed25519(message),
        }
    }

    /// Sign a 32-byte digest. Ed25519 treats the digest as the message.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature> {
        if !self.has_private_key() {
            return Err(HdNodeError::NoPrivateKey);
        }
        match self.curve.family {
            CurveFamily::Weierstrass(_) => {
                let sk = self.secret_key()?;
                let msg = Message::from_slice(digest)?;
                let (recovery_id, bytes) = SECP256K1
                    .sign_ecdsa_recoverable(&msg, &sk)
                    .serialize_compact();
                Ok(Signature {
                    bytes,
                    recovery_id: recovery_id.to_i32() as u8,
                })
            }
            CurveFamily::Edwards => self.sign_ed25519(digest),
        }
    }

    fn sign_ed25519(&self, message: &[u8]) -> Result<Signature> {
        let sk = SigningKey::from_bytes(&self.private_key);
        let sig = sk.try_sign(message)?;
        Ok(Signature {
            bytes: sig.to_bytes(),
            recovery_id: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Verifier as _, VerifyingKey};
    use hex_literal::hex;
    use secp256k1::{
        PublicKey,
        ecdsa::{RecoverableSignature, RecoveryId},
    };

    const SEED1: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");

    #[test]
    fn ecdsa_signature_recovers_node_key() {
        let mut node = HdNode::from_seed(&SEED1, "secp256k1").unwrap();
        node.private_ckd_prime(0).unwrap();

        let sig = node.sign(b"hello").unwrap();
        let digest = sha256(b"hello");
        assert_eq!(sig, node.sign_digest(&digest).unwrap(), "RFC6979 is deterministic");

        let recoverable = RecoverableSignature::from_compact(
            &sig.bytes,
            RecoveryId::from_i32(sig.recovery_id as i32).unwrap(),
        )
        .unwrap();
        let msg = Message::from_slice(&digest).unwrap();
        let recovered = SECP256K1.recover_ecdsa(&msg, &recoverable).unwrap();
        assert_eq!(recovered, PublicKey::from_slice(&node.public_key).unwrap());

        SECP256K1
            .verify_ecdsa(&msg, &recoverable.to_standard(), &recovered)
            .unwrap();
    }

    #[test]
    fn ed25519_signature_verifies() {
        let mut node = HdNode::from_seed(&SEED1, "ed25519").unwrap();
        node.private_ckd_prime(7).unwrap();

        let sig = node.sign(b"hello").unwrap();
        assert_eq!(sig.recovery_id, 0);

        let vk = VerifyingKey::from_bytes(node.public_key[1..].try_into().unwrap()).unwrap();
        let parsed = ed25519_dalek::Signature::from_bytes(&sig.bytes);
        vk.verify(b"hello", &parsed).unwrap();
        assert!(vk.verify(b"hellO", &parsed).is_err());

        let digest = [0x5a; 32];
        let sig = node.sign_digest(&digest).unwrap();
        vk.verify(&digest, &ed25519_dalek::Signature::from_bytes(&sig.bytes))
            .unwrap();
    }

    #[test]
    fn public_only_node_cannot_sign() {
        for curve in ["secp256k1", "ed25519"] {
            let mut node = HdNode::from_seed(&SEED1, curve).unwrap();
            node.neuter();
            assert!(matches!(node.sign(b"x"), Err(HdNodeError::NoPrivateKey)));
            assert!(matches!(
                node.sign_digest(&[1; 32]),
                Err(HdNodeError::NoPrivateKey)
            ));
        }
    }
}
