//! Schnorr key management for account signers
//!
//! Provides key pair generation, signing, and verification using
//! BIP-340 style Schnorr signatures over secp256k1. The x-only public
//! key doubles as the signer identifier, and signatures are handled as
//! their 32-byte `r` and `s` halves.

use crate::core::{FieldElement, SignerId};
use rand::rngs::OsRng;
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message, Secp256k1, SecretKey, XOnlyPublicKey};
use thiserror::Error;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A signing key pair whose x-only public key is the signer identifier
#[derive(Clone)]
pub struct SignerKeyPair {
    keypair: Keypair,
}

impl SignerKeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, _) = secp.generate_keypair(&mut OsRng);
        Self {
            keypair: Keypair::from_secret_key(&secp, &secret_key),
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secp = Secp256k1::new();
        Ok(Self {
            keypair: Keypair::from_secret_key(&secp, &secret_key),
        })
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.keypair.secret_bytes())
    }

    /// The signer identifier: the x-only public key as a field value
    pub fn signer_id(&self) -> SignerId {
        let (xonly, _parity) = self.keypair.x_only_public_key();
        FieldElement::from_bytes(xonly.serialize())
    }

    /// Sign a 32-byte message hash, returning the signature split into
    /// its `r` and `s` components
    pub fn sign(&self, message_hash: &FieldElement) -> Result<(FieldElement, FieldElement), KeyError> {
        let secp = Secp256k1::new();
        let message = Message::from_digest_slice(message_hash.as_bytes())?;
        let signature = secp.sign_schnorr(&message, &self.keypair);
        let bytes = signature.serialize();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok((FieldElement::from_bytes(r), FieldElement::from_bytes(s)))
    }
}

/// Verify a Schnorr signature against a signer identifier.
///
/// Malformed signer identifiers or signature components count as
/// verification failure rather than errors, matching the host primitive
/// contract `verify(hash, pubkey, r, s) -> bool`.
pub fn verify_signature(
    signer: SignerId,
    message_hash: &FieldElement,
    r: &FieldElement,
    s: &FieldElement,
) -> bool {
    let secp = Secp256k1::verification_only();

    let pubkey = match XOnlyPublicKey::from_slice(signer.as_bytes()) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(r.as_bytes());
    sig_bytes[32..].copy_from_slice(s.as_bytes());
    let signature = match Signature::from_slice(&sig_bytes) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let message = match Message::from_digest_slice(message_hash.as_bytes()) {
        Ok(msg) => msg,
        Err(_) => return false,
    };

    secp.verify_schnorr(&signature, &message, &pubkey).is_ok()
}
