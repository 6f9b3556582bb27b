//! Cryptographic primitives for utxochain
//!
//! Signature checking is consumed by the validators through the
//! [`SignatureVerifier`] trait; [`Secp256k1Verifier`] is the default backend.

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};
use std::fmt;

/// Shared secp256k1 context, created on first use.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// SHA-256 of `bytes`. This is the digest that signatures commit to.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Identity of an output's owner: a compressed secp256k1 public key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct OwnerKey(Vec<u8>);

impl OwnerKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        OwnerKey(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerKey({})", self.to_hex())
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Checks a signature made by `owner` over `message`.
///
/// Implementations must be deterministic and free of side effects: the
/// validators call them inline and treat `false` as a rejected input.
pub trait SignatureVerifier {
    fn verify(&self, owner: &OwnerKey, message: &[u8], signature: &[u8]) -> bool;
}

/// ECDSA over secp256k1 with SHA-256 message digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, owner: &OwnerKey, message: &[u8], signature: &[u8]) -> bool {
        verify_signature(owner.as_bytes(), message, signature).is_ok()
    }
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for &V {
    fn verify(&self, owner: &OwnerKey, message: &[u8], signature: &[u8]) -> bool {
        (**self).verify(owner, message, signature)
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Result<Self, ChainError> {
        let secret_key = SecretKey::new(&mut OsRng);
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    /// The owner identity that outputs paying this key carry.
    pub fn owner_key(&self) -> OwnerKey {
        OwnerKey::from_bytes(self.public_key_bytes().to_vec())
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }

    /// Signs the SHA-256 digest of `message` and returns the compact signature.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; COMPACT_SIGNATURE_SIZE], ChainError> {
        let message = Message::from_digest(sha256(message));
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

/// Verifies an ECDSA signature given the raw public key bytes, message, and signature bytes.
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), ChainError> {
    if public_key_bytes.len() != PUBLIC_KEY_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Public key must be exactly {} bytes (compressed), got {}",
            PUBLIC_KEY_SIZE,
            public_key_bytes.len()
        )));
    }
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = PublicKey::from_slice(public_key_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key: {}", e)))?;

    let message = Message::from_digest(sha256(message));

    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| ChainError::CryptoError("Signature verification failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_key_matches_public_key() {
        let keypair = KeyPair::generate().unwrap();
        let owner = keypair.owner_key();
        assert_eq!(owner.as_bytes().len(), PUBLIC_KEY_SIZE);
        assert_eq!(owner.to_hex().len(), PUBLIC_KEY_SIZE * 2);
        assert_eq!(owner.as_bytes(), &keypair.public_key_bytes()[..]);
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate().unwrap();
        let message = b"spend output 0";

        let signature = keypair.sign(message).unwrap();
        assert!(verify_signature(&keypair.public_key_bytes(), message, &signature).is_ok());
        assert!(Secp256k1Verifier.verify(&keypair.owner_key(), message, &signature));
    }

    #[test]
    fn test_invalid_signature() {
        let keypair1 = KeyPair::generate().unwrap();
        let keypair2 = KeyPair::generate().unwrap();

        let message = b"Test message";
        let signature = keypair1.sign(message).unwrap();

        let result = verify_signature(&keypair2.public_key_bytes(), message, &signature);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Cryptographic error: Signature verification failed"
        );
        assert!(!Secp256k1Verifier.verify(&keypair2.owner_key(), message, &signature));
    }

    #[test]
    fn test_tampered_message() {
        let keypair = KeyPair::generate().unwrap();
        let signature = keypair.sign(b"Original message").unwrap();

        assert!(!Secp256k1Verifier.verify(&keypair.owner_key(), b"Tampered message", &signature));
    }

    #[test]
    fn test_malformed_inputs_do_not_verify() {
        let keypair = KeyPair::generate().unwrap();
        let message = b"Test";
        let signature = keypair.sign(message).unwrap();
        let pubkey_bytes = keypair.public_key_bytes();

        let result = verify_signature(&pubkey_bytes[1..], message, &signature);
        assert!(result.unwrap_err().to_string().contains("Public key must be exactly"));

        let result = verify_signature(&pubkey_bytes, message, &signature[1..]);
        assert!(result.unwrap_err().to_string().contains("Signature must be exactly"));

        let garbage = OwnerKey::from_bytes(vec![7u8; 12]);
        assert!(!Secp256k1Verifier.verify(&garbage, message, &signature));
        assert!(!Secp256k1Verifier.verify(&keypair.owner_key(), message, &[]));
    }

    #[test]
    fn test_from_secret_bytes_invalid_length() {
        let short_bytes = [0u8; SECRET_KEY_SIZE - 1];
        let result = KeyPair::from_secret_bytes(&short_bytes);
        assert!(result.unwrap_err().to_string().contains("Secret key must be"));
    }

    #[test]
    fn test_from_secret_bytes_is_deterministic() {
        let a = KeyPair::from_secret_bytes(&[0x11; SECRET_KEY_SIZE]).unwrap();
        let b = KeyPair::from_secret_bytes(&[0x11; SECRET_KEY_SIZE]).unwrap();
        assert_eq!(a.owner_key(), b.owner_key());
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_signature_commits_to_sha256_digest() {
        let keypair = KeyPair::generate().unwrap();
        let signature = keypair.sign(b"payload").unwrap();
        let signature = Signature::from_compact(&signature).unwrap();

        let digest = Message::from_digest(sha256(b"payload"));
        assert!(SECP256K1_CONTEXT
            .verify_ecdsa(&digest, &signature, &keypair.public_key)
            .is_ok());
        let other = Message::from_digest(sha256(b"other"));
        assert!(SECP256K1_CONTEXT
            .verify_ecdsa(&other, &signature, &keypair.public_key)
            .is_err());
    }
}
