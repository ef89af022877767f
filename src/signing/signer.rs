//! RSA/SHA-256 signing of encoded readings
use log::debug;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, PKeyRef, Private, Public};
use openssl::sign::{Signer as OpensslSigner, Verifier};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SignError;

/// Load a PEM-encoded private key (PKCS#1 or PKCS#8, unencrypted)
pub fn load_private_key(path: &Path) -> Result<PKey<Private>, SignError> {
    let pem = fs::read(path).map_err(|source| SignError::KeyNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    PKey::private_key_from_pem(&pem).map_err(|source| SignError::KeyParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a PEM-encoded public key, as a receiver would
pub fn load_public_key(path: &Path) -> Result<PKey<Public>, SignError> {
    let pem = fs::read(path).map_err(|source| SignError::KeyNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    PKey::public_key_from_pem(&pem).map_err(|source| SignError::KeyParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Sign `message` with SHA-256 and the key's default padding
/// (PKCS#1 v1.5 for RSA keys)
///
/// The signature length equals the key's modulus size, 256 bytes for
/// RSA-2048.
pub fn sign_with_key(key: &PKeyRef<Private>, message: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut signer = OpensslSigner::new(MessageDigest::sha256(), key)?;
    signer.update(message)?;
    Ok(signer.sign_to_vec()?)
}

/// Load the key at `key_path` and sign `message` with it
pub fn sign(key_path: &Path, message: &[u8]) -> Result<Vec<u8>, SignError> {
    let key = load_private_key(key_path)?;
    sign_with_key(&key, message)
}

/// Check `signature` over `message` with the sender's public key
///
/// Returns Ok(false) for a signature that does not match.
pub fn verify(
    key: &PKeyRef<Public>,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, SignError> {
    let mut verifier = Verifier::new(MessageDigest::sha256(), key)?;
    verifier.update(message)?;
    Ok(verifier.verify(signature)?)
}

/// When the signer reads the key file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Read and parse the key file on every signature
    #[default]
    ReloadEachSign,
    /// Parse once on first use and keep the key in memory
    Cached,
}

/// Signs messages with the private key at a fixed location
pub struct Signer {
    key_path: PathBuf,
    policy: KeyPolicy,
    cached: Option<PKey<Private>>,
}

impl Signer {
    pub fn new(key_path: impl Into<PathBuf>, policy: KeyPolicy) -> Self {
        Self {
            key_path: key_path.into(),
            policy,
            cached: None,
        }
    }

    pub fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>, SignError> {
        match self.policy {
            KeyPolicy::ReloadEachSign => sign(&self.key_path, message),
            KeyPolicy::Cached => {
                let key = match self.cached.take() {
                    Some(key) => key,
                    None => {
                        let key = load_private_key(&self.key_path)?;
                        debug!(
                            "Loaded {}-bit private key from {}",
                            key.bits(),
                            self.key_path.display()
                        );
                        key
                    }
                };
                let key = self.cached.insert(key);
                let signature = sign_with_key(key, message);
                if signature.is_err() {
                    self.invalidate();
                }
                signature
            }
        }
    }

    /// Drop any cached key so the next signature rereads the file
    fn invalidate(&mut self) {
        self.cached = None;
    }
}
