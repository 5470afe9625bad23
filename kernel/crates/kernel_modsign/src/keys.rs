//! Key stores and signing key resolution.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use kernel_abi::{EACCES, EAGAIN, EKEYEXPIRED, EKEYREVOKED, ENOKEY, ENOTDIR, Errno};
use spin::RwLock;
use thiserror::Error;

use crate::error::{VerifyError, VerifyResult};

/// An asymmetric public key as held by a keyring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    description: String,
    material: Vec<u8>,
}

impl PublicKey {
    /// `material` is the DER encoding understood by the configured
    /// [`PublicKeyVerifier`](crate::PublicKeyVerifier); PKCS#1 for RSA.
    pub fn new(description: impl Into<String>, material: impl Into<Vec<u8>>) -> Self {
        Self {
            description: description.into(),
            material: material.into(),
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn material(&self) -> &[u8] {
        &self.material
    }
}

/// Failures reported by a key store search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyringError {
    #[error("key not found")]
    NotFound,
    #[error("permission denied")]
    AccessDenied,
    #[error("not a keyring")]
    NotAKeyring,
    #[error("try again")]
    TryAgain,
    #[error("key has been revoked")]
    Revoked,
    #[error("key has expired")]
    Expired,
}

impl KeyringError {
    #[must_use]
    pub fn errno(self) -> Errno {
        match self {
            Self::NotFound => ENOKEY,
            Self::AccessDenied => EACCES,
            Self::NotAKeyring => ENOTDIR,
            Self::TryAgain => EAGAIN,
            Self::Revoked => EKEYREVOKED,
            Self::Expired => EKEYEXPIRED,
        }
    }
}

/// Lookup of asymmetric keys by description.
pub trait KeyStore: Send + Sync {
    fn search(&self, description: &str) -> Result<Arc<PublicKey>, KeyringError>;
}

struct Entry {
    key: Arc<PublicKey>,
    revoked: bool,
}

/// A named in-memory keyring.
///
/// Keys are indexed by description. A revoked key stays in the ring and is
/// reported as [`KeyringError::Revoked`] until removed.
pub struct Keyring {
    name: &'static str,
    keys: RwLock<BTreeMap<String, Entry>>,
    fault: RwLock<Option<KeyringError>>,
}

impl Keyring {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            keys: RwLock::new(BTreeMap::new()),
            fault: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add or replace a key, returning the key it replaced.
    pub fn insert(&self, key: PublicKey) -> Option<Arc<PublicKey>> {
        log::debug!("{}: adding key '{}'", self.name, key.description());
        let description = key.description().to_string();
        let entry = Entry {
            key: Arc::new(key),
            revoked: false,
        };
        self.keys.write().insert(description, entry).map(|old| old.key)
    }

    pub fn remove(&self, description: &str) -> Option<Arc<PublicKey>> {
        self.keys.write().remove(description).map(|old| old.key)
    }

    /// Mark a key revoked. Returns `false` if no such key is held.
    pub fn revoke(&self, description: &str) -> bool {
        match self.keys.write().get_mut(description) {
            Some(entry) => {
                log::info!("{}: revoking key '{}'", self.name, description);
                entry.revoked = true;
                true
            }
            None => false,
        }
    }

    /// Make every following search fail with `fault` until cleared with
    /// `None`.
    pub fn set_fault(&self, fault: Option<KeyringError>) {
        *self.fault.write() = fault;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl KeyStore for Keyring {
    fn search(&self, description: &str) -> Result<Arc<PublicKey>, KeyringError> {
        if let Some(fault) = *self.fault.read() {
            return Err(fault);
        }
        match self.keys.read().get(description) {
            Some(entry) if entry.revoked => Err(KeyringError::Revoked),
            Some(entry) => Ok(Arc::clone(&entry.key)),
            None => Err(KeyringError::NotFound),
        }
    }
}

/// Description a signing key is filed under: `"<signer>: <hex key id>"`.
#[must_use]
pub fn key_description(signer: &[u8], key_id: &[u8]) -> String {
    let mut description = String::from_utf8_lossy(signer).into_owned();
    description.push_str(": ");
    description.push_str(&hex::encode(key_id));
    description
}

/// Find the key that signed a module.
///
/// A key present in the blacklist keyring is refused outright. Lookup
/// failures that would reveal keyring internals are reported as a missing
/// key.
pub fn resolve_key(
    trusted: &dyn KeyStore,
    blacklist: Option<&dyn KeyStore>,
    signer: &[u8],
    key_id: &[u8],
) -> VerifyResult<Arc<PublicKey>> {
    let description = key_description(signer, key_id);
    log::debug!("look up: \"{description}\"");

    if blacklist.is_some_and(|keys| keys.search(&description).is_ok()) {
        log::error!("module key '{description}' is in blacklist");
        return Err(VerifyError::KeyRejected);
    }

    trusted.search(&description).map_err(|err| match err {
        KeyringError::NotFound
        | KeyringError::AccessDenied
        | KeyringError::NotAKeyring
        | KeyringError::TryAgain => {
            log::debug!("request for unknown module key '{description}' err {err}");
            VerifyError::NoSuchKey
        }
        other => VerifyError::KeyLookup(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_format() {
        assert_eq!(
            key_description(b"Build time autogenerated kernel key", &[0xde, 0xad, 0x0b, 0xef]),
            "Build time autogenerated kernel key: dead0bef"
        );
        assert_eq!(key_description(b"x", &[]), "x: ");
    }

    #[test]
    fn keyring_lookup_and_revocation() {
        let ring = Keyring::new(".test");
        assert!(ring.insert(PublicKey::new("a: 01", [1u8])).is_none());
        assert_eq!(ring.search("a: 01").unwrap().material(), &[1]);
        assert_eq!(ring.search("a: 02"), Err(KeyringError::NotFound));

        assert!(ring.revoke("a: 01"));
        assert!(!ring.revoke("a: 02"));
        assert_eq!(ring.search("a: 01"), Err(KeyringError::Revoked));

        assert!(ring.remove("a: 01").is_some());
        assert!(ring.is_empty());
    }

    #[test]
    fn injected_faults() {
        let ring = Keyring::new(".test");
        ring.insert(PublicKey::new("a: 01", [1u8]));
        ring.set_fault(Some(KeyringError::TryAgain));
        assert_eq!(ring.search("a: 01"), Err(KeyringError::TryAgain));
        ring.set_fault(None);
        assert!(ring.search("a: 01").is_ok());
    }

    #[test]
    fn blacklist_wins_over_trusted() {
        let trusted = Keyring::new(".system_keyring");
        let blacklist = Keyring::new(".system_blacklist_keyring");
        trusted.insert(PublicKey::new("s: 0a", [1u8]));
        blacklist.insert(PublicKey::new("s: 0a", [1u8]));

        assert_eq!(
            resolve_key(&trusted, Some(&blacklist), b"s", &[0x0a]),
            Err(VerifyError::KeyRejected)
        );
        assert!(resolve_key(&trusted, None, b"s", &[0x0a]).is_ok());
    }

    #[test]
    fn blacklist_errors_are_ignored() {
        let trusted = Keyring::new(".system_keyring");
        let blacklist = Keyring::new(".system_blacklist_keyring");
        trusted.insert(PublicKey::new("s: 0a", [1u8]));
        blacklist.set_fault(Some(KeyringError::AccessDenied));

        assert!(resolve_key(&trusted, Some(&blacklist), b"s", &[0x0a]).is_ok());
    }

    #[test]
    fn trusted_errors_are_normalized() {
        let trusted = Keyring::new(".system_keyring");
        for fault in [
            KeyringError::NotFound,
            KeyringError::AccessDenied,
            KeyringError::NotAKeyring,
            KeyringError::TryAgain,
        ] {
            trusted.set_fault(Some(fault));
            assert_eq!(resolve_key(&trusted, None, b"s", &[1]), Err(VerifyError::NoSuchKey));
        }
        for fault in [KeyringError::Revoked, KeyringError::Expired] {
            trusted.set_fault(Some(fault));
            assert_eq!(
                resolve_key(&trusted, None, b"s", &[1]),
                Err(VerifyError::KeyLookup(fault))
            );
        }
    }
}
