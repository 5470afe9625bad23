//! Module hash blacklist.
//!
//! The blacklist is a snapshot owned by the caller. Updating it is an
//! administrative operation outside of verification.

use alloc::string::String;
use alloc::vec::Vec;

use crate::digest::{Digest, DigestEngine, DigestError};
use crate::error::{VerifyError, VerifyResult};
use crate::trailer::HashAlgo;

/// A forbidden module digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEntry {
    algorithm: String,
    digest: Vec<u8>,
}

impl BlacklistEntry {
    pub fn new(algorithm: impl Into<String>, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest: digest.into(),
        }
    }

    /// Entry from a hex digest in either case.
    pub fn from_hex(algorithm: impl Into<String>, digest: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self::new(algorithm, hex::decode(digest)?))
    }

    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashBlacklist {
    entries: Vec<BlacklistEntry>,
}

impl HashBlacklist {
    #[must_use]
    pub fn new(entries: Vec<BlacklistEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: BlacklistEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlacklistEntry> {
        self.entries.iter()
    }

    /// First entry for `algorithm` whose digest equals `digest`.
    #[must_use]
    pub fn find(&self, algorithm: &str, digest: &Digest) -> Option<&BlacklistEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.algorithm == algorithm)
            .find(|entry| digest.matches(&entry.digest))
    }
}

impl FromIterator<BlacklistEntry> for HashBlacklist {
    fn from_iter<I: IntoIterator<Item = BlacklistEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn log_hit(entry: &BlacklistEntry) {
    log::info!(
        "module hash is in the module hash blacklist: {}",
        hex::encode(entry.digest())
    );
}

/// Check used for X.509 identified signatures.
///
/// Only entries for the signature's own hash are considered. The first hit
/// ends the check.
///
/// The whole file is deliberately checked before the already computed
/// content digest. Either order rejects the same modules; whole-file first
/// means a match there never reaches the content comparison, which
/// `hash_blacklist_on_whole_image_short_circuits` relies on. Do not swap
/// the two lookups.
pub(crate) fn check_signed_digest(
    blacklist: &HashBlacklist,
    engine: &dyn DigestEngine,
    hash: HashAlgo,
    whole: &[u8],
    content_digest: &Digest,
) -> VerifyResult<()> {
    if blacklist.is_empty() {
        return Ok(());
    }

    match engine.digest(hash.name(), whole) {
        Ok(digest) => {
            if let Some(entry) = blacklist.find(hash.name(), &digest) {
                log_hit(entry);
                return Err(VerifyError::KeyRejected);
            }
        }
        Err(DigestError::NotSupported) => {}
        Err(err) => return Err(err.into()),
    }

    if let Some(entry) = blacklist.find(hash.name(), content_digest) {
        log_hit(entry);
        return Err(VerifyError::KeyRejected);
    }
    Ok(())
}

/// Check used for PKCS#7 signatures.
///
/// Every entry is hashed with its own algorithm over both the whole file
/// and the content, whatever earlier entries found. Entries whose
/// algorithm the engine lacks are skipped.
pub(crate) fn check_all_entries(
    blacklist: &HashBlacklist,
    engine: &dyn DigestEngine,
    whole: &[u8],
    content: &[u8],
) -> VerifyResult<()> {
    let mut rejected = false;
    let mut failure = None;

    for entry in blacklist.iter() {
        for framing in [whole, content] {
            match engine.digest(entry.algorithm(), framing) {
                Ok(digest) if digest.matches(entry.digest()) => {
                    log_hit(entry);
                    rejected = true;
                }
                Ok(_) | Err(DigestError::NotSupported) => {}
                Err(err) => {
                    log::error!("blacklist digest {} failed: {err}", entry.algorithm());
                    failure.get_or_insert(VerifyError::from(err));
                }
            }
        }
    }

    if rejected {
        return Err(VerifyError::KeyRejected);
    }
    failure.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::digest::SoftwareDigest;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl DigestEngine for Counting {
        fn digest(&self, algorithm: &str, data: &[u8]) -> Result<Digest, DigestError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            SoftwareDigest.digest(algorithm, data)
        }
    }

    struct Exhausted;

    impl DigestEngine for Exhausted {
        fn digest(&self, _: &str, _: &[u8]) -> Result<Digest, DigestError> {
            Err(DigestError::ResourceExhausted)
        }
    }

    fn sha256(data: &[u8]) -> Digest {
        SoftwareDigest.digest("sha256", data).unwrap()
    }

    fn entry(algorithm: &str, data: &[u8]) -> BlacklistEntry {
        let digest = SoftwareDigest.digest(algorithm, data).unwrap();
        BlacklistEntry::new(algorithm, digest.as_bytes())
    }

    #[test]
    fn hex_entries() {
        let lower =
            BlacklistEntry::from_hex("sha1", "a9993e364706816aba3e25717850c26c9cd0d89d").unwrap();
        let upper =
            BlacklistEntry::from_hex("sha1", "A9993E364706816ABA3E25717850C26C9CD0D89D").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, entry("sha1", b"abc"));
        assert!(BlacklistEntry::from_hex("sha1", "xyz").is_err());
    }

    #[test]
    fn find_matches_algorithm_then_bytes() {
        let blacklist: HashBlacklist = [entry("sha1", b"abc"), entry("sha256", b"abc")]
            .into_iter()
            .collect();
        assert!(blacklist.find("sha256", &sha256(b"abc")).is_some());
        assert!(blacklist.find("sha512", &sha256(b"abc")).is_none());
        assert!(blacklist.find("sha256", &sha256(b"abd")).is_none());
    }

    #[test]
    fn signed_digest_empty_list_does_no_work() {
        let engine = Counting::default();
        let result = check_signed_digest(
            &HashBlacklist::default(),
            &engine,
            HashAlgo::Sha256,
            b"whole",
            &sha256(b"content"),
        );
        assert_eq!(result, Ok(()));
        assert_eq!(engine.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn signed_digest_checks_whole_then_content() {
        let engine = Counting::default();
        let content = sha256(b"content");

        let whole_hit: HashBlacklist = [entry("sha256", b"whole")].into_iter().collect();
        assert_eq!(
            check_signed_digest(&whole_hit, &engine, HashAlgo::Sha256, b"whole", &content),
            Err(VerifyError::KeyRejected)
        );

        let content_hit: HashBlacklist = [entry("sha256", b"content")].into_iter().collect();
        assert_eq!(
            check_signed_digest(&content_hit, &engine, HashAlgo::Sha256, b"whole", &content),
            Err(VerifyError::KeyRejected)
        );

        // other algorithms are never consulted
        let other: HashBlacklist = [entry("sha1", b"whole"), entry("sha1", b"content")]
            .into_iter()
            .collect();
        assert_eq!(
            check_signed_digest(&other, &engine, HashAlgo::Sha256, b"whole", &content),
            Ok(())
        );

        // one digest per call, however long the list
        assert_eq!(engine.calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn signed_digest_resource_failure() {
        let blacklist: HashBlacklist = [entry("sha256", b"x")].into_iter().collect();
        assert_eq!(
            check_signed_digest(&blacklist, &Exhausted, HashAlgo::Sha256, b"w", &sha256(b"c")),
            Err(VerifyError::ResourceExhausted)
        );
    }

    #[test]
    fn all_entries_hashes_every_entry_twice() {
        let engine = Counting::default();
        let blacklist: HashBlacklist = [
            entry("sha256", b"whole"),
            entry("sha1", b"nothing"),
            entry("sha3-256", b"content"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            check_all_entries(&blacklist, &engine, b"whole", b"content"),
            Err(VerifyError::KeyRejected)
        );
        assert_eq!(engine.calls.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn all_entries_match_is_not_forgotten() {
        // a later clean entry must not clear an earlier hit
        let blacklist: HashBlacklist = [entry("sha256", b"content"), entry("sha256", b"other")]
            .into_iter()
            .collect();
        assert_eq!(
            check_all_entries(&blacklist, &SoftwareDigest, b"whole", b"content"),
            Err(VerifyError::KeyRejected)
        );
    }

    #[test]
    fn all_entries_skips_unknown_algorithms() {
        let blacklist: HashBlacklist =
            [BlacklistEntry::new("md5", [0u8; 16])].into_iter().collect();
        assert_eq!(check_all_entries(&blacklist, &SoftwareDigest, b"w", b"c"), Ok(()));
        assert_eq!(
            check_all_entries(&blacklist, &Exhausted, b"w", b"c"),
            Err(VerifyError::ResourceExhausted)
        );
    }
}
