//! Module signature verification.

use alloc::sync::Arc;

use crate::blacklist::{self, HashBlacklist};
use crate::crypto::{self, Pkcs7Verifier, PublicKeyVerifier, RsaPkcs1Verifier, VerifyingPurpose};
use crate::digest::{DigestEngine, SoftwareDigest};
use crate::error::{VerifyError, VerifyResult};
use crate::keys::{self, KeyStore, PublicKey};
use crate::trailer::{self, SignatureInfo};

/// How far verification of a module got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerifyState {
    #[default]
    Start,
    TrailerParsed,
    KeyResolved,
    Digested,
    CryptoVerified,
    BlacklistChecked,
    Accepted,
}

#[derive(Debug, Default)]
struct Progress {
    state: VerifyState,
}

impl Progress {
    fn advance(&mut self, next: VerifyState) {
        log::trace!("modsign: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// A module whose signature checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedModule {
    /// Length of the module proper, without any signature data.
    pub content_len: usize,
    /// Key that signed an X.509 identified module.
    pub signer: Option<Arc<PublicKey>>,
}

/// Authenticates signed modules against the system keyrings.
pub struct ModuleVerifier {
    trusted: Arc<dyn KeyStore>,
    blacklist_keys: Option<Arc<dyn KeyStore>>,
    digests: Arc<dyn DigestEngine>,
    public_key: Arc<dyn PublicKeyVerifier>,
    pkcs7: Option<Arc<dyn Pkcs7Verifier>>,
}

impl ModuleVerifier {
    /// A verifier using software digests and RSA PKCS#1 v1.5.
    pub fn new(trusted: Arc<dyn KeyStore>) -> Self {
        Self {
            trusted,
            blacklist_keys: None,
            digests: Arc::new(SoftwareDigest),
            public_key: Arc::new(RsaPkcs1Verifier),
            pkcs7: None,
        }
    }

    #[must_use]
    pub fn with_blacklist_keyring(mut self, keys: Arc<dyn KeyStore>) -> Self {
        self.blacklist_keys = Some(keys);
        self
    }

    #[must_use]
    pub fn with_digest_engine(mut self, digests: Arc<dyn DigestEngine>) -> Self {
        self.digests = digests;
        self
    }

    #[must_use]
    pub fn with_public_key_verifier(mut self, verifier: Arc<dyn PublicKeyVerifier>) -> Self {
        self.public_key = verifier;
        self
    }

    /// Without one, PKCS#7 signed modules are reported as unsupported.
    #[must_use]
    pub fn with_pkcs7_verifier(mut self, verifier: Arc<dyn Pkcs7Verifier>) -> Self {
        self.pkcs7 = Some(verifier);
        self
    }

    /// Verify a complete module image, signature marker included.
    ///
    /// `blacklist` is consulted once the signature itself is good.
    pub fn verify(&self, image: &[u8], blacklist: &HashBlacklist) -> VerifyResult<VerifiedModule> {
        let mut progress = Progress::default();
        let result = self.run(image, blacklist, &mut progress);
        match &result {
            Ok(_) => progress.advance(VerifyState::Accepted),
            Err(err) => log::debug!("modsign: rejected after {:?}: {err}", progress.state),
        }
        result
    }

    fn run(
        &self,
        image: &[u8],
        blacklist: &HashBlacklist,
        progress: &mut Progress,
    ) -> VerifyResult<VerifiedModule> {
        let module = trailer::strip_marker(image).ok_or(VerifyError::NotSigned)?;
        let info = trailer::parse(module)?;
        progress.advance(VerifyState::TrailerParsed);

        match info {
            SignatureInfo::Pkcs7 { content, signature } => {
                let pkcs7 = self.pkcs7.as_ref().ok_or_else(|| {
                    log::error!("no PKCS#7 verifier configured");
                    VerifyError::UnsupportedAlgorithm
                })?;
                pkcs7.verify_data(content, signature, VerifyingPurpose::ModuleSignature)?;
                progress.advance(VerifyState::CryptoVerified);

                blacklist::check_all_entries(blacklist, &*self.digests, image, content)?;
                progress.advance(VerifyState::BlacklistChecked);

                Ok(VerifiedModule {
                    content_len: content.len(),
                    signer: None,
                })
            }
            SignatureInfo::X509 {
                content,
                hash,
                signer,
                key_id,
                signature,
            } => {
                // A rejected or missing key must surface before any digest
                // error the policy could downgrade.
                let key = keys::resolve_key(
                    &*self.trusted,
                    self.blacklist_keys.as_deref(),
                    signer,
                    key_id,
                )?;
                progress.advance(VerifyState::KeyResolved);

                let digest = self.digests.digest(hash.name(), content)?;
                progress.advance(VerifyState::Digested);

                let mpi = crypto::extract_mpi(signature)?;
                self.public_key.verify(&key, hash, &digest, mpi)?;
                progress.advance(VerifyState::CryptoVerified);

                blacklist::check_signed_digest(blacklist, &*self.digests, hash, image, &digest)?;
                progress.advance(VerifyState::BlacklistChecked);

                Ok(VerifiedModule {
                    content_len: content.len(),
                    signer: Some(key),
                })
            }
        }
    }
}

/// Outcome of a load-time signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleStatus {
    Verified(VerifiedModule),
    /// Admitted without a valid signature; the kernel is tainted.
    Unverified(VerifyError),
}

/// Whether unsigned modules may load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SigCheckPolicy {
    pub enforce: bool,
}

impl SigCheckPolicy {
    #[must_use]
    pub const fn enforcing() -> Self {
        Self { enforce: true }
    }

    /// Check `image` and decide whether it may load.
    ///
    /// Without enforcement a module that is unsigned, or signed with a key
    /// or algorithm this system does not know, loads unverified. A module
    /// that is malformed, blacklisted or carries a bad signature never
    /// loads.
    pub fn check(
        &self,
        verifier: &ModuleVerifier,
        image: &[u8],
        blacklist: &HashBlacklist,
    ) -> VerifyResult<ModuleStatus> {
        match verifier.verify(image, blacklist) {
            Ok(verified) => Ok(ModuleStatus::Verified(verified)),
            Err(
                err @ (VerifyError::NotSigned
                | VerifyError::NoSuchKey
                | VerifyError::UnsupportedAlgorithm),
            ) if !self.enforce => {
                log::warn!("module verification failed: {err} - tainting kernel");
                Ok(ModuleStatus::Unverified(err))
            }
            Err(err) => {
                log::error!("module verification failed: {err}");
                Err(err)
            }
        }
    }
}
