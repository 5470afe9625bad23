//! Module verification errors.

use kernel_abi::{EBADMSG, EKEYREJECTED, ENOKEY, ENOMEM, ENOPKG, Errno};
use thiserror::Error;

use crate::keys::KeyringError;

/// Result type for verification.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Why a module was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Trailer fields are inconsistent with the blob length.
    #[error("malformed module signature")]
    Malformed,

    /// Unknown key-id type, public-key algorithm or hash.
    #[error("unsupported signature or hash algorithm")]
    UnsupportedAlgorithm,

    /// The signing key is not in the trusted keyring.
    #[error("signing key not found")]
    NoSuchKey,

    /// The signing key or a module hash is blacklisted.
    #[error("module key or hash is blacklisted")]
    KeyRejected,

    #[error("signature verification failed")]
    CryptoVerificationFailed,

    #[error("out of memory during verification")]
    ResourceExhausted,

    /// The signature marker is missing.
    #[error("module is not signed")]
    NotSigned,

    /// The trusted keyring failed in a way that is reported as-is.
    #[error("key lookup failed: {0}")]
    KeyLookup(KeyringError),
}

impl VerifyError {
    #[must_use]
    pub fn errno(self) -> Errno {
        match self {
            Self::Malformed => EBADMSG,
            Self::UnsupportedAlgorithm => ENOPKG,
            Self::NoSuchKey | Self::NotSigned => ENOKEY,
            Self::KeyRejected | Self::CryptoVerificationFailed => EKEYREJECTED,
            Self::ResourceExhausted => ENOMEM,
            Self::KeyLookup(err) => err.errno(),
        }
    }
}

impl From<VerifyError> for Errno {
    fn from(err: VerifyError) -> Self {
        err.errno()
    }
}
