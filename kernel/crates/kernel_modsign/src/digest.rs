//! Digest computation for signatures and hash blacklists.

use core::fmt;

use thiserror::Error;

use crate::error::VerifyError;

/// Largest digest any supported algorithm produces.
pub const MAX_DIGEST_LEN: usize = 64;

/// A computed digest of up to [`MAX_DIGEST_LEN`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Digest {
    bytes: [u8; MAX_DIGEST_LEN],
    len: usize,
}

impl Digest {
    /// Returns `None` if `slice` is longer than [`MAX_DIGEST_LEN`].
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let mut bytes = [0u8; MAX_DIGEST_LEN];
        bytes.get_mut(..slice.len())?.copy_from_slice(slice);
        Some(Self {
            bytes,
            len: slice.len(),
        })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exact comparison; a digest of a different length never matches.
    #[must_use]
    pub fn matches(&self, other: &[u8]) -> bool {
        if other.len() != self.len {
            return false;
        }
        // Constant-time over the common length
        let mut result = 0u8;
        for (a, b) in self.as_bytes().iter().zip(other) {
            result |= a ^ b;
        }
        result == 0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The engine has no implementation of the named algorithm.
    #[error("digest algorithm not available")]
    NotSupported,

    #[error("out of memory while hashing")]
    ResourceExhausted,
}

impl From<DigestError> for VerifyError {
    fn from(err: DigestError) -> Self {
        match err {
            DigestError::NotSupported => Self::UnsupportedAlgorithm,
            DigestError::ResourceExhausted => Self::ResourceExhausted,
        }
    }
}

/// Hashes a byte range with an algorithm chosen by name.
pub trait DigestEngine: Send + Sync {
    fn digest(&self, algorithm: &str, data: &[u8]) -> Result<Digest, DigestError>;
}

/// Software implementations from the RustCrypto hash crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareDigest;

impl SoftwareDigest {
    /// Algorithm names this engine understands.
    pub const ALGORITHMS: [&'static str; 9] = [
        "sha1", "sha224", "sha256", "sha384", "sha512", "sha3-224", "sha3-256", "sha3-384",
        "sha3-512",
    ];
}

fn compute<H: sha2::Digest>(data: &[u8]) -> Result<Digest, DigestError> {
    Digest::from_slice(&H::digest(data)).ok_or(DigestError::ResourceExhausted)
}

impl DigestEngine for SoftwareDigest {
    fn digest(&self, algorithm: &str, data: &[u8]) -> Result<Digest, DigestError> {
        match algorithm {
            "sha1" => compute::<sha1::Sha1>(data),
            "sha224" => compute::<sha2::Sha224>(data),
            "sha256" => compute::<sha2::Sha256>(data),
            "sha384" => compute::<sha2::Sha384>(data),
            "sha512" => compute::<sha2::Sha512>(data),
            "sha3-224" => compute::<sha3::Sha3_224>(data),
            "sha3-256" => compute::<sha3::Sha3_256>(data),
            "sha3-384" => compute::<sha3::Sha3_384>(data),
            "sha3-512" => compute::<sha3::Sha3_512>(data),
            _ => {
                log::debug!("no software digest for {algorithm}");
                Err(DigestError::NotSupported)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        let engine = SoftwareDigest;
        let sha256 = engine.digest("sha256", b"abc").unwrap();
        assert_eq!(
            hex::encode(sha256.as_bytes()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let sha1 = engine.digest("sha1", b"abc").unwrap();
        assert_eq!(hex::encode(sha1.as_bytes()), "a9993e364706816aba3e25717850c26c9cd0d89d");
        let sha3 = engine.digest("sha3-256", b"").unwrap();
        assert_eq!(
            hex::encode(sha3.as_bytes()),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn lengths() {
        let engine = SoftwareDigest;
        let expected = [20, 28, 32, 48, 64, 28, 32, 48, 64];
        for (name, len) in SoftwareDigest::ALGORITHMS.iter().zip(expected) {
            assert_eq!(engine.digest(name, b"x").unwrap().len(), len, "{name}");
        }
    }

    #[test]
    fn unknown_algorithm() {
        assert_eq!(SoftwareDigest.digest("md5", b"x"), Err(DigestError::NotSupported));
        assert_eq!(
            VerifyError::from(DigestError::NotSupported),
            VerifyError::UnsupportedAlgorithm
        );
    }

    #[test]
    fn matches_requires_equal_length() {
        let d = Digest::from_slice(&[1, 2, 3, 4]).unwrap();
        assert!(d.matches(&[1, 2, 3, 4]));
        assert!(!d.matches(&[1, 2, 3]));
        assert!(!d.matches(&[1, 2, 3, 4, 0]));
        assert!(!d.matches(&[1, 2, 3, 5]));
        assert!(Digest::from_slice(&[0; 65]).is_none());
    }
}
