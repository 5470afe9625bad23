//! Public-key signature checks.

use alloc::vec;

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPublicKey};

use crate::digest::Digest;
use crate::error::{VerifyError, VerifyResult};
use crate::keys::PublicKey;
use crate::trailer::HashAlgo;

/// Why a detached signature is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum VerifyingPurpose {
    ModuleSignature,
}

/// Checks a signature over an already computed digest.
pub trait PublicKeyVerifier: Send + Sync {
    fn verify(
        &self,
        key: &PublicKey,
        hash: HashAlgo,
        digest: &Digest,
        signature: &[u8],
    ) -> VerifyResult<()>;
}

/// Checks a detached PKCS#7 message against the system trusted keys.
///
/// Errors are passed back to the loader unchanged.
pub trait Pkcs7Verifier: Send + Sync {
    fn verify_data(
        &self,
        content: &[u8],
        signature: &[u8],
        purpose: VerifyingPurpose,
    ) -> VerifyResult<()>;
}

/// Split the single RSA MPI out of a signature payload.
///
/// The MPI is prefixed by its size in bytes as a big-endian `u16`, which
/// must account for exactly the rest of the payload.
pub fn extract_mpi(payload: &[u8]) -> VerifyResult<&[u8]> {
    if payload.len() < 3 {
        return Err(VerifyError::Malformed);
    }
    let (len, mpi) = payload.split_at(2);
    if usize::from(u16::from_be_bytes([len[0], len[1]])) != mpi.len() {
        return Err(VerifyError::Malformed);
    }
    Ok(mpi)
}

/// RSASSA-PKCS1-v1_5 over PKCS#1 DER encoded public keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaPkcs1Verifier;

impl RsaPkcs1Verifier {
    fn scheme(hash: HashAlgo) -> VerifyResult<Pkcs1v15Sign> {
        Ok(match hash {
            HashAlgo::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
            HashAlgo::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
            HashAlgo::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
            HashAlgo::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
            HashAlgo::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
            _ => return Err(VerifyError::UnsupportedAlgorithm),
        })
    }
}

impl PublicKeyVerifier for RsaPkcs1Verifier {
    fn verify(
        &self,
        key: &PublicKey,
        hash: HashAlgo,
        digest: &Digest,
        signature: &[u8],
    ) -> VerifyResult<()> {
        let scheme = Self::scheme(hash)?;
        let rsa = RsaPublicKey::from_pkcs1_der(key.material()).map_err(|err| {
            log::warn!("key '{}' is not a PKCS#1 RSA key: {err}", key.description());
            VerifyError::CryptoVerificationFailed
        })?;

        // An MPI drops leading zero bytes; the primitive wants the full
        // modulus width.
        let size = rsa.size();
        if signature.len() > size {
            return Err(VerifyError::CryptoVerificationFailed);
        }
        let mut padded = vec![0u8; size];
        padded[size - signature.len()..].copy_from_slice(signature);

        rsa.verify(scheme, digest.as_bytes(), &padded).map_err(|_| {
            log::debug!("RSA signature mismatch for key '{}'", key.description());
            VerifyError::CryptoVerificationFailed
        })
    }
}
