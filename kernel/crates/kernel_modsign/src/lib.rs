//! Module signature verification.
//!
//! A signed module carries its signature at the end of the image, followed
//! by a fixed trailer and the marker [`MODULE_SIG_STRING`]. Two signature
//! formats exist: a detached PKCS#7 message handed to a [`Pkcs7Verifier`],
//! and the older raw RSA signature whose key is named by an X.509 signer
//! and key id. [`ModuleVerifier`] checks either kind against the trusted
//! and blacklist keyrings, then checks the module hash against a
//! [`HashBlacklist`].

#![no_std]

extern crate alloc;

mod blacklist;
mod crypto;
mod digest;
mod error;
mod keys;
mod trailer;
mod verifier;

pub use blacklist::{BlacklistEntry, HashBlacklist};
pub use crypto::{
    Pkcs7Verifier, PublicKeyVerifier, RsaPkcs1Verifier, VerifyingPurpose, extract_mpi,
};
pub use digest::{Digest, DigestEngine, DigestError, MAX_DIGEST_LEN, SoftwareDigest};
pub use error::{VerifyError, VerifyResult};
pub use keys::{KeyStore, Keyring, KeyringError, PublicKey, key_description, resolve_key};
pub use trailer::{
    HashAlgo, IdType, MODULE_SIG_STRING, ModuleSignature, PkeyAlgo, SignatureInfo, TRAILER_LEN,
    parse as parse_trailer, strip_marker,
};
pub use verifier::{
    ModuleStatus, ModuleVerifier, SigCheckPolicy, VerifiedModule, VerifyState,
};
