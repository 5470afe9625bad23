//! Module signature trailer.
//!
//! A signed module is laid out as
//!
//! ```text
//! [ content ][ signer ][ key id ][ signature ][ trailer ][ marker ]
//! ```
//!
//! where signer and key id are only present for X.509 identified keys and
//! the trailer is a fixed 12 byte [`ModuleSignature`]. All lengths in the
//! trailer are untrusted.

use core::mem::size_of;

use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{VerifyError, VerifyResult};

/// Marker appended after the trailer of every signed module.
pub const MODULE_SIG_STRING: &[u8] = b"~Module signature appended~\n";

/// Size of [`ModuleSignature`] on the wire.
pub const TRAILER_LEN: usize = size_of::<ModuleSignature>();

/// Fixed trailer placed just before [`MODULE_SIG_STRING`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct ModuleSignature {
    /// Public-key algorithm.
    pub algo: u8,
    /// Digest algorithm.
    pub hash: u8,
    /// Key identifier type.
    pub id_type: u8,
    pub signer_len: u8,
    pub key_id_len: u8,
    pub pad: [u8; 3],
    pub sig_len: U32,
}

impl ModuleSignature {
    /// Trailer of a PKCS#7 signed module: everything but the length is zero.
    #[must_use]
    pub fn pkcs7(sig_len: u32) -> Self {
        Self {
            algo: 0,
            hash: 0,
            id_type: IdType::Pkcs7 as u8,
            signer_len: 0,
            key_id_len: 0,
            pad: [0; 3],
            sig_len: U32::new(sig_len),
        }
    }

    /// Trailer of an RSA signature identified by X.509 signer and key id.
    #[must_use]
    pub fn x509(hash: HashAlgo, signer_len: u8, key_id_len: u8, sig_len: u32) -> Self {
        Self {
            algo: PkeyAlgo::Rsa as u8,
            hash: hash as u8,
            id_type: IdType::X509 as u8,
            signer_len,
            key_id_len,
            pad: [0; 3],
            sig_len: U32::new(sig_len),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IdType {
    Pgp = 0,
    X509 = 1,
    Pkcs7 = 2,
}

impl TryFrom<u8> for IdType {
    type Error = VerifyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pgp),
            1 => Ok(Self::X509),
            2 => Ok(Self::Pkcs7),
            _ => Err(VerifyError::UnsupportedAlgorithm),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PkeyAlgo {
    Dsa = 0,
    Rsa = 1,
}

/// Digest algorithms in the kernel's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HashAlgo {
    Md4 = 0,
    Md5 = 1,
    Sha1 = 2,
    RipeMd160 = 3,
    Sha256 = 4,
    Sha384 = 5,
    Sha512 = 6,
    Sha224 = 7,
    RipeMd128 = 8,
    RipeMd256 = 9,
    RipeMd320 = 10,
    Wp256 = 11,
    Wp384 = 12,
    Wp512 = 13,
    Tgr128 = 14,
    Tgr160 = 15,
    Tgr192 = 16,
}

impl HashAlgo {
    const ALL: [Self; 17] = [
        Self::Md4,
        Self::Md5,
        Self::Sha1,
        Self::RipeMd160,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha224,
        Self::RipeMd128,
        Self::RipeMd256,
        Self::RipeMd320,
        Self::Wp256,
        Self::Wp384,
        Self::Wp512,
        Self::Tgr128,
        Self::Tgr160,
        Self::Tgr192,
    ];

    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// Name used by the digest engine and in hash blacklist entries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md4 => "md4",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::RipeMd160 => "rmd160",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha224 => "sha224",
            Self::RipeMd128 => "rmd128",
            Self::RipeMd256 => "rmd256",
            Self::RipeMd320 => "rmd320",
            Self::Wp256 => "wp256",
            Self::Wp384 => "wp384",
            Self::Wp512 => "wp512",
            Self::Tgr128 => "tgr128",
            Self::Tgr160 => "tgr160",
            Self::Tgr192 => "tgr192",
        }
    }
}

/// A parsed trailer with the pieces of the module it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureInfo<'a> {
    /// Detached PKCS#7 message.
    Pkcs7 {
        content: &'a [u8],
        signature: &'a [u8],
    },
    /// Raw RSA signature over `content`, key named by signer and key id.
    X509 {
        content: &'a [u8],
        hash: HashAlgo,
        signer: &'a [u8],
        key_id: &'a [u8],
        signature: &'a [u8],
    },
}

impl<'a> SignatureInfo<'a> {
    /// The signed bytes.
    #[must_use]
    pub fn content(&self) -> &'a [u8] {
        match *self {
            Self::Pkcs7 { content, .. } | Self::X509 { content, .. } => content,
        }
    }
}

/// Split a module, with the marker already removed, at its trailer.
pub fn parse(module: &[u8]) -> VerifyResult<SignatureInfo<'_>> {
    if module.len() <= TRAILER_LEN {
        return Err(VerifyError::Malformed);
    }

    let (body, raw) = module.split_at(module.len() - TRAILER_LEN);
    let ms = ModuleSignature::read_from_bytes(raw).map_err(|_| VerifyError::Malformed)?;

    let id_type = IdType::try_from(ms.id_type).inspect_err(|_| {
        log::error!("module is not signed with expected signature type {}", ms.id_type);
    })?;

    let sig_len = ms.sig_len.get() as usize;
    if sig_len >= body.len() {
        return Err(VerifyError::Malformed);
    }
    let (rest, signature) = body.split_at(body.len() - sig_len);

    match id_type {
        IdType::Pkcs7 => {
            if ms.algo != 0
                || ms.hash != 0
                || ms.signer_len != 0
                || ms.key_id_len != 0
                || ms.pad != [0; 3]
            {
                log::error!("PKCS#7 signature info has unexpected non-zero params");
                return Err(VerifyError::Malformed);
            }
            Ok(SignatureInfo::Pkcs7 {
                content: rest,
                signature,
            })
        }
        IdType::X509 => {
            let ids_len = usize::from(ms.signer_len) + usize::from(ms.key_id_len);
            if ids_len >= rest.len() {
                return Err(VerifyError::Malformed);
            }
            let (content, ids) = rest.split_at(rest.len() - ids_len);
            let (signer, key_id) = ids.split_at(usize::from(ms.signer_len));

            if ms.algo != PkeyAlgo::Rsa as u8 {
                return Err(VerifyError::UnsupportedAlgorithm);
            }
            let hash = HashAlgo::from_id(ms.hash).ok_or(VerifyError::UnsupportedAlgorithm)?;

            Ok(SignatureInfo::X509 {
                content,
                hash,
                signer,
                key_id,
                signature,
            })
        }
        IdType::Pgp => Err(VerifyError::UnsupportedAlgorithm),
    }
}

/// Remove [`MODULE_SIG_STRING`] from the end of `image`.
///
/// `None` when the marker is absent, which means the module is unsigned.
#[must_use]
pub fn strip_marker(image: &[u8]) -> Option<&[u8]> {
    if image.len() <= MODULE_SIG_STRING.len() {
        return None;
    }
    image.strip_suffix(MODULE_SIG_STRING)
}
