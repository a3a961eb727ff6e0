use std::fmt::Formatter;

use hmac::{Hmac, Mac};
use sha2::Digest;

use crate::prelude::*;

/// Narrows the supported hashing algorithms to the ones JOSE uses
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HashAlgorithm {
    /// SHA-256
    SHA256,
    /// SHA-384
    SHA384,
    /// SHA-512
    SHA512,
}

macro_rules! hmac_with {
    ($hash:ty, $key:expr, $parts:expr) => {{
        let mut mac = <Hmac<$hash>>::new_from_slice($key).map_err(|_| JoseError::InvalidKey("invalid HMAC key"))?;
        for part in $parts {
            mac.update(part);
        }
        mac.finalize().into_bytes().to_vec()
    }};
}

macro_rules! hmac_verify_with {
    ($hash:ty, $key:expr, $parts:expr, $tag:expr) => {{
        let mut mac = <Hmac<$hash>>::new_from_slice($key).map_err(|_| JoseError::InvalidKey("invalid HMAC key"))?;
        for part in $parts {
            mac.update(part);
        }
        mac.verify_truncated_left($tag).is_ok()
    }};
}

impl HashAlgorithm {
    /// Digest size in bytes
    pub const fn size(&self) -> usize {
        match self {
            Self::SHA256 => 256 / 8,
            Self::SHA384 => 384 / 8,
            Self::SHA512 => 512 / 8,
        }
    }

    /// Hashes the input
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::SHA256 => sha2::Sha256::digest(data).to_vec(),
            Self::SHA384 => sha2::Sha384::digest(data).to_vec(),
            Self::SHA512 => sha2::Sha512::digest(data).to_vec(),
        }
    }

    /// HMAC over the concatenation of `parts`
    pub fn hmac(&self, key: &[u8], parts: &[&[u8]]) -> JoseResult<Vec<u8>> {
        Ok(match self {
            Self::SHA256 => hmac_with!(sha2::Sha256, key, parts),
            Self::SHA384 => hmac_with!(sha2::Sha384, key, parts),
            Self::SHA512 => hmac_with!(sha2::Sha512, key, parts),
        })
    }

    /// Compares in constant time `tag` with the leftmost bytes of the HMAC over `parts`
    pub fn hmac_verify(&self, key: &[u8], parts: &[&[u8]], tag: &[u8]) -> JoseResult<bool> {
        Ok(match self {
            Self::SHA256 => hmac_verify_with!(sha2::Sha256, key, parts, tag),
            Self::SHA384 => hmac_verify_with!(sha2::Sha384, key, parts, tag),
            Self::SHA512 => hmac_verify_with!(sha2::Sha512, key, parts, tag),
        })
    }

    /// PBKDF2 with HMAC of this hash
    pub fn pbkdf2(&self, password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
        match self {
            Self::SHA256 => pbkdf2::pbkdf2_hmac::<sha2::Sha256>(password, salt, rounds, out),
            Self::SHA384 => pbkdf2::pbkdf2_hmac::<sha2::Sha384>(password, salt, rounds, out),
            Self::SHA512 => pbkdf2::pbkdf2_hmac::<sha2::Sha512>(password, salt, rounds, out),
        }
    }
}

#[cfg(test)]
#[allow(missing_docs)]
impl HashAlgorithm {
    pub fn values() -> [Self; 3] {
        [Self::SHA256, Self::SHA384, Self::SHA512]
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HashAlgorithm::SHA256 => "SHA-256",
            HashAlgorithm::SHA384 => "SHA-384",
            HashAlgorithm::SHA512 => "SHA-512",
        };
        write!(f, "{name}")
    }
}
