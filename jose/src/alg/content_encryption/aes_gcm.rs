use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aead::consts::U12;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm as AesGcmCipher, Nonce, Tag};

use crate::prelude::*;

type Aes192Gcm = AesGcmCipher<aes::Aes192, U12>;

/// Size in bytes of the nonce
const IV_LEN: usize = 12;
/// Size in bytes of the authentication tag
const TAG_LEN: usize = 16;

/// AES in Galois/Counter Mode
#[derive(Debug, Copy, Clone)]
pub struct AesGcm {
    name: &'static str,
    key_len: usize,
}

impl AesGcm {
    /// A128GCM
    pub const A128GCM: Self = Self {
        name: "A128GCM",
        key_len: 16,
    };
    /// A192GCM
    pub const A192GCM: Self = Self {
        name: "A192GCM",
        key_len: 24,
    };
    /// A256GCM
    pub const A256GCM: Self = Self {
        name: "A256GCM",
        key_len: 32,
    };
}

impl Algorithm for AesGcm {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl ContentEncryptionAlgorithm for AesGcm {
    fn cek_size(&self) -> usize {
        self.key_len * 8
    }

    fn iv_size(&self) -> usize {
        IV_LEN * 8
    }

    fn encrypt_content(&self, data: &[u8], cek: &[u8], iv: &[u8], aad: &[u8]) -> JoseResult<(Vec<u8>, Vec<u8>)> {
        if cek.len() != self.key_len {
            return Err(JoseError::InvalidKey("CEK has the wrong size"));
        }
        encrypt(cek, iv, data, aad)
    }

    fn decrypt_content(&self, data: &[u8], cek: &[u8], iv: &[u8], aad: &[u8], tag: &[u8]) -> JoseResult<Vec<u8>> {
        if cek.len() != self.key_len {
            return Err(JoseError::InvalidKey("CEK has the wrong size"));
        }
        decrypt(cek, iv, data, aad, tag)
    }
}

macro_rules! encrypt_with {
    ($cipher:ty, $key:expr, $iv:expr, $buffer:expr, $aad:expr) => {{
        let cipher = <$cipher>::new_from_slice($key).map_err(|_| JoseError::InvalidKey("invalid AES key"))?;
        cipher
            .encrypt_in_place_detached(Nonce::from_slice($iv), $aad, $buffer)
            .map_err(|_| JoseError::CryptoError("AES-GCM encryption failed"))?
    }};
}

macro_rules! decrypt_with {
    ($cipher:ty, $key:expr, $iv:expr, $buffer:expr, $aad:expr, $tag:expr) => {{
        let cipher = <$cipher>::new_from_slice($key).map_err(|_| JoseError::InvalidKey("invalid AES key"))?;
        cipher
            .decrypt_in_place_detached(Nonce::from_slice($iv), $aad, $buffer, Tag::from_slice($tag))
            .map_err(|_| JoseError::CryptoError("AES-GCM authentication failed"))?
    }};
}

/// Encrypts with a 128, 192 or 256 bits key, returns the ciphertext and the detached tag
pub(crate) fn encrypt(key: &[u8], iv: &[u8], data: &[u8], aad: &[u8]) -> JoseResult<(Vec<u8>, Vec<u8>)> {
    if iv.len() != IV_LEN {
        return Err(JoseError::CryptoError("AES-GCM requires a 96 bits IV"));
    }
    let mut buffer = data.to_vec();
    let tag = match key.len() {
        16 => encrypt_with!(Aes128Gcm, key, iv, &mut buffer, aad),
        24 => encrypt_with!(Aes192Gcm, key, iv, &mut buffer, aad),
        32 => encrypt_with!(Aes256Gcm, key, iv, &mut buffer, aad),
        _ => return Err(JoseError::InvalidKey("AES-GCM requires a 128, 192 or 256 bits key")),
    };
    Ok((buffer, tag.to_vec()))
}

/// Authenticates and decrypts with a 128, 192 or 256 bits key
pub(crate) fn decrypt(key: &[u8], iv: &[u8], data: &[u8], aad: &[u8], tag: &[u8]) -> JoseResult<Vec<u8>> {
    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(JoseError::CryptoError("AES-GCM requires a 96 bits IV and a 128 bits tag"));
    }
    let mut buffer = data.to_vec();
    match key.len() {
        16 => decrypt_with!(Aes128Gcm, key, iv, &mut buffer, aad, tag),
        24 => decrypt_with!(Aes192Gcm, key, iv, &mut buffer, aad, tag),
        32 => decrypt_with!(Aes256Gcm, key, iv, &mut buffer, aad, tag),
        _ => return Err(JoseError::InvalidKey("AES-GCM requires a 128, 192 or 256 bits key")),
    };
    Ok(buffer)
}
