//! AES_CBC_HMAC_SHA2 composite algorithms of [RFC 7518 Section 5.2][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7518#section-5.2

use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};

use crate::prelude::*;

/// Size in bytes of the IV
const IV_LEN: usize = 16;

/// AES-CBC encryption authenticated with a truncated HMAC
#[derive(Debug, Copy, Clone)]
pub struct AesCbcHs {
    name: &'static str,
    /// Size in bytes of both the MAC key and the encryption key
    half_len: usize,
    hash: HashAlgorithm,
}

impl AesCbcHs {
    /// A128CBC-HS256
    pub const A128CBC_HS256: Self = Self {
        name: "A128CBC-HS256",
        half_len: 16,
        hash: HashAlgorithm::SHA256,
    };
    /// A192CBC-HS384
    pub const A192CBC_HS384: Self = Self {
        name: "A192CBC-HS384",
        half_len: 24,
        hash: HashAlgorithm::SHA384,
    };
    /// A256CBC-HS512
    pub const A256CBC_HS512: Self = Self {
        name: "A256CBC-HS512",
        half_len: 32,
        hash: HashAlgorithm::SHA512,
    };

    /// Splits the CEK into the MAC key and the encryption key
    fn split<'a>(&self, cek: &'a [u8]) -> JoseResult<(&'a [u8], &'a [u8])> {
        if cek.len() != 2 * self.half_len {
            return Err(JoseError::InvalidKey("CEK has the wrong size"));
        }
        Ok(cek.split_at(self.half_len))
    }

    /// AL is the number of bits of the AAD as a 64 bits big endian integer
    fn aad_length(aad: &[u8]) -> [u8; 8] {
        ((aad.len() as u64) * 8).to_be_bytes()
    }
}

impl Algorithm for AesCbcHs {
    fn name(&self) -> &'static str {
        self.name
    }
}

macro_rules! cbc_encrypt {
    ($cipher:ty, $key:expr, $iv:expr, $data:expr) => {
        cbc::Encryptor::<$cipher>::new_from_slices($key, $iv)
            .map_err(|_| JoseError::InvalidKey("invalid AES-CBC key or IV"))?
            .encrypt_padded_vec_mut::<Pkcs7>($data)
    };
}

macro_rules! cbc_decrypt {
    ($cipher:ty, $key:expr, $iv:expr, $data:expr) => {
        cbc::Decryptor::<$cipher>::new_from_slices($key, $iv)
            .map_err(|_| JoseError::InvalidKey("invalid AES-CBC key or IV"))?
            .decrypt_padded_vec_mut::<Pkcs7>($data)
            .map_err(|_| JoseError::CryptoError("invalid padding"))?
    };
}

impl ContentEncryptionAlgorithm for AesCbcHs {
    fn cek_size(&self) -> usize {
        self.half_len * 2 * 8
    }

    fn iv_size(&self) -> usize {
        IV_LEN * 8
    }

    fn encrypt_content(&self, data: &[u8], cek: &[u8], iv: &[u8], aad: &[u8]) -> JoseResult<(Vec<u8>, Vec<u8>)> {
        let (mac_key, enc_key) = self.split(cek)?;
        let ciphertext = match self.half_len {
            16 => cbc_encrypt!(aes::Aes128, enc_key, iv, data),
            24 => cbc_encrypt!(aes::Aes192, enc_key, iv, data),
            32 => cbc_encrypt!(aes::Aes256, enc_key, iv, data),
            _ => return Err(JoseError::ImplementationError),
        };
        let al = Self::aad_length(aad);
        let mut tag = self.hash.hmac(mac_key, &[aad, iv, ciphertext.as_slice(), al.as_slice()])?;
        tag.truncate(self.half_len);
        Ok((ciphertext, tag))
    }

    fn decrypt_content(&self, data: &[u8], cek: &[u8], iv: &[u8], aad: &[u8], tag: &[u8]) -> JoseResult<Vec<u8>> {
        let (mac_key, enc_key) = self.split(cek)?;
        let al = Self::aad_length(aad);
        // the tag is checked before any padding is looked at
        if tag.len() != self.half_len || !self.hash.hmac_verify(mac_key, &[aad, iv, data, al.as_slice()], tag)? {
            return Err(JoseError::CryptoError("invalid authentication tag"));
        }
        Ok(match self.half_len {
            16 => cbc_decrypt!(aes::Aes128, enc_key, iv, data),
            24 => cbc_decrypt!(aes::Aes192, enc_key, iv, data),
            32 => cbc_decrypt!(aes::Aes256, enc_key, iv, data),
            _ => return Err(JoseError::ImplementationError),
        })
    }
}
