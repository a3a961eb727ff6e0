//! AES Key Wrap as specified in [RFC 3394][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc3394

use aes::cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit, consts::U16};
use aes::{Aes128, Aes192, Aes256, Block};

use super::octet_secret;
use crate::prelude::*;

/// Default initial value of RFC 3394 Section 2.2.3.1
const IV: [u8; 8] = [0xA6; 8];

/// A128KW, A192KW or A256KW
#[derive(Debug, Copy, Clone)]
pub struct AesKw {
    name: &'static str,
    key_len: usize,
}

impl AesKw {
    /// A128KW
    pub const A128KW: Self = Self {
        name: "A128KW",
        key_len: 16,
    };
    /// A192KW
    pub const A192KW: Self = Self {
        name: "A192KW",
        key_len: 24,
    };
    /// A256KW
    pub const A256KW: Self = Self {
        name: "A256KW",
        key_len: 32,
    };
}

impl Algorithm for AesKw {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["oct"]
    }
}

impl KeyEncryptionAlgorithm for AesKw {
    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::KeyWrap
    }

    fn encrypt_key(&self, key: &Jwk, cek: &[u8], _: &Header, _: &mut Header) -> JoseResult<Vec<u8>> {
        wrap(&octet_secret(key, Some(self.key_len))?, cek)
    }

    fn decrypt_key(&self, key: &Jwk, encrypted_key: &[u8], _: &Header) -> JoseResult<Vec<u8>> {
        unwrap(&octet_secret(key, Some(self.key_len))?, encrypted_key)
    }
}

/// Wraps `data` with a 128, 192 or 256 bits key encryption key
pub fn wrap(kek: &[u8], data: &[u8]) -> JoseResult<Vec<u8>> {
    match kek.len() {
        16 => wrap_with::<Aes128>(kek, data),
        24 => wrap_with::<Aes192>(kek, data),
        32 => wrap_with::<Aes256>(kek, data),
        _ => Err(JoseError::InvalidKey("AES key wrap requires a 128, 192 or 256 bits key")),
    }
}

/// Unwraps `data` and checks its integrity
pub fn unwrap(kek: &[u8], data: &[u8]) -> JoseResult<Vec<u8>> {
    match kek.len() {
        16 => unwrap_with::<Aes128>(kek, data),
        24 => unwrap_with::<Aes192>(kek, data),
        32 => unwrap_with::<Aes256>(kek, data),
        _ => Err(JoseError::InvalidKey("AES key wrap requires a 128, 192 or 256 bits key")),
    }
}

fn wrap_with<C>(kek: &[u8], data: &[u8]) -> JoseResult<Vec<u8>>
where
    C: BlockEncrypt + KeyInit + BlockSizeUser<BlockSize = U16>,
{
    if data.len() % 8 != 0 || data.len() < 16 {
        return Err(JoseError::CryptoError("key data must be a multiple of 64 bits, at least 128 bits"));
    }
    let cipher = C::new_from_slice(kek).map_err(|_| JoseError::InvalidKey("invalid AES key"))?;
    let n = data.len() / 8;
    let mut a = IV;
    let mut r = data.to_vec();
    let mut block = Block::default();
    for j in 0..6 {
        for i in 0..n {
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(&r[i * 8..(i + 1) * 8]);
            cipher.encrypt_block(&mut block);
            let t = ((n * j) + i + 1) as u64;
            a.copy_from_slice(&block[..8]);
            xor_counter(&mut a, t);
            r[i * 8..(i + 1) * 8].copy_from_slice(&block[8..]);
        }
    }
    let mut wrapped = a.to_vec();
    wrapped.extend_from_slice(&r);
    Ok(wrapped)
}

fn unwrap_with<C>(kek: &[u8], data: &[u8]) -> JoseResult<Vec<u8>>
where
    C: BlockDecrypt + KeyInit + BlockSizeUser<BlockSize = U16>,
{
    if data.len() % 8 != 0 || data.len() < 24 {
        return Err(JoseError::CryptoError("wrapped key must be a multiple of 64 bits, at least 192 bits"));
    }
    let cipher = C::new_from_slice(kek).map_err(|_| JoseError::InvalidKey("invalid AES key"))?;
    let n = data.len() / 8 - 1;
    let mut a: [u8; 8] = data[..8].try_into()?;
    let mut r = data[8..].to_vec();
    let mut block = Block::default();
    for j in (0..6).rev() {
        for i in (0..n).rev() {
            let t = ((n * j) + i + 1) as u64;
            xor_counter(&mut a, t);
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(&r[i * 8..(i + 1) * 8]);
            cipher.decrypt_block(&mut block);
            a.copy_from_slice(&block[..8]);
            r[i * 8..(i + 1) * 8].copy_from_slice(&block[8..]);
        }
    }
    if a != IV {
        return Err(JoseError::CryptoError("integrity check of the wrapped key failed"));
    }
    Ok(r)
}

fn xor_counter(a: &mut [u8; 8], t: u64) {
    a.iter_mut().zip(t.to_be_bytes()).for_each(|(a, t)| *a ^= t);
}
