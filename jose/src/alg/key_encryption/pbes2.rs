//! Password based key wrapping as per [RFC 7518 Section 4.8][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7518#section-4.8

use serde_json::Value;
use zeroize::Zeroizing;

use super::{aes_kw, octet_secret};
use crate::prelude::*;

/// PBES2 with HMAC SHA-2 and AES key wrap. The password is the 'k' parameter of an 'oct' key.
#[derive(Debug, Copy, Clone)]
pub struct Pbes2 {
    name: &'static str,
    hash: HashAlgorithm,
    key_len: usize,
    salt_size: usize,
    iterations: u32,
    max_iterations: u32,
}

impl Pbes2 {
    /// Default size in bytes of the salt input
    pub const DEFAULT_SALT_SIZE: usize = 64;
    /// Default PBKDF2 iteration count
    pub const DEFAULT_ITERATIONS: u32 = 4096;
    /// RFC 7518 requires at least 8 bytes of salt input
    pub const MIN_SALT_SIZE: usize = 8;
    /// Default upper bound of a received 'p2c'
    pub const DEFAULT_MAX_ITERATIONS: u32 = 1_000_000;

    /// PBES2-HS256+A128KW
    pub const HS256_A128KW: Self = Self::new("PBES2-HS256+A128KW", HashAlgorithm::SHA256, 16);
    /// PBES2-HS384+A192KW
    pub const HS384_A192KW: Self = Self::new("PBES2-HS384+A192KW", HashAlgorithm::SHA384, 24);
    /// PBES2-HS512+A256KW
    pub const HS512_A256KW: Self = Self::new("PBES2-HS512+A256KW", HashAlgorithm::SHA512, 32);

    const fn new(name: &'static str, hash: HashAlgorithm, key_len: usize) -> Self {
        Self {
            name,
            hash,
            key_len,
            salt_size: Self::DEFAULT_SALT_SIZE,
            iterations: Self::DEFAULT_ITERATIONS,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Same algorithm with another salt size and iteration count when encrypting, and another
    /// upper bound on the iteration count accepted when decrypting
    pub fn with_parameters(self, salt_size: usize, iterations: u32, max_iterations: u32) -> JoseResult<Self> {
        if salt_size < Self::MIN_SALT_SIZE {
            return Err(JoseError::InvalidArgument(format!(
                "PBES2 salt size must be at least {} bytes",
                Self::MIN_SALT_SIZE
            )));
        }
        if iterations == 0 {
            return Err(JoseError::InvalidArgument("PBES2 iteration count must be positive".to_string()));
        }
        if iterations > max_iterations {
            return Err(JoseError::InvalidArgument(format!(
                "PBES2 iteration count must not exceed {max_iterations}"
            )));
        }
        Ok(Self {
            salt_size,
            iterations,
            max_iterations,
            ..self
        })
    }

    /// `(UTF8(alg) || 0x00 || salt_input)` stretched with PBKDF2
    fn derive_key(&self, password: &[u8], salt_input: &[u8], iterations: u32) -> Zeroizing<Vec<u8>> {
        let mut salt = Vec::with_capacity(self.name.len() + 1 + salt_input.len());
        salt.extend_from_slice(self.name.as_bytes());
        salt.push(0x00);
        salt.extend_from_slice(salt_input);
        let mut kek = Zeroizing::new(vec![0u8; self.key_len]);
        self.hash.pbkdf2(password, &salt, iterations, &mut kek);
        kek
    }
}

impl Algorithm for Pbes2 {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["oct"]
    }
}

impl KeyEncryptionAlgorithm for Pbes2 {
    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::KeyWrap
    }

    fn encrypt_key(&self, key: &Jwk, cek: &[u8], _: &Header, additional_header: &mut Header) -> JoseResult<Vec<u8>> {
        let password = Zeroizing::new(octet_secret(key, None)?);
        let salt_input = random_bytes(self.salt_size)?;
        let kek = self.derive_key(&password, &salt_input, self.iterations);
        additional_header.insert("p2s".to_string(), Value::String(base64_url_encode(&salt_input)));
        additional_header.insert("p2c".to_string(), Value::from(self.iterations));
        aes_kw::wrap(&kek, cek)
    }

    fn decrypt_key(&self, key: &Jwk, encrypted_key: &[u8], complete_header: &Header) -> JoseResult<Vec<u8>> {
        let password = Zeroizing::new(octet_secret(key, None)?);
        let salt_input = header::get_decoded(complete_header, "p2s")?;
        if salt_input.len() < Self::MIN_SALT_SIZE {
            return Err(JoseError::MissingHeaderParameter("p2s"));
        }
        let iterations = complete_header
            .get("p2c")
            .and_then(Value::as_u64)
            .and_then(|c| u32::try_from(c).ok())
            .filter(|c| *c > 0)
            .ok_or(JoseError::MissingHeaderParameter("p2c"))?;
        if iterations > self.max_iterations {
            tracing::debug!(iterations, max = self.max_iterations, "PBES2 iteration count refused");
            return Err(JoseError::InvalidArgument(format!(
                "PBES2 iteration count {iterations} exceeds {}",
                self.max_iterations
            )));
        }
        let kek = self.derive_key(&password, &salt_input, iterations);
        aes_kw::unwrap(&kek, encrypted_key)
    }
}
