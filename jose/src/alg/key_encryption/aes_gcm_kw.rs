use serde_json::Value;

use super::octet_secret;
use crate::alg::content_encryption::aes_gcm;
use crate::prelude::*;

/// Key wrapping with AES-GCM as per [RFC 7518 Section 4.7][1]. The IV and the tag travel in the
/// recipient header as 'iv' and 'tag'.
///
/// [1]: https://www.rfc-editor.org/rfc/rfc7518#section-4.7
#[derive(Debug, Copy, Clone)]
pub struct AesGcmKw {
    name: &'static str,
    key_len: usize,
}

impl AesGcmKw {
    /// A128GCMKW
    pub const A128GCMKW: Self = Self {
        name: "A128GCMKW",
        key_len: 16,
    };
    /// A192GCMKW
    pub const A192GCMKW: Self = Self {
        name: "A192GCMKW",
        key_len: 24,
    };
    /// A256GCMKW
    pub const A256GCMKW: Self = Self {
        name: "A256GCMKW",
        key_len: 32,
    };
}

impl Algorithm for AesGcmKw {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["oct"]
    }
}

impl KeyEncryptionAlgorithm for AesGcmKw {
    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::KeyWrap
    }

    fn encrypt_key(&self, key: &Jwk, cek: &[u8], _: &Header, additional_header: &mut Header) -> JoseResult<Vec<u8>> {
        let kek = octet_secret(key, Some(self.key_len))?;
        let iv = random_bytes(96 / 8)?;
        let (encrypted_key, tag) = aes_gcm::encrypt(&kek, &iv, cek, &[])?;
        additional_header.insert("iv".to_string(), Value::String(base64_url_encode(iv)));
        additional_header.insert("tag".to_string(), Value::String(base64_url_encode(tag)));
        Ok(encrypted_key)
    }

    fn decrypt_key(&self, key: &Jwk, encrypted_key: &[u8], complete_header: &Header) -> JoseResult<Vec<u8>> {
        let kek = octet_secret(key, Some(self.key_len))?;
        let iv = header::get_decoded(complete_header, "iv")?;
        let tag = header::get_decoded(complete_header, "tag")?;
        aes_gcm::decrypt(&kek, &iv, encrypted_key, &[], &tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_and_unwrap() {
        let key = Jwk::octet([5u8; 24]);
        let cek = [1u8; 32];
        let mut additional = Header::new();
        let wrapped = AesGcmKw::A192GCMKW.encrypt_key(&key, &cek, &Header::new(), &mut additional).unwrap();
        assert!(additional.contains_key("iv") && additional.contains_key("tag"));
        assert_eq!(AesGcmKw::A192GCMKW.decrypt_key(&key, &wrapped, &additional).unwrap(), cek);
    }

    #[test]
    fn should_require_iv_and_tag() {
        let key = Jwk::octet([5u8; 16]);
        let result = AesGcmKw::A128GCMKW.decrypt_key(&key, &[0u8; 16], &Header::new());
        assert!(matches!(result.unwrap_err(), JoseError::MissingHeaderParameter("iv")));
    }
}
