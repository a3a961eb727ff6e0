//! Algorithm capabilities and their concrete implementations
//!
//! Algorithms are stateless and identified by their IANA JOSE name. They are shared through
//! [Arc](std::sync::Arc) between every builder, verifier and decrypter of a process.

use crate::prelude::*;

/// JWE payload compression
pub mod compression;
pub mod content_encryption;
/// SHA-2 digests, HMAC and PBKDF2
pub mod hash;
pub mod key_encryption;
/// Allow-lists of algorithms
pub mod manager;
/// Every known algorithm, by name
pub mod registry;
pub mod signature;

/// Common to every algorithm
pub trait Algorithm: Send + Sync {
    /// IANA JOSE name e.g. 'ES256'
    fn name(&self) -> &'static str;

    /// JWK 'kty' values this algorithm operates on. Empty for algorithms not consuming a JWK.
    fn allowed_key_types(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Computes and verifies JWS signatures
pub trait SignatureAlgorithm: Algorithm {
    /// Signs the JWS signing input
    fn sign(&self, key: &Jwk, input: &[u8]) -> JoseResult<Vec<u8>>;

    /// Verifies a raw signature. Errors denote an unusable key, a mismatch is `Ok(false)`.
    fn verify(&self, key: &Jwk, input: &[u8], signature: &[u8]) -> JoseResult<bool>;
}

/// How a key encryption algorithm determines the Content Encryption Key as per
/// [RFC 7516 Section 2][1]
///
/// [1]: https://www.rfc-editor.org/rfc/rfc7516#section-2
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyManagementMode {
    /// CEK is encrypted with an asymmetric key e.g. RSA-OAEP
    KeyEncryption,
    /// CEK is wrapped with a symmetric key e.g. A128KW
    KeyWrap,
    /// The shared symmetric key is the CEK
    Direct,
    /// The CEK is agreed upon with a key agreement e.g. ECDH-ES
    KeyAgreement,
    /// A key agreement produces the key wrapping the CEK e.g. ECDH-ES+A128KW
    KeyAgreementWithKeyWrapping,
}

impl KeyManagementMode {
    /// Whether recipients with both modes can share the same CEK
    pub fn is_compatible_with(&self, other: Self) -> bool {
        use KeyManagementMode::*;
        match (self, other) {
            (Direct, _) | (_, Direct) | (KeyAgreement, _) | (_, KeyAgreement) => false,
            (KeyEncryption | KeyWrap | KeyAgreementWithKeyWrapping, _) => true,
        }
    }

    /// Whether the CEK, or the key wrapping it, comes from a key agreement
    pub fn is_key_agreement(&self) -> bool {
        matches!(self, Self::KeyAgreement | Self::KeyAgreementWithKeyWrapping)
    }

    /// Whether the recipient carries an encrypted key
    pub fn has_encrypted_key(&self) -> bool {
        !matches!(self, Self::Direct | Self::KeyAgreement)
    }
}

/// Determines the CEK of a JWE recipient
///
/// Implementors only override the operations matching their [KeyManagementMode].
pub trait KeyEncryptionAlgorithm: Algorithm {
    /// How this algorithm determines the CEK
    fn mode(&self) -> KeyManagementMode;

    /// Encrypts or wraps the CEK. Parameters the recipient needs to reverse the operation (salt,
    /// ephemeral key...) are added to `additional_header`.
    fn encrypt_key(
        &self,
        _key: &Jwk,
        _cek: &[u8],
        _complete_header: &Header,
        _additional_header: &mut Header,
    ) -> JoseResult<Vec<u8>> {
        Err(JoseError::AlgorithmCapabilityMismatch(self.name().to_string()))
    }

    /// Decrypts or unwraps the CEK
    fn decrypt_key(&self, _key: &Jwk, _encrypted_key: &[u8], _complete_header: &Header) -> JoseResult<Vec<u8>> {
        Err(JoseError::AlgorithmCapabilityMismatch(self.name().to_string()))
    }

    /// The CEK in [KeyManagementMode::Direct]
    fn direct_cek(&self, _key: &Jwk) -> JoseResult<Vec<u8>> {
        Err(JoseError::AlgorithmCapabilityMismatch(self.name().to_string()))
    }

    /// Sender side of [KeyManagementMode::KeyAgreement], the agreed key is the CEK
    fn agree_key(
        &self,
        _key: &Jwk,
        _enc: &str,
        _cek_bits: usize,
        _complete_header: &Header,
        _additional_header: &mut Header,
    ) -> JoseResult<Vec<u8>> {
        Err(JoseError::AlgorithmCapabilityMismatch(self.name().to_string()))
    }

    /// Recipient side of [KeyManagementMode::KeyAgreement]
    fn agreed_key(&self, _key: &Jwk, _enc: &str, _cek_bits: usize, _complete_header: &Header) -> JoseResult<Vec<u8>> {
        Err(JoseError::AlgorithmCapabilityMismatch(self.name().to_string()))
    }
}

/// Authenticated encryption of the JWE payload
pub trait ContentEncryptionAlgorithm: Algorithm {
    /// CEK size in bits
    fn cek_size(&self) -> usize;

    /// Initialization vector size in bits
    fn iv_size(&self) -> usize;

    /// Returns the ciphertext and the authentication tag
    fn encrypt_content(&self, data: &[u8], cek: &[u8], iv: &[u8], aad: &[u8]) -> JoseResult<(Vec<u8>, Vec<u8>)>;

    /// Authenticates then decrypts
    fn decrypt_content(&self, data: &[u8], cek: &[u8], iv: &[u8], aad: &[u8], tag: &[u8]) -> JoseResult<Vec<u8>>;
}

/// JWE 'zip' methods
pub trait CompressionMethod: Algorithm {
    /// Applied on the plaintext before encryption
    fn compress(&self, data: &[u8]) -> JoseResult<Vec<u8>>;

    /// Applied on the plaintext after decryption
    fn uncompress(&self, data: &[u8]) -> JoseResult<Vec<u8>>;
}
