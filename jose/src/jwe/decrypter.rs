use std::sync::Arc;

use zeroize::Zeroizing;

use crate::jwe::Jwe;
use crate::prelude::*;

/// Decrypts [Jwe] with an allow-list of algorithms
///
/// A key which cannot be used, a wrong key, a tampered token or a bad padding all yield `None`:
/// the reason is only logged, so that callers cannot tell them apart. Malformed tokens and
/// forbidden algorithms are errors.
#[derive(Debug, Clone)]
pub struct JweDecrypter {
    key_encryption: AlgorithmManager<dyn KeyEncryptionAlgorithm>,
    content_encryption: AlgorithmManager<dyn ContentEncryptionAlgorithm>,
    compression: AlgorithmManager<dyn CompressionMethod>,
}

/// Algorithms a recipient's header resolves to
struct RecipientAlgorithms {
    key_encryption: Arc<dyn KeyEncryptionAlgorithm>,
    content_encryption: Arc<dyn ContentEncryptionAlgorithm>,
    compression: Option<Arc<dyn CompressionMethod>>,
}

impl JweDecrypter {
    /// Decrypter accepting only the given algorithms
    pub fn new(
        key_encryption: AlgorithmManager<dyn KeyEncryptionAlgorithm>,
        content_encryption: AlgorithmManager<dyn ContentEncryptionAlgorithm>,
        compression: AlgorithmManager<dyn CompressionMethod>,
    ) -> Self {
        Self {
            key_encryption,
            content_encryption,
            compression,
        }
    }

    /// Allowed key encryption algorithms
    pub fn key_encryption_algorithm_manager(&self) -> &AlgorithmManager<dyn KeyEncryptionAlgorithm> {
        &self.key_encryption
    }

    /// Allowed content encryption algorithms
    pub fn content_encryption_algorithm_manager(&self) -> &AlgorithmManager<dyn ContentEncryptionAlgorithm> {
        &self.content_encryption
    }

    /// Allowed compression methods
    pub fn compression_method_manager(&self) -> &AlgorithmManager<dyn CompressionMethod> {
        &self.compression
    }

    /// Decrypts the token for the recipient at `recipient_index` with `key`. Returns the token
    /// with its payload, `None` when decryption failed.
    pub fn decrypt_using_key(&self, jwe: &Jwe, key: &Jwk, recipient_index: usize) -> JoseResult<Option<Jwe>> {
        Ok(self
            .decrypt_using_keys(jwe, std::slice::from_ref(key), recipient_index)?
            .map(|(jwe, _)| jwe))
    }

    /// Decrypts the token for the recipient at `recipient_index` with any key of the set. Returns
    /// the token with its payload and the key which decrypted it.
    pub fn decrypt_using_key_set<'k>(
        &self,
        jwe: &Jwe,
        keys: &'k JwkSet,
        recipient_index: usize,
    ) -> JoseResult<Option<(Jwe, &'k Jwk)>> {
        self.decrypt_using_keys(jwe, keys.all(), recipient_index)
    }

    fn decrypt_using_keys<'k>(
        &self,
        jwe: &Jwe,
        keys: &'k [Jwk],
        recipient_index: usize,
    ) -> JoseResult<Option<(Jwe, &'k Jwk)>> {
        if jwe.count_recipients() == 0 {
            return Err(JoseError::NoRecipients);
        }
        let complete_header = jwe.complete_header(recipient_index)?;
        let algorithms = self.find_algorithms(&complete_header)?;
        let encrypted_key = jwe.recipient(recipient_index)?.encrypted_key();

        let usage = KeyUsage::of_recipient_key(KeyUsage::Decryption, algorithms.key_encryption.mode());
        for key in keys {
            let alg = algorithms.key_encryption.name();
            if let Err(e) = key
                .check_kty(algorithms.key_encryption.allowed_key_types())
                .and_then(|_| checker::check_key(key, usage, alg))
            {
                tracing::debug!(kid = key.kid(), error = %e, "key cannot decrypt this recipient");
                continue;
            }
            match Self::decrypt_payload(jwe, key, encrypted_key, &complete_header, &algorithms) {
                Ok(payload) => return Ok(Some((jwe.with_payload(payload), key))),
                Err(e) => tracing::debug!(kid = key.kid(), error = %e, "JWE decryption failed"),
            }
        }
        Ok(None)
    }

    fn decrypt_payload(
        jwe: &Jwe,
        key: &Jwk,
        encrypted_key: Option<&[u8]>,
        complete_header: &Header,
        algorithms: &RecipientAlgorithms,
    ) -> JoseResult<Vec<u8>> {
        let cek = Zeroizing::new(Self::decrypt_cek(key, encrypted_key, complete_header, algorithms)?);
        let content_encryption = &algorithms.content_encryption;
        if cek.len() * 8 != content_encryption.cek_size() {
            return Err(JoseError::CryptoError("the CEK size does not match the content encryption algorithm"));
        }
        let aad = jwe.additional_authenticated_data();
        let payload = content_encryption.decrypt_content(jwe.ciphertext(), &cek, jwe.iv(), &aad, jwe.tag())?;
        match &algorithms.compression {
            Some(method) => method.uncompress(&payload),
            None => Ok(payload),
        }
    }

    fn decrypt_cek(
        key: &Jwk,
        encrypted_key: Option<&[u8]>,
        complete_header: &Header,
        algorithms: &RecipientAlgorithms,
    ) -> JoseResult<Vec<u8>> {
        let key_encryption = &algorithms.key_encryption;
        let content_encryption = &algorithms.content_encryption;
        match key_encryption.mode() {
            KeyManagementMode::Direct => key_encryption.direct_cek(key),
            KeyManagementMode::KeyAgreement => key_encryption.agreed_key(
                key,
                content_encryption.name(),
                content_encryption.cek_size(),
                complete_header,
            ),
            KeyManagementMode::KeyEncryption => {
                let encrypted_key = encrypted_key.ok_or(JoseError::CryptoError("the encrypted key is missing"))?;
                // A failed RSA decryption must not be distinguishable from a failed content
                // decryption: go on with a random CEK (RFC 7516 Section 11.5)
                key_encryption
                    .decrypt_key(key, encrypted_key, complete_header)
                    .or_else(|_| random_bytes(content_encryption.cek_size() / 8))
            }
            KeyManagementMode::KeyWrap | KeyManagementMode::KeyAgreementWithKeyWrapping => {
                let encrypted_key = encrypted_key.ok_or(JoseError::CryptoError("the encrypted key is missing"))?;
                key_encryption.decrypt_key(key, encrypted_key, complete_header)
            }
        }
    }

    fn find_algorithms(&self, complete_header: &Header) -> JoseResult<RecipientAlgorithms> {
        let alg = complete_header
            .get("alg")
            .and_then(|a| a.as_str())
            .ok_or(JoseError::MissingAlgorithm)?;
        let key_encryption = self.key_encryption.get(alg).cloned().ok_or_else(|| {
            tracing::debug!(alg, "key encryption algorithm not in the decrypter's allow-list");
            JoseError::AlgorithmNotAllowed(alg.to_string())
        })?;
        let enc = header::get_str(complete_header, "enc")?;
        let content_encryption = self.content_encryption.get(enc).cloned().ok_or_else(|| {
            tracing::debug!(enc, "content encryption algorithm not in the decrypter's allow-list");
            JoseError::AlgorithmNotAllowed(enc.to_string())
        })?;
        let compression = match complete_header.get("zip") {
            None => None,
            Some(zip) => {
                let zip = zip.as_str().ok_or(JoseError::MissingHeaderParameter("zip"))?;
                let method = self.compression.get(zip).cloned().ok_or_else(|| {
                    tracing::debug!(zip, "compression method not in the decrypter's allow-list");
                    JoseError::AlgorithmNotAllowed(zip.to_string())
                })?;
                Some(method)
            }
        };
        Ok(RecipientAlgorithms {
            key_encryption,
            content_encryption,
            compression,
        })
    }
}
