use std::sync::Arc;

use zeroize::Zeroizing;

use crate::jwe::{Jwe, Recipient, additional_authenticated_data};
use crate::prelude::*;

/// Builds [Jwe]. Every method consumes the builder and returns a new one so that a partially
/// configured builder can be cloned and reused as a template.
///
/// Shared headers are set first, then recipients are added. All recipients share the same content
/// encryption algorithm, compression method and CEK.
#[derive(Clone)]
pub struct JweBuilder {
    key_encryption: AlgorithmManager<dyn KeyEncryptionAlgorithm>,
    content_encryption: AlgorithmManager<dyn ContentEncryptionAlgorithm>,
    compression: AlgorithmManager<dyn CompressionMethod>,
    payload: Option<Vec<u8>>,
    aad: Option<Vec<u8>>,
    shared_protected_header: Header,
    shared_header: Header,
    content_encryption_algorithm: Option<Arc<dyn ContentEncryptionAlgorithm>>,
    compression_method: Option<Arc<dyn CompressionMethod>>,
    recipients: Vec<PendingRecipient>,
}

/// A recipient whose encrypted key is computed when the token is built
#[derive(Clone)]
struct PendingRecipient {
    algorithm: Arc<dyn KeyEncryptionAlgorithm>,
    key: Jwk,
    header: Header,
    complete_header: Header,
}

impl JweBuilder {
    /// Builder restricted to the given algorithms
    pub fn new(
        key_encryption: AlgorithmManager<dyn KeyEncryptionAlgorithm>,
        content_encryption: AlgorithmManager<dyn ContentEncryptionAlgorithm>,
        compression: AlgorithmManager<dyn CompressionMethod>,
    ) -> Self {
        Self {
            key_encryption,
            content_encryption,
            compression,
            payload: None,
            aad: None,
            shared_protected_header: Header::new(),
            shared_header: Header::new(),
            content_encryption_algorithm: None,
            compression_method: None,
            recipients: vec![],
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

    /// Same builder without payload, headers nor recipients
    pub fn create(self) -> Self {
        Self::new(self.key_encryption, self.content_encryption, self.compression)
    }

    /// Sets a UTF-8 payload, fails with [JoseError::InvalidEncoding] otherwise
    pub fn with_payload(self, payload: impl AsRef<[u8]>) -> JoseResult<Self> {
        let payload = std::str::from_utf8(payload.as_ref()).map_err(|_| JoseError::InvalidEncoding)?;
        Ok(self.with_binary_payload(payload.as_bytes().to_vec()))
    }

    /// Sets a payload without checking its encoding
    pub fn with_binary_payload(self, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            ..self
        }
    }

    /// Sets additional authenticated data, covered by the tag but not encrypted
    pub fn with_aad(self, aad: impl Into<Vec<u8>>) -> Self {
        Self {
            aad: Some(aad.into()),
            ..self
        }
    }

    /// Sets the integrity protected header shared by all recipients
    pub fn with_shared_protected_header(self, shared_protected_header: Header) -> JoseResult<Self> {
        self.check_no_recipient()?;
        header::check_duplicated_parameters(&[&shared_protected_header, &self.shared_header])?;
        Ok(Self {
            shared_protected_header,
            ..self
        })
    }

    /// Sets the unprotected header shared by all recipients
    pub fn with_shared_header(self, shared_header: Header) -> JoseResult<Self> {
        self.check_no_recipient()?;
        header::check_duplicated_parameters(&[&self.shared_protected_header, &shared_header])?;
        Ok(Self { shared_header, ..self })
    }

    /// Adds a recipient able to decrypt with `key`. Header rules, algorithms and the key are
    /// checked here, before anything is encrypted.
    pub fn add_recipient(self, key: &Jwk, header: Header) -> JoseResult<Self> {
        let layers = [&self.shared_protected_header, &self.shared_header, &header];
        header::check_duplicated_parameters(&layers)?;
        if header.contains_key("zip") || self.shared_header.contains_key("zip") {
            return Err(JoseError::ConfigurationError("'zip' must be in the shared protected header"));
        }
        let complete_header = header::merge(&layers);

        let algorithm = self.find_key_encryption_algorithm(&complete_header)?;
        let content_encryption_algorithm = self.find_content_encryption_algorithm(&complete_header)?;
        let compression_method = self.find_compression_method(&complete_header)?;
        let mode = algorithm.mode();
        if let Some(other) = self.recipients.first() {
            if !mode.is_compatible_with(other.algorithm.mode()) {
                return Err(JoseError::ConfigurationError(
                    "key management modes of the recipients are not compatible",
                ));
            }
        }
        key.check_kty(algorithm.allowed_key_types())?;
        checker::check_key(key, KeyUsage::of_recipient_key(KeyUsage::Encryption, mode), algorithm.name())?;

        let mut recipients = self.recipients;
        recipients.push(PendingRecipient {
            algorithm,
            key: key.clone(),
            header,
            complete_header,
        });
        Ok(Self {
            recipients,
            content_encryption_algorithm: Some(content_encryption_algorithm),
            compression_method,
            ..self
        })
    }

    /// Determines the CEK, encrypts it for every recipient then encrypts the payload
    pub fn build(self) -> JoseResult<Jwe> {
        let payload = self.payload.as_deref().ok_or(JoseError::PayloadNotSet)?;
        let (Some(first), Some(content_encryption)) = (self.recipients.first(), &self.content_encryption_algorithm)
        else {
            return Err(JoseError::NoRecipients);
        };

        let mut additional_header = Header::new();
        let cek = Zeroizing::new(match first.algorithm.mode() {
            KeyManagementMode::Direct => first.algorithm.direct_cek(&first.key)?,
            KeyManagementMode::KeyAgreement => first.algorithm.agree_key(
                &first.key,
                content_encryption.name(),
                content_encryption.cek_size(),
                &first.complete_header,
                &mut additional_header,
            )?,
            _ => random_bytes(content_encryption.cek_size() / 8)?,
        });
        if cek.len() * 8 != content_encryption.cek_size() {
            return Err(JoseError::InvalidKey("the CEK size does not match the content encryption algorithm"));
        }

        let single_recipient = self.recipients.len() == 1;
        let mut recipients = Vec::with_capacity(self.recipients.len());
        for pending in &self.recipients {
            let mut recipient_header = pending.header.clone();
            let encrypted_key = if pending.algorithm.mode().has_encrypted_key() {
                let mut additional = Header::new();
                let encrypted_key =
                    pending
                        .algorithm
                        .encrypt_key(&pending.key, &cek, &pending.complete_header, &mut additional)?;
                if single_recipient {
                    additional_header.extend(additional);
                } else {
                    recipient_header.extend(additional);
                }
                Some(encrypted_key)
            } else {
                None
            };
            tracing::trace!(alg = pending.algorithm.name(), kid = pending.key.kid(), "JWE recipient added");
            recipients.push(Recipient::new(recipient_header, encrypted_key));
        }

        // with a single recipient, what the key management computed is protected along the rest
        let shared_protected_header = header::merge(&[&additional_header, &self.shared_protected_header]);
        let encoded_shared_protected_header = header::encode(&shared_protected_header)?;
        let aad = additional_authenticated_data(encoded_shared_protected_header.as_deref(), self.aad.as_deref());

        let compressed;
        let plaintext = match &self.compression_method {
            Some(method) => {
                compressed = method.compress(payload)?;
                compressed.as_slice()
            }
            None => payload,
        };
        let iv = random_bytes(content_encryption.iv_size() / 8)?;
        let (ciphertext, tag) = content_encryption.encrypt_content(plaintext, &cek, &iv, &aad)?;
        tracing::trace!(enc = content_encryption.name(), recipients = recipients.len(), "JWE encrypted");

        Ok(Jwe::new(
            ciphertext,
            iv,
            tag,
            self.aad.clone(),
            shared_protected_header,
            encoded_shared_protected_header,
            self.shared_header.clone(),
            recipients,
        ))
    }

    fn check_no_recipient(&self) -> JoseResult<()> {
        if self.recipients.is_empty() {
            Ok(())
        } else {
            Err(JoseError::ConfigurationError("shared headers must be set before adding recipients"))
        }
    }

    fn find_key_encryption_algorithm(&self, complete_header: &Header) -> JoseResult<Arc<dyn KeyEncryptionAlgorithm>> {
        let alg = complete_header
            .get("alg")
            .and_then(|a| a.as_str())
            .ok_or(JoseError::MissingAlgorithm)?;
        self.key_encryption.get(alg).cloned().ok_or_else(|| {
            tracing::debug!(alg, "key encryption algorithm not in the builder's allow-list");
            JoseError::UnsupportedAlgorithm(alg.to_string())
        })
    }

    fn find_content_encryption_algorithm(
        &self,
        complete_header: &Header,
    ) -> JoseResult<Arc<dyn ContentEncryptionAlgorithm>> {
        let enc = header::get_str(complete_header, "enc")?;
        if let Some(current) = &self.content_encryption_algorithm {
            if current.name() != enc {
                return Err(JoseError::ConfigurationError(
                    "all recipients must use the same content encryption algorithm",
                ));
            }
        }
        self.content_encryption.get(enc).cloned().ok_or_else(|| {
            tracing::debug!(enc, "content encryption algorithm not in the builder's allow-list");
            JoseError::UnsupportedAlgorithm(enc.to_string())
        })
    }

    fn find_compression_method(&self, complete_header: &Header) -> JoseResult<Option<Arc<dyn CompressionMethod>>> {
        let Some(zip) = complete_header.get("zip") else {
            return Ok(None);
        };
        let zip = zip.as_str().ok_or(JoseError::MissingHeaderParameter("zip"))?;
        self.compression.get(zip).cloned().map(Some).ok_or_else(|| {
            tracing::debug!(zip, "compression method not in the builder's allow-list");
            JoseError::UnsupportedAlgorithm(zip.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_utils::*;

    use super::*;

    fn builder() -> JweBuilder {
        AlgorithmRegistry::global()
            .jwe_builder(
                &["A128KW", "A256KW", "dir", "ECDH-ES", "ECDH-ES+A128KW", "RSA-OAEP", "PBES2-HS256+A128KW"],
                &["A128GCM", "A256GCM", "A128CBC-HS256"],
                &["DEF"],
            )
            .unwrap()
    }

    #[test]
    fn should_require_payload_and_recipient() {
        let result = builder().build();
        assert!(matches!(result.unwrap_err(), JoseError::PayloadNotSet));
        let result = builder().with_payload("Hello").unwrap().build();
        assert!(matches!(result.unwrap_err(), JoseError::NoRecipients));
    }

    #[test]
    fn should_refuse_non_utf8_payload() {
        let result = builder().with_payload(b"\xC3\x28");
        assert!(matches!(result.unwrap_err(), JoseError::InvalidEncoding));
    }

    #[test]
    fn should_refuse_duplicated_header_parameters() {
        let result = builder()
            .with_shared_protected_header(header(json!({"enc": "A128GCM"})))
            .unwrap()
            .add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW", "enc": "A128GCM"})));
        assert!(matches!(result.unwrap_err(), JoseError::HeaderConflict(d) if d == vec!["enc"]));
    }

    #[test]
    fn should_refuse_unlisted_algorithms() {
        let b = builder()
            .with_shared_protected_header(header(json!({"enc": "A192GCM"})))
            .unwrap();
        let result = b.clone().add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW"})));
        assert!(matches!(result.unwrap_err(), JoseError::UnsupportedAlgorithm(a) if a == "A192GCM"));
        let result = b.add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A192KW"})));
        assert!(matches!(result.unwrap_err(), JoseError::UnsupportedAlgorithm(a) if a == "A192KW"));
    }

    #[test]
    fn should_require_alg_and_enc() {
        let result = builder().add_recipient(&Jwk::octet([0u8; 16]), header(json!({"enc": "A128GCM"})));
        assert!(matches!(result.unwrap_err(), JoseError::MissingAlgorithm));
        let result = builder().add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW"})));
        assert!(matches!(result.unwrap_err(), JoseError::MissingHeaderParameter("enc")));
    }

    #[test]
    fn should_refuse_second_recipient_in_direct_mode() {
        let result = builder()
            .with_shared_protected_header(header(json!({"enc": "A128GCM"})))
            .unwrap()
            .add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "dir"})))
            .unwrap()
            .add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW"})));
        assert!(matches!(result.unwrap_err(), JoseError::ConfigurationError(_)));
    }

    #[test]
    fn should_refuse_different_content_encryption_algorithms() {
        let result = builder()
            .add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW", "enc": "A128GCM"})))
            .unwrap()
            .add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW", "enc": "A256GCM"})));
        assert!(matches!(result.unwrap_err(), JoseError::ConfigurationError(_)));
    }

    #[test]
    fn should_refuse_unprotected_zip() {
        let result = builder()
            .with_shared_protected_header(header(json!({"enc": "A128GCM"})))
            .unwrap()
            .add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW", "zip": "DEF"})));
        assert!(matches!(result.unwrap_err(), JoseError::ConfigurationError(_)));
    }

    #[test]
    fn should_refuse_shared_header_after_recipients() {
        let result = builder()
            .add_recipient(&Jwk::octet([0u8; 16]), header(json!({"alg": "A128KW", "enc": "A128GCM"})))
            .unwrap()
            .with_shared_header(header(json!({"kid": "1"})));
        assert!(matches!(result.unwrap_err(), JoseError::ConfigurationError(_)));
    }

    #[test]
    fn should_refuse_key_restricted_to_signature() {
        let key = Jwk::octet([0u8; 16]).with_parameter("use", "sig").unwrap();
        let result = builder()
            .with_shared_protected_header(header(json!({"alg": "A128KW", "enc": "A128GCM"})))
            .unwrap()
            .add_recipient(&key, Header::new());
        assert!(matches!(result.unwrap_err(), JoseError::KeyUsageMismatch(_)));
    }

    #[test]
    fn direct_encryption_should_refuse_key_of_wrong_size() {
        let result = builder()
            .with_payload("Hello")
            .unwrap()
            .with_shared_protected_header(header(json!({"alg": "dir", "enc": "A256GCM"})))
            .unwrap()
            .add_recipient(&Jwk::octet([0u8; 16]), Header::new())
            .unwrap()
            .build();
        assert!(matches!(result.unwrap_err(), JoseError::InvalidKey(_)));
    }

    #[test]
    fn single_recipient_parameters_should_be_protected() {
        let jwe = builder()
            .with_payload("Hello")
            .unwrap()
            .with_shared_protected_header(header(json!({"alg": "PBES2-HS256+A128KW", "enc": "A128GCM"})))
            .unwrap()
            .add_recipient(&Jwk::octet(b"password"), Header::new())
            .unwrap()
            .build()
            .unwrap();
        assert!(jwe.shared_protected_header().contains_key("p2s"));
        assert!(jwe.shared_protected_header().contains_key("p2c"));
        assert!(jwe.recipients()[0].header().is_empty());
        assert_eq!(jwe.iv().len(), 12);
        assert_eq!(jwe.tag().len(), 16);
    }

    #[test]
    fn multiple_recipients_parameters_should_be_per_recipient() {
        let ec = TestKey::ec(EcCurve::P256);
        let jwe = builder()
            .with_payload("Hello")
            .unwrap()
            .with_shared_protected_header(header(json!({"enc": "A128CBC-HS256"})))
            .unwrap()
            .add_recipient(&ec.public, header(json!({"alg": "ECDH-ES+A128KW"})))
            .unwrap()
            .add_recipient(&Jwk::octet([1u8; 16]), header(json!({"alg": "A128KW"})))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(jwe.count_recipients(), 2);
        assert!(jwe.recipients()[0].header().contains_key("epk"));
        assert!(!jwe.shared_protected_header().contains_key("epk"));
        assert_eq!(jwe.recipients()[1].encrypted_key().map(<[u8]>::len), Some(40));
    }

    #[test]
    fn direct_modes_should_not_have_encrypted_key() {
        let ec = TestKey::ec(EcCurve::P384);
        let jwe = builder()
            .with_payload("Hello")
            .unwrap()
            .with_shared_protected_header(header(json!({"alg": "ECDH-ES", "enc": "A256GCM"})))
            .unwrap()
            .add_recipient(&ec.public, Header::new())
            .unwrap()
            .build()
            .unwrap();
        assert!(jwe.recipients()[0].encrypted_key().is_none());
        assert!(jwe.shared_protected_header().contains_key("epk"));
    }

    #[test]
    fn builder_should_be_reusable_as_template() {
        let template = builder()
            .with_shared_protected_header(header(json!({"alg": "A128KW", "enc": "A128GCM"})))
            .unwrap();
        let a = template.clone().with_payload("a").unwrap().add_recipient(&Jwk::octet([0u8; 16]), Header::new());
        let b = template.with_payload("b").unwrap().add_recipient(&Jwk::octet([1u8; 16]), Header::new());
        assert_ne!(a.unwrap().build().unwrap().ciphertext(), b.unwrap().build().unwrap().ciphertext());
    }
}

#[cfg(test)]
impl std::fmt::Debug for JweBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JweBuilder").finish_non_exhaustive()
    }
}
