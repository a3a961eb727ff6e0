//! Allow-lists of a token processing context
//!
//! ```json
//! {
//!     "signature_algorithms": ["ES256", "EdDSA"],
//!     "key_encryption_algorithms": ["ECDH-ES+A256KW"],
//!     "content_encryption_algorithms": ["A256GCM"],
//!     "compression_methods": [],
//!     "pbes2_salt_size": 64,
//!     "pbes2_iterations": 4096,
//!     "pbes2_max_iterations": 1000000,
//!     "max_uncompressed_size": 256000
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::alg::{compression::Deflate, key_encryption::pbes2::Pbes2};
use crate::prelude::*;

/// Which algorithms may be used, how PBES2 salts and stretches passwords when encrypting and how
/// much work a received token may demand.
/// Missing fields take their default value.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoseConfig {
    /// JWS 'alg' values
    pub signature_algorithms: Vec<String>,
    /// JWE 'alg' values
    pub key_encryption_algorithms: Vec<String>,
    /// JWE 'enc' values
    pub content_encryption_algorithms: Vec<String>,
    /// JWE 'zip' values
    pub compression_methods: Vec<String>,
    /// Size in bytes of the random PBES2 salt input
    pub pbes2_salt_size: usize,
    /// PBES2 iteration count
    pub pbes2_iterations: u32,
    /// Largest PBES2 iteration count accepted from a received token
    pub pbes2_max_iterations: u32,
    /// Largest size in bytes a compressed payload may inflate to
    pub max_uncompressed_size: usize,
}

impl Default for JoseConfig {
    /// Every algorithm but the unsecured 'none' signature
    fn default() -> Self {
        let registry = AlgorithmRegistry::global();
        let of = |capability: fn(&JoseAlgorithm) -> bool| {
            registry
                .ids()
                .filter(|id| registry.resolve(id).map(capability).unwrap_or_default())
                .filter(|id| *id != "none")
                .map(str::to_string)
                .collect()
        };
        Self {
            signature_algorithms: of(|a| matches!(a, JoseAlgorithm::Signature(_))),
            key_encryption_algorithms: of(|a| matches!(a, JoseAlgorithm::KeyEncryption(_))),
            content_encryption_algorithms: of(|a| matches!(a, JoseAlgorithm::ContentEncryption(_))),
            compression_methods: of(|a| matches!(a, JoseAlgorithm::Compression(_))),
            pbes2_salt_size: Pbes2::DEFAULT_SALT_SIZE,
            pbes2_iterations: Pbes2::DEFAULT_ITERATIONS,
            pbes2_max_iterations: Pbes2::DEFAULT_MAX_ITERATIONS,
            max_uncompressed_size: Deflate::DEFAULT_MAX_SIZE,
        }
    }
}

impl JoseConfig {
    /// Parses a JSON configuration
    pub fn from_json(json: &str) -> JoseResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Registry honoring the PBES2 parameters
    pub fn registry(&self) -> JoseResult<AlgorithmRegistry> {
        AlgorithmRegistry::from_config(self)
    }

    /// JWS builder restricted to [Self::signature_algorithms]
    pub fn jws_builder(&self) -> JoseResult<JwsBuilder> {
        self.registry()?.jws_builder(&self.signature_algorithms)
    }

    /// JWS verifier restricted to [Self::signature_algorithms]
    pub fn jws_verifier(&self) -> JoseResult<JwsVerifier> {
        self.registry()?.jws_verifier(&self.signature_algorithms)
    }

    /// JWE builder restricted to the configured encryption algorithms
    pub fn jwe_builder(&self) -> JoseResult<JweBuilder> {
        self.registry()?.jwe_builder(
            &self.key_encryption_algorithms,
            &self.content_encryption_algorithms,
            &self.compression_methods,
        )
    }

    /// JWE decrypter restricted to the configured encryption algorithms
    pub fn jwe_decrypter(&self) -> JoseResult<JweDecrypter> {
        self.registry()?.jwe_decrypter(
            &self.key_encryption_algorithms,
            &self.content_encryption_algorithms,
            &self.compression_methods,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_should_exclude_unsecured_signature() {
        let config = JoseConfig::default();
        assert!(!config.signature_algorithms.iter().any(|a| a == "none"));
        assert!(config.signature_algorithms.iter().any(|a| a == "EdDSA"));
        assert_eq!(config.compression_methods, vec!["DEF".to_string()]);
        assert!(config.content_encryption_algorithms.iter().any(|a| a == "A128CBC-HS256"));
        assert!(config.key_encryption_algorithms.iter().any(|a| a == "PBES2-HS512+A256KW"));
    }

    #[test]
    fn should_parse_partial_config() {
        let config = JoseConfig::from_json(r#"{"signature_algorithms": ["ES256"], "pbes2_iterations": 8192}"#).unwrap();
        assert_eq!(config.signature_algorithms, vec!["ES256".to_string()]);
        assert_eq!(config.pbes2_iterations, 8192);
        assert_eq!(config.pbes2_salt_size, Pbes2::DEFAULT_SALT_SIZE);
        assert!(!config.content_encryption_algorithms.is_empty());
    }

    #[test]
    fn should_bound_work_of_received_tokens() {
        let config = JoseConfig::from_json(r#"{"pbes2_iterations": 1000, "pbes2_max_iterations": 1000}"#).unwrap();
        assert_eq!(config.max_uncompressed_size, Deflate::DEFAULT_MAX_SIZE);
        let decrypter = config.jwe_decrypter().unwrap();
        let pbes2 = decrypter.key_encryption_algorithm_manager().get("PBES2-HS256+A128KW").unwrap();
        let mut header = Header::new();
        header.insert("p2s".to_string(), base64_url_encode([0u8; 16]).into());
        header.insert("p2c".to_string(), 1001.into());
        let result = pbes2.decrypt_key(&Jwk::octet(b"password"), &[0u8; 24], &header);
        assert!(matches!(result.unwrap_err(), JoseError::InvalidArgument(_)));

        let config = JoseConfig::from_json(r#"{"max_uncompressed_size": 10}"#).unwrap();
        let decrypter = config.jwe_decrypter().unwrap();
        let deflate = decrypter.compression_method_manager().get("DEF").unwrap();
        let compressed = deflate.compress(&[0u8; 11]).unwrap();
        assert!(matches!(deflate.uncompress(&compressed).unwrap_err(), JoseError::PayloadTooLarge(10)));

        let config = JoseConfig::from_json(r#"{"pbes2_max_iterations": 10}"#).unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn should_fail_on_unknown_algorithm() {
        let config = JoseConfig::from_json(r#"{"signature_algorithms": ["ES512"]}"#).unwrap();
        assert!(matches!(
            config.jws_verifier().unwrap_err(),
            JoseError::UnsupportedAlgorithm(alg) if alg == "ES512"
        ));
    }
}
