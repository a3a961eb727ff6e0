use std::collections::BTreeMap;
use std::sync::Arc;

use crate::alg::compression::Deflate;
use crate::alg::content_encryption::{aes_cbc_hs::AesCbcHs, aes_gcm::AesGcm};
use crate::alg::key_encryption::{
    aes_gcm_kw::AesGcmKw, aes_kw::AesKw, dir::Dir, ecdh_es::EcdhEs, pbes2::Pbes2, rsa::RsaEncryption,
};
use crate::alg::signature::{Ecdsa, EdDsa, Hmac, NoSignature, RsaSignature};
use crate::prelude::*;

lazy_static::lazy_static! {
    static ref DEFAULT_REGISTRY: AlgorithmRegistry = AlgorithmRegistry::with_defaults();
}

/// A registered algorithm, typed by capability
#[derive(Clone)]
pub enum JoseAlgorithm {
    /// JWS 'alg'
    Signature(Arc<dyn SignatureAlgorithm>),
    /// JWE 'alg'
    KeyEncryption(Arc<dyn KeyEncryptionAlgorithm>),
    /// JWE 'enc'
    ContentEncryption(Arc<dyn ContentEncryptionAlgorithm>),
    /// JWE 'zip'
    Compression(Arc<dyn CompressionMethod>),
}

impl JoseAlgorithm {
    /// Wraps a signature algorithm
    pub fn signature(alg: impl SignatureAlgorithm + 'static) -> Self {
        Self::Signature(Arc::new(alg))
    }

    /// Wraps a key encryption algorithm
    pub fn key_encryption(alg: impl KeyEncryptionAlgorithm + 'static) -> Self {
        Self::KeyEncryption(Arc::new(alg))
    }

    /// Wraps a content encryption algorithm
    pub fn content_encryption(alg: impl ContentEncryptionAlgorithm + 'static) -> Self {
        Self::ContentEncryption(Arc::new(alg))
    }

    /// Wraps a compression method
    pub fn compression(alg: impl CompressionMethod + 'static) -> Self {
        Self::Compression(Arc::new(alg))
    }

    /// IANA JOSE name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signature(a) => a.name(),
            Self::KeyEncryption(a) => a.name(),
            Self::ContentEncryption(a) => a.name(),
            Self::Compression(a) => a.name(),
        }
    }
}

impl std::fmt::Debug for JoseAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let capability = match self {
            Self::Signature(_) => "Signature",
            Self::KeyEncryption(_) => "KeyEncryption",
            Self::ContentEncryption(_) => "ContentEncryption",
            Self::Compression(_) => "Compression",
        };
        f.debug_tuple(capability).field(&self.name()).finish()
    }
}

/// Maps IANA JOSE identifiers to algorithms
///
/// Populated once then only read: managers handed to builders, verifiers and decrypters are
/// restricted to an explicit allow-list resolved here.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: BTreeMap<String, JoseAlgorithm>,
}

macro_rules! manager_of {
    ($registry:expr, $ids:expr, $capability:ident) => {{
        let algorithms = $ids
            .iter()
            .map(|id| {
                let id: &str = id.as_ref();
                match $registry.resolve(id)? {
                    JoseAlgorithm::$capability(alg) => Ok(alg.clone()),
                    _ => Err(JoseError::AlgorithmCapabilityMismatch(id.to_string())),
                }
            })
            .collect::<JoseResult<Vec<_>>>()?;
        Ok(AlgorithmManager::new(algorithms))
    }};
}

impl AlgorithmRegistry {
    /// Registry without any algorithm
    pub fn new() -> Self {
        Self::default()
    }

    /// Every algorithm this crate implements, with default PBES2 parameters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for alg in Self::signature_defaults()
            .into_iter()
            .chain(Self::key_encryption_defaults([
                Pbes2::HS256_A128KW,
                Pbes2::HS384_A192KW,
                Pbes2::HS512_A256KW,
            ]))
            .chain(Self::content_encryption_defaults())
            .chain([JoseAlgorithm::compression(Deflate::default())])
        {
            registry.algorithms.insert(alg.name().to_string(), alg);
        }
        registry
    }

    /// Every algorithm this crate implements, PBES2 and DEF bounded by the configuration
    pub fn from_config(config: &JoseConfig) -> JoseResult<Self> {
        let (salt_size, iterations, max) = (
            config.pbes2_salt_size,
            config.pbes2_iterations,
            config.pbes2_max_iterations,
        );
        let pbes2 = [
            Pbes2::HS256_A128KW.with_parameters(salt_size, iterations, max)?,
            Pbes2::HS384_A192KW.with_parameters(salt_size, iterations, max)?,
            Pbes2::HS512_A256KW.with_parameters(salt_size, iterations, max)?,
        ];
        let deflate = Deflate::default().with_max_size(config.max_uncompressed_size);
        let mut registry = Self::new();
        for alg in Self::key_encryption_defaults(pbes2) {
            registry.register(alg.name(), alg)?;
        }
        for alg in Self::signature_defaults()
            .into_iter()
            .chain(Self::content_encryption_defaults())
            .chain([JoseAlgorithm::compression(deflate)])
        {
            registry.register(alg.name(), alg)?;
        }
        Ok(registry)
    }

    /// Process wide registry with every default algorithm
    pub fn global() -> &'static Self {
        &DEFAULT_REGISTRY
    }

    /// Registers or replaces an algorithm. The identifier must be the algorithm's name.
    pub fn register(&mut self, id: &str, algorithm: JoseAlgorithm) -> JoseResult<&mut Self> {
        if id != algorithm.name() {
            return Err(JoseError::InvalidArgument(format!(
                "identifier '{id}' does not match algorithm '{}'",
                algorithm.name()
            )));
        }
        self.algorithms.insert(id.to_string(), algorithm);
        Ok(self)
    }

    /// Exact, case-sensitive, lookup
    pub fn resolve(&self, id: &str) -> JoseResult<&JoseAlgorithm> {
        self.algorithms.get(id).ok_or_else(|| {
            tracing::debug!(id, "algorithm not registered");
            JoseError::UnsupportedAlgorithm(id.to_string())
        })
    }

    /// Identifiers of every registered algorithm
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    /// Restricts the signature algorithms to `ids`
    pub fn signature_algorithms(
        &self,
        ids: &[impl AsRef<str>],
    ) -> JoseResult<AlgorithmManager<dyn SignatureAlgorithm>> {
        manager_of!(self, ids, Signature)
    }

    /// Restricts the key encryption algorithms to `ids`
    pub fn key_encryption_algorithms(
        &self,
        ids: &[impl AsRef<str>],
    ) -> JoseResult<AlgorithmManager<dyn KeyEncryptionAlgorithm>> {
        manager_of!(self, ids, KeyEncryption)
    }

    /// Restricts the content encryption algorithms to `ids`
    pub fn content_encryption_algorithms(
        &self,
        ids: &[impl AsRef<str>],
    ) -> JoseResult<AlgorithmManager<dyn ContentEncryptionAlgorithm>> {
        manager_of!(self, ids, ContentEncryption)
    }

    /// Restricts the compression methods to `ids`
    pub fn compression_methods(&self, ids: &[impl AsRef<str>]) -> JoseResult<AlgorithmManager<dyn CompressionMethod>> {
        manager_of!(self, ids, Compression)
    }

    /// JWS builder restricted to the `signature` algorithms
    pub fn jws_builder(&self, signature: &[impl AsRef<str>]) -> JoseResult<JwsBuilder> {
        Ok(JwsBuilder::new(self.signature_algorithms(signature)?))
    }

    /// JWS verifier restricted to the `signature` algorithms
    pub fn jws_verifier(&self, signature: &[impl AsRef<str>]) -> JoseResult<JwsVerifier> {
        Ok(JwsVerifier::new(self.signature_algorithms(signature)?))
    }

    /// JWE builder restricted to the given algorithms
    pub fn jwe_builder(
        &self,
        key_encryption: &[impl AsRef<str>],
        content_encryption: &[impl AsRef<str>],
        compression: &[impl AsRef<str>],
    ) -> JoseResult<JweBuilder> {
        Ok(JweBuilder::new(
            self.key_encryption_algorithms(key_encryption)?,
            self.content_encryption_algorithms(content_encryption)?,
            self.compression_methods(compression)?,
        ))
    }

    /// JWE decrypter restricted to the given algorithms
    pub fn jwe_decrypter(
        &self,
        key_encryption: &[impl AsRef<str>],
        content_encryption: &[impl AsRef<str>],
        compression: &[impl AsRef<str>],
    ) -> JoseResult<JweDecrypter> {
        Ok(JweDecrypter::new(
            self.key_encryption_algorithms(key_encryption)?,
            self.content_encryption_algorithms(content_encryption)?,
            self.compression_methods(compression)?,
        ))
    }

    fn signature_defaults() -> Vec<JoseAlgorithm> {
        vec![
            JoseAlgorithm::signature(Hmac::HS256),
            JoseAlgorithm::signature(Hmac::HS384),
            JoseAlgorithm::signature(Hmac::HS512),
            JoseAlgorithm::signature(Ecdsa::ES256),
            JoseAlgorithm::signature(Ecdsa::ES384),
            JoseAlgorithm::signature(EdDsa),
            JoseAlgorithm::signature(RsaSignature::RS256),
            JoseAlgorithm::signature(RsaSignature::RS384),
            JoseAlgorithm::signature(RsaSignature::RS512),
            JoseAlgorithm::signature(RsaSignature::PS256),
            JoseAlgorithm::signature(RsaSignature::PS384),
            JoseAlgorithm::signature(RsaSignature::PS512),
            JoseAlgorithm::signature(NoSignature),
        ]
    }

    fn key_encryption_defaults(pbes2: [Pbes2; 3]) -> Vec<JoseAlgorithm> {
        let mut algorithms = vec![
            JoseAlgorithm::key_encryption(AesKw::A128KW),
            JoseAlgorithm::key_encryption(AesKw::A192KW),
            JoseAlgorithm::key_encryption(AesKw::A256KW),
            JoseAlgorithm::key_encryption(AesGcmKw::A128GCMKW),
            JoseAlgorithm::key_encryption(AesGcmKw::A192GCMKW),
            JoseAlgorithm::key_encryption(AesGcmKw::A256GCMKW),
            JoseAlgorithm::key_encryption(Dir),
            JoseAlgorithm::key_encryption(RsaEncryption::RSA1_5),
            JoseAlgorithm::key_encryption(RsaEncryption::RSA_OAEP),
            JoseAlgorithm::key_encryption(RsaEncryption::RSA_OAEP_256),
            JoseAlgorithm::key_encryption(EcdhEs::ECDH_ES),
            JoseAlgorithm::key_encryption(EcdhEs::ECDH_ES_A128KW),
            JoseAlgorithm::key_encryption(EcdhEs::ECDH_ES_A192KW),
            JoseAlgorithm::key_encryption(EcdhEs::ECDH_ES_A256KW),
        ];
        algorithms.extend(pbes2.map(JoseAlgorithm::key_encryption));
        algorithms
    }

    fn content_encryption_defaults() -> Vec<JoseAlgorithm> {
        vec![
            JoseAlgorithm::content_encryption(AesCbcHs::A128CBC_HS256),
            JoseAlgorithm::content_encryption(AesCbcHs::A192CBC_HS384),
            JoseAlgorithm::content_encryption(AesCbcHs::A256CBC_HS512),
            JoseAlgorithm::content_encryption(AesGcm::A128GCM),
            JoseAlgorithm::content_encryption(AesGcm::A192GCM),
            JoseAlgorithm::content_encryption(AesGcm::A256GCM),
        ]
    }
}
