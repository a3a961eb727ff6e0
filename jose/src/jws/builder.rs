use std::sync::Arc;

use crate::jws::{Jws, Signature};
use crate::prelude::*;

/// Builds [Jws]. Every method consumes the builder and returns a new one so that a partially
/// configured builder can be cloned and reused as a template.
#[derive(Clone)]
pub struct JwsBuilder {
    algorithms: AlgorithmManager<dyn SignatureAlgorithm>,
    payload: Option<Vec<u8>>,
    is_payload_detached: bool,
    is_payload_encoded: Option<bool>,
    signatures: Vec<PendingSignature>,
}

/// A signature computed when the token is built
#[derive(Clone)]
struct PendingSignature {
    algorithm: Arc<dyn SignatureAlgorithm>,
    key: Jwk,
    protected_header: Header,
    header: Header,
}

impl JwsBuilder {
    /// Builder restricted to the given signature algorithms
    pub fn new(algorithms: AlgorithmManager<dyn SignatureAlgorithm>) -> Self {
        Self {
            algorithms,
            payload: None,
            is_payload_detached: false,
            is_payload_encoded: None,
            signatures: vec![],
        }
    }

    /// Allowed signature algorithms
    pub fn algorithm_manager(&self) -> &AlgorithmManager<dyn SignatureAlgorithm> {
        &self.algorithms
    }

    /// Same builder without payload nor signatures
    pub fn create(self) -> Self {
        Self::new(self.algorithms)
    }

    /// Sets a UTF-8 payload, fails with [JoseError::InvalidEncoding] otherwise
    pub fn with_payload(self, payload: impl AsRef<[u8]>, detached: bool) -> JoseResult<Self> {
        let payload = std::str::from_utf8(payload.as_ref()).map_err(|_| JoseError::InvalidEncoding)?;
        Ok(self.with_binary_payload(payload.as_bytes().to_vec(), detached))
    }

    /// Sets a payload without checking its encoding
    pub fn with_binary_payload(self, payload: impl Into<Vec<u8>>, detached: bool) -> Self {
        Self {
            payload: Some(payload.into()),
            is_payload_detached: detached,
            ..self
        }
    }

    /// Adds a signature computed with `key`. Header rules are enforced here, before anything is
    /// signed.
    pub fn add_signature(self, key: &Jwk, protected_header: Header, header: Header) -> JoseResult<Self> {
        header::check_duplicated_parameters(&[&protected_header, &header])?;
        header::check_b64_and_crit(&protected_header)?;
        let is_payload_encoded = header::is_payload_encoded(&protected_header);
        if matches!(self.is_payload_encoded, Some(encoded) if encoded != is_payload_encoded) {
            return Err(JoseError::InconsistentPayloadEncoding);
        }
        let algorithm = self.find_algorithm(&protected_header, &header)?;
        key.check_kty(algorithm.allowed_key_types())?;
        checker::check_key(key, KeyUsage::Signature, algorithm.name())?;

        let mut signatures = self.signatures;
        signatures.push(PendingSignature {
            algorithm,
            key: key.clone(),
            protected_header,
            header,
        });
        Ok(Self {
            signatures,
            is_payload_encoded: Some(is_payload_encoded),
            ..self
        })
    }

    /// Computes every signature
    pub fn build(self) -> JoseResult<Jws> {
        let payload = self.payload.ok_or(JoseError::PayloadNotSet)?;
        if self.signatures.is_empty() {
            return Err(JoseError::NoSignatures);
        }
        let encoded_payload = if self.is_payload_encoded.unwrap_or(true) {
            base64_url_encode(&payload)
        } else {
            String::from_utf8(payload.clone()).map_err(|_| JoseError::InvalidEncoding)?
        };

        let signatures = self
            .signatures
            .into_iter()
            .map(|pending| {
                let encoded_protected_header = header::encode(&pending.protected_header)?;
                let mut signature =
                    Signature::new(pending.protected_header, encoded_protected_header, pending.header, vec![]);
                let input = signature.signing_input(encoded_payload.as_bytes());
                signature.signature = pending.algorithm.sign(&pending.key, &input)?;
                tracing::trace!(alg = pending.algorithm.name(), kid = pending.key.kid(), "JWS signed");
                Ok(signature)
            })
            .collect::<JoseResult<Vec<_>>>()?;

        Ok(Jws::new(
            Some(payload),
            Some(encoded_payload),
            self.is_payload_detached,
            signatures,
        ))
    }

    fn find_algorithm(&self, protected_header: &Header, header: &Header) -> JoseResult<Arc<dyn SignatureAlgorithm>> {
        let complete_header = header::merge(&[header, protected_header]);
        let alg = complete_header
            .get("alg")
            .and_then(|a| a.as_str())
            .ok_or(JoseError::MissingAlgorithm)?;
        self.algorithms.get(alg).cloned().ok_or_else(|| {
            tracing::debug!(alg, "signature algorithm not in the builder's allow-list");
            JoseError::UnsupportedAlgorithm(alg.to_string())
        })
    }
}


#[cfg(test)]
impl std::fmt::Debug for JwsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwsBuilder").finish_non_exhaustive()
    }
}
