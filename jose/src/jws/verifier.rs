use crate::jws::{Jws, Signature};
use crate::prelude::*;

/// Verifies [Jws] signatures with an allow-list of algorithms
///
/// A signature which does not verify, or a key which cannot be used, yields `false`: the reason is
/// only logged. Malformed tokens and forbidden algorithms are errors.
#[derive(Debug, Clone)]
pub struct JwsVerifier {
    algorithms: AlgorithmManager<dyn SignatureAlgorithm>,
}

impl JwsVerifier {
    /// Verifier accepting only the given signature algorithms
    pub fn new(algorithms: AlgorithmManager<dyn SignatureAlgorithm>) -> Self {
        Self { algorithms }
    }

    /// Allowed signature algorithms
    pub fn algorithm_manager(&self) -> &AlgorithmManager<dyn SignatureAlgorithm> {
        &self.algorithms
    }

    /// Verifies the signature at `signature_index` with `key`
    ///
    /// # Arguments
    /// * `detached_payload` - the raw payload, mandatory when and only when the JWS payload is detached
    pub fn verify_with_key(
        &self,
        jws: &Jws,
        key: &Jwk,
        signature_index: usize,
        detached_payload: Option<&[u8]>,
    ) -> JoseResult<bool> {
        Ok(self
            .verify_with_keys(jws, std::slice::from_ref(key), signature_index, detached_payload)?
            .is_some())
    }

    /// Verifies the signature at `signature_index` with any key of the set, returns the first key
    /// which verified it
    pub fn verify_with_key_set<'k>(
        &self,
        jws: &Jws,
        keys: &'k JwkSet,
        signature_index: usize,
        detached_payload: Option<&[u8]>,
    ) -> JoseResult<Option<&'k Jwk>> {
        self.verify_with_keys(jws, keys.all(), signature_index, detached_payload)
    }

    fn verify_with_keys<'k>(
        &self,
        jws: &Jws,
        keys: &'k [Jwk],
        signature_index: usize,
        detached_payload: Option<&[u8]>,
    ) -> JoseResult<Option<&'k Jwk>> {
        if jws.count_signatures() == 0 {
            return Err(JoseError::NoSignatures);
        }
        let signature = jws.signature(signature_index)?;
        let input = Self::signing_input(jws, signature, detached_payload)?;
        let complete_header = signature.complete_header();
        let alg = complete_header
            .get("alg")
            .and_then(|a| a.as_str())
            .ok_or(JoseError::MissingAlgorithm)?;
        let algorithm = self.algorithms.get(alg).ok_or_else(|| {
            tracing::debug!(alg, "signature algorithm not in the verifier's allow-list");
            JoseError::AlgorithmNotAllowed(alg.to_string())
        })?;

        let verified = keys.iter().find(|key| {
            if let Err(e) = key
                .check_kty(algorithm.allowed_key_types())
                .and_then(|_| checker::check_key(key, KeyUsage::Verification, alg))
            {
                tracing::debug!(kid = key.kid(), error = %e, "key cannot verify this signature");
                return false;
            }
            match algorithm.verify(key, &input, signature.signature()) {
                Ok(verified) => verified,
                Err(e) => {
                    tracing::debug!(kid = key.kid(), error = %e, "signature verification failed");
                    false
                }
            }
        });
        Ok(verified)
    }

    /// Rebuilds the exact signing input of a signature
    fn signing_input(jws: &Jws, signature: &Signature, detached_payload: Option<&[u8]>) -> JoseResult<Vec<u8>> {
        match (jws.encoded_payload(), detached_payload) {
            // a compact token cannot tell an empty payload from a detached one
            (Some(""), Some(payload)) => Ok(Self::detached_signing_input(signature, payload)),
            (Some(_), Some(_)) => Err(JoseError::ConfigurationError(
                "a detached payload is set but the JWS already has a payload",
            )),
            (None, None) => Err(JoseError::ConfigurationError("the payload is detached but none was given")),
            (Some(encoded), None) => Ok(signature.signing_input(encoded.as_bytes())),
            (None, Some(payload)) => Ok(Self::detached_signing_input(signature, payload)),
        }
    }

    fn detached_signing_input(signature: &Signature, payload: &[u8]) -> Vec<u8> {
        if signature.is_payload_encoded() {
            signature.signing_input(base64_url_encode(payload).as_bytes())
        } else {
            signature.signing_input(payload)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_utils::*;

    use super::*;

    fn sign(key: &Jwk, alg: &str, payload: &str, detached: bool) -> Jws {
        AlgorithmRegistry::global()
            .jws_builder(&[alg])
            .unwrap()
            .with_payload(payload, detached)
            .unwrap()
            .add_signature(key, header(json!({ "alg": alg })), Header::new())
            .unwrap()
            .build()
            .unwrap()
    }

    fn verifier(algs: &[&str]) -> JwsVerifier {
        AlgorithmRegistry::global().jws_verifier(algs).unwrap()
    }

    #[apply(all_signature_algorithms)]
    fn should_verify_signature(#[case] alg: &dyn SignatureAlgorithm, #[case] key: TestKey) {
        let jws = sign(&key.private, alg.name(), "Hello World!", false);
        let verifier = verifier(&[alg.name()]);
        assert!(verifier.verify_with_key(&jws, &key.public, 0, None).unwrap());
    }

    #[test]
    fn should_not_verify_with_another_key() {
        let key = TestKey::ec(EcCurve::P256);
        let jws = sign(&key.private, "ES256", "Hello World!", false);
        let other = TestKey::ec(EcCurve::P256);
        assert!(!verifier(&["ES256"]).verify_with_key(&jws, &other.public, 0, None).unwrap());
    }

    #[test]
    fn should_refuse_algorithm_outside_allow_list() {
        let key = TestKey::oct(32);
        let jws = sign(&key.private, "HS256", "Hello World!", false);
        let result = verifier(&["ES256", "HS512"]).verify_with_key(&jws, &key.public, 0, None);
        assert!(matches!(result.unwrap_err(), JoseError::AlgorithmNotAllowed(a) if a == "HS256"));
    }

    #[test]
    fn should_refuse_unsecured_signature_unless_allowed() {
        let key = Jwk::from_json(r#"{"kty": "none"}"#).unwrap();
        let jws = sign(&key, "none", "Hello World!", false);
        let result = verifier(&["HS256"]).verify_with_key(&jws, &key, 0, None);
        assert!(matches!(result.unwrap_err(), JoseError::AlgorithmNotAllowed(_)));
        assert!(verifier(&["none"]).verify_with_key(&jws, &key, 0, None).unwrap());
    }

    #[test]
    fn incompatible_key_should_not_verify() {
        let key = TestKey::oct(32);
        let jws = sign(&key.private, "HS256", "Hello World!", false);
        let verifier = verifier(&["HS256"]);
        let restricted = key.public.with_parameter("alg", "HS512").unwrap();
        assert!(!verifier.verify_with_key(&jws, &restricted, 0, None).unwrap());
        let ec = TestKey::ec(EcCurve::P256);
        assert!(!verifier.verify_with_key(&jws, &ec.public, 0, None).unwrap());
    }

    #[test]
    fn should_verify_with_key_set() {
        let key = TestKey::ed25519().public.with_parameter("kid", "b").unwrap();
        let signer = TestKey::ed25519();
        let jws = sign(&signer.private, "EdDSA", "Hello World!", false);
        let set = JwkSet::new([key, signer.public.with_parameter("kid", "a").unwrap()]);
        let verified = verifier(&["EdDSA"]).verify_with_key_set(&jws, &set, 0, None).unwrap();
        assert_eq!(verified.and_then(Jwk::kid), Some("a"));
        let result = verifier(&["EdDSA"]).verify_with_key_set(&jws, &set, 1, None);
        assert!(matches!(result.unwrap_err(), JoseError::InvalidArgument(_)));
    }

    #[test]
    fn should_verify_detached_payload() {
        let key = TestKey::oct(32);
        let jws = sign(&key.private, "HS256", "Hello World!", true);
        let verifier = verifier(&["HS256"]);
        assert!(verifier.verify_with_key(&jws, &key.public, 0, Some(b"Hello World!")).unwrap());
        assert!(!verifier.verify_with_key(&jws, &key.public, 0, Some(b"Hello World?")).unwrap());
        let result = verifier.verify_with_key(&jws, &key.public, 0, None);
        assert!(matches!(result.unwrap_err(), JoseError::ConfigurationError(_)));

        let attached = sign(&key.private, "HS256", "Hello World!", false);
        let result = verifier.verify_with_key(&attached, &key.public, 0, Some(b"Hello World!"));
        assert!(matches!(result.unwrap_err(), JoseError::ConfigurationError(_)));
    }

    #[test]
    fn should_verify_rfc7797_detached_unencoded_payload() {
        let jws = JwsCompactSerializer
            .unserialize(
                "eyJhbGciOiJIUzI1NiIsImI2NCI6ZmFsc2UsImNyaXQiOlsiYjY0Il19..A5dxf2s96_n5FLueVuW1Z_vh161FwXZC4YLPff6dmDY",
            )
            .unwrap();
        let verifier = verifier(&["HS256"]);
        assert!(verifier.verify_with_key(&jws, &rfc7515_hs256_key(), 0, Some(b"$.02")).unwrap());
        assert!(!verifier.verify_with_key(&jws, &rfc7515_hs256_key(), 0, Some(b"$.03")).unwrap());
    }

    #[test]
    fn compact_detached_payload_should_verify_once_parsed() {
        let key = TestKey::oct(32);
        let jws = sign(&key.private, "HS256", "Hello World!", true);
        let token = JwsCompactSerializer.serialize(&jws, None).unwrap();
        assert!(token.contains(".."));

        let parsed = JwsCompactSerializer.unserialize(&token).unwrap();
        let verifier = verifier(&["HS256"]);
        assert!(verifier.verify_with_key(&parsed, &key.public, 0, Some(b"Hello World!")).unwrap());
        assert!(!verifier.verify_with_key(&parsed, &key.public, 0, Some(b"Hello World?")).unwrap());
        assert!(!verifier.verify_with_key(&parsed, &key.public, 0, None).unwrap());
    }
}
