use crate::jws::{Jws, UNDERSTOOD_CRITICAL_PARAMETERS, serializer::JwsSerializerManager, verifier::JwsVerifier};
use crate::prelude::*;

/// Parses a token in any known format, checks its critical parameters and verifies it
#[derive(Clone)]
pub struct JwsLoader {
    serializers: JwsSerializerManager,
    verifier: JwsVerifier,
}

impl JwsLoader {
    /// Loader with the given formats and verifier
    pub fn new(serializers: JwsSerializerManager, verifier: JwsVerifier) -> Self {
        Self { serializers, verifier }
    }

    /// Underlying verifier
    pub fn verifier(&self) -> &JwsVerifier {
        &self.verifier
    }

    /// Underlying formats
    pub fn serializer_manager(&self) -> &JwsSerializerManager {
        &self.serializers
    }

    /// Returns the token and the index of the first signature `key` verifies, `None` when no
    /// signature verifies
    pub fn load_and_verify_with_key(
        &self,
        token: &str,
        key: &Jwk,
        detached_payload: Option<&[u8]>,
    ) -> JoseResult<Option<(Jws, usize)>> {
        let keys = JwkSet::new([key.clone()]);
        Ok(self
            .load_and_verify_with_key_set(token, &keys, detached_payload)?
            .map(|(jws, index, _)| (jws, index)))
    }

    /// Returns the token, the index of the first verified signature and the key which verified it
    ///
    /// A signature which cannot be processed (forbidden algorithm, unknown critical parameter...)
    /// is skipped. The first such error is returned only when no signature could be attempted.
    pub fn load_and_verify_with_key_set<'k>(
        &self,
        token: &str,
        keys: &'k JwkSet,
        detached_payload: Option<&[u8]>,
    ) -> JoseResult<Option<(Jws, usize, &'k Jwk)>> {
        let (jws, format) = self.serializers.unserialize(token)?;
        tracing::trace!(format, signatures = jws.count_signatures(), "JWS parsed");
        let mut skipped = None;
        let mut attempted = false;
        for index in 0..jws.count_signatures() {
            let signature = jws.signature(index)?;
            if let Err(e) = header::check_critical_parameters(signature.protected_header(), &UNDERSTOOD_CRITICAL_PARAMETERS) {
                tracing::debug!(index, error = %e, "signature skipped");
                attempted = true;
                continue;
            }
            match self.verifier.verify_with_key_set(&jws, keys, index, detached_payload) {
                Ok(Some(key)) => return Ok(Some((jws, index, key))),
                Ok(None) => attempted = true,
                Err(e) => {
                    tracing::debug!(index, error = %e, "signature skipped");
                    skipped.get_or_insert(e);
                }
            }
        }
        match skipped {
            Some(e) if !attempted => Err(e),
            _ => Ok(None),
        }
    }
}
