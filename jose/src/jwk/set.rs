use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::prelude::*;

/// 'key_ops' values meaning the key is used for signatures
const SIGNATURE_OPERATIONS: [&str; 2] = ["sign", "verify"];
/// 'key_ops' values meaning the key is used for encryption
const ENCRYPTION_OPERATIONS: [&str; 6] = ["encrypt", "decrypt", "wrapKey", "unwrapKey", "deriveKey", "deriveBits"];

/// An ordered collection of [Jwk] as specified in [RFC 7517 Section 5][1]
///
/// Immutable: [JwkSet::with] and [JwkSet::without] return new sets. Key ids are not required to
/// be unique, lookups by key id return the first match.
///
/// [1]: https://www.rfc-editor.org/rfc/rfc7517#section-5
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_more::Deref, derive_more::IntoIterator)]
pub struct JwkSet {
    #[deref]
    #[into_iterator(owned, ref)]
    keys: Vec<Jwk>,
}

impl JwkSet {
    /// Creates a set from keys, insertion order is preserved
    pub fn new(keys: impl IntoIterator<Item = Jwk>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Parses a JSON serialized JWK Set
    pub fn from_json(json: &str) -> JoseResult<Self> {
        Self::from_key_data(serde_json::from_str(json)?)
    }

    /// Builds a set from its JSON value, `keys` must be an array of JWK
    pub fn from_key_data(data: Value) -> JoseResult<Self> {
        let Some(Value::Array(keys)) = data.get("keys") else {
            return Err(JoseError::InvalidJwk("a JWK Set must have a 'keys' array"));
        };
        let keys = keys
            .iter()
            .map(|k| match k {
                Value::Object(values) => Jwk::new(values.clone()),
                _ => Err(JoseError::InvalidJwk("a JWK must be a JSON object")),
            })
            .collect::<JoseResult<Vec<_>>>()?;
        Ok(Self { keys })
    }

    /// Serializes the set as `{"keys":[...]}`
    pub fn to_json(&self) -> JoseResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// New set with `jwk` appended
    pub fn with(&self, jwk: Jwk) -> Self {
        let mut keys = self.keys.clone();
        keys.push(jwk);
        Self { keys }
    }

    /// New set without any key identified by `kid`
    pub fn without(&self, kid: &str) -> Self {
        let keys = self.keys.iter().filter(|k| k.kid() != Some(kid)).cloned().collect();
        Self { keys }
    }

    /// Whether a key is identified by `kid`
    pub fn has(&self, kid: &str) -> bool {
        self.get(kid).is_some()
    }

    /// First key identified by `kid`
    pub fn get(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid() == Some(kid))
    }

    /// Every key of the set
    pub fn all(&self) -> &[Jwk] {
        &self.keys
    }

    /// Selects the most suitable key
    ///
    /// # Arguments
    /// * `key_use` - either "sig" or "enc"
    /// * `algorithm` - when set, the key type must be supported and the key 'alg' (if any) must match
    /// * `restrictions` - parameters every candidate must have with the exact same value
    ///
    /// Keys with an explicit matching 'use'/'key_ops' or 'alg' are preferred over keys which merely
    /// do not forbid the usage. Ties are broken by insertion order.
    pub fn select_key(
        &self,
        key_use: &str,
        algorithm: Option<&dyn Algorithm>,
        restrictions: &Map<String, Value>,
    ) -> JoseResult<Option<&Jwk>> {
        if !matches!(key_use, "sig" | "enc") {
            return Err(JoseError::InvalidArgument(
                "Allowed key types are 'sig' or 'enc'".to_string(),
            ));
        }
        let selected = self
            .keys
            .iter()
            .filter_map(|key| {
                let usage_score = Self::usage_score(key, key_use)?;
                let alg_score = Self::algorithm_score(key, algorithm)?;
                Self::satisfies(key, restrictions).then_some((usage_score + alg_score, key))
            })
            // `max_by_key` keeps the last maximum, hence the reversed iteration
            .rev()
            .max_by_key(|(score, _)| *score)
            .map(|(_, key)| key);
        if selected.is_none() {
            tracing::debug!(key_use, "no key in the set satisfies the requirements");
        }
        Ok(selected)
    }

    fn usage_score(key: &Jwk, key_use: &str) -> Option<u8> {
        if let Some(u) = key.key_use() {
            return (u == key_use).then_some(1);
        }
        if let Some(ops) = key.key_ops() {
            let expected: &[&str] = if key_use == "sig" {
                &SIGNATURE_OPERATIONS
            } else {
                &ENCRYPTION_OPERATIONS
            };
            return ops.iter().any(|op| expected.contains(op)).then_some(1);
        }
        Some(0)
    }

    fn algorithm_score(key: &Jwk, algorithm: Option<&dyn Algorithm>) -> Option<u8> {
        let Some(algorithm) = algorithm else {
            return Some(0);
        };
        if !algorithm.allowed_key_types().contains(&key.kty()) {
            return None;
        }
        match key.alg() {
            Some(alg) => (alg == algorithm.name()).then_some(2),
            None => Some(1),
        }
    }

    fn satisfies(key: &Jwk, restrictions: &Map<String, Value>) -> bool {
        restrictions.iter().all(|(k, v)| key.get(k) == Some(v))
    }
}

impl FromIterator<Jwk> for JwkSet {
    fn from_iter<T: IntoIterator<Item = Jwk>>(iter: T) -> Self {
        Self::new(iter)
    }
}
