//! JSON Web Key as specified in [RFC 7517][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7517

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::prelude::*;

/// NIST curves key material
pub mod ecdsa;
/// Ed25519 key material
pub mod eddsa;
/// RSA key material
pub mod rsa;
/// JWK Set
pub mod set;
pub mod thumbprint;

/// Parameters holding private or secret key material
const PRIVATE_PARAMETERS: [&str; 8] = ["d", "p", "q", "dp", "dq", "qi", "oth", "k"];

/// A JSON Web Key. Immutable, equality is structural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Jwk {
    values: Map<String, Value>,
}

impl Jwk {
    /// Builds a key from its parameters. A string `kty` is mandatory.
    pub fn new(values: Map<String, Value>) -> JoseResult<Self> {
        match values.get("kty") {
            Some(Value::String(_)) => Ok(Self { values }),
            _ => Err(JoseError::InvalidJwk("the parameter 'kty' is mandatory")),
        }
    }

    /// Parses a JSON serialized JWK
    pub fn from_json(json: &str) -> JoseResult<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(values) => Self::new(values),
            _ => Err(JoseError::InvalidJwk("a JWK must be a JSON object")),
        }
    }

    /// Symmetric key with the given secret
    pub fn octet(secret: impl AsRef<[u8]>) -> Self {
        let mut values = Map::new();
        values.insert("kty".to_string(), "oct".into());
        values.insert("k".to_string(), base64_url_encode(secret).into());
        Self { values }
    }

    /// Returns a copy of this key with an additional or replaced parameter
    pub fn with_parameter(&self, name: &str, value: impl Into<Value>) -> JoseResult<Self> {
        let mut values = self.values.clone();
        values.insert(name.to_string(), value.into());
        Self::new(values)
    }

    /// Serializes the key
    pub fn to_json(&self) -> JoseResult<String> {
        Ok(serde_json::to_string(&self.values)?)
    }

    /// All key parameters
    pub fn all(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Whether the parameter is present
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Parameter value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Key type
    pub fn kty(&self) -> &str {
        self.get_str("kty").unwrap_or_default()
    }

    /// Key identifier
    pub fn kid(&self) -> Option<&str> {
        self.get_str("kid")
    }

    /// Intended use, 'sig' or 'enc'
    pub fn key_use(&self) -> Option<&str> {
        self.get_str("use")
    }

    /// Algorithm the key is restricted to
    pub fn alg(&self) -> Option<&str> {
        self.get_str("alg")
    }

    /// Permitted operations, `None` when absent or malformed
    pub fn key_ops(&self) -> Option<Vec<&str>> {
        self.get("key_ops")?.as_array()?.iter().map(Value::as_str).collect()
    }

    /// Public counterpart of this key, with every private parameter stripped
    pub fn to_public(&self) -> Self {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| !PRIVATE_PARAMETERS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { values }
    }

    /// Whether the key holds private or secret material
    pub fn is_private(&self) -> bool {
        PRIVATE_PARAMETERS.iter().any(|p| self.has(p))
    }

    /// Decodes a base64url encoded key parameter
    pub fn decoded(&self, name: &'static str) -> JoseResult<Vec<u8>> {
        let value = self.get_str(name).ok_or(JoseError::MissingKeyParameter(name))?;
        base64_url_decode(value)
    }

    /// Decodes a base64url encoded key parameter when present
    pub fn decoded_opt(&self, name: &'static str) -> JoseResult<Option<Vec<u8>>> {
        if self.has(name) { self.decoded(name).map(Some) } else { Ok(None) }
    }

    /// Fails unless the key type is one of `allowed`
    pub fn check_kty(&self, allowed: &[&str]) -> JoseResult<()> {
        if allowed.contains(&self.kty()) {
            Ok(())
        } else {
            Err(JoseError::KeyTypeMismatch(self.kty().to_string()))
        }
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

impl TryFrom<Map<String, Value>> for Jwk {
    type Error = JoseError;

    fn try_from(values: Map<String, Value>) -> JoseResult<Self> {
        Self::new(values)
    }
}

impl From<Jwk> for Map<String, Value> {
    fn from(jwk: Jwk) -> Self {
        jwk.values
    }
}

impl std::str::FromStr for Jwk {
    type Err = JoseError;

    fn from_str(s: &str) -> JoseResult<Self> {
        Self::from_json(s)
    }
}
