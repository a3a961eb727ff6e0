//! JWE serialization formats of [RFC 7516 Section 7][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7516#section-7

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::jwe::{Jwe, Recipient};
use crate::prelude::*;

/// Converts a [Jwe] from and to one wire format
pub trait JweSerializer: Send + Sync {
    /// Identifier, e.g. 'jwe_compact'
    fn name(&self) -> &'static str;

    /// Human readable name
    fn display_name(&self) -> &'static str;

    /// Serializes the token. Single recipient formats pick the recipient at `recipient_index`
    /// (default 0), the general format ignores it.
    fn serialize(&self, jwe: &Jwe, recipient_index: Option<usize>) -> JoseResult<String>;

    /// Parses the token, without decrypting it
    fn unserialize(&self, input: &str) -> JoseResult<Jwe>;
}

/// `BASE64URL(protected).BASE64URL(encrypted_key).BASE64URL(iv).BASE64URL(ciphertext).BASE64URL(tag)`
#[derive(Debug, Copy, Clone, Default)]
pub struct JweCompactSerializer;

/// Single recipient JSON object
#[derive(Debug, Copy, Clone, Default)]
pub struct JweJsonFlattenedSerializer;

/// JSON object with a `recipients` array
#[derive(Debug, Copy, Clone, Default)]
pub struct JweJsonGeneralSerializer;

/// Members common to both JSON formats
#[derive(Debug, Serialize, Deserialize)]
struct JsonShared {
    #[serde(skip_serializing_if = "Option::is_none")]
    protected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unprotected: Option<Header>,
    iv: String,
    ciphertext: String,
    tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    aad: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonRecipient {
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<Header>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encrypted_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FlattenedJwe {
    #[serde(flatten)]
    shared: JsonShared,
    #[serde(flatten)]
    recipient: JsonRecipient,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeneralJwe {
    #[serde(flatten)]
    shared: JsonShared,
    recipients: Vec<JsonRecipient>,
}

fn non_empty(header: &Header) -> Option<Header> {
    (!header.is_empty()).then(|| header.clone())
}

impl From<&Jwe> for JsonShared {
    fn from(jwe: &Jwe) -> Self {
        Self {
            protected: jwe.encoded_shared_protected_header().map(str::to_string),
            unprotected: non_empty(jwe.shared_header()),
            iv: base64_url_encode(jwe.iv()),
            ciphertext: base64_url_encode(jwe.ciphertext()),
            tag: base64_url_encode(jwe.tag()),
            aad: jwe.aad().map(base64_url_encode),
        }
    }
}

impl From<&Recipient> for JsonRecipient {
    fn from(recipient: &Recipient) -> Self {
        Self {
            header: non_empty(recipient.header()),
            encrypted_key: recipient.encrypted_key().map(base64_url_encode),
        }
    }
}

impl TryFrom<JsonRecipient> for Recipient {
    type Error = JoseError;

    fn try_from(r: JsonRecipient) -> JoseResult<Self> {
        let encrypted_key = r.encrypted_key.as_deref().map(base64_url_decode).transpose()?;
        Ok(Recipient::new(r.header.unwrap_or_default(), encrypted_key))
    }
}

fn parse_json(shared: JsonShared, recipients: Vec<JsonRecipient>) -> JoseResult<Jwe> {
    let recipients = recipients
        .into_iter()
        .map(Recipient::try_from)
        .collect::<JoseResult<Vec<_>>>()?;
    if recipients.is_empty() {
        return Err(JoseError::NoRecipients);
    }
    let shared_protected_header = shared
        .protected
        .as_deref()
        .map(header::decode)
        .transpose()?
        .unwrap_or_default();
    Ok(Jwe::new(
        base64_url_decode(&shared.ciphertext)?,
        base64_url_decode(&shared.iv)?,
        base64_url_decode(&shared.tag)?,
        shared.aad.as_deref().map(base64_url_decode).transpose()?,
        shared_protected_header,
        shared.protected,
        shared.unprotected.unwrap_or_default(),
        recipients,
    ))
}

impl JweSerializer for JweCompactSerializer {
    fn name(&self) -> &'static str {
        "jwe_compact"
    }

    fn display_name(&self) -> &'static str {
        "JWE Compact"
    }

    fn serialize(&self, jwe: &Jwe, recipient_index: Option<usize>) -> JoseResult<String> {
        let recipient = jwe.recipient(recipient_index.unwrap_or_default())?;
        if !jwe.shared_header().is_empty() || !recipient.header().is_empty() {
            return Err(JoseError::InvalidSerialization(
                "the token has an unprotected header and cannot be converted into the compact format",
            ));
        }
        if jwe.aad().is_some() {
            return Err(JoseError::InvalidSerialization(
                "the token has additional authenticated data and cannot be converted into the compact format",
            ));
        }
        Ok(format!(
            "{}.{}.{}.{}.{}",
            jwe.encoded_shared_protected_header().unwrap_or_default(),
            recipient.encrypted_key().map(base64_url_encode).unwrap_or_default(),
            base64_url_encode(jwe.iv()),
            base64_url_encode(jwe.ciphertext()),
            base64_url_encode(jwe.tag()),
        ))
    }

    fn unserialize(&self, input: &str) -> JoseResult<Jwe> {
        let parts = input.split('.').collect::<Vec<_>>();
        let [protected, encrypted_key, iv, ciphertext, tag] = parts.as_slice() else {
            return Err(JoseError::InvalidSerialization("a compact JWE has 5 parts"));
        };
        let encrypted_key = (!encrypted_key.is_empty())
            .then(|| base64_url_decode(encrypted_key))
            .transpose()?;
        Ok(Jwe::new(
            base64_url_decode(ciphertext)?,
            base64_url_decode(iv)?,
            base64_url_decode(tag)?,
            None,
            header::decode(protected)?,
            Some(protected.to_string()),
            Header::new(),
            vec![Recipient::new(Header::new(), encrypted_key)],
        ))
    }
}

impl JweSerializer for JweJsonFlattenedSerializer {
    fn name(&self) -> &'static str {
        "jwe_json_flattened"
    }

    fn display_name(&self) -> &'static str {
        "JWE JSON Flattened"
    }

    fn serialize(&self, jwe: &Jwe, recipient_index: Option<usize>) -> JoseResult<String> {
        let recipient = jwe.recipient(recipient_index.unwrap_or_default())?;
        let flattened = FlattenedJwe {
            shared: jwe.into(),
            recipient: recipient.into(),
        };
        Ok(serde_json::to_string(&flattened)?)
    }

    fn unserialize(&self, input: &str) -> JoseResult<Jwe> {
        let value = serde_json::from_str::<serde_json::Value>(input)?;
        if value.get("recipients").is_some() {
            return Err(JoseError::InvalidSerialization("not a flattened JWE"));
        }
        let flattened = serde_json::from_value::<FlattenedJwe>(value)?;
        parse_json(flattened.shared, vec![flattened.recipient])
    }
}

impl JweSerializer for JweJsonGeneralSerializer {
    fn name(&self) -> &'static str {
        "jwe_json_general"
    }

    fn display_name(&self) -> &'static str {
        "JWE JSON General"
    }

    fn serialize(&self, jwe: &Jwe, _: Option<usize>) -> JoseResult<String> {
        if jwe.count_recipients() == 0 {
            return Err(JoseError::NoRecipients);
        }
        let general = GeneralJwe {
            shared: jwe.into(),
            recipients: jwe.recipients().iter().map(JsonRecipient::from).collect(),
        };
        Ok(serde_json::to_string(&general)?)
    }

    fn unserialize(&self, input: &str) -> JoseResult<Jwe> {
        let general = serde_json::from_str::<GeneralJwe>(input)?;
        parse_json(general.shared, general.recipients)
    }
}

/// Holds the known formats, tries each of them when parsing
#[derive(Clone)]
pub struct JweSerializerManager {
    serializers: Vec<Arc<dyn JweSerializer>>,
}

impl JweSerializerManager {
    /// Manager with the given formats, parsing tries them in this order
    pub fn new(serializers: impl IntoIterator<Item = Arc<dyn JweSerializer>>) -> Self {
        Self {
            serializers: serializers.into_iter().collect(),
        }
    }

    /// Compact, flattened and general formats
    pub fn with_defaults() -> Self {
        Self::new([
            Arc::new(JweCompactSerializer) as Arc<dyn JweSerializer>,
            Arc::new(JweJsonFlattenedSerializer) as Arc<dyn JweSerializer>,
            Arc::new(JweJsonGeneralSerializer) as Arc<dyn JweSerializer>,
        ])
    }

    /// Names of the known formats
    pub fn names(&self) -> Vec<&'static str> {
        self.serializers.iter().map(|s| s.name()).collect()
    }

    /// Serializes with the format named `name`
    pub fn serialize(&self, name: &str, jwe: &Jwe, recipient_index: Option<usize>) -> JoseResult<String> {
        self.serializers
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| JoseError::UnsupportedSerializer(name.to_string()))?
            .serialize(jwe, recipient_index)
    }

    /// Parses with the first format accepting the input, also returns that format's name
    pub fn unserialize(&self, input: &str) -> JoseResult<(Jwe, &'static str)> {
        for serializer in &self.serializers {
            match serializer.unserialize(input) {
                Ok(jwe) => return Ok((jwe, serializer.name())),
                Err(e) => tracing::trace!(serializer = serializer.name(), error = %e, "input not in this format"),
            }
        }
        Err(JoseError::UnrecognizedFormat)
    }
}

impl Default for JweSerializerManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}
