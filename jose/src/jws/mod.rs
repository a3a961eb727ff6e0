//! JSON Web Signature as specified in [RFC 7515][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7515

/// Signing
pub mod builder;
/// Parsing and verification in one go
pub mod loader;
pub mod serializer;
/// Signature verification
pub mod verifier;

use crate::prelude::*;

/// Understood 'crit' extensions
pub const UNDERSTOOD_CRITICAL_PARAMETERS: [&str; 1] = ["b64"];

/// A signed token: one payload, one or more signatures. Immutable once built or parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Jws {
    payload: Option<Vec<u8>>,
    encoded_payload: Option<String>,
    is_payload_detached: bool,
    signatures: Vec<Signature>,
}

/// One signature over the payload of a [Jws]
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    protected_header: Header,
    encoded_protected_header: Option<String>,
    header: Header,
    signature: Vec<u8>,
}

impl Jws {
    pub(crate) fn new(
        payload: Option<Vec<u8>>,
        encoded_payload: Option<String>,
        is_payload_detached: bool,
        signatures: Vec<Signature>,
    ) -> Self {
        Self {
            payload,
            encoded_payload,
            is_payload_detached,
            signatures,
        }
    }

    /// Raw payload, `None` when detached
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Payload as it appears in the signing input, `None` when detached
    pub fn encoded_payload(&self) -> Option<&str> {
        if self.is_payload_detached {
            None
        } else {
            self.encoded_payload.as_deref()
        }
    }

    /// Whether the payload has to be supplied by other means
    pub fn is_payload_detached(&self) -> bool {
        self.is_payload_detached
    }

    /// All the signatures, in order
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Signature at `index`
    pub fn signature(&self, index: usize) -> JoseResult<&Signature> {
        self.signatures
            .get(index)
            .ok_or_else(|| JoseError::InvalidArgument(format!("no signature at index {index}")))
    }

    /// Number of signatures
    pub fn count_signatures(&self) -> usize {
        self.signatures.len()
    }

    /// Same token with a single signature, convenient for serializing in a single signature format
    pub fn split(&self) -> Vec<Jws> {
        self.signatures
            .iter()
            .map(|s| Self {
                signatures: vec![s.clone()],
                ..self.clone()
            })
            .collect()
    }
}

impl Signature {
    pub(crate) fn new(
        protected_header: Header,
        encoded_protected_header: Option<String>,
        header: Header,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            protected_header,
            encoded_protected_header,
            header,
            signature,
        }
    }

    /// Integrity protected header
    pub fn protected_header(&self) -> &Header {
        &self.protected_header
    }

    /// Protected header exactly as encoded in the signing input
    pub fn encoded_protected_header(&self) -> Option<&str> {
        self.encoded_protected_header.as_deref()
    }

    /// Unprotected header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Protected and unprotected headers merged
    pub fn complete_header(&self) -> Header {
        header::merge(&[&self.header, &self.protected_header])
    }

    /// Raw signature
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Whether the payload this signature covers is base64url encoded
    pub fn is_payload_encoded(&self) -> bool {
        header::is_payload_encoded(&self.protected_header)
    }

    /// `ASCII(BASE64URL(protected) || '.' || payload)`, with `payload` already encoded
    pub(crate) fn signing_input(&self, encoded_payload: &[u8]) -> Vec<u8> {
        let protected = self.encoded_protected_header.as_deref().unwrap_or_default().as_bytes();
        let mut input = Vec::with_capacity(protected.len() + 1 + encoded_payload.len());
        input.extend_from_slice(protected);
        input.push(b'.');
        input.extend_from_slice(encoded_payload);
        input
    }
}
