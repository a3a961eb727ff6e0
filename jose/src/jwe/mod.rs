//! JSON Web Encryption as specified in [RFC 7516][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7516

/// Encryption
pub mod builder;
/// Decryption
pub mod decrypter;
/// Parsing and decryption in one go
pub mod loader;
pub mod serializer;

use crate::prelude::*;

/// An encrypted token: one ciphertext, one or more recipients able to recover its CEK. Immutable
/// once built or parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Jwe {
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
    tag: Vec<u8>,
    aad: Option<Vec<u8>>,
    shared_protected_header: Header,
    encoded_shared_protected_header: Option<String>,
    shared_header: Header,
    recipients: Vec<Recipient>,
    payload: Option<Vec<u8>>,
}

/// One recipient of a [Jwe]
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    header: Header,
    encrypted_key: Option<Vec<u8>>,
}

impl Jwe {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ciphertext: Vec<u8>,
        iv: Vec<u8>,
        tag: Vec<u8>,
        aad: Option<Vec<u8>>,
        shared_protected_header: Header,
        encoded_shared_protected_header: Option<String>,
        shared_header: Header,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            ciphertext,
            iv,
            tag,
            aad,
            shared_protected_header,
            encoded_shared_protected_header,
            shared_header,
            recipients,
            payload: None,
        }
    }

    /// Same token carrying its decrypted payload
    pub(crate) fn with_payload(&self, payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            ..self.clone()
        }
    }

    /// Plaintext, only available once decrypted
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Encrypted payload
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Initialization vector
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Authentication tag
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Additional authenticated data supplied by the sender
    pub fn aad(&self) -> Option<&[u8]> {
        self.aad.as_deref()
    }

    /// Header shared by all recipients and integrity protected
    pub fn shared_protected_header(&self) -> &Header {
        &self.shared_protected_header
    }

    /// Shared protected header exactly as it is encoded in the AAD
    pub fn encoded_shared_protected_header(&self) -> Option<&str> {
        self.encoded_shared_protected_header.as_deref()
    }

    /// Header shared by all recipients, not integrity protected
    pub fn shared_header(&self) -> &Header {
        &self.shared_header
    }

    /// All the recipients, in order
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Recipient at `index`
    pub fn recipient(&self, index: usize) -> JoseResult<&Recipient> {
        self.recipients
            .get(index)
            .ok_or_else(|| JoseError::InvalidArgument(format!("no recipient at index {index}")))
    }

    /// Number of recipients
    pub fn count_recipients(&self) -> usize {
        self.recipients.len()
    }

    /// Same token with a single recipient, convenient for serializing in a single recipient format
    pub fn split(&self) -> Vec<Jwe> {
        self.recipients
            .iter()
            .map(|r| Self {
                recipients: vec![r.clone()],
                ..self.clone()
            })
            .collect()
    }

    /// Recipient, shared and shared protected headers merged. Fails when they overlap.
    pub fn complete_header(&self, recipient_index: usize) -> JoseResult<Header> {
        let recipient = self.recipient(recipient_index)?;
        let layers = [&recipient.header, &self.shared_header, &self.shared_protected_header];
        header::check_duplicated_parameters(&layers)?;
        Ok(header::merge(&layers))
    }

    /// `ASCII(BASE64URL(protected))`, followed by `'.' || BASE64URL(aad)` when there is an AAD
    pub(crate) fn additional_authenticated_data(&self) -> Vec<u8> {
        additional_authenticated_data(self.encoded_shared_protected_header.as_deref(), self.aad.as_deref())
    }
}

pub(crate) fn additional_authenticated_data(encoded_protected_header: Option<&str>, aad: Option<&[u8]>) -> Vec<u8> {
    let mut input = encoded_protected_header.unwrap_or_default().as_bytes().to_vec();
    if let Some(aad) = aad {
        input.push(b'.');
        input.extend_from_slice(base64_url_encode(aad).as_bytes());
    }
    input
}

impl Recipient {
    pub(crate) fn new(header: Header, encrypted_key: Option<Vec<u8>>) -> Self {
        Self { header, encrypted_key }
    }

    /// Per-recipient unprotected header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Encrypted CEK, `None` in direct encryption or direct key agreement
    pub fn encrypted_key(&self) -> Option<&[u8]> {
        self.encrypted_key.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_utils::*;

    use super::*;

    #[test]
    fn aad_should_join_protected_header_and_aad() {
        assert_eq!(additional_authenticated_data(Some("eyJ9"), None), b"eyJ9");
        assert_eq!(additional_authenticated_data(Some("eyJ9"), Some(b"\xff")), b"eyJ9._w");
        assert_eq!(additional_authenticated_data(None, Some(b"\xff")), b"._w");
    }

    #[test]
    fn complete_header_should_refuse_overlapping_layers() {
        let jwe = Jwe::new(
            vec![],
            vec![],
            vec![],
            None,
            header(json!({"enc": "A128GCM"})),
            None,
            header(json!({"kid": "1"})),
            vec![
                Recipient::new(header(json!({"alg": "dir"})), None),
                Recipient::new(header(json!({"kid": "2"})), None),
            ],
        );
        let complete = jwe.complete_header(0).unwrap();
        assert_eq!(complete, header(json!({"alg": "dir", "kid": "1", "enc": "A128GCM"})));
        assert!(matches!(jwe.complete_header(1).unwrap_err(), JoseError::HeaderConflict(_)));
        assert!(matches!(jwe.complete_header(2).unwrap_err(), JoseError::InvalidArgument(_)));
        assert_eq!(jwe.split().len(), 2);
    }
}
