//! Signed then encrypted tokens: a JWE whose plaintext is a serialized JWS, as described in
//! [RFC 7519 Section 5.2][1]
//!
//! Each layer has its own allow-lists so that what is acceptable for the signature never decides
//! what is acceptable for the encryption, or the other way around.
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7519#section-5.2

use crate::prelude::*;

/// Content type announcing a nested token
const NESTED_CONTENT_TYPE: &str = "JWT";

/// Signs a payload, then encrypts the serialized JWS
#[derive(Clone)]
pub struct NestedTokenBuilder {
    jws_builder: JwsBuilder,
    jws_serializers: JwsSerializerManager,
    jwe_builder: JweBuilder,
    jwe_serializers: JweSerializerManager,
}

/// A signature to add to the inner token
pub struct NestedSignature<'a> {
    /// Signing key
    pub key: &'a Jwk,
    /// Protected header, must carry 'alg'
    pub protected_header: Header,
    /// Unprotected header
    pub header: Header,
}

/// A recipient of the outer token
pub struct NestedRecipient<'a> {
    /// Key encryption key
    pub key: &'a Jwk,
    /// Per-recipient unprotected header
    pub header: Header,
}

impl NestedTokenBuilder {
    /// Builder chaining both layers
    pub fn new(
        jws_builder: JwsBuilder,
        jws_serializers: JwsSerializerManager,
        jwe_builder: JweBuilder,
        jwe_serializers: JweSerializerManager,
    ) -> Self {
        Self {
            jws_builder,
            jws_serializers,
            jwe_builder,
            jwe_serializers,
        }
    }

    /// Signs `payload`, serializes the JWS with `jws_format`, encrypts it and serializes the JWE
    /// with `jwe_format`. The outer token gets `"cty": "JWT"` unless it already declares a
    /// content type.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        payload: &str,
        signatures: Vec<NestedSignature>,
        jws_format: &str,
        jwe_shared_protected_header: Header,
        jwe_shared_header: Header,
        recipients: Vec<NestedRecipient>,
        jwe_format: &str,
        aad: Option<&[u8]>,
    ) -> JoseResult<String> {
        let mut jws_builder = self.jws_builder.clone().create().with_payload(payload, false)?;
        for signature in signatures {
            jws_builder = jws_builder.add_signature(signature.key, signature.protected_header, signature.header)?;
        }
        let jws = jws_builder.build()?;
        let inner = self.jws_serializers.serialize(jws_format, &jws, None)?;

        let mut protected = jwe_shared_protected_header;
        if !protected.contains_key("cty") && !jwe_shared_header.contains_key("cty") {
            protected.insert("cty".to_string(), NESTED_CONTENT_TYPE.into());
        }
        let mut jwe_builder = self
            .jwe_builder
            .clone()
            .create()
            .with_payload(inner)?
            .with_shared_protected_header(protected)?
            .with_shared_header(jwe_shared_header)?;
        if let Some(aad) = aad {
            jwe_builder = jwe_builder.with_aad(aad);
        }
        for recipient in recipients {
            jwe_builder = jwe_builder.add_recipient(recipient.key, recipient.header)?;
        }
        let jwe = jwe_builder.build()?;
        tracing::trace!(jws_format, jwe_format, "nested token created");
        self.jwe_serializers.serialize(jwe_format, &jwe, None)
    }
}

/// Decrypts the outer token, then verifies the inner one
#[derive(Clone)]
pub struct NestedTokenLoader {
    jwe_loader: JweLoader,
    jws_loader: JwsLoader,
}

impl NestedTokenLoader {
    /// Loader chaining both layers
    pub fn new(jwe_loader: JweLoader, jws_loader: JwsLoader) -> Self {
        Self { jwe_loader, jws_loader }
    }

    /// Returns the verified inner token and the index of its verified signature. `None` when the
    /// outer token cannot be decrypted or no inner signature verifies.
    pub fn load(&self, token: &str, encryption_keys: &JwkSet, signature_keys: &JwkSet) -> JoseResult<Option<(Jws, usize)>> {
        let Some((jwe, _, _)) = self.jwe_loader.load_and_decrypt_with_key_set(token, encryption_keys)? else {
            tracing::debug!("outer token could not be decrypted");
            return Ok(None);
        };
        let content_type = jwe
            .shared_protected_header()
            .get("cty")
            .or_else(|| jwe.shared_header().get("cty"))
            .and_then(|cty| cty.as_str());
        if !matches!(content_type, Some(cty) if cty.eq_ignore_ascii_case(NESTED_CONTENT_TYPE)) {
            return Err(JoseError::InvalidNestedContentType);
        }
        let payload = jwe.payload().ok_or(JoseError::ImplementationError)?;
        let inner = std::str::from_utf8(payload).map_err(|_| JoseError::InvalidEncoding)?;
        Ok(self
            .jws_loader
            .load_and_verify_with_key_set(inner, signature_keys, None)?
            .map(|(jws, index, _)| (jws, index)))
    }
}
