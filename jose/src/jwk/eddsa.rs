use ed25519_dalek::{Signer as _, Verifier as _};
use serde_json::Map;
use zeroize::Zeroizing;

use crate::prelude::*;

/// Ed25519 key material extracted from an 'OKP' JWK as per [RFC 8037][1]
///
/// [1]: https://www.rfc-editor.org/rfc/rfc8037
pub struct Ed25519Key {
    public: ed25519_dalek::VerifyingKey,
    secret: Option<Zeroizing<[u8; ed25519_dalek::SECRET_KEY_LENGTH]>>,
}

impl Ed25519Key {
    /// For JWK 'crv' field
    pub const CRV: &'static str = "Ed25519";

    /// Extracts the public key and, when present, the private seed
    pub fn try_from_jwk(jwk: &Jwk) -> JoseResult<Self> {
        jwk.check_kty(&["OKP"])?;
        if jwk.get("crv").and_then(|c| c.as_str()) != Some(Self::CRV) {
            return Err(JoseError::InvalidKey("unsupported octet key pair curve"));
        }
        let x: [u8; ed25519_dalek::PUBLIC_KEY_LENGTH] = jwk.decoded("x")?.as_slice().try_into()?;
        let public = ed25519_dalek::VerifyingKey::from_bytes(&x)?;
        let secret = match jwk.decoded_opt("d")? {
            Some(d) => Some(Zeroizing::new(d.as_slice().try_into()?)),
            None => None,
        };
        Ok(Self { public, secret })
    }

    /// Derives the key pair from a 32 bytes seed
    pub fn from_seed(seed: [u8; ed25519_dalek::SECRET_KEY_LENGTH]) -> Self {
        let public = ed25519_dalek::SigningKey::from_bytes(&seed).verifying_key();
        Self {
            public,
            secret: Some(Zeroizing::new(seed)),
        }
    }

    /// Signs with EdDSA
    pub fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>> {
        let seed = self.secret.as_ref().ok_or(JoseError::MissingKeyParameter("d"))?;
        let sk = ed25519_dalek::SigningKey::from_bytes(seed);
        Ok(sk.sign(input).to_bytes().to_vec())
    }

    /// Verifies an EdDSA signature
    pub fn verify(&self, input: &[u8], signature: &[u8]) -> bool {
        ed25519_dalek::Signature::from_slice(signature)
            .map(|s| self.public.verify(input, &s).is_ok())
            .unwrap_or(false)
    }

    /// Public JWK of this key
    pub fn to_public_jwk(&self) -> JoseResult<Jwk> {
        let mut values = Map::new();
        values.insert("kty".to_string(), "OKP".into());
        values.insert("crv".to_string(), Self::CRV.into());
        values.insert("x".to_string(), base64_url_encode(self.public.to_bytes()).into());
        Jwk::new(values)
    }

    /// Private JWK of this key
    pub fn to_private_jwk(&self) -> JoseResult<Jwk> {
        let seed = self.secret.as_ref().ok_or(JoseError::MissingKeyParameter("d"))?;
        self.to_public_jwk()?.with_parameter("d", base64_url_encode(seed.as_slice()))
    }
}


#[cfg(test)]
impl std::fmt::Debug for Ed25519Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Key").finish_non_exhaustive()
    }
}
