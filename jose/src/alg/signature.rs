//! JWS algorithms of [RFC 7518 Section 3][1] and EdDSA from [RFC 8037][2]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7518#section-3
//! [2]: https://www.rfc-editor.org/rfc/rfc8037

use rsa::{Pkcs1v15Sign, Pss};

use crate::jwk::{ecdsa::EcKey, eddsa::Ed25519Key, rsa::RsaKey};
use crate::prelude::*;

/// HMAC with a SHA-2 function
#[derive(Debug, Copy, Clone)]
pub struct Hmac {
    name: &'static str,
    hash: HashAlgorithm,
}

impl Hmac {
    /// HS256
    pub const HS256: Self = Self::new("HS256", HashAlgorithm::SHA256);
    /// HS384
    pub const HS384: Self = Self::new("HS384", HashAlgorithm::SHA384);
    /// HS512
    pub const HS512: Self = Self::new("HS512", HashAlgorithm::SHA512);

    const fn new(name: &'static str, hash: HashAlgorithm) -> Self {
        Self { name, hash }
    }

    /// A key of the same size as the hash output or larger MUST be used
    fn secret(&self, key: &Jwk) -> JoseResult<Vec<u8>> {
        key.check_kty(self.allowed_key_types())?;
        let k = key.decoded("k")?;
        if k.len() < self.hash.size() {
            return Err(JoseError::InvalidKey("HMAC key is shorter than the hash output"));
        }
        Ok(k)
    }
}

impl Algorithm for Hmac {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["oct"]
    }
}

impl SignatureAlgorithm for Hmac {
    fn sign(&self, key: &Jwk, input: &[u8]) -> JoseResult<Vec<u8>> {
        self.hash.hmac(&self.secret(key)?, &[input])
    }

    fn verify(&self, key: &Jwk, input: &[u8], signature: &[u8]) -> JoseResult<bool> {
        let secret = self.secret(key)?;
        Ok(signature.len() == self.hash.size() && self.hash.hmac_verify(&secret, &[input], signature)?)
    }
}

/// ECDSA over a NIST curve, signatures are the raw `r || s` concatenation
#[derive(Debug, Copy, Clone)]
pub struct Ecdsa {
    name: &'static str,
    curve: EcCurve,
}

impl Ecdsa {
    /// ES256, P-256 and SHA-256
    pub const ES256: Self = Self {
        name: "ES256",
        curve: EcCurve::P256,
    };
    /// ES384, P-384 and SHA-384
    pub const ES384: Self = Self {
        name: "ES384",
        curve: EcCurve::P384,
    };

    fn key(&self, jwk: &Jwk) -> JoseResult<EcKey> {
        let key = EcKey::try_from_jwk(jwk)?;
        if key.curve() != self.curve {
            return Err(JoseError::InvalidKey("elliptic curve does not match the algorithm"));
        }
        Ok(key)
    }
}

impl Algorithm for Ecdsa {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["EC"]
    }
}

impl SignatureAlgorithm for Ecdsa {
    fn sign(&self, key: &Jwk, input: &[u8]) -> JoseResult<Vec<u8>> {
        self.key(key)?.sign(input)
    }

    fn verify(&self, key: &Jwk, input: &[u8], signature: &[u8]) -> JoseResult<bool> {
        if signature.len() != 2 * self.curve.field_len() {
            return Ok(false);
        }
        self.key(key)?.verify(input, signature)
    }
}

/// EdDSA with Ed25519
#[derive(Debug, Copy, Clone, Default)]
pub struct EdDsa;

impl Algorithm for EdDsa {
    fn name(&self) -> &'static str {
        "EdDSA"
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["OKP"]
    }
}

impl SignatureAlgorithm for EdDsa {
    fn sign(&self, key: &Jwk, input: &[u8]) -> JoseResult<Vec<u8>> {
        Ed25519Key::try_from_jwk(key)?.sign(input)
    }

    fn verify(&self, key: &Jwk, input: &[u8], signature: &[u8]) -> JoseResult<bool> {
        Ok(Ed25519Key::try_from_jwk(key)?.verify(input, signature))
    }
}

/// RSASSA-PKCS1-v1_5 or RSASSA-PSS
#[derive(Debug, Copy, Clone)]
pub struct RsaSignature {
    name: &'static str,
    hash: HashAlgorithm,
    pss: bool,
}

impl RsaSignature {
    /// RS256
    pub const RS256: Self = Self::pkcs1("RS256", HashAlgorithm::SHA256);
    /// RS384
    pub const RS384: Self = Self::pkcs1("RS384", HashAlgorithm::SHA384);
    /// RS512
    pub const RS512: Self = Self::pkcs1("RS512", HashAlgorithm::SHA512);
    /// PS256
    pub const PS256: Self = Self::pss("PS256", HashAlgorithm::SHA256);
    /// PS384
    pub const PS384: Self = Self::pss("PS384", HashAlgorithm::SHA384);
    /// PS512
    pub const PS512: Self = Self::pss("PS512", HashAlgorithm::SHA512);

    const fn pkcs1(name: &'static str, hash: HashAlgorithm) -> Self {
        Self { name, hash, pss: false }
    }

    const fn pss(name: &'static str, hash: HashAlgorithm) -> Self {
        Self { name, hash, pss: true }
    }

    fn pkcs1_scheme(&self) -> Pkcs1v15Sign {
        match self.hash {
            HashAlgorithm::SHA256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
            HashAlgorithm::SHA384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
            HashAlgorithm::SHA512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        }
    }

    /// Salt as long as the hash output as per RFC 7518 Section 3.5
    fn pss_scheme(&self) -> Pss {
        match self.hash {
            HashAlgorithm::SHA256 => Pss::new::<sha2::Sha256>(),
            HashAlgorithm::SHA384 => Pss::new::<sha2::Sha384>(),
            HashAlgorithm::SHA512 => Pss::new::<sha2::Sha512>(),
        }
    }
}

impl Algorithm for RsaSignature {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["RSA"]
    }
}

impl SignatureAlgorithm for RsaSignature {
    fn sign(&self, key: &Jwk, input: &[u8]) -> JoseResult<Vec<u8>> {
        let key = RsaKey::try_from_jwk(key)?;
        let sk = key.private_key()?;
        let digest = self.hash.digest(input);
        Ok(if self.pss {
            sk.sign_with_rng(&mut rand::rngs::OsRng, self.pss_scheme(), &digest)?
        } else {
            sk.sign(self.pkcs1_scheme(), &digest)?
        })
    }

    fn verify(&self, key: &Jwk, input: &[u8], signature: &[u8]) -> JoseResult<bool> {
        let pk = RsaKey::try_from_jwk(key)?.public_key();
        let digest = self.hash.digest(input);
        let verified = if self.pss {
            pk.verify(self.pss_scheme(), &digest, signature)
        } else {
            pk.verify(self.pkcs1_scheme(), &digest, signature)
        };
        Ok(verified.is_ok())
    }
}

/// Unsecured JWS, only usable with a `{"kty": "none"}` key and when explicitly allowed
#[derive(Debug, Copy, Clone, Default)]
pub struct NoSignature;

impl Algorithm for NoSignature {
    fn name(&self) -> &'static str {
        "none"
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["none"]
    }
}

impl SignatureAlgorithm for NoSignature {
    fn sign(&self, key: &Jwk, _input: &[u8]) -> JoseResult<Vec<u8>> {
        key.check_kty(self.allowed_key_types())?;
        Ok(vec![])
    }

    fn verify(&self, key: &Jwk, _input: &[u8], signature: &[u8]) -> JoseResult<bool> {
        key.check_kty(self.allowed_key_types())?;
        Ok(signature.is_empty())
    }
}
