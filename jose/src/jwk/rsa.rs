use rsa::traits::{PrivateKeyParts as _, PublicKeyParts as _};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde_json::Map;

use crate::prelude::*;

/// RSA key material extracted from an 'RSA' JWK
pub enum RsaKey {
    /// Only 'n' and 'e'
    Public(RsaPublicKey),
    /// 'd' and the two primes 'p' and 'q' as well
    Private(RsaPrivateKey),
}

impl RsaKey {
    /// Extracts the modulus, exponent and, when present, the private exponent and primes
    pub fn try_from_jwk(jwk: &Jwk) -> JoseResult<Self> {
        jwk.check_kty(&["RSA"])?;
        let n = BigUint::from_bytes_be(&jwk.decoded("n")?);
        let e = BigUint::from_bytes_be(&jwk.decoded("e")?);
        let Some(d) = jwk.decoded_opt("d")? else {
            return Ok(Self::Public(RsaPublicKey::new(n, e)?));
        };
        let d = BigUint::from_bytes_be(&d);
        let p = BigUint::from_bytes_be(&jwk.decoded("p")?);
        let q = BigUint::from_bytes_be(&jwk.decoded("q")?);
        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])?;
        key.validate()?;
        Ok(Self::Private(key))
    }

    /// Public part, required for verification and encryption
    pub fn public_key(&self) -> RsaPublicKey {
        match self {
            Self::Public(pk) => pk.clone(),
            Self::Private(sk) => sk.to_public_key(),
        }
    }

    /// Private part, required for signing and decryption
    pub fn private_key(&self) -> JoseResult<&RsaPrivateKey> {
        match self {
            Self::Public(_) => Err(JoseError::MissingKeyParameter("d")),
            Self::Private(sk) => Ok(sk),
        }
    }

    /// JWK of a private key, including its primes
    pub fn private_jwk(sk: &RsaPrivateKey) -> JoseResult<Jwk> {
        let mut values = Map::new();
        values.insert("kty".to_string(), "RSA".into());
        values.insert("n".to_string(), base64_url_encode(sk.n().to_bytes_be()).into());
        values.insert("e".to_string(), base64_url_encode(sk.e().to_bytes_be()).into());
        values.insert("d".to_string(), base64_url_encode(sk.d().to_bytes_be()).into());
        let [p, q] = sk.primes() else {
            return Err(JoseError::InvalidKey("multi-prime RSA keys are not supported"));
        };
        values.insert("p".to_string(), base64_url_encode(p.to_bytes_be()).into());
        values.insert("q".to_string(), base64_url_encode(q.to_bytes_be()).into());
        Jwk::new(values)
    }
}


#[cfg(test)]
impl std::fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKey").finish_non_exhaustive()
    }
}
