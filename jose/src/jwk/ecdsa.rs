use serde_json::Map;
use zeroize::Zeroizing;

use crate::prelude::*;

/// Supported elliptic curves
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EcCurve {
    /// P-256
    P256,
    /// P-384
    P384,
}

impl EcCurve {
    /// Curve from a JWK 'crv' field
    pub fn from_crv(crv: &str) -> JoseResult<Self> {
        match crv {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            _ => Err(JoseError::InvalidKey("unsupported elliptic curve")),
        }
    }

    /// Curve of an 'EC' JWK
    pub fn from_jwk(jwk: &Jwk) -> JoseResult<Self> {
        jwk.check_kty(&["EC"])?;
        let crv = jwk.get("crv").and_then(|c| c.as_str()).ok_or(JoseError::MissingKeyParameter("crv"))?;
        Self::from_crv(crv)
    }

    /// For JWK 'crv' field
    pub const fn crv(&self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
        }
    }

    /// Size in bytes of a coordinate or a scalar
    pub const fn field_len(&self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }
}

/// Factorizes operations which only differ by the curve crate
macro_rules! ec_ops {
    ($module:ident, $curve:ident) => {
        mod $module {
            use ::$curve::ecdsa::signature::{Signer as _, Verifier as _};
            use ::$curve::elliptic_curve::sec1::ToEncodedPoint as _;

            use super::*;

            pub fn sign(d: &[u8], input: &[u8]) -> JoseResult<Vec<u8>> {
                let sk = ::$curve::ecdsa::SigningKey::from_slice(d)?;
                let signature: ::$curve::ecdsa::Signature = sk.sign(input);
                Ok(signature.to_bytes().to_vec())
            }

            pub fn verify(point: &[u8], input: &[u8], signature: &[u8]) -> JoseResult<bool> {
                let vk = ::$curve::ecdsa::VerifyingKey::from_sec1_bytes(point)?;
                let Ok(signature) = ::$curve::ecdsa::Signature::from_slice(signature) else {
                    return Ok(false);
                };
                Ok(vk.verify(input, &signature).is_ok())
            }

            pub fn diffie_hellman(d: &[u8], point: &[u8]) -> JoseResult<Zeroizing<Vec<u8>>> {
                let sk = ::$curve::SecretKey::from_slice(d)?;
                let pk = ::$curve::PublicKey::from_sec1_bytes(point)?;
                let shared = ::$curve::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }

            pub fn generate() -> JoseResult<(Vec<u8>, Vec<u8>, Vec<u8>)> {
                let sk = ::$curve::SecretKey::random(&mut rand::rngs::OsRng);
                let point = sk.public_key().to_encoded_point(false);
                let x = point.x().ok_or(JoseError::ImplementationError)?.to_vec();
                let y = point.y().ok_or(JoseError::ImplementationError)?.to_vec();
                Ok((sk.to_bytes().to_vec(), x, y))
            }
        }
    };
}

ec_ops!(p256_ops, p256);
ec_ops!(p384_ops, p384);

/// Elliptic curve key material extracted from a JWK
pub struct EcKey {
    curve: EcCurve,
    x: Vec<u8>,
    y: Vec<u8>,
    d: Option<Zeroizing<Vec<u8>>>,
}

impl EcKey {
    /// Extracts the curve point and, when present, the private scalar
    pub fn try_from_jwk(jwk: &Jwk) -> JoseResult<Self> {
        let curve = EcCurve::from_jwk(jwk)?;
        let x = jwk.decoded("x")?;
        let y = jwk.decoded("y")?;
        if x.len() != curve.field_len() || y.len() != curve.field_len() {
            return Err(JoseError::InvalidKey("invalid elliptic curve coordinates length"));
        }
        let d = jwk.decoded_opt("d")?.map(Zeroizing::new);
        if matches!(&d, Some(d) if d.len() != curve.field_len()) {
            return Err(JoseError::InvalidKey("invalid elliptic curve scalar length"));
        }
        Ok(Self { curve, x, y, d })
    }

    /// Generates a fresh key pair on the curve
    pub fn generate(curve: EcCurve) -> JoseResult<Self> {
        let (d, x, y) = match curve {
            EcCurve::P256 => p256_ops::generate()?,
            EcCurve::P384 => p384_ops::generate()?,
        };
        Ok(Self {
            curve,
            x,
            y,
            d: Some(Zeroizing::new(d)),
        })
    }

    /// Curve of the key
    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    /// Signs with ECDSA, the signature being the raw `r || s` concatenation
    pub fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>> {
        let d = self.private_scalar()?;
        match self.curve {
            EcCurve::P256 => p256_ops::sign(d, input),
            EcCurve::P384 => p384_ops::sign(d, input),
        }
    }

    /// Verifies a raw `r || s` ECDSA signature
    pub fn verify(&self, input: &[u8], signature: &[u8]) -> JoseResult<bool> {
        let point = self.uncompressed_point();
        match self.curve {
            EcCurve::P256 => p256_ops::verify(&point, input, signature),
            EcCurve::P384 => p384_ops::verify(&point, input, signature),
        }
    }

    /// ECDH shared secret between this private key and `other`'s public point
    pub fn diffie_hellman(&self, other: &EcKey) -> JoseResult<Zeroizing<Vec<u8>>> {
        if self.curve != other.curve {
            return Err(JoseError::InvalidKey("elliptic curves mismatch"));
        }
        let d = self.private_scalar()?;
        let point = other.uncompressed_point();
        match self.curve {
            EcCurve::P256 => p256_ops::diffie_hellman(d, &point),
            EcCurve::P384 => p384_ops::diffie_hellman(d, &point),
        }
    }

    /// Public JWK of this key
    pub fn to_public_jwk(&self) -> JoseResult<Jwk> {
        let mut values = Map::new();
        values.insert("kty".to_string(), "EC".into());
        values.insert("crv".to_string(), self.curve.crv().into());
        values.insert("x".to_string(), base64_url_encode(&self.x).into());
        values.insert("y".to_string(), base64_url_encode(&self.y).into());
        Jwk::new(values)
    }

    /// Private JWK of this key
    pub fn to_private_jwk(&self) -> JoseResult<Jwk> {
        let d = self.private_scalar()?;
        self.to_public_jwk()?.with_parameter("d", base64_url_encode(d))
    }

    fn private_scalar(&self) -> JoseResult<&[u8]> {
        self.d
            .as_deref()
            .map(Vec::as_slice)
            .ok_or(JoseError::MissingKeyParameter("d"))
    }

    fn uncompressed_point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + self.x.len() + self.y.len());
        point.push(0x04);
        point.extend_from_slice(&self.x);
        point.extend_from_slice(&self.y);
        point
    }
}


#[cfg(test)]
impl std::fmt::Debug for EcKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcKey").finish_non_exhaustive()
    }
}
