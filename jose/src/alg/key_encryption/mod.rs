//! JWE 'alg' values of [RFC 7518 Section 4][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7518#section-4

/// AES GCM key wrapping
pub mod aes_gcm_kw;
pub mod aes_kw;
/// Direct use of a shared symmetric key
pub mod dir;
pub mod ecdh_es;
pub mod pbes2;
/// RSAES-PKCS1-v1_5 and RSAES OAEP
pub mod rsa;

use crate::prelude::*;

/// Secret of an 'oct' key, whose length must be `expected` bytes when set
pub(crate) fn octet_secret(key: &Jwk, expected: Option<usize>) -> JoseResult<Vec<u8>> {
    key.check_kty(&["oct"])?;
    let k = key.decoded("k")?;
    match expected {
        Some(len) if k.len() != len => Err(JoseError::InvalidKey("symmetric key has the wrong size")),
        _ => Ok(k),
    }
}
