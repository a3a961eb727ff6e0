//! JWE 'enc' values of [RFC 7518 Section 5][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7518#section-5

pub mod aes_cbc_hs;
/// AES GCM
pub mod aes_gcm;
