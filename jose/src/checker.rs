//! Validates a key's declared `use`, `key_ops` and `alg` against the operation being attempted.
//!
//! A key lacking those parameters is compatible with anything.

use crate::prelude::*;

/// Operation a key is about to be used for
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyUsage {
    /// Computing a signature
    Signature,
    /// Verifying a signature
    Verification,
    /// Encrypting or wrapping a CEK
    Encryption,
    /// Decrypting or unwrapping a CEK
    Decryption,
    /// Deriving a CEK, or the key wrapping it, with ECDH-ES
    KeyAgreement,
}

impl KeyUsage {
    /// Expected value of the JWK 'use' parameter
    const fn public_key_use(&self) -> &'static str {
        match self {
            Self::Signature | Self::Verification => "sig",
            Self::Encryption | Self::Decryption | Self::KeyAgreement => "enc",
        }
    }

    /// Any of these in 'key_ops' permits the operation
    const fn key_operations(&self) -> &'static [&'static str] {
        match self {
            Self::Signature => &["sign"],
            Self::Verification => &["verify"],
            Self::Encryption => &["encrypt", "wrapKey"],
            Self::Decryption => &["decrypt", "unwrapKey"],
            Self::KeyAgreement => &["deriveKey", "deriveBits"],
        }
    }
}

impl KeyUsage {
    /// Usage of a JWE recipient key, `usage` being [KeyUsage::Encryption] or
    /// [KeyUsage::Decryption]
    pub fn of_recipient_key(usage: Self, mode: KeyManagementMode) -> Self {
        if mode.is_key_agreement() {
            Self::KeyAgreement
        } else {
            usage
        }
    }
}

impl std::fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let usage = match self {
            Self::Signature => "signature",
            Self::Verification => "verification",
            Self::Encryption => "encryption",
            Self::Decryption => "decryption",
            Self::KeyAgreement => "key agreement",
        };
        write!(f, "{usage}")
    }
}

/// Checks both usage and algorithm
pub fn check_key(key: &Jwk, usage: KeyUsage, algorithm: &str) -> JoseResult<()> {
    check_key_usage(key, usage)?;
    check_key_algorithm(key, algorithm)
}

/// Fails when the key's 'use' (or 'key_ops' when 'use' is absent) forbids `usage`
pub fn check_key_usage(key: &Jwk, usage: KeyUsage) -> JoseResult<()> {
    let allowed = if let Some(key_use) = key.key_use() {
        key_use == usage.public_key_use()
    } else if let Some(ops) = key.key_ops() {
        ops.iter().any(|op| usage.key_operations().contains(op))
    } else {
        true
    };
    if allowed {
        Ok(())
    } else {
        tracing::debug!(%usage, kid = key.kid(), "key usage mismatch");
        Err(JoseError::KeyUsageMismatch(usage.to_string()))
    }
}

/// Fails when the key is restricted to another algorithm
pub fn check_key_algorithm(key: &Jwk, algorithm: &str) -> JoseResult<()> {
    match key.alg() {
        Some(key_alg) if key_alg != algorithm => {
            tracing::debug!(key_alg, algorithm, kid = key.kid(), "key algorithm mismatch");
            Err(JoseError::KeyAlgorithmMismatch {
                key_alg: key_alg.to_string(),
                alg: algorithm.to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;

    use super::*;

    fn key(json: &str) -> Jwk {
        Jwk::from_json(json).unwrap()
    }

    #[rstest]
    #[case::signature(KeyUsage::Signature)]
    #[case::verification(KeyUsage::Verification)]
    #[case::encryption(KeyUsage::Encryption)]
    #[case::decryption(KeyUsage::Decryption)]
    fn key_without_restrictions_should_be_compatible(#[case] usage: KeyUsage) {
        let jwk = key(r#"{"kty": "oct", "k": "AA"}"#);
        assert!(check_key(&jwk, usage, "HS256").is_ok());
    }

    #[test]
    fn should_honor_use() {
        let jwk = key(r#"{"kty": "oct", "k": "AA", "use": "sig"}"#);
        assert!(check_key_usage(&jwk, KeyUsage::Signature).is_ok());
        assert!(check_key_usage(&jwk, KeyUsage::Verification).is_ok());
        assert!(matches!(
            check_key_usage(&jwk, KeyUsage::Encryption).unwrap_err(),
            JoseError::KeyUsageMismatch(_)
        ));
    }

    #[test]
    fn use_should_prevail_over_key_ops() {
        let jwk = key(r#"{"kty": "oct", "k": "AA", "use": "enc", "key_ops": ["sign"]}"#);
        assert!(check_key_usage(&jwk, KeyUsage::Signature).is_err());
        assert!(check_key_usage(&jwk, KeyUsage::Decryption).is_ok());
    }

    #[rstest]
    #[case::sign(r#"["sign"]"#, KeyUsage::Signature, true)]
    #[case::sign_only(r#"["sign"]"#, KeyUsage::Verification, false)]
    #[case::wrap(r#"["wrapKey"]"#, KeyUsage::Encryption, true)]
    #[case::unwrap(r#"["unwrapKey"]"#, KeyUsage::Decryption, true)]
    #[case::encrypt_only(r#"["encrypt"]"#, KeyUsage::Decryption, false)]
    #[case::derive_key(r#"["deriveKey"]"#, KeyUsage::KeyAgreement, true)]
    #[case::derive_bits(r#"["deriveBits"]"#, KeyUsage::KeyAgreement, true)]
    #[case::derive_only(r#"["deriveKey"]"#, KeyUsage::Encryption, false)]
    #[case::wrap_is_not_derive(r#"["wrapKey"]"#, KeyUsage::KeyAgreement, false)]
    fn should_honor_key_ops(#[case] ops: &str, #[case] usage: KeyUsage, #[case] allowed: bool) {
        let jwk = key(&format!(r#"{{"kty": "oct", "k": "AA", "key_ops": {ops}}}"#));
        assert_eq!(check_key_usage(&jwk, usage).is_ok(), allowed);
    }

    #[rstest]
    #[case::wrap(KeyManagementMode::KeyWrap, KeyUsage::Encryption)]
    #[case::direct(KeyManagementMode::Direct, KeyUsage::Encryption)]
    #[case::agreement(KeyManagementMode::KeyAgreement, KeyUsage::KeyAgreement)]
    #[case::agreement_wrap(KeyManagementMode::KeyAgreementWithKeyWrapping, KeyUsage::KeyAgreement)]
    fn recipient_key_usage_should_follow_mode(#[case] mode: KeyManagementMode, #[case] expected: KeyUsage) {
        assert_eq!(KeyUsage::of_recipient_key(KeyUsage::Encryption, mode), expected);
    }

    #[test]
    fn should_honor_alg() {
        let jwk = key(r#"{"kty": "oct", "k": "AA", "alg": "HS256"}"#);
        assert!(check_key_algorithm(&jwk, "HS256").is_ok());
        assert!(matches!(
            check_key_algorithm(&jwk, "HS512").unwrap_err(),
            JoseError::KeyAlgorithmMismatch { key_alg, alg } if key_alg == "HS256" && alg == "HS512"
        ));
    }
}
