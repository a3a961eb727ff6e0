use rsa::RsaPrivateKey;
use serde_json::Value;

pub use rstest::*;
pub use rstest_reuse::{self, *};

pub use crate::prelude::*;

use crate::jwk::{ecdsa::EcKey, eddsa::Ed25519Key, rsa::RsaKey};

lazy_static::lazy_static! {
    // generating RSA keys is slow, share a single one
    static ref RSA_KEY: Jwk = {
        let sk = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
        RsaKey::private_jwk(&sk).unwrap()
    };
}

#[template]
#[export]
#[rstest]
#[case::P256($crate::prelude::EcCurve::P256)]
#[case::P384($crate::prelude::EcCurve::P384)]
#[allow(non_snake_case)]
pub fn all_ec_curves(#[case] curve: EcCurve) {}

#[template]
#[export]
#[rstest]
#[case::HS256(&$crate::alg::signature::Hmac::HS256, $crate::test_utils::TestKey::oct(32))]
#[case::HS384(&$crate::alg::signature::Hmac::HS384, $crate::test_utils::TestKey::oct(48))]
#[case::HS512(&$crate::alg::signature::Hmac::HS512, $crate::test_utils::TestKey::oct(64))]
#[case::ES256(&$crate::alg::signature::Ecdsa::ES256, $crate::test_utils::TestKey::ec($crate::prelude::EcCurve::P256))]
#[case::ES384(&$crate::alg::signature::Ecdsa::ES384, $crate::test_utils::TestKey::ec($crate::prelude::EcCurve::P384))]
#[case::EdDSA(&$crate::alg::signature::EdDsa, $crate::test_utils::TestKey::ed25519())]
#[case::RS256(&$crate::alg::signature::RsaSignature::RS256, $crate::test_utils::TestKey::rsa())]
#[case::RS512(&$crate::alg::signature::RsaSignature::RS512, $crate::test_utils::TestKey::rsa())]
#[case::PS256(&$crate::alg::signature::RsaSignature::PS256, $crate::test_utils::TestKey::rsa())]
#[case::PS384(&$crate::alg::signature::RsaSignature::PS384, $crate::test_utils::TestKey::rsa())]
#[case::none(&$crate::alg::signature::NoSignature, $crate::test_utils::TestKey::none())]
#[allow(non_snake_case)]
pub fn all_signature_algorithms(#[case] alg: &dyn SignatureAlgorithm, #[case] key: TestKey) {}

#[template]
#[export]
#[rstest]
#[case::A128KW("A128KW", $crate::test_utils::TestKey::oct(16))]
#[case::A192KW("A192KW", $crate::test_utils::TestKey::oct(24))]
#[case::A256KW("A256KW", $crate::test_utils::TestKey::oct(32))]
#[case::A128GCMKW("A128GCMKW", $crate::test_utils::TestKey::oct(16))]
#[case::A256GCMKW("A256GCMKW", $crate::test_utils::TestKey::oct(32))]
#[case::dir("dir", $crate::test_utils::TestKey::oct(32))]
#[case::PBES2_HS256_A128KW("PBES2-HS256+A128KW", $crate::test_utils::TestKey::oct(12))]
#[case::PBES2_HS512_A256KW("PBES2-HS512+A256KW", $crate::test_utils::TestKey::oct(12))]
#[case::RSA1_5("RSA1_5", $crate::test_utils::TestKey::rsa())]
#[case::RSA_OAEP("RSA-OAEP", $crate::test_utils::TestKey::rsa())]
#[case::RSA_OAEP_256("RSA-OAEP-256", $crate::test_utils::TestKey::rsa())]
#[case::ECDH_ES("ECDH-ES", $crate::test_utils::TestKey::ec($crate::prelude::EcCurve::P256))]
#[case::ECDH_ES_A128KW("ECDH-ES+A128KW", $crate::test_utils::TestKey::ec($crate::prelude::EcCurve::P384))]
#[case::ECDH_ES_A256KW("ECDH-ES+A256KW", $crate::test_utils::TestKey::ec($crate::prelude::EcCurve::P256))]
#[allow(non_snake_case)]
pub fn all_key_encryption_algorithms(#[case] alg: &str, #[case] key: TestKey) {}

/// A key pair as JWKs. Symmetric keys are their own public part.
#[derive(Debug, Clone, PartialEq)]
pub struct TestKey {
    pub public: Jwk,
    pub private: Jwk,
}

impl TestKey {
    pub fn ec(curve: EcCurve) -> Self {
        let key = EcKey::generate(curve).unwrap();
        Self {
            public: key.to_public_jwk().unwrap(),
            private: key.to_private_jwk().unwrap(),
        }
    }

    pub fn ed25519() -> Self {
        let seed: [u8; ed25519_dalek::SECRET_KEY_LENGTH] = random_bytes(ed25519_dalek::SECRET_KEY_LENGTH)
            .unwrap()
            .try_into()
            .unwrap();
        let key = Ed25519Key::from_seed(seed);
        Self {
            public: key.to_public_jwk().unwrap(),
            private: key.to_private_jwk().unwrap(),
        }
    }

    pub fn rsa() -> Self {
        Self {
            public: RSA_KEY.to_public(),
            private: RSA_KEY.clone(),
        }
    }

    /// Random symmetric key of `len` bytes
    pub fn oct(len: usize) -> Self {
        let key = Jwk::octet(random_bytes(len).unwrap());
        Self {
            public: key.clone(),
            private: key,
        }
    }

    pub fn none() -> Self {
        let key = Jwk::from_json(r#"{"kty": "none"}"#).unwrap();
        Self {
            public: key.clone(),
            private: key,
        }
    }
}

pub fn header(value: Value) -> Header {
    value.as_object().cloned().unwrap()
}

/// HMAC key of RFC 7515 Appendix A.1
pub fn rfc7515_hs256_key() -> Jwk {
    Jwk::from_json(
        r#"{"kty":"oct","k":"AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow"}"#,
    )
    .unwrap()
}

/// Ed25519 key of RFC 8037 Appendix A.1
pub fn rfc8037_ed25519_key() -> Jwk {
    Jwk::from_json(
        r#"{"kty":"OKP","crv":"Ed25519","d":"nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"}"#,
    )
    .unwrap()
}
