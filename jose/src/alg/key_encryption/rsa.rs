use rsa::{Oaep, Pkcs1v15Encrypt};

use crate::jwk::rsa::RsaKey;
use crate::prelude::*;

#[derive(Debug, Copy, Clone)]
enum Padding {
    Pkcs1v15,
    OaepSha1,
    OaepSha256,
}

/// CEK encryption with RSAES-PKCS1-v1_5 or RSAES-OAEP
#[derive(Debug, Copy, Clone)]
pub struct RsaEncryption {
    name: &'static str,
    padding: Padding,
}

impl RsaEncryption {
    /// RSA1_5
    pub const RSA1_5: Self = Self {
        name: "RSA1_5",
        padding: Padding::Pkcs1v15,
    };
    /// RSA-OAEP, with SHA-1 and MGF1 with SHA-1
    pub const RSA_OAEP: Self = Self {
        name: "RSA-OAEP",
        padding: Padding::OaepSha1,
    };
    /// RSA-OAEP-256, with SHA-256 and MGF1 with SHA-256
    pub const RSA_OAEP_256: Self = Self {
        name: "RSA-OAEP-256",
        padding: Padding::OaepSha256,
    };
}

impl Algorithm for RsaEncryption {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["RSA"]
    }
}

impl KeyEncryptionAlgorithm for RsaEncryption {
    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::KeyEncryption
    }

    fn encrypt_key(&self, key: &Jwk, cek: &[u8], _: &Header, _: &mut Header) -> JoseResult<Vec<u8>> {
        let pk = RsaKey::try_from_jwk(key)?.public_key();
        let mut rng = rand::rngs::OsRng;
        Ok(match self.padding {
            Padding::Pkcs1v15 => pk.encrypt(&mut rng, Pkcs1v15Encrypt, cek)?,
            Padding::OaepSha1 => pk.encrypt(&mut rng, Oaep::new::<sha1::Sha1>(), cek)?,
            Padding::OaepSha256 => pk.encrypt(&mut rng, Oaep::new::<sha2::Sha256>(), cek)?,
        })
    }

    fn decrypt_key(&self, key: &Jwk, encrypted_key: &[u8], _: &Header) -> JoseResult<Vec<u8>> {
        let key = RsaKey::try_from_jwk(key)?;
        let sk = key.private_key()?;
        Ok(match self.padding {
            Padding::Pkcs1v15 => sk.decrypt(Pkcs1v15Encrypt, encrypted_key)?,
            Padding::OaepSha1 => sk.decrypt(Oaep::new::<sha1::Sha1>(), encrypted_key)?,
            Padding::OaepSha256 => sk.decrypt(Oaep::new::<sha2::Sha256>(), encrypted_key)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;

    use super::*;

    #[rstest]
    #[case::rsa1_5(RsaEncryption::RSA1_5)]
    #[case::oaep(RsaEncryption::RSA_OAEP)]
    #[case::oaep_256(RsaEncryption::RSA_OAEP_256)]
    fn should_encrypt_and_decrypt(#[case] alg: RsaEncryption) {
        let key = TestKey::rsa();
        let cek = [3u8; 32];
        let encrypted = alg.encrypt_key(&key.public, &cek, &Header::new(), &mut Header::new()).unwrap();
        assert_eq!(alg.decrypt_key(&key.private, &encrypted, &Header::new()).unwrap(), cek);
    }

    #[test]
    fn public_key_cannot_decrypt() {
        let key = TestKey::rsa();
        let alg = RsaEncryption::RSA_OAEP_256;
        let encrypted = alg.encrypt_key(&key.public, &[3u8; 16], &Header::new(), &mut Header::new()).unwrap();
        assert!(alg.decrypt_key(&key.public, &encrypted, &Header::new()).is_err());
    }
}
