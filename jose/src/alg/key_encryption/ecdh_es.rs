//! Elliptic Curve Diffie-Hellman Ephemeral Static key agreement as per
//! [RFC 7518 Section 4.6][1]
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7518#section-4.6

use serde_json::Value;
use sha2::Digest as _;
use zeroize::Zeroizing;

use super::aes_kw;
use crate::jwk::ecdsa::EcKey;
use crate::prelude::*;

/// ECDH-ES, optionally followed by AES key wrap
#[derive(Debug, Copy, Clone)]
pub struct EcdhEs {
    name: &'static str,
    /// Size in bytes of the wrapping key, `None` when the agreed key is the CEK
    wrap_key_len: Option<usize>,
}

impl EcdhEs {
    /// ECDH-ES
    pub const ECDH_ES: Self = Self {
        name: "ECDH-ES",
        wrap_key_len: None,
    };
    /// ECDH-ES+A128KW
    pub const ECDH_ES_A128KW: Self = Self {
        name: "ECDH-ES+A128KW",
        wrap_key_len: Some(16),
    };
    /// ECDH-ES+A192KW
    pub const ECDH_ES_A192KW: Self = Self {
        name: "ECDH-ES+A192KW",
        wrap_key_len: Some(24),
    };
    /// ECDH-ES+A256KW
    pub const ECDH_ES_A256KW: Self = Self {
        name: "ECDH-ES+A256KW",
        wrap_key_len: Some(32),
    };

    /// Generates an ephemeral key on the recipient's curve, records its public part as 'epk' and
    /// derives `key_bits` from the shared secret
    fn sender_key(
        &self,
        recipient: &Jwk,
        algorithm_id: &str,
        key_bits: usize,
        complete_header: &Header,
        additional_header: &mut Header,
    ) -> JoseResult<Zeroizing<Vec<u8>>> {
        let recipient = EcKey::try_from_jwk(recipient)?;
        let ephemeral = EcKey::generate(recipient.curve())?;
        let z = ephemeral.diffie_hellman(&recipient)?;
        let epk = ephemeral.to_public_jwk()?;
        additional_header.insert("epk".to_string(), Value::Object(epk.into()));
        let (apu, apv) = party_info(complete_header)?;
        Ok(concat_kdf(&z, algorithm_id, &apu, &apv, key_bits))
    }

    /// Derives `key_bits` from the private key and the sender's 'epk'
    fn recipient_key(
        &self,
        private_key: &Jwk,
        algorithm_id: &str,
        key_bits: usize,
        complete_header: &Header,
    ) -> JoseResult<Zeroizing<Vec<u8>>> {
        let epk = match complete_header.get("epk") {
            Some(Value::Object(epk)) => Jwk::new(epk.clone())?,
            _ => return Err(JoseError::MissingHeaderParameter("epk")),
        };
        let private_key = EcKey::try_from_jwk(private_key)?;
        let z = private_key.diffie_hellman(&EcKey::try_from_jwk(&epk)?)?;
        let (apu, apv) = party_info(complete_header)?;
        Ok(concat_kdf(&z, algorithm_id, &apu, &apv, key_bits))
    }
}

impl Algorithm for EcdhEs {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["EC"]
    }
}

impl KeyEncryptionAlgorithm for EcdhEs {
    fn mode(&self) -> KeyManagementMode {
        match self.wrap_key_len {
            None => KeyManagementMode::KeyAgreement,
            Some(_) => KeyManagementMode::KeyAgreementWithKeyWrapping,
        }
    }

    fn encrypt_key(
        &self,
        key: &Jwk,
        cek: &[u8],
        complete_header: &Header,
        additional_header: &mut Header,
    ) -> JoseResult<Vec<u8>> {
        let len = self.wrap_key_len.ok_or_else(|| JoseError::AlgorithmCapabilityMismatch(self.name.to_string()))?;
        let kek = self.sender_key(key, self.name, len * 8, complete_header, additional_header)?;
        aes_kw::wrap(&kek, cek)
    }

    fn decrypt_key(&self, key: &Jwk, encrypted_key: &[u8], complete_header: &Header) -> JoseResult<Vec<u8>> {
        let len = self.wrap_key_len.ok_or_else(|| JoseError::AlgorithmCapabilityMismatch(self.name.to_string()))?;
        let kek = self.recipient_key(key, self.name, len * 8, complete_header)?;
        aes_kw::unwrap(&kek, encrypted_key)
    }

    fn agree_key(
        &self,
        key: &Jwk,
        enc: &str,
        cek_bits: usize,
        complete_header: &Header,
        additional_header: &mut Header,
    ) -> JoseResult<Vec<u8>> {
        if self.wrap_key_len.is_some() {
            return Err(JoseError::AlgorithmCapabilityMismatch(self.name.to_string()));
        }
        let cek = self.sender_key(key, enc, cek_bits, complete_header, additional_header)?;
        Ok(cek.to_vec())
    }

    fn agreed_key(&self, key: &Jwk, enc: &str, cek_bits: usize, complete_header: &Header) -> JoseResult<Vec<u8>> {
        if self.wrap_key_len.is_some() {
            return Err(JoseError::AlgorithmCapabilityMismatch(self.name.to_string()));
        }
        let cek = self.recipient_key(key, enc, cek_bits, complete_header)?;
        Ok(cek.to_vec())
    }
}

/// Optional 'apu' and 'apv' header parameters
fn party_info(header: &Header) -> JoseResult<(Vec<u8>, Vec<u8>)> {
    let apu = header::get_decoded_opt(header, "apu")?.unwrap_or_default();
    let apv = header::get_decoded_opt(header, "apv")?.unwrap_or_default();
    Ok((apu, apv))
}

/// Concat KDF with SHA-256 of [NIST SP 800-56A][1] as profiled by RFC 7518 Section 4.6.2
///
/// [1]: https://nvlpubs.nist.gov/nistpubs/SpecialPublications/NIST.SP.800-56Ar2.pdf
fn concat_kdf(z: &[u8], algorithm_id: &str, apu: &[u8], apv: &[u8], key_bits: usize) -> Zeroizing<Vec<u8>> {
    let key_len = key_bits.div_ceil(8);
    let mut other_info = Vec::new();
    for field in [algorithm_id.as_bytes(), apu, apv] {
        other_info.extend_from_slice(&(field.len() as u32).to_be_bytes());
        other_info.extend_from_slice(field);
    }
    other_info.extend_from_slice(&(key_bits as u32).to_be_bytes());

    let mut derived = Zeroizing::new(Vec::with_capacity(key_len + 32));
    let mut counter = 1u32;
    while derived.len() < key_len {
        let mut hasher = sha2::Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        derived.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    derived.truncate(key_len);
    derived
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_utils::*;

    use super::*;

    /// Bob's key from RFC 7518 Appendix C
    fn bob() -> Jwk {
        Jwk::from_json(
            r#"{
                "kty": "EC",
                "crv": "P-256",
                "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
                "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck",
                "d": "VEmDZpDXXK8p8N0Cndsxs924q6nS1RXFASRl6BfUqdw"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn should_derive_rfc7518_appendix_c_key() {
        let header = json!({
            "alg": "ECDH-ES",
            "enc": "A128GCM",
            "apu": "QWxpY2U",
            "apv": "Qm9i",
            "epk": {
                "kty": "EC",
                "crv": "P-256",
                "x": "gI0GAILBdu7T53akrFmMyGcsF3n5dO7MmwNBHKW5SV0",
                "y": "SLW_xSffzlPWrHEVI30DHM_4egVwt3NQqeUD7nMFpps"
            }
        });
        let header = header.as_object().unwrap();
        let cek = EcdhEs::ECDH_ES.agreed_key(&bob(), "A128GCM", 128, header).unwrap();
        assert_eq!(base64_url_encode(cek), "VqqN6vgjbSBcIijNcacQGg");
    }

    #[apply(all_ec_curves)]
    fn should_agree_on_cek(#[case] curve: EcCurve) {
        let key = TestKey::ec(curve);
        let mut additional = Header::new();
        let cek = EcdhEs::ECDH_ES
            .agree_key(&key.public, "A256GCM", 256, &Header::new(), &mut additional)
            .unwrap();
        assert_eq!(cek.len(), 32);
        assert!(!additional["epk"].as_object().unwrap().contains_key("d"));
        let agreed = EcdhEs::ECDH_ES.agreed_key(&key.private, "A256GCM", 256, &additional).unwrap();
        assert_eq!(cek, agreed);
    }

    #[rstest]
    #[case::a128kw(EcdhEs::ECDH_ES_A128KW)]
    #[case::a192kw(EcdhEs::ECDH_ES_A192KW)]
    #[case::a256kw(EcdhEs::ECDH_ES_A256KW)]
    fn should_wrap_with_agreed_key(#[case] alg: EcdhEs) {
        let key = TestKey::ec(EcCurve::P256);
        let cek = [8u8; 32];
        let mut additional = Header::new();
        let wrapped = alg.encrypt_key(&key.public, &cek, &Header::new(), &mut additional).unwrap();
        assert_eq!(alg.decrypt_key(&key.private, &wrapped, &additional).unwrap(), cek);
        assert!(alg.agree_key(&key.public, "A128GCM", 128, &Header::new(), &mut Header::new()).is_err());
    }

    #[test]
    fn should_require_epk() {
        let result = EcdhEs::ECDH_ES.agreed_key(&bob(), "A128GCM", 128, &Header::new());
        assert!(matches!(result.unwrap_err(), JoseError::MissingHeaderParameter("epk")));
    }
}
