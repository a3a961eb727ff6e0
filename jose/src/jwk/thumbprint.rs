//! JWK thumbprint

use serde_json::{Map, Value};

use crate::prelude::*;

impl Jwk {
    /// Base64url encoded hash of the key's required members as per [RFC 7638][1]
    ///
    /// [1]: https://www.rfc-editor.org/rfc/rfc7638.html
    pub fn thumbprint(&self, alg: HashAlgorithm) -> JoseResult<String> {
        let json = serde_json::to_vec(&self.thumbprint_members()?)?;
        Ok(base64_url_encode(alg.digest(&json)))
    }

    /// Filters out some JWK fields and lexicographically order them as per [RFC 7638 Section 3.2][1]
    ///
    /// [1]: https://www.rfc-editor.org/rfc/rfc7638.html#section-3.2
    fn thumbprint_members(&self) -> JoseResult<Value> {
        let members: &[&str] = match self.kty() {
            "RSA" => &["e", "kty", "n"],
            "EC" => &["crv", "kty", "x", "y"],
            "OKP" => &["crv", "kty", "x"],
            "oct" => &["k", "kty"],
            _ => return Err(JoseError::KeyTypeMismatch(self.kty().to_string())),
        };
        let mut json = Map::new();
        for &member in members {
            let value = self
                .get(member)
                .ok_or_else(|| JoseError::InvalidJwk("a thumbprint member is missing"))?;
            json.insert(member.to_string(), value.clone());
        }
        Ok(Value::Object(json))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;

    use super::*;

    #[test]
    fn rfc_test() {
        let jwk = Jwk::from_json(r#"{
            "kty": "RSA",
            "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
            "e": "AQAB",
            "alg": "RS256",
            "kid": "2011-04-29"
        }"#)
        .unwrap();
        let thumbprint = jwk.thumbprint(HashAlgorithm::SHA256).unwrap();
        assert_eq!(&thumbprint, "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs")
    }

    #[test]
    fn should_ignore_private_members() {
        let key = TestKey::ec(EcCurve::P256);
        for hash in HashAlgorithm::values() {
            assert_eq!(
                key.private.thumbprint(hash).unwrap(),
                key.public.thumbprint(hash).unwrap()
            );
        }
    }

    #[test]
    fn should_fail_when_member_missing() {
        let jwk = Jwk::from_json(r#"{"kty": "EC", "crv": "P-256", "x": "AA"}"#).unwrap();
        assert!(matches!(
            jwk.thumbprint(HashAlgorithm::SHA256).unwrap_err(),
            JoseError::InvalidJwk(_)
        ));
    }
}
