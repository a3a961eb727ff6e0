//! JOSE headers are kept as ordered maps of loosely typed JSON values. Known parameters are
//! validated where they matter, unknown ones (extensions listed in `crit`) are passed through.

use serde_json::{Map, Value};

use crate::prelude::*;

/// A protected or unprotected JOSE header
pub type Header = Map<String, Value>;

/// Merges header layers, later layers overriding earlier ones
pub fn merge(layers: &[&Header]) -> Header {
    layers.iter().fold(Header::new(), |mut acc, layer| {
        acc.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        acc
    })
}

/// Fails if any parameter appears in more than one header layer
pub fn check_duplicated_parameters(layers: &[&Header]) -> JoseResult<()> {
    let mut duplicates = vec![];
    for (i, a) in layers.iter().enumerate() {
        for b in &layers[i + 1..] {
            duplicates.extend(a.keys().filter(|k| b.contains_key(*k)).cloned());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(JoseError::HeaderConflict(duplicates))
    }
}

/// Unencoded payloads ([RFC 7797][1]) must be flagged as critical
///
/// [1]: https://www.rfc-editor.org/rfc/rfc7797#section-6
pub fn check_b64_and_crit(protected_header: &Header) -> JoseResult<()> {
    if !protected_header.contains_key("b64") {
        return Ok(());
    }
    let crit = protected_header.get("crit").ok_or_else(|| {
        JoseError::CriticalHeaderViolation("'crit' is mandatory when 'b64' is set".to_string())
    })?;
    let crit = crit
        .as_array()
        .ok_or_else(|| JoseError::CriticalHeaderViolation("'crit' must be an array".to_string()))?;
    if !crit.iter().any(|c| c.as_str() == Some("b64")) {
        return Err(JoseError::CriticalHeaderViolation(
            "'crit' must contain 'b64' when 'b64' is set".to_string(),
        ));
    }
    Ok(())
}

/// Whether the payload is base64url encoded. Only an explicit `"b64": false` turns encoding off.
pub fn is_payload_encoded(protected_header: &Header) -> bool {
    !matches!(protected_header.get("b64"), Some(b64) if b64 != &Value::Bool(true))
}

/// Verifies that every parameter listed in `crit` sits in the protected header and is understood
pub fn check_critical_parameters(protected_header: &Header, understood: &[&str]) -> JoseResult<()> {
    let Some(crit) = protected_header.get("crit") else {
        return Ok(());
    };
    let crit = crit
        .as_array()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| JoseError::CriticalHeaderViolation("'crit' must be a non-empty array".to_string()))?;
    for name in crit {
        let name = name
            .as_str()
            .ok_or_else(|| JoseError::CriticalHeaderViolation("'crit' entries must be strings".to_string()))?;
        if !protected_header.contains_key(name) {
            return Err(JoseError::CriticalHeaderViolation(format!(
                "'{name}' is critical but not in the protected header"
            )));
        }
        if !understood.contains(&name) {
            return Err(JoseError::CriticalHeaderViolation(format!("'{name}' is not understood")));
        }
    }
    Ok(())
}

/// Reads a string header parameter
pub fn get_str<'a>(header: &'a Header, name: &'static str) -> JoseResult<&'a str> {
    header
        .get(name)
        .and_then(Value::as_str)
        .ok_or(JoseError::MissingHeaderParameter(name))
}

/// Reads a base64url encoded header parameter
pub fn get_decoded(header: &Header, name: &'static str) -> JoseResult<Vec<u8>> {
    crate::util::base64_url_decode(get_str(header, name)?)
}

/// Reads an optional base64url encoded header parameter
pub fn get_decoded_opt(header: &Header, name: &'static str) -> JoseResult<Option<Vec<u8>>> {
    match header.get(name) {
        None => Ok(None),
        Some(_) => get_decoded(header, name).map(Some),
    }
}

/// Parses a base64url encoded JSON object into a header
pub fn decode(encoded: &str) -> JoseResult<Header> {
    let decoded = crate::util::base64_url_decode(encoded)?;
    match serde_json::from_slice::<Value>(&decoded)? {
        Value::Object(header) => Ok(header),
        _ => Err(JoseError::InvalidSerialization("a header must be a JSON object")),
    }
}

/// Encodes a header as base64url JSON, an empty header has no encoding
pub fn encode(header: &Header) -> JoseResult<Option<String>> {
    if header.is_empty() {
        return Ok(None);
    }
    Ok(Some(crate::util::base64_url_encode(serde_json::to_vec(header)?)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn header(v: Value) -> Header {
        v.as_object().unwrap().clone()
    }

    mod duplicates {
        use super::*;

        #[test]
        fn should_accept_disjoint_headers() {
            let a = header(json!({"alg": "HS256"}));
            let b = header(json!({"kid": "1"}));
            assert!(check_duplicated_parameters(&[&a, &b]).is_ok());
        }

        #[test]
        fn should_report_every_duplicate() {
            let a = header(json!({"alg": "HS256", "kid": "1"}));
            let b = header(json!({"kid": "2"}));
            let c = header(json!({"alg": "HS256"}));
            let result = check_duplicated_parameters(&[&a, &b, &c]);
            assert!(matches!(result.unwrap_err(), JoseError::HeaderConflict(d) if d == vec!["kid", "alg"]));
        }
    }

    mod b64 {
        use super::*;

        #[test]
        fn should_require_crit() {
            let h = header(json!({"alg": "HS256", "b64": false}));
            assert!(matches!(
                check_b64_and_crit(&h).unwrap_err(),
                JoseError::CriticalHeaderViolation(_)
            ));
        }

        #[test]
        fn should_require_crit_array() {
            let h = header(json!({"alg": "HS256", "b64": false, "crit": "b64"}));
            assert!(matches!(
                check_b64_and_crit(&h).unwrap_err(),
                JoseError::CriticalHeaderViolation(_)
            ));
        }

        #[test]
        fn should_require_b64_in_crit() {
            let h = header(json!({"alg": "HS256", "b64": false, "crit": ["foo"]}));
            assert!(matches!(
                check_b64_and_crit(&h).unwrap_err(),
                JoseError::CriticalHeaderViolation(_)
            ));
        }

        #[test]
        fn should_accept_b64_in_crit() {
            let h = header(json!({"alg": "HS256", "b64": false, "crit": ["b64"]}));
            assert!(check_b64_and_crit(&h).is_ok());
            assert!(!is_payload_encoded(&h));
        }

        #[test]
        fn should_default_to_encoded() {
            assert!(is_payload_encoded(&header(json!({"alg": "HS256"}))));
            assert!(is_payload_encoded(&header(json!({"b64": true}))));
        }
    }

    mod crit {
        use super::*;

        #[test]
        fn should_reject_unknown_extension() {
            let h = header(json!({"alg": "HS256", "exp": 1, "crit": ["exp"]}));
            assert!(check_critical_parameters(&h, &["b64"]).is_err());
        }

        #[test]
        fn should_reject_extension_outside_protected_header() {
            let h = header(json!({"alg": "HS256", "crit": ["b64"]}));
            assert!(check_critical_parameters(&h, &["b64"]).is_err());
        }

        #[test]
        fn should_accept_understood_extension() {
            let h = header(json!({"alg": "HS256", "b64": false, "crit": ["b64"]}));
            assert!(check_critical_parameters(&h, &["b64"]).is_ok());
        }
    }

    #[test]
    fn merge_should_let_last_layer_win() {
        let a = header(json!({"alg": "A", "kid": "1"}));
        let b = header(json!({"alg": "B"}));
        let merged = merge(&[&a, &b]);
        assert_eq!(merged["alg"], "B");
        assert_eq!(merged["kid"], "1");
    }

    #[test]
    fn empty_header_should_have_no_encoding() {
        assert!(encode(&Header::new()).unwrap().is_none());
        let h = header(json!({"alg": "HS256"}));
        assert_eq!(decode(&encode(&h).unwrap().unwrap()).unwrap(), h);
    }
}
