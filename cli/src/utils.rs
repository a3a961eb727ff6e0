use rusty_jose::prelude::*;
use serde_json::Value;
use std::path::PathBuf;

pub fn read_stdin() -> anyhow::Result<String> {
    use std::io::Read as _;

    let mut result = String::new();
    std::io::stdin().lock().read_to_string(&mut result)?;
    Ok(result)
}

pub fn read_file(file: Option<&PathBuf>) -> anyhow::Result<Option<String>> {
    file.map(|f| {
        if f.exists() {
            Ok(std::fs::read_to_string(f)?)
        } else {
            anyhow::bail!("File {f:?} does not exist")
        }
    })
    .transpose()
}

/// Content of the file or, without one, of standard in
pub fn read_input(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match read_file(file)? {
        Some(content) => Ok(content),
        None => read_stdin(),
    }
}

/// Configuration file or, without one, every algorithm but 'none'
pub fn read_config(file: Option<&PathBuf>) -> anyhow::Result<JoseConfig> {
    Ok(match read_file(file)? {
        Some(json) => JoseConfig::from_json(&json)?,
        None => JoseConfig::default(),
    })
}

/// Overrides an allow-list of the configuration when algorithms are given on the command line
pub fn restrict(allowed: &mut Vec<String>, only: &[String]) {
    if !only.is_empty() {
        *allowed = only.to_vec();
    }
}

pub fn read_key(file: &PathBuf) -> anyhow::Result<Jwk> {
    let json = read_file(Some(file))?.unwrap_or_default();
    Ok(Jwk::from_json(json.trim())?)
}

/// Accepts either a single JWK or a JWK Set
pub fn read_key_set(file: &PathBuf) -> anyhow::Result<JwkSet> {
    let json = read_file(Some(file))?.unwrap_or_default();
    let value = serde_json::from_str::<Value>(json.trim())?;
    Ok(if value.get("keys").is_some() {
        JwkSet::from_key_data(value)?
    } else {
        JwkSet::new([Jwk::from_json(json.trim())?])
    })
}

pub fn to_header(value: Value) -> anyhow::Result<Header> {
    match value {
        Value::Object(header) => Ok(header),
        _ => anyhow::bail!("A header must be a JSON object"),
    }
}
