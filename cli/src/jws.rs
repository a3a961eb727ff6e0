use crate::utils::*;
use clap::Parser;
use console::style;
use rusty_jose::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct BuildJws {
    /// path to file with the payload, standard in when absent
    payload: Option<PathBuf>,
    /// path to file with the signature key as a JWK
    #[arg(short = 'k', long)]
    key: PathBuf,
    /// signature algorithm
    #[arg(short = 'a', long)]
    alg: String,
    /// JSON object merged into the protected header
    #[arg(long)]
    header: Option<String>,
    /// output format
    #[arg(short = 'f', long, default_value = "jws_compact")]
    format: String,
    /// leave the payload out of the token
    #[arg(short = 'd', long)]
    detached: bool,
    /// path to a JSON configuration with the allowed algorithms
    #[arg(long)]
    config: Option<PathBuf>,
}

impl BuildJws {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = read_config(self.config.as_ref())?;
        let payload = read_input(self.payload.as_ref())?;
        let key = read_key(&self.key)?;

        let mut protected_header = match &self.header {
            Some(header) => to_header(serde_json::from_str(header)?)?,
            None => Header::new(),
        };
        protected_header.insert("alg".to_string(), self.alg.clone().into());

        let jws = config
            .jws_builder()?
            .with_payload(payload.as_bytes(), self.detached)?
            .add_signature(&key, protected_header, Header::new())?
            .build()?;
        let token = JwsSerializerManager::default().serialize(&self.format, &jws, Some(0))?;

        println!("{token}");
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct VerifyJws {
    /// path to file with the token, standard in when absent
    token: Option<PathBuf>,
    /// path to file with a JWK or a JWK Set
    #[arg(short = 'k', long)]
    keys: PathBuf,
    /// path to file with the detached payload
    #[arg(short = 'p', long)]
    payload: Option<PathBuf>,
    /// allowed signature algorithms, the configuration's when absent
    #[arg(short = 'a', long)]
    alg: Vec<String>,
    /// path to a JSON configuration with the allowed algorithms
    #[arg(long)]
    config: Option<PathBuf>,
}

impl VerifyJws {
    pub fn execute(self) -> anyhow::Result<()> {
        let mut config = read_config(self.config.as_ref())?;
        restrict(&mut config.signature_algorithms, &self.alg);
        let token = read_input(self.token.as_ref())?;
        let keys = read_key_set(&self.keys)?;
        let detached_payload = read_file(self.payload.as_ref())?;

        let loader = JwsLoader::new(JwsSerializerManager::default(), config.jws_verifier()?);
        let loaded = loader.load_and_verify_with_key_set(
            token.trim(),
            &keys,
            detached_payload.as_deref().map(str::as_bytes),
        )?;

        match loaded {
            Some((jws, index, key)) => {
                println!("{}", style(format!("✅ signature {index} verified")).green());
                if let Some(kid) = key.kid() {
                    println!("- key: {}", style(kid).cyan());
                }
                let header = jws.signature(index)?.complete_header();
                println!("- header: {}", style(serde_json::to_string_pretty(&header)?).cyan());
                if let Some(payload) = jws.payload() {
                    println!("- payload: {}", style(String::from_utf8_lossy(payload)).cyan());
                }
                Ok(())
            }
            None => anyhow::bail!("❌ no signature could be verified"),
        }
    }
}
