use crate::utils::*;
use clap::Parser;
use console::style;
use rusty_jose::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct BuildJwe {
    /// path to file with the payload, standard in when absent
    payload: Option<PathBuf>,
    /// path to file with the recipient key as a JWK
    #[arg(short = 'k', long)]
    key: PathBuf,
    /// key encryption algorithm
    #[arg(short = 'a', long)]
    alg: String,
    /// content encryption algorithm
    #[arg(short = 'e', long)]
    enc: String,
    /// compression method
    #[arg(short = 'z', long)]
    zip: Option<String>,
    /// output format
    #[arg(short = 'f', long, default_value = "jwe_compact")]
    format: String,
    /// path to a JSON configuration with the allowed algorithms
    #[arg(long)]
    config: Option<PathBuf>,
}

impl BuildJwe {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = read_config(self.config.as_ref())?;
        let payload = read_input(self.payload.as_ref())?;
        let key = read_key(&self.key)?;

        let mut shared_protected_header = Header::new();
        shared_protected_header.insert("alg".to_string(), self.alg.clone().into());
        shared_protected_header.insert("enc".to_string(), self.enc.clone().into());
        if let Some(zip) = &self.zip {
            shared_protected_header.insert("zip".to_string(), zip.clone().into());
        }

        let jwe = config
            .jwe_builder()?
            .with_payload(payload.as_bytes())?
            .with_shared_protected_header(shared_protected_header)?
            .add_recipient(&key, Header::new())?
            .build()?;
        let token = JweSerializerManager::default().serialize(&self.format, &jwe, Some(0))?;

        println!("{token}");
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct DecryptJwe {
    /// path to file with the token, standard in when absent
    token: Option<PathBuf>,
    /// path to file with a JWK or a JWK Set
    #[arg(short = 'k', long)]
    keys: PathBuf,
    /// allowed key encryption algorithms, the configuration's when absent
    #[arg(short = 'a', long)]
    alg: Vec<String>,
    /// allowed content encryption algorithms, the configuration's when absent
    #[arg(short = 'e', long)]
    enc: Vec<String>,
    /// allowed compression methods, the configuration's when absent
    #[arg(short = 'z', long)]
    zip: Vec<String>,
    /// path to a JSON configuration with the allowed algorithms
    #[arg(long)]
    config: Option<PathBuf>,
}

impl DecryptJwe {
    pub fn execute(self) -> anyhow::Result<()> {
        let mut config = read_config(self.config.as_ref())?;
        restrict(&mut config.key_encryption_algorithms, &self.alg);
        restrict(&mut config.content_encryption_algorithms, &self.enc);
        restrict(&mut config.compression_methods, &self.zip);
        let token = read_input(self.token.as_ref())?;
        let keys = read_key_set(&self.keys)?;

        let loader = JweLoader::new(JweSerializerManager::default(), config.jwe_decrypter()?);
        match loader.load_and_decrypt_with_key_set(token.trim(), &keys)? {
            Some((jwe, index, key)) => {
                println!("{}", style(format!("✅ recipient {index} decrypted")).green());
                if let Some(kid) = key.kid() {
                    println!("- key: {}", style(kid).cyan());
                }
                let header = jwe.complete_header(index)?;
                println!("- header: {}", style(serde_json::to_string_pretty(&header)?).cyan());
                if let Some(payload) = jwe.payload() {
                    println!("- payload: {}", style(String::from_utf8_lossy(payload)).cyan());
                }
                Ok(())
            }
            None => anyhow::bail!("❌ the token could not be decrypted"),
        }
    }
}
