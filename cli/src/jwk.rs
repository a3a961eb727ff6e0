use crate::utils::*;
use clap::Parser;
use console::style;
use rusty_jose::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct ParseJwk {
    /// JWK in JSON, standard in when absent
    key: Option<PathBuf>,
}

impl ParseJwk {
    pub fn execute(self) -> anyhow::Result<()> {
        let key = read_input(self.key.as_ref())?;
        let jwk = Jwk::from_json(key.trim())?;

        let json_jwk = serde_json::to_string_pretty(jwk.all())?;
        println!("- JWK: \n{}", style(&json_jwk).cyan());
        if jwk.is_private() {
            let public = serde_json::to_string_pretty(jwk.to_public().all())?;
            println!("- public JWK: \n{}", style(&public).cyan());
        }

        // JWK thumbprint of a private key is the same as its corresponding public key https://www.rfc-editor.org/rfc/rfc7638.html#section-3.2.1
        for hash_alg in [HashAlgorithm::SHA256, HashAlgorithm::SHA384] {
            let thumbprint = jwk.thumbprint(hash_alg)?;
            println!("- JWK thumbprint with {hash_alg} : {}", style(&thumbprint).cyan());
        }

        Ok(())
    }
}
