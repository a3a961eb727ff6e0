use clap::{Parser, Subcommand};

pub use jwe::{BuildJwe, DecryptJwe};
pub use jwk::ParseJwk;
pub use jws::{BuildJws, VerifyJws};

mod jwe;
mod jwk;
mod jws;
mod utils;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct RustyCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Signs a payload and prints the JWS
    JwsBuild {
        #[command(flatten)]
        delegate: BuildJws,
    },
    /// Verifies a JWS in any serialization
    JwsVerify {
        #[command(flatten)]
        delegate: VerifyJws,
    },
    /// Encrypts a payload and prints the JWE
    JweBuild {
        #[command(flatten)]
        delegate: BuildJwe,
    },
    /// Decrypts a JWE in any serialization
    JweDecrypt {
        #[command(flatten)]
        delegate: DecryptJwe,
    },
    /// Prints a JWK, its public part and its thumbprint
    JwkParse {
        #[command(flatten)]
        delegate: ParseJwk,
    },
}
