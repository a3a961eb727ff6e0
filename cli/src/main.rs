use clap::Parser;
use rusty_jose_cli::*;

fn main() -> anyhow::Result<()> {
    let cli: RustyCli = RustyCli::parse();
    match cli.cmd {
        Commands::JwsBuild { delegate } => delegate.execute()?,
        Commands::JwsVerify { delegate } => delegate.execute()?,
        Commands::JweBuild { delegate } => delegate.execute()?,
        Commands::JweDecrypt { delegate } => delegate.execute()?,
        Commands::JwkParse { delegate } => delegate.execute()?,
    };
    Ok(())
}
