use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use data_encoding::BASE64;

use super::KeySystemArgs;

/**
    Print the server certificate configured for a key system.
*/
#[derive(Args)]
pub struct ServerCertificateCommand {
    #[command(flatten)]
    key_system: KeySystemArgs,

    /// Write the raw certificate to a file instead of printing base64.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ServerCertificateCommand {
    pub fn run(self) -> Result<()> {
        let key_system = self.key_system.key_system()?;
        let Some(cert) = key_system.server_certificate() else {
            bail!(
                "no server certificate configured for {}",
                key_system.system_string()
            );
        };

        match &self.output {
            Some(path) => {
                std::fs::write(path, &cert)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Wrote {} bytes to {}", cert.len(), path.display());
            }
            None => println!("{}", BASE64.encode(&cert)),
        }
        Ok(())
    }
}
