use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    ConfigurationsCommand, InitDataCommand, InspectPsshCommand, LicenseRequestCommand,
    ServerCertificateCommand,
};

/**
    DRM key system command-line tool.

    Set `RUST_LOG=debug` to see key system decisions on stderr.
*/
#[derive(Parser)]
#[command(name = "drm-cli")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect one or more concatenated PSSH boxes.
    InspectPssh(InspectPsshCommand),
    /// Resolve session init data from protection data and a manifest record.
    InitData(InitDataCommand),
    /// Print the capability configurations for a codec pair.
    Configurations(ConfigurationsCommand),
    /// Shape a CDM message into a license request.
    LicenseRequest(LicenseRequestCommand),
    /// Print the configured server certificate.
    ServerCertificate(ServerCertificateCommand),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::InspectPssh(cmd) => cmd.run(),
            Command::InitData(cmd) => cmd.run(),
            Command::Configurations(cmd) => cmd.run(),
            Command::LicenseRequest(cmd) => cmd.run(),
            Command::ServerCertificate(cmd) => cmd.run(),
        }
    }
}
