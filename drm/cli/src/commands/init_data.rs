use anyhow::{Context, Result, bail};
use clap::Args;
use data_encoding::BASE64;

use drm_core::{Kid, parse_kid};
use drm_keysystem::ContentProtectionRecord;

use super::{KeySystemArgs, decode_base64};

/**
    Resolve the init data a key system would hand to session creation.

    The manifest `ContentProtection` record is described by `--pssh`,
    `--pro` and `--default-kid`; a configured `pssh` takes precedence.
*/
#[derive(Args)]
pub struct InitDataCommand {
    #[command(flatten)]
    key_system: KeySystemArgs,

    /// Base64 `cenc:pssh` from the manifest.
    #[arg(long)]
    pssh: Option<String>,

    /// Base64 `mspr:pro` from the manifest (PlayReady).
    #[arg(long)]
    pro: Option<String>,

    /**
        `cenc:default_KID`, as a UUID, 32 hex digits or base64.
    */
    #[arg(long, value_parser = parse_default_kid)]
    default_kid: Option<Kid>,

    /// Print hex instead of base64.
    #[arg(long)]
    hex: bool,
}

impl InitDataCommand {
    pub fn run(self) -> Result<()> {
        let key_system = self.key_system.key_system()?;

        let mut record = ContentProtectionRecord::for_system(key_system.system_id());
        if let Some(pssh) = &self.pssh {
            record = record.with_pssh(&decode_base64("cenc:pssh", pssh)?);
        }
        if let Some(pro) = &self.pro {
            record = record.with_pro(&decode_base64("mspr:pro", pro)?);
        }
        record.default_kid = self.default_kid;

        let Some(init_data) = key_system.init_data(&record) else {
            bail!(
                "no initialization data available for {}",
                key_system.system_string()
            );
        };

        if self.hex {
            println!("{}", hex::encode(&init_data));
        } else {
            println!("{}", BASE64.encode(&init_data));
        }
        Ok(())
    }
}

fn parse_default_kid(s: &str) -> Result<Kid> {
    parse_kid(s).context("expected a 16-byte key ID")
}
