mod configurations;
mod init_data;
mod inspect_pssh;
mod license_request;
mod server_certificate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use data_encoding::BASE64;
use tracing::debug;

use drm_keysystem::{KeySystem, ProtectionConfig, ProtectionData, SystemId, key_system_for};

pub use self::configurations::ConfigurationsCommand;
pub use self::init_data::InitDataCommand;
pub use self::inspect_pssh::InspectPsshCommand;
pub use self::license_request::LicenseRequestCommand;
pub use self::server_certificate::ServerCertificateCommand;

/**
    Key system selection and protection configuration shared by the
    key system commands.
*/
#[derive(Args)]
pub struct KeySystemArgs {
    /**
        Key system string, system name, UUID or `urn:uuid:` scheme URI.
    */
    #[arg(short, long, default_value = "com.widevine.alpha")]
    key_system: SystemId,

    /**
        Protection configuration JSON, keyed by key system string.
    */
    #[arg(short, long)]
    protection: Option<PathBuf>,
}

impl KeySystemArgs {
    pub fn system_id(&self) -> SystemId {
        self.key_system
    }

    /**
        Protection data configured for the selected key system.
    */
    pub fn protection_data(&self) -> Result<Option<ProtectionData>> {
        let Some(path) = &self.protection else {
            return Ok(None);
        };
        let config = ProtectionConfig::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        let data = config.for_system(self.key_system).cloned();
        if data.is_none() {
            debug!(
                key_system = %self.key_system,
                path = %path.display(),
                "no protection data for key system"
            );
        }
        Ok(data)
    }

    /**
        The selected key system, initialized from the configuration.
    */
    pub fn key_system(&self) -> Result<Box<dyn KeySystem>> {
        let mut key_system = key_system_for(self.key_system)
            .with_context(|| format!("unsupported key system: {}", self.key_system))?;
        key_system.init(self.protection_data()?);
        Ok(key_system)
    }
}

pub fn decode_base64(what: &str, value: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(value.trim().as_bytes())
        .with_context(|| format!("invalid base64 {what}"))
}
