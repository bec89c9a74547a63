use anyhow::Result;
use clap::Args;

use drm_keysystem::SessionType;

use super::KeySystemArgs;

/**
    Print the candidate configurations for the platform's key system
    access query, as JSON.
*/
#[derive(Args)]
pub struct ConfigurationsCommand {
    #[command(flatten)]
    key_system: KeySystemArgs,

    /// Video codec (`avc1.640028`) or full content type.
    #[arg(long)]
    video_codec: Option<String>,

    /// Audio codec (`mp4a.40.2`) or full content type.
    #[arg(long)]
    audio_codec: Option<String>,

    /**
        Session type to request. Defaults to the configured session type,
        or `temporary`.
    */
    #[arg(long)]
    session_type: Option<SessionType>,
}

impl ConfigurationsCommand {
    pub fn run(self) -> Result<()> {
        let key_system = self.key_system.key_system()?;
        let session_type = self
            .session_type
            .unwrap_or_else(|| key_system.session_type());

        let configs = key_system.key_system_configurations(
            self.video_codec.as_deref(),
            self.audio_codec.as_deref(),
            session_type,
        );
        println!("{}", serde_json::to_string_pretty(&configs)?);
        Ok(())
    }
}
