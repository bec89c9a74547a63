use anyhow::{Context, Result, bail};
use clap::Args;

use drm_keysystem::cenc::parse_pssh_list;
use drm_keysystem::{KeySystem, PlayReady, PsshBox, SystemId, find_key_id_slot, has_placeholder_kid};

use super::decode_base64;

/**
    Inspect a PSSH box, or several concatenated ones.
*/
#[derive(Args)]
pub struct InspectPsshCommand {
    /// Base64-encoded PSSH box(es).
    pub base64: String,
}

impl InspectPsshCommand {
    pub fn run(self) -> Result<()> {
        let bytes = decode_base64("PSSH", &self.base64)?;

        let boxes = parse_pssh_list(&bytes);
        if boxes.is_empty() {
            // surface the parse error for a lone malformed box
            PsshBox::from_bytes(&bytes).context("failed to parse PSSH box")?;
            bail!("no PSSH box found");
        }

        for (i, (system, raw)) in boxes.into_iter().enumerate() {
            if i > 0 {
                println!();
            }
            let pssh = PsshBox::from_bytes(raw).context("failed to parse PSSH box")?;
            print_box(system, raw, &pssh);
        }
        Ok(())
    }
}

fn print_box(system: SystemId, raw: &[u8], pssh: &PsshBox) {
    println!("System:     {system}");
    println!("Version:    {}", pssh.version);
    println!("Box Size:   {} bytes", raw.len());
    println!("Data Size:  {} bytes", pssh.data.len());

    let kids = pssh.key_ids();
    if !kids.is_empty() {
        println!();
        println!("Key IDs ({}):", kids.len());
        for kid in kids {
            println!("  {}", hex::encode(kid));
        }
    }

    match system {
        SystemId::Widevine => match find_key_id_slot(&pssh.data) {
            Some(slot) if has_placeholder_kid(&pssh.data) => {
                println!();
                println!("Key ID:     placeholder at data offset {slot}");
            }
            Some(slot) => {
                println!();
                println!(
                    "Key ID:     {}",
                    hex::encode(&pssh.data[slot..slot + drm_core::KID_LEN])
                );
            }
            None => {}
        },
        SystemId::PlayReady => {
            if let Some(url) = PlayReady::new().license_server_url_from_init_data(raw) {
                println!();
                println!("LA URL:     {url}");
            }
        }
        _ => {}
    }
}
