use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use clap::Args;
use data_encoding::BASE64;
use serde::Serialize;
use tracing::{debug, info};

use drm_keysystem::{ClearKey, KeySystem, LicenseRequest, SystemId};

use super::{KeySystemArgs, decode_base64};

/**
    Shape a CDM key message into the license request a player would send,
    printed as JSON. Nothing is sent.
*/
#[derive(Args)]
pub struct LicenseRequestCommand {
    #[command(flatten)]
    key_system: KeySystemArgs,

    /// Base64-encoded CDM message.
    #[arg(short, long)]
    message: String,

    /// Base64-encoded session init data, used to find a license server URL.
    #[arg(short, long)]
    init_data: Option<String>,

    /**
        Additional HTTP headers in "Key: Value" format. Can be repeated.
    */
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestOutput<'a> {
    url: &'a str,
    headers: &'a BTreeMap<String, String>,
    body: String,
    with_credentials: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cdm_data: Option<String>,
}

impl LicenseRequestCommand {
    pub fn run(self) -> Result<()> {
        let message = decode_base64("message", &self.message)?;
        let init_data = self
            .init_data
            .as_deref()
            .map(|i| decode_base64("init data", i))
            .transpose()?;

        if self.key_system.system_id() == SystemId::ClearKey
            && self.answer_clear_key_locally(&message)?
        {
            return Ok(());
        }

        let key_system = self.key_system.key_system()?;
        let Some(mut request) =
            LicenseRequest::prepare(key_system.as_ref(), &message, init_data.as_deref())
        else {
            bail!(
                "no license request for {} (missing server URL or unusable message)",
                key_system.system_string()
            );
        };
        for h in &self.headers {
            let (key, value) = parse_header(h)?;
            debug!(header = %key, "overriding request header");
            request.headers.insert(key, value);
        }

        let output = RequestOutput {
            url: &request.url,
            headers: &request.headers,
            body: BASE64.encode(&request.body),
            with_credentials: request.with_credentials,
            cdm_data: key_system.cdm_data().map(|d| BASE64.encode(&d)),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    /**
        Print a JWK license when configured clear keys answer the request.
    */
    fn answer_clear_key_locally(&self, message: &[u8]) -> Result<bool> {
        let mut clear_key = ClearKey::new();
        clear_key.init(self.key_system.protection_data()?);
        let Some(keys) = clear_key.clear_keys_for_message(message) else {
            return Ok(false);
        };
        let license = keys.to_jwk_json()?;
        info!(keys = keys.keys.len(), "answered ClearKey request locally");
        println!("{}", String::from_utf8_lossy(&license));
        Ok(true)
    }
}

fn parse_header(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once(':')
        .context("header must be in 'Key: Value' format")?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}
