/*!
    Microsoft PlayReady (`com.microsoft.playready`).

    The CDM wraps its SOAP license challenge in a `<PlayReadyKeyMessage>`
    envelope that also lists the HTTP headers to send; both are unpacked
    here. Init data may come from the manifest's `<mspr:pro>` header object,
    and the license server URL can be read back out of it.
*/

mod header;
mod message;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use drm_core::SystemId;

use crate::cenc;
use crate::content_protection::ContentProtectionRecord;
use crate::encoding::decode_base64;
use crate::system::{KeySystem, ProtectionState};

use self::message::{KeyMessage, cdm_data_envelope, default_headers};

pub use self::message::MessageFormat;

#[derive(Debug, Clone, Default)]
pub struct PlayReady {
    state: ProtectionState,
    message_format: MessageFormat,
}

impl PlayReady {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Use `format` to decode CDM messages (UTF-16 by default).
    */
    pub fn with_message_format(mut self, format: MessageFormat) -> Self {
        self.message_format = format;
        self
    }

    pub fn message_format(&self) -> MessageFormat {
        self.message_format
    }

    /**
        `None` for a malformed envelope, `Some(None)` for an unwrapped
        challenge.
    */
    fn key_message(&self, message: &[u8]) -> Option<Option<KeyMessage>> {
        KeyMessage::parse(message, self.message_format)
            .inspect_err(|e| warn!(error = %e, "malformed PlayReady key message"))
            .ok()
    }

    fn pro_init_data(record: &ContentProtectionRecord) -> Option<Vec<u8>> {
        let pro = record.pro.as_deref().filter(|s| !s.trim().is_empty())?;
        match decode_base64("mspr:pro", pro) {
            Ok(pro) => Some(header::pssh_from_pro(&pro)),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable mspr:pro");
                None
            }
        }
    }
}

impl KeySystem for PlayReady {
    fn system_id(&self) -> SystemId {
        SystemId::PlayReady
    }

    fn state(&self) -> &ProtectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProtectionState {
        &mut self.state
    }

    fn init_data(&self, record: &ContentProtectionRecord) -> Option<Vec<u8>> {
        self.state
            .explicit_pssh()
            .or_else(|| Self::pro_init_data(record))
            .or_else(|| cenc::parse_init_data_from_content_protection(record))
    }

    fn request_headers_from_message(&self, message: &[u8]) -> Option<BTreeMap<String, String>> {
        match self.key_message(message)? {
            Some(msg) => Some(msg.headers),
            None => Some(default_headers()),
        }
    }

    fn license_request_from_message(&self, message: &[u8]) -> Option<Vec<u8>> {
        let Some(msg) = self.key_message(message)? else {
            return Some(message.to_vec());
        };
        match msg.challenge_bytes() {
            Some(Ok(challenge)) => Some(challenge),
            Some(Err(e)) => {
                warn!(error = %e, "undecodable PlayReady challenge");
                None
            }
            None => {
                warn!("PlayReady key message has no challenge");
                None
            }
        }
    }

    fn license_server_url_from_init_data(&self, init_data: &[u8]) -> Option<String> {
        match header::license_server_url(init_data) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "no license server URL in PlayReady init data");
                None
            }
        }
    }

    fn cdm_data(&self) -> Option<Vec<u8>> {
        let custom_data = self.protection_data()?.cdm_data()?;
        Some(cdm_data_envelope(custom_data))
    }
}
