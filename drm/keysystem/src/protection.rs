use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use drm_core::{ContentKey, ParseError, SystemId, eq_ignore_ascii_case, trim_ascii};

use crate::encoding::decode_base64;
use crate::error::{KeySystemError, KeySystemResult};

/**
    Kind of media key session to request.
*/
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    /// Licenses and keys are never persisted.
    #[default]
    Temporary,
    /// The license is persisted for offline playback.
    PersistentLicense,
}

impl SessionType {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        let name = trim_ascii(name);
        match name.len() {
            9 if eq_ignore_ascii_case(name, b"temporary") => Some(Self::Temporary),
            18 if eq_ignore_ascii_case(name, b"persistent-license") => {
                Some(Self::PersistentLicense)
            }
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Temporary => "temporary",
            Self::PersistentLicense => "persistent-license",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for SessionType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "session type",
            value: s.to_owned(),
        })
    }
}

/**
    Per-key-system protection settings supplied by the application.

    Field names follow the player's JSON configuration format. Empty strings
    are treated the same as absent values.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtectionData {
    /// Base64 PSSH box that overrides the one found in the manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pssh: Option<String>,
    /// Base64 license server certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_robustness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_robustness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_type: Option<SessionType>,
    /// License server URL; takes precedence over one embedded in init data.
    #[serde(rename = "serverURL", skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    /// Extra headers sent with every license request.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub http_request_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    pub with_credentials: bool,
    /// Opaque custom data forwarded to the CDM (PlayReady).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdm_data: Option<String>,
    /// Base64url key ID → base64url key, answered locally (ClearKey).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub clearkeys: BTreeMap<String, String>,
}

impl ProtectionData {
    /**
        The explicitly configured PSSH box, decoded.
    */
    pub fn decoded_pssh(&self) -> KeySystemResult<Option<Vec<u8>>> {
        non_empty(&self.pssh)
            .map(|b64| decode_base64("pssh", b64))
            .transpose()
    }

    /**
        The configured server certificate, decoded.
    */
    pub fn decoded_server_certificate(&self) -> KeySystemResult<Option<Vec<u8>>> {
        non_empty(&self.server_certificate)
            .map(|b64| decode_base64("serverCertificate", b64))
            .transpose()
    }

    pub fn audio_robustness(&self) -> Option<&str> {
        non_empty(&self.audio_robustness)
    }

    pub fn video_robustness(&self) -> Option<&str> {
        non_empty(&self.video_robustness)
    }

    pub fn server_url(&self) -> Option<&str> {
        non_empty(&self.server_url)
    }

    pub fn cdm_data(&self) -> Option<&str> {
        non_empty(&self.cdm_data)
    }

    /**
        The configured ClearKey pairs, in key ID order.
    */
    pub fn clear_keys(&self) -> KeySystemResult<Vec<ContentKey>> {
        self.clearkeys
            .iter()
            .map(|(kid, key)| ContentKey::from_base64url(kid, key).map_err(KeySystemError::from))
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/**
    Player-level protection configuration: [`ProtectionData`] keyed by key
    system string, e.g.

    ```json
    { "com.widevine.alpha": { "serverURL": "https://example.com/wv" } }
    ```
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectionConfig {
    systems: BTreeMap<String, ProtectionData>,
}

impl ProtectionConfig {
    pub fn from_json_str(json: &str) -> KeySystemResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> KeySystemResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| KeySystemError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, key_system: impl Into<String>, data: ProtectionData) {
        self.systems.insert(key_system.into(), data);
    }

    pub fn for_key_system(&self, key_system: &str) -> Option<&ProtectionData> {
        self.systems.get(key_system)
    }

    pub fn for_system(&self, system: SystemId) -> Option<&ProtectionData> {
        system
            .key_system_string()
            .and_then(|ks| self.for_key_system(ks))
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
