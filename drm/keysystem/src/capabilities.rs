use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use drm_core::{ParseError, eq_ignore_ascii_case, trim_ascii};

use crate::protection::SessionType;

/**
    Requirement level for an optional CDM feature
    (`distinctiveIdentifier`, `persistentState`).
*/
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Requirement {
    Required,
    #[default]
    Optional,
    NotAllowed,
}

impl Requirement {
    pub const fn from_name(name: &[u8]) -> Option<Self> {
        let name = trim_ascii(name);
        match name.len() {
            8 if eq_ignore_ascii_case(name, b"required") => Some(Self::Required),
            8 if eq_ignore_ascii_case(name, b"optional") => Some(Self::Optional),
            11 if eq_ignore_ascii_case(name, b"not-allowed") => Some(Self::NotAllowed),
            _ => None,
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::NotAllowed => "not-allowed",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for Requirement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes()).ok_or_else(|| ParseError {
            kind: "requirement",
            value: s.to_owned(),
        })
    }
}

/**
    One content type the CDM must be able to decrypt, with the robustness
    level it must do so at. An empty robustness means "any".
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCapability {
    pub content_type: String,
    #[serde(default)]
    pub robustness: String,
}

impl MediaCapability {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            robustness: String::new(),
        }
    }

    pub fn with_robustness(mut self, robustness: impl Into<String>) -> Self {
        self.robustness = robustness.into();
        self
    }
}

/**
    A candidate configuration for the platform's key-system access query.

    Serializes to the shape of an EME `MediaKeySystemConfiguration`.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySystemConfiguration {
    pub init_data_types: Vec<String>,
    pub audio_capabilities: Vec<MediaCapability>,
    pub video_capabilities: Vec<MediaCapability>,
    pub distinctive_identifier: Requirement,
    pub persistent_state: Requirement,
    pub session_types: Vec<SessionType>,
}

impl Default for KeySystemConfiguration {
    fn default() -> Self {
        Self {
            init_data_types: vec!["cenc".to_owned()],
            audio_capabilities: Vec::new(),
            video_capabilities: Vec::new(),
            distinctive_identifier: Requirement::Optional,
            persistent_state: Requirement::Optional,
            session_types: vec![SessionType::Temporary],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_names() {
        for r in [
            Requirement::Required,
            Requirement::Optional,
            Requirement::NotAllowed,
        ] {
            assert_eq!(r.to_string().parse::<Requirement>().unwrap(), r);
        }
        assert_eq!(
            Requirement::from_name(b"REQUIRED"),
            Some(Requirement::Required)
        );
        assert_eq!(Requirement::from_name(b"maybe"), None);
    }

    #[test]
    fn configuration_serializes_like_eme() {
        let config = KeySystemConfiguration {
            video_capabilities: vec![
                MediaCapability::new(r#"video/mp4;codecs="avc1.4d401e""#)
                    .with_robustness("SW_SECURE_DECODE"),
            ],
            persistent_state: Requirement::Required,
            session_types: vec![SessionType::PersistentLicense],
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["initDataTypes"][0], "cenc");
        assert_eq!(json["audioCapabilities"].as_array().unwrap().len(), 0);
        assert_eq!(
            json["videoCapabilities"][0]["contentType"],
            r#"video/mp4;codecs="avc1.4d401e""#
        );
        assert_eq!(
            json["videoCapabilities"][0]["robustness"],
            "SW_SECURE_DECODE"
        );
        assert_eq!(json["distinctiveIdentifier"], "optional");
        assert_eq!(json["persistentState"], "required");
        assert_eq!(json["sessionTypes"][0], "persistent-license");
    }
}
