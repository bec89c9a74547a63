use data_encoding::BASE64;
use serde::{Deserialize, Serialize};

use drm_core::{Kid, SystemId};

use crate::cenc::MP4_PROTECTION_SCHEME;

/**
    One `ContentProtection` descriptor from a DASH manifest, reduced to the
    fields the key systems consume.

    Deserializes from the attribute/element names used in the manifest
    (`schemeIdUri`, `cenc:default_KID`, `cenc:pssh`, `mspr:pro`).
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentProtectionRecord {
    #[serde(rename = "schemeIdUri")]
    pub scheme_id_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(
        rename = "cenc:default_KID",
        alias = "default_KID",
        default,
        with = "default_kid",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_kid: Option<Kid>,

    /// Base64 PSSH box (`<cenc:pssh>`).
    #[serde(
        rename = "cenc:pssh",
        alias = "pssh",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pssh: Option<String>,

    /// Base64 PlayReady Header Object (`<mspr:pro>`).
    #[serde(
        rename = "mspr:pro",
        alias = "pro",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pro: Option<String>,
}

impl ContentProtectionRecord {
    pub fn new(scheme_id_uri: impl Into<String>) -> Self {
        Self {
            scheme_id_uri: scheme_id_uri.into(),
            ..Default::default()
        }
    }

    /**
        A record for a DRM system's own `urn:uuid:` scheme.
    */
    pub fn for_system(system: SystemId) -> Self {
        Self::new(system.scheme_id_uri())
    }

    /**
        The generic `mp4protection` / `cenc` record.
    */
    pub fn cenc() -> Self {
        Self::new(MP4_PROTECTION_SCHEME).with_value("cenc")
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_default_kid(mut self, kid: Kid) -> Self {
        self.default_kid = Some(kid);
        self
    }

    pub fn with_pssh(mut self, pssh: &[u8]) -> Self {
        self.pssh = Some(BASE64.encode(pssh));
        self
    }

    pub fn with_pro(mut self, pro: &[u8]) -> Self {
        self.pro = Some(BASE64.encode(pro));
        self
    }

    /**
        The DRM system named by a `urn:uuid:` scheme URI.
    */
    pub fn system_id(&self) -> Option<SystemId> {
        SystemId::from_scheme_id_uri(&self.scheme_id_uri)
    }

    /**
        Whether this is the generic Common Encryption descriptor.
    */
    pub fn is_cenc(&self) -> bool {
        self.scheme_id_uri
            .trim()
            .eq_ignore_ascii_case(MP4_PROTECTION_SCHEME)
            && self.value.as_deref().map(str::trim) == Some("cenc")
    }
}

/**
    `cenc:default_KID` is written in UUID form in manifests.
*/
mod default_kid {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use drm_core::{Kid, parse_kid, utils::format_uuid};

    pub fn serialize<S: Serializer>(kid: &Option<Kid>, serializer: S) -> Result<S::Ok, S::Error> {
        match kid {
            Some(kid) => serializer.serialize_str(&format_uuid(kid)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Kid>, D::Error> {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse_kid(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid cenc:default_KID '{s}'")))
    }
}
