use core::fmt;
use core::str::FromStr;

use data_encoding::BASE64URL_NOPAD;

use crate::constants::KID_LEN;
use crate::error::{ContentKeyError, ParseError};
use crate::utils::{bytes_equal, eq_ignore_ascii_case, trim_ascii};

/**
    A 16-byte key identifier.
*/
pub type Kid = [u8; KID_LEN];

const URN_UUID_PREFIX: &str = "urn:uuid:";

const KNOWN_SYSTEMS: [SystemId; 4] = [
    SystemId::Widevine,
    SystemId::PlayReady,
    SystemId::FairPlay,
    SystemId::ClearKey,
];

/**
    DRM content protection system identifier.

    Recognizes the major DRM systems by their DASH-IF registered UUIDs.
    Unrecognized system IDs are captured in the `Unknown` variant.

    Reference: <https://dashif.org/identifiers/content_protection/>
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemId {
    Widevine,
    PlayReady,
    FairPlay,
    ClearKey,
    Unknown([u8; 16]),
}

impl SystemId {
    /**
        Identify a DRM system from its 16-byte UUID.
    */
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        use crate::constants::*;
        if bytes_equal(&bytes, &WIDEVINE_SYSTEM_ID) {
            Self::Widevine
        } else if bytes_equal(&bytes, &PLAYREADY_SYSTEM_ID) {
            Self::PlayReady
        } else if bytes_equal(&bytes, &FAIRPLAY_SYSTEM_ID) {
            Self::FairPlay
        } else if bytes_equal(&bytes, &CLEARKEY_SYSTEM_ID) {
            Self::ClearKey
        } else {
            Self::Unknown(bytes)
        }
    }

    /**
        Return the raw 16-byte UUID for this system.
    */
    pub const fn to_bytes(self) -> [u8; 16] {
        use crate::constants::*;
        match self {
            Self::Widevine => WIDEVINE_SYSTEM_ID,
            Self::PlayReady => PLAYREADY_SYSTEM_ID,
            Self::FairPlay => FAIRPLAY_SYSTEM_ID,
            Self::ClearKey => CLEARKEY_SYSTEM_ID,
            Self::Unknown(bytes) => bytes,
        }
    }

    /**
        Human-readable name for this system.
    */
    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Widevine => "Widevine",
            Self::PlayReady => "PlayReady",
            Self::FairPlay => "FairPlay",
            Self::ClearKey => "ClearKey",
            Self::Unknown(_) => "Unknown",
        }
    }

    /**
        Reverse-domain key system string used by the platform's
        encrypted-media API (`requestMediaKeySystemAccess`).
    */
    pub const fn key_system_string(self) -> Option<&'static str> {
        match self {
            Self::Widevine => Some("com.widevine.alpha"),
            Self::PlayReady => Some("com.microsoft.playready"),
            Self::FairPlay => Some("com.apple.fps.1_0"),
            Self::ClearKey => Some("org.w3.clearkey"),
            Self::Unknown(_) => None,
        }
    }

    /**
        Identify a known DRM system from its key system string.
    */
    pub fn from_key_system_string(s: &str) -> Option<Self> {
        let s = s.trim();
        KNOWN_SYSTEMS
            .into_iter()
            .find(|id| id.key_system_string() == Some(s))
    }

    /**
        Parse a UUID string into a `SystemId`.

        Accepts both hyphenated (`edef8ba9-79d6-4ace-a3c8-27dcd51d21ed`) and
        plain (`edef8ba979d64acea3c827dcd51d21ed`) formats. Hex digits are
        case-insensitive.
    */
    pub const fn from_uuid(s: &[u8]) -> Option<Self> {
        match crate::utils::parse_uuid_bytes(s) {
            Some(bytes) => Some(Self::from_bytes(bytes)),
            None => None,
        }
    }

    /**
        Format as a standard UUID string (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
    */
    pub fn to_uuid(self) -> String {
        crate::utils::format_uuid(&self.to_bytes())
    }

    /**
        DASH `ContentProtection@schemeIdUri` for this system (`urn:uuid:<uuid>`).
    */
    pub fn scheme_id_uri(self) -> String {
        format!("{URN_UUID_PREFIX}{}", self.to_uuid())
    }

    /**
        Parse a `urn:uuid:` scheme URI. The prefix and hex digits are matched
        case-insensitively, as manifests are inconsistent about both.
    */
    pub fn from_scheme_id_uri(uri: &str) -> Option<Self> {
        let uri = trim_ascii(uri.as_bytes());
        let prefix = URN_UUID_PREFIX.as_bytes();
        if uri.len() <= prefix.len() || !eq_ignore_ascii_case(&uri[..prefix.len()], prefix) {
            return None;
        }
        Self::from_uuid(&uri[prefix.len()..])
    }

    /**
        Returns `true` for recognized DRM systems.
    */
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /**
        Returns `true` for unrecognized DRM systems.
    */
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_name(), self.to_uuid())
    }
}

/**
    Parse a system from a key system string, a UUID or a `urn:uuid:` URI.
*/
impl FromStr for SystemId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key_system_string(s)
            .or_else(|| Self::from_scheme_id_uri(s))
            .or_else(|| Self::from_uuid(trim_ascii(s.as_bytes())))
            .or_else(|| {
                let name = trim_ascii(s.as_bytes());
                KNOWN_SYSTEMS
                    .into_iter()
                    .find(|id| eq_ignore_ascii_case(name, id.to_name().as_bytes()))
            })
            .ok_or_else(|| ParseError {
                kind: "DRM system",
                value: s.to_owned(),
            })
    }
}

/**
    A content decryption key paired with its key ID.

    `Display` prints `kid_hex:key_hex` (e.g. `00000000000000000000000000000001:abcdef0123456789`).
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentKey {
    kid: Kid,
    key: Vec<u8>,
}

impl ContentKey {
    pub fn new(kid: impl AsRef<[u8]>, key: impl AsRef<[u8]>) -> Result<Self, ContentKeyError> {
        let kid_bytes: &[u8] = kid.as_ref();
        let kid: Kid = kid_bytes
            .try_into()
            .map_err(|_| ContentKeyError::InvalidKidLength(kid_bytes.len()))?;
        let key: &[u8] = key.as_ref();
        if key.is_empty() {
            return Err(ContentKeyError::EmptyKey);
        }
        Ok(Self {
            kid,
            key: key.to_vec(),
        })
    }

    /**
        Build a key from the unpadded base64url strings used by JSON Web Keys
        (`kid` / `k`). Trailing `=` padding is tolerated.
    */
    pub fn from_base64url(kid: &str, key: &str) -> Result<Self, ContentKeyError> {
        let decode = |s: &str| {
            BASE64URL_NOPAD
                .decode(s.trim().trim_end_matches('=').as_bytes())
                .map_err(|e| ContentKeyError::InvalidBase64(e.to_string()))
        };
        Self::new(decode(kid)?, decode(key)?)
    }

    /**
        16-byte key identifier.
    */
    pub fn kid(&self) -> Kid {
        self.kid
    }

    /**
        Key bytes. Typically 16 bytes for AES-128 content.
    */
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn kid_hex(&self) -> String {
        hex::encode(self.kid)
    }

    pub fn key_hex(&self) -> String {
        hex::encode(&self.key)
    }

    /**
        Key ID as unpadded base64url, as carried in JWK sets and ClearKey
        license requests.
    */
    pub fn kid_base64url(&self) -> String {
        BASE64URL_NOPAD.encode(&self.kid)
    }

    pub fn key_base64url(&self) -> String {
        BASE64URL_NOPAD.encode(&self.key)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.kid), hex::encode(&self.key))
    }
}

/**
    Parse a content key from `kid_hex:key_hex` format (e.g. `00...01:abcdef01`).
*/
impl FromStr for ContentKey {
    type Err = ContentKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kid_hex, key_hex) = s.split_once(':').ok_or(ContentKeyError::InvalidFormat)?;
        let kid =
            hex::decode(kid_hex.trim()).map_err(|e| ContentKeyError::InvalidHex(e.to_string()))?;
        let key =
            hex::decode(key_hex.trim()).map_err(|e| ContentKeyError::InvalidHex(e.to_string()))?;
        Self::new(kid, key)
    }
}
