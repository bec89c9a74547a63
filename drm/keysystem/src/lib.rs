/*!
    Key-system abstraction for encrypted media playback.

    Each supported DRM system is a [`KeySystem`] variant that turns player
    configuration ([`ProtectionData`]) and manifest metadata
    ([`ContentProtectionRecord`]) into what the platform's encrypted-media
    API and the license server expect:

    - capability requests for `requestMediaKeySystemAccess`
      ([`KeySystemConfiguration`])
    - initialization data for session creation
    - license request payloads, headers and server URLs
    - an optional server certificate

    Nothing here performs I/O or holds session state beyond the
    configuration installed by [`KeySystem::init`].
*/

mod capabilities;
mod clearkey;
mod content_protection;
mod encoding;
mod error;
mod license;
mod playready;
mod protection;
mod system;
mod widevine;

pub mod cenc;

// Re-export shared DRM types from drm-core
pub use drm_core::{ContentKey, Kid, PsshBox, SystemId};

pub use self::capabilities::{KeySystemConfiguration, MediaCapability, Requirement};
pub use self::clearkey::{ClearKey, ClearKeySet};
pub use self::content_protection::ContentProtectionRecord;
pub use self::error::{KeySystemError, KeySystemResult};
pub use self::license::LicenseRequest;
pub use self::playready::{MessageFormat, PlayReady};
pub use self::protection::{ProtectionConfig, ProtectionData, SessionType};
pub use self::system::{
    KeySystem, ProtectionState, SupportedKeySystem, key_system_for, key_system_for_scheme_id_uri,
    key_system_for_string, supported_key_systems, supported_key_systems_from_content_protection,
};
pub use self::widevine::{
    KEY_ID_FIELD_MARKER, PLACEHOLDER_KID_BYTE, Widevine, fill_placeholder_kid, find_key_id_slot,
    has_placeholder_kid,
};
