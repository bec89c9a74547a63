use core::fmt;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use drm_core::SystemId;

use crate::capabilities::KeySystemConfiguration;
use crate::cenc;
use crate::clearkey::ClearKey;
use crate::content_protection::ContentProtectionRecord;
use crate::playready::PlayReady;
use crate::protection::{ProtectionConfig, ProtectionData, SessionType};
use crate::widevine::Widevine;

/**
    Configuration installed into a key system by [`KeySystem::init`].

    Every variant owns one of these; `init` is its only mutator.
*/
#[derive(Debug, Clone, Default)]
pub struct ProtectionState {
    data: Option<ProtectionData>,
    session_type: SessionType,
}

impl ProtectionState {
    /**
        Install `data`, replacing whatever was installed before.

        `None` leaves the current configuration in place. The session type
        only changes when the new data names one.
    */
    pub fn init(&mut self, data: Option<ProtectionData>) {
        let Some(data) = data else {
            return;
        };
        if let Some(session_type) = data.session_type {
            self.session_type = session_type;
        }
        self.data = Some(data);
    }

    pub fn data(&self) -> Option<&ProtectionData> {
        self.data.as_ref()
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    /**
        The PSSH box configured by the application, if any.

        An undecodable value is logged and treated as absent so the manifest
        PSSH can be used instead.
    */
    pub fn explicit_pssh(&self) -> Option<Vec<u8>> {
        match self.data()?.decoded_pssh() {
            Ok(pssh) => pssh,
            Err(e) => {
                warn!(error = %e, "ignoring configured pssh");
                None
            }
        }
    }

    /**
        Overwrite the robustness of the first audio and video capability of
        the first configuration with the configured levels.
    */
    pub fn apply_robustness(&self, configs: &mut [KeySystemConfiguration]) {
        let Some(data) = self.data() else {
            return;
        };
        let Some(first) = configs.first_mut() else {
            return;
        };
        if let Some(robustness) = data.audio_robustness() {
            match first.audio_capabilities.first_mut() {
                Some(cap) => cap.robustness = robustness.to_owned(),
                None => debug!(robustness, "no audio capability to apply robustness to"),
            }
        }
        if let Some(robustness) = data.video_robustness() {
            match first.video_capabilities.first_mut() {
                Some(cap) => cap.robustness = robustness.to_owned(),
                None => debug!(robustness, "no video capability to apply robustness to"),
            }
        }
    }

    /**
        The decoded server certificate. An empty or undecodable value yields
        `None`.
    */
    pub fn server_certificate(&self) -> Option<Vec<u8>> {
        match self.data()?.decoded_server_certificate() {
            Ok(cert) => cert,
            Err(e) => {
                warn!(error = %e, "ignoring configured server certificate");
                None
            }
        }
    }
}

/**
    A DRM system as seen by the content protection layer.

    Implementors supply their identity, their [`ProtectionState`] and init
    data resolution; every other operation has a default that suits systems
    whose CDM speaks the license protocol natively.
*/
pub trait KeySystem: fmt::Debug + Send + Sync {
    fn system_id(&self) -> SystemId;

    fn state(&self) -> &ProtectionState;

    fn state_mut(&mut self) -> &mut ProtectionState;

    /**
        Initialization data for a media key session, from the configured
        PSSH or from the manifest record for this system.
    */
    fn init_data(&self, record: &ContentProtectionRecord) -> Option<Vec<u8>>;

    fn scheme_id_uri(&self) -> String {
        self.system_id().scheme_id_uri()
    }

    fn system_string(&self) -> &'static str {
        self.system_id().key_system_string().unwrap_or_default()
    }

    fn uuid(&self) -> String {
        self.system_id().to_uuid()
    }

    fn session_type(&self) -> SessionType {
        self.state().session_type()
    }

    fn protection_data(&self) -> Option<&ProtectionData> {
        self.state().data()
    }

    fn init(&mut self, data: Option<ProtectionData>) {
        self.state_mut().init(data);
    }

    /**
        Candidate configurations for the platform's key system access query,
        in preference order.
    */
    fn key_system_configurations(
        &self,
        video_codec: Option<&str>,
        audio_codec: Option<&str>,
        session_type: SessionType,
    ) -> Vec<KeySystemConfiguration> {
        let mut configs = cenc::key_system_configurations(video_codec, audio_codec, session_type);
        self.state().apply_robustness(&mut configs);
        configs
    }

    fn request_headers_from_message(&self, _message: &[u8]) -> Option<BTreeMap<String, String>> {
        None
    }

    /**
        The body to send to the license server for a CDM message.
    */
    fn license_request_from_message(&self, message: &[u8]) -> Option<Vec<u8>> {
        Some(message.to_vec())
    }

    fn license_server_url_from_init_data(&self, _init_data: &[u8]) -> Option<String> {
        None
    }

    fn cdm_data(&self) -> Option<Vec<u8>> {
        None
    }

    fn server_certificate(&self) -> Option<Vec<u8>> {
        self.state().server_certificate()
    }
}

/**
    Construct the key system for a DRM system ID. FairPlay and unknown
    systems have no implementation.
*/
pub fn key_system_for(system: SystemId) -> Option<Box<dyn KeySystem>> {
    match system {
        SystemId::Widevine => Some(Box::new(Widevine::new())),
        SystemId::PlayReady => Some(Box::new(PlayReady::new())),
        SystemId::ClearKey => Some(Box::new(ClearKey::new())),
        SystemId::FairPlay | SystemId::Unknown(_) => None,
    }
}

pub fn key_system_for_scheme_id_uri(uri: &str) -> Option<Box<dyn KeySystem>> {
    SystemId::from_scheme_id_uri(uri).and_then(key_system_for)
}

pub fn key_system_for_string(key_system: &str) -> Option<Box<dyn KeySystem>> {
    SystemId::from_key_system_string(key_system).and_then(key_system_for)
}

/**
    Systems tried during negotiation, most preferred first.
*/
const PREFERENCE_ORDER: [SystemId; 3] = [
    SystemId::Widevine,
    SystemId::PlayReady,
    SystemId::ClearKey,
];

/**
    Every implemented key system, in negotiation preference order.
*/
pub fn supported_key_systems() -> Vec<Box<dyn KeySystem>> {
    PREFERENCE_ORDER
        .into_iter()
        .filter_map(key_system_for)
        .collect()
}

/**
    A key system matched against a manifest, with the init data it resolved.
*/
#[derive(Debug)]
pub struct SupportedKeySystem {
    pub key_system: Box<dyn KeySystem>,
    pub init_data: Option<Vec<u8>>,
}

/**
    Match manifest `ContentProtection` records against the implemented key
    systems.

    Each system (in preference order) is paired with every record carrying
    its scheme URI, initialized from `config` and asked for init data. A
    record without `cenc:default_KID` takes the one from the `cenc` record.
*/
pub fn supported_key_systems_from_content_protection(
    records: &[ContentProtectionRecord],
    config: Option<&ProtectionConfig>,
) -> Vec<SupportedKeySystem> {
    let default_kid = cenc::find_cenc_content_protection(records).and_then(|r| r.default_kid);
    let mut supported = Vec::new();

    for system in PREFERENCE_ORDER {
        for record in records.iter().filter(|r| r.system_id() == Some(system)) {
            let Some(mut key_system) = key_system_for(system) else {
                continue;
            };
            key_system.init(config.and_then(|c| c.for_system(system)).cloned());

            let mut record = record.clone();
            if record.default_kid.is_none() {
                record.default_kid = default_kid;
            }

            let init_data = key_system.init_data(&record);
            debug!(
                system = %system,
                has_init_data = init_data.is_some(),
                "matched content protection record"
            );
            supported.push(SupportedKeySystem {
                key_system,
                init_data,
            });
        }
    }
    supported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::MediaCapability;

    fn config() -> Vec<KeySystemConfiguration> {
        vec![
            KeySystemConfiguration {
                audio_capabilities: vec![MediaCapability::new("audio/mp4")],
                video_capabilities: vec![
                    MediaCapability::new("video/mp4"),
                    MediaCapability::new("video/webm"),
                ],
                ..Default::default()
            },
            KeySystemConfiguration {
                video_capabilities: vec![MediaCapability::new("video/mp4")],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn init_replaces_and_keeps_session_type() {
        let mut state = ProtectionState::default();
        assert_eq!(state.session_type(), SessionType::Temporary);

        state.init(Some(ProtectionData {
            session_type: Some(SessionType::PersistentLicense),
            video_robustness: Some("HW_SECURE_ALL".into()),
            ..Default::default()
        }));
        assert_eq!(state.session_type(), SessionType::PersistentLicense);

        state.init(Some(ProtectionData {
            audio_robustness: Some("SW_SECURE_CRYPTO".into()),
            ..Default::default()
        }));
        assert_eq!(state.session_type(), SessionType::PersistentLicense);
        let data = state.data().unwrap();
        assert_eq!(data.video_robustness(), None);
        assert_eq!(data.audio_robustness(), Some("SW_SECURE_CRYPTO"));

        state.init(None);
        assert!(state.data().is_some());
    }

    #[test]
    fn robustness_touches_only_first_entries() {
        let mut state = ProtectionState::default();
        state.init(Some(ProtectionData {
            audio_robustness: Some("SW_SECURE_CRYPTO".into()),
            video_robustness: Some("HW_SECURE_ALL".into()),
            ..Default::default()
        }));

        let mut configs = config();
        state.apply_robustness(&mut configs);

        let mut expected = config();
        expected[0].audio_capabilities[0].robustness = "SW_SECURE_CRYPTO".into();
        expected[0].video_capabilities[0].robustness = "HW_SECURE_ALL".into();
        assert_eq!(configs, expected);
    }

    #[test]
    fn robustness_without_capabilities_is_skipped() {
        let mut state = ProtectionState::default();
        state.init(Some(ProtectionData {
            audio_robustness: Some("SW_SECURE_CRYPTO".into()),
            ..Default::default()
        }));
        let mut configs = vec![KeySystemConfiguration::default()];
        state.apply_robustness(&mut configs);
        assert_eq!(configs, vec![KeySystemConfiguration::default()]);

        let mut none: Vec<KeySystemConfiguration> = Vec::new();
        state.apply_robustness(&mut none);
        assert!(none.is_empty());
    }

    #[test]
    fn server_certificate_requires_non_empty_value() {
        let mut state = ProtectionState::default();
        assert_eq!(state.server_certificate(), None);

        state.init(Some(ProtectionData {
            server_certificate: Some(String::new()),
            ..Default::default()
        }));
        assert_eq!(state.server_certificate(), None);

        state.init(Some(ProtectionData {
            server_certificate: Some("3q2+7w==".into()),
            ..Default::default()
        }));
        assert_eq!(
            state.server_certificate(),
            Some(vec![0xde, 0xad, 0xbe, 0xef])
        );

        state.init(Some(ProtectionData {
            server_certificate: Some("***".into()),
            ..Default::default()
        }));
        assert_eq!(state.server_certificate(), None);
    }

    #[test]
    fn explicit_pssh_falls_back_on_bad_base64() {
        let mut state = ProtectionState::default();
        state.init(Some(ProtectionData {
            pssh: Some("%%".into()),
            ..Default::default()
        }));
        assert_eq!(state.explicit_pssh(), None);
    }

    #[test]
    fn lookup_by_identity() {
        assert_eq!(
            key_system_for(SystemId::Widevine).unwrap().system_string(),
            "com.widevine.alpha"
        );
        assert!(key_system_for(SystemId::FairPlay).is_none());

        let pr = key_system_for_scheme_id_uri("urn:uuid:9A04F079-9840-4286-AB92-E65BE0885F95")
            .unwrap();
        assert_eq!(pr.system_id(), SystemId::PlayReady);
        assert_eq!(pr.uuid(), "9a04f079-9840-4286-ab92-e65be0885f95");

        let ck = key_system_for_string("org.w3.clearkey").unwrap();
        assert_eq!(
            ck.scheme_id_uri(),
            "urn:uuid:1077efec-c0b2-4d02-ace3-3c1e52e2fb4b"
        );
        assert!(key_system_for_string("com.example.drm").is_none());
    }

    #[test]
    fn preference_order() {
        let ids: Vec<_> = supported_key_systems()
            .iter()
            .map(|ks| ks.system_id())
            .collect();
        assert_eq!(
            ids,
            [SystemId::Widevine, SystemId::PlayReady, SystemId::ClearKey]
        );
    }
}
