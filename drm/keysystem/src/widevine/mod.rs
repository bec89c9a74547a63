/*!
    Google Widevine (`com.widevine.alpha`).

    The CDM produces and consumes the license protocol directly, so message
    shaping is a pass-through. The only Widevine-specific work is filling a
    placeholder key ID in the PSSH data from the manifest's
    `cenc:default_KID` (see [`fill_placeholder_kid`]).
*/

mod placeholder;

use tracing::debug;

use drm_core::SystemId;

use crate::cenc;
use crate::content_protection::ContentProtectionRecord;
use crate::system::{KeySystem, ProtectionState};

pub use self::placeholder::{
    KEY_ID_FIELD_MARKER, PLACEHOLDER_KID_BYTE, fill_placeholder_kid, find_key_id_slot,
    has_placeholder_kid,
};

#[derive(Debug, Clone, Default)]
pub struct Widevine {
    state: ProtectionState,
}

impl Widevine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySystem for Widevine {
    fn system_id(&self) -> SystemId {
        SystemId::Widevine
    }

    fn state(&self) -> &ProtectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProtectionState {
        &mut self.state
    }

    fn init_data(&self, record: &ContentProtectionRecord) -> Option<Vec<u8>> {
        let mut pssh = self
            .state
            .explicit_pssh()
            .or_else(|| cenc::parse_init_data_from_content_protection(record))?;

        match record.default_kid {
            Some(kid) => {
                if fill_placeholder_kid(&mut pssh, &kid) {
                    debug!(kid = %hex::encode(kid), "filled placeholder key ID");
                }
            }
            None => debug!("no cenc:default_KID, key ID left as is"),
        }
        Some(pssh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_encoding::BASE64;
    use hex_literal::hex;

    use crate::protection::{ProtectionData, SessionType};

    const KID: [u8; 16] = hex!("0102030405060708090a0b0c0d0e0f10");

    // pssh v0, Widevine, data = 08 01 | 12 10 <16 x FF> | 22 04 "test"
    const PLACEHOLDER_PSSH: [u8; 58] = hex!(
        "0000003a 70737368 00000000"
        "edef8ba979d64acea3c827dcd51d21ed"
        "0000001a"
        "0801"
        "1210 ffffffffffffffffffffffffffffffff"
        "2204 74657374"
    );

    fn record() -> ContentProtectionRecord {
        ContentProtectionRecord::for_system(SystemId::Widevine)
            .with_default_kid(KID)
            .with_pssh(&PLACEHOLDER_PSSH)
    }

    #[test]
    fn identity() {
        let wv = Widevine::new();
        assert_eq!(wv.system_string(), "com.widevine.alpha");
        assert_eq!(wv.uuid(), "edef8ba9-79d6-4ace-a3c8-27dcd51d21ed");
        assert_eq!(
            wv.scheme_id_uri(),
            "urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed"
        );
        assert_eq!(wv.session_type(), SessionType::Temporary);
    }

    #[test]
    fn manifest_pssh_placeholder_is_filled() {
        let wv = Widevine::new();
        let init_data = wv.init_data(&record()).unwrap();

        let mut expected = PLACEHOLDER_PSSH.to_vec();
        expected[36..52].copy_from_slice(&KID);
        assert_eq!(init_data, expected);
    }

    #[test]
    fn init_data_is_repeatable() {
        let mut wv = Widevine::new();
        wv.init(None);
        let record = record();
        assert_eq!(wv.init_data(&record), wv.init_data(&record));
    }

    #[test]
    fn explicit_pssh_wins_over_manifest() {
        let mut explicit = PLACEHOLDER_PSSH;
        explicit[36..52].copy_from_slice(&[0x42; 16]);

        let mut wv = Widevine::new();
        wv.init(Some(ProtectionData {
            pssh: Some(BASE64.encode(&explicit)),
            ..Default::default()
        }));
        assert_eq!(wv.init_data(&record()).unwrap(), explicit);
    }

    #[test]
    fn blank_explicit_pssh_falls_back_to_manifest() {
        let mut wv = Widevine::new();
        wv.init(Some(ProtectionData {
            pssh: Some(" \n".into()),
            server_certificate: Some("  ".into()),
            ..Default::default()
        }));

        let mut expected = PLACEHOLDER_PSSH.to_vec();
        expected[36..52].copy_from_slice(&KID);
        assert_eq!(wv.init_data(&record()), Some(expected));
        assert_eq!(wv.server_certificate(), None);
    }

    #[test]
    fn explicit_placeholder_is_filled_from_record() {
        let mut wv = Widevine::new();
        wv.init(Some(ProtectionData {
            pssh: Some(BASE64.encode(&PLACEHOLDER_PSSH)),
            ..Default::default()
        }));
        let record = ContentProtectionRecord::for_system(SystemId::Widevine).with_default_kid(KID);
        let init_data = wv.init_data(&record).unwrap();
        assert_eq!(&init_data[36..52], &KID);
    }

    #[test]
    fn no_pssh_anywhere() {
        let wv = Widevine::new();
        let record = ContentProtectionRecord::for_system(SystemId::Widevine).with_default_kid(KID);
        assert_eq!(wv.init_data(&record), None);
    }

    #[test]
    fn missing_default_kid_keeps_placeholder() {
        let wv = Widevine::new();
        let record = ContentProtectionRecord::for_system(SystemId::Widevine)
            .with_pssh(&PLACEHOLDER_PSSH);
        assert_eq!(wv.init_data(&record).unwrap(), PLACEHOLDER_PSSH);
    }

    #[test]
    fn pass_through_message_handling() {
        let wv = Widevine::new();
        let message = hex!("080112340a0b");
        assert_eq!(wv.license_request_from_message(&message).unwrap(), message);
        assert_eq!(wv.request_headers_from_message(&message), None);
        assert_eq!(
            wv.license_server_url_from_init_data(&PLACEHOLDER_PSSH),
            None
        );
        assert_eq!(wv.cdm_data(), None);
    }

    #[test]
    fn robustness_and_certificate_from_protection_data() {
        let mut wv = Widevine::new();
        assert_eq!(wv.server_certificate(), None);

        wv.init(Some(ProtectionData {
            video_robustness: Some("HW_SECURE_ALL".into()),
            server_certificate: Some("AQID".into()),
            session_type: Some(SessionType::PersistentLicense),
            ..Default::default()
        }));

        let configs = wv.key_system_configurations(
            Some("avc1.640028"),
            Some("mp4a.40.2"),
            wv.session_type(),
        );
        assert_eq!(configs[0].video_capabilities[0].robustness, "HW_SECURE_ALL");
        assert_eq!(configs[0].audio_capabilities[0].robustness, "");
        assert_eq!(configs[0].session_types, [SessionType::PersistentLicense]);
        assert_eq!(wv.server_certificate(), Some(vec![1, 2, 3]));
    }
}
