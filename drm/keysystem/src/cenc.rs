/*!
    Common Encryption helpers shared by every key system: locating the
    `cenc` descriptor and its PSSH, walking concatenated PSSH boxes, and the
    baseline capability configuration.
*/

use tracing::{debug, warn};

use drm_core::{PsshBox, SystemId, pssh_boxes};

use crate::capabilities::{KeySystemConfiguration, MediaCapability, Requirement};
use crate::content_protection::ContentProtectionRecord;
use crate::encoding::decode_base64;
use crate::error::KeySystemResult;
use crate::protection::SessionType;

/**
    Scheme URI of the generic MPEG Common Encryption `ContentProtection`
    descriptor.
*/
pub const MP4_PROTECTION_SCHEME: &str = "urn:mpeg:dash:mp4protection:2011";

/**
    The `mp4protection` record with `value="cenc"`, if the manifest has one.
*/
pub fn find_cenc_content_protection(
    records: &[ContentProtectionRecord],
) -> Option<&ContentProtectionRecord> {
    records.iter().find(|r| r.is_cenc())
}

/**
    The decoded `cenc:pssh` box of a record.

    Returns `None` when the record carries no PSSH or when it is not valid
    base64 (logged).
*/
pub fn parse_init_data_from_content_protection(
    record: &ContentProtectionRecord,
) -> Option<Vec<u8>> {
    let pssh = record.pssh.as_deref().filter(|s| !s.trim().is_empty())?;
    match decode_base64("cenc:pssh", pssh) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(scheme = %record.scheme_id_uri, error = %e, "ignoring unreadable cenc:pssh");
            None
        }
    }
}

/**
    Split a buffer of concatenated PSSH boxes (e.g. the init data of an
    `encrypted` event) into `(system, box bytes)` pairs, in input order.

    Boxes of other types and malformed PSSH boxes are skipped; a box whose
    size runs past the end of the buffer ends the walk.
*/
pub fn parse_pssh_list(data: &[u8]) -> Vec<(SystemId, &[u8])> {
    pssh_boxes(data)
        .map(|(raw, pssh)| (pssh.system_id(), raw))
        .collect()
}

/**
    The first PSSH box for `system` in a buffer of concatenated boxes.
*/
pub fn pssh_for_key_system(system: SystemId, data: &[u8]) -> Option<&[u8]> {
    pssh_boxes(data)
        .find(|(_, pssh)| pssh.system_id() == system)
        .map(|(raw, _)| raw)
}

/**
    The system-specific payload of a single PSSH box.
*/
pub fn pssh_data(pssh: &[u8]) -> KeySystemResult<Vec<u8>> {
    Ok(PsshBox::from_bytes(pssh)?.data)
}

/**
    The baseline candidate configurations for a codec pair.

    Capabilities are only listed for the codecs that were given. A codec
    containing `/` is taken as a full content type; anything else is
    wrapped as `video/mp4;codecs="…"` / `audio/mp4;codecs="…"`. Persistent
    sessions require persistent state.
*/
pub fn key_system_configurations(
    video_codec: Option<&str>,
    audio_codec: Option<&str>,
    session_type: SessionType,
) -> Vec<KeySystemConfiguration> {
    let persistent_state = match session_type {
        SessionType::Temporary => Requirement::Optional,
        SessionType::PersistentLicense => Requirement::Required,
    };

    let config = KeySystemConfiguration {
        init_data_types: vec!["cenc".to_owned()],
        audio_capabilities: capability("audio", audio_codec).into_iter().collect(),
        video_capabilities: capability("video", video_codec).into_iter().collect(),
        distinctive_identifier: Requirement::Optional,
        persistent_state,
        session_types: vec![session_type],
    };

    debug!(
        video = ?video_codec,
        audio = ?audio_codec,
        %session_type,
        "built baseline key system configuration"
    );
    vec![config]
}

fn capability(kind: &str, codec: Option<&str>) -> Option<MediaCapability> {
    let codec = codec.map(str::trim).filter(|c| !c.is_empty())?;
    let content_type = if codec.contains('/') {
        codec.to_owned()
    } else {
        format!(r#"{kind}/mp4;codecs="{codec}""#)
    };
    Some(MediaCapability::new(content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const WV: [u8; 16] = hex!("edef8ba979d64acea3c827dcd51d21ed");
    const PR: [u8; 16] = hex!("9a04f07998404286ab92e65be0885f95");

    fn pssh(system_id: [u8; 16], data: &[u8]) -> Vec<u8> {
        PsshBox {
            version: 0,
            flags: [0; 3],
            system_id,
            key_ids: Vec::new(),
            data: data.to_vec(),
        }
        .to_bytes()
    }

    #[test]
    fn finds_cenc_record() {
        let records = vec![
            ContentProtectionRecord::for_system(SystemId::Widevine),
            ContentProtectionRecord::cenc().with_default_kid([7; 16]),
        ];
        let cenc = find_cenc_content_protection(&records).unwrap();
        assert_eq!(cenc.default_kid, Some([7; 16]));
        assert!(find_cenc_content_protection(&records[..1]).is_none());
    }

    #[test]
    fn init_data_from_record() {
        let bytes = pssh(WV, &[1, 2, 3]);
        let record = ContentProtectionRecord::for_system(SystemId::Widevine).with_pssh(&bytes);
        assert_eq!(
            parse_init_data_from_content_protection(&record),
            Some(bytes)
        );

        let missing = ContentProtectionRecord::for_system(SystemId::Widevine);
        assert_eq!(parse_init_data_from_content_protection(&missing), None);

        let mut broken = missing.clone();
        broken.pssh = Some("not base64!".into());
        assert_eq!(parse_init_data_from_content_protection(&broken), None);
    }

    #[test]
    fn pssh_list_keeps_order_and_skips_foreign_boxes() {
        let wv = pssh(WV, &[0xAA]);
        let pr = pssh(PR, &[0xBB, 0xCC]);
        let free = hex!("0000000c 66726565 00000000");

        let mut buf = Vec::new();
        buf.extend_from_slice(&wv);
        buf.extend_from_slice(&free);
        buf.extend_from_slice(&pr);

        let list = parse_pssh_list(&buf);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], (SystemId::Widevine, wv.as_slice()));
        assert_eq!(list[1], (SystemId::PlayReady, pr.as_slice()));

        assert_eq!(
            pssh_for_key_system(SystemId::PlayReady, &buf),
            Some(pr.as_slice())
        );
        assert_eq!(pssh_for_key_system(SystemId::ClearKey, &buf), None);
        assert_eq!(pssh_data(&pr).unwrap(), vec![0xBB, 0xCC]);
    }

    #[test]
    fn pssh_list_stops_at_truncated_box() {
        let wv = pssh(WV, &[0xAA]);
        let mut buf = wv.clone();
        buf.extend_from_slice(&hex!("000000ff 70737368 00"));
        assert_eq!(
            parse_pssh_list(&buf),
            vec![(SystemId::Widevine, wv.as_slice())]
        );
        assert!(parse_pssh_list(&[]).is_empty());
        assert!(parse_pssh_list(&[0, 0]).is_empty());
    }

    #[test]
    fn pssh_data_rejects_garbage() {
        assert!(pssh_data(&[0, 0, 0, 8]).is_err());
    }

    #[test]
    fn baseline_configuration() {
        let configs = key_system_configurations(
            Some("avc1.4d401e"),
            Some("mp4a.40.2"),
            SessionType::Temporary,
        );
        assert_eq!(configs.len(), 1);
        let c = &configs[0];
        assert_eq!(c.init_data_types, ["cenc"]);
        assert_eq!(
            c.video_capabilities[0].content_type,
            r#"video/mp4;codecs="avc1.4d401e""#
        );
        assert_eq!(
            c.audio_capabilities[0].content_type,
            r#"audio/mp4;codecs="mp4a.40.2""#
        );
        assert_eq!(c.video_capabilities[0].robustness, "");
        assert_eq!(c.persistent_state, Requirement::Optional);
        assert_eq!(c.session_types, [SessionType::Temporary]);
    }

    #[test]
    fn baseline_configuration_variants() {
        let configs = key_system_configurations(
            Some(r#"video/webm;codecs="vp9""#),
            None,
            SessionType::PersistentLicense,
        );
        let c = &configs[0];
        assert_eq!(
            c.video_capabilities[0].content_type,
            r#"video/webm;codecs="vp9""#
        );
        assert!(c.audio_capabilities.is_empty());
        assert_eq!(c.persistent_state, Requirement::Required);
        assert_eq!(c.session_types, [SessionType::PersistentLicense]);

        let empty = key_system_configurations(Some(""), None, SessionType::Temporary);
        assert!(empty[0].video_capabilities.is_empty());
    }
}
