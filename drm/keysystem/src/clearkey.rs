/*!
    W3C Clear Key (`org.w3.clearkey`).

    License requests are JSON (`{"kids":[..],"type":..}`) and licenses are
    JWK sets. When the application configures `clearkeys`, requests can be
    answered locally with [`ClearKey::clear_keys_for_message`].
*/

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use drm_core::{ContentKey, SystemId, parse_kid};

use crate::cenc;
use crate::content_protection::ContentProtectionRecord;
use crate::error::KeySystemResult;
use crate::protection::SessionType;
use crate::system::{KeySystem, ProtectionState};

#[derive(Debug, Deserialize)]
struct ClearKeyRequest {
    kids: Vec<String>,
    #[serde(rename = "type", default)]
    session_type: SessionType,
}

impl ClearKeyRequest {
    fn parse(message: &[u8]) -> KeySystemResult<Self> {
        Ok(serde_json::from_slice(message)?)
    }
}

#[derive(Serialize)]
struct JwkSet<'a> {
    keys: Vec<Jwk>,
    #[serde(rename = "type")]
    session_type: &'a str,
}

#[derive(Serialize)]
struct Jwk {
    kty: &'static str,
    kid: String,
    k: String,
}

/**
    Keys answering one ClearKey license request.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearKeySet {
    pub keys: Vec<ContentKey>,
    pub session_type: SessionType,
}

impl ClearKeySet {
    /**
        The license as a JWK set:
        `{"keys":[{"kty":"oct","kid":..,"k":..}],"type":..}`.
    */
    pub fn to_jwk_json(&self) -> KeySystemResult<Vec<u8>> {
        let set = JwkSet {
            keys: self
                .keys
                .iter()
                .map(|key| Jwk {
                    kty: "oct",
                    kid: key.kid_base64url(),
                    k: key.key_base64url(),
                })
                .collect(),
            session_type: self.session_type.to_name(),
        };
        Ok(serde_json::to_vec(&set)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClearKey {
    state: ProtectionState,
}

impl ClearKey {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Answer a license request from the configured `clearkeys`.

        Only requested keys are returned; `None` when nothing is configured,
        the request is malformed, or no requested key is known.
    */
    pub fn clear_keys_for_message(&self, message: &[u8]) -> Option<ClearKeySet> {
        let data = self.protection_data()?;
        if data.clearkeys.is_empty() {
            return None;
        }
        let known = data
            .clear_keys()
            .inspect_err(|e| warn!(error = %e, "ignoring malformed clearkeys"))
            .ok()?;
        let request = ClearKeyRequest::parse(message)
            .inspect_err(|e| warn!(error = %e, "malformed ClearKey license request"))
            .ok()?;

        let requested: Vec<_> = request
            .kids
            .iter()
            .filter_map(|kid| parse_kid(kid))
            .collect();
        let keys: Vec<ContentKey> = known
            .into_iter()
            .filter(|key| requested.contains(&key.kid()))
            .collect();

        debug!(
            requested = requested.len(),
            matched = keys.len(),
            "answered ClearKey request locally"
        );
        if keys.is_empty() {
            return None;
        }
        Some(ClearKeySet {
            keys,
            session_type: request.session_type,
        })
    }
}

impl KeySystem for ClearKey {
    fn system_id(&self) -> SystemId {
        SystemId::ClearKey
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
            .or_else(|| cenc::parse_init_data_from_content_protection(record))
    }

    fn license_request_from_message(&self, message: &[u8]) -> Option<Vec<u8>> {
        match ClearKeyRequest::parse(message) {
            Ok(_) => Some(message.to_vec()),
            Err(e) => {
                warn!(error = %e, "malformed ClearKey license request");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::protection::ProtectionData;

    const KID_1: &str = "AAAAAAAAAAAAAAAAAAAAAQ";
    const KID_2: &str = "AAAAAAAAAAAAAAAAAAAAAg";
    const KID_3: &str = "AAAAAAAAAAAAAAAAAAAAAw";

    fn configured() -> ClearKey {
        let mut ck = ClearKey::new();
        ck.init(Some(ProtectionData {
            clearkeys: BTreeMap::from([
                (KID_1.to_owned(), "q83vAQIDBAUGBwgJCgsMDQ".to_owned()),
                (KID_2.to_owned(), "ESIzRFVmd4iZqrvM3e7_AA".to_owned()),
            ]),
            ..Default::default()
        }));
        ck
    }

    #[test]
    fn identity() {
        let ck = ClearKey::new();
        assert_eq!(ck.system_string(), "org.w3.clearkey");
        assert_eq!(ck.uuid(), "1077efec-c0b2-4d02-ace3-3c1e52e2fb4b");
    }

    #[test]
    fn request_must_be_clearkey_json() {
        let ck = ClearKey::new();
        let request = format!(r#"{{"kids":["{KID_1}"],"type":"temporary"}}"#);
        assert_eq!(
            ck.license_request_from_message(request.as_bytes()).unwrap(),
            request.as_bytes()
        );
        assert_eq!(ck.license_request_from_message(b"\x08\x01"), None);
        assert_eq!(
            ck.license_request_from_message(br#"{"type":"temporary"}"#),
            None
        );
    }

    #[test]
    fn answers_only_requested_known_keys() {
        let ck = configured();
        let request = format!(r#"{{"kids":["{KID_2}","{KID_3}"],"type":"persistent-license"}}"#);
        let set = ck.clear_keys_for_message(request.as_bytes()).unwrap();
        assert_eq!(set.keys.len(), 1);
        assert_eq!(set.keys[0].kid_base64url(), KID_2);
        assert_eq!(set.session_type, SessionType::PersistentLicense);

        let json: serde_json::Value = serde_json::from_slice(&set.to_jwk_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "keys": [{ "kty": "oct", "kid": KID_2, "k": "ESIzRFVmd4iZqrvM3e7_AA" }],
                "type": "persistent-license"
            })
        );
    }

    #[test]
    fn no_answer_without_match_or_config() {
        let request = format!(r#"{{"kids":["{KID_3}"]}}"#);
        assert_eq!(
            configured().clear_keys_for_message(request.as_bytes()),
            None
        );
        assert_eq!(
            ClearKey::new().clear_keys_for_message(request.as_bytes()),
            None
        );
        assert_eq!(configured().clear_keys_for_message(b"not json"), None);
    }

    #[test]
    fn init_data_from_record() {
        let ck = ClearKey::new();
        let record =
            ContentProtectionRecord::for_system(SystemId::ClearKey).with_pssh(&[1, 2, 3, 4]);
        assert_eq!(ck.init_data(&record), Some(vec![1, 2, 3, 4]));
        assert_eq!(
            ck.init_data(&ContentProtectionRecord::for_system(SystemId::ClearKey)),
            None
        );
    }
}
