use core::mem;
use std::collections::BTreeMap;

use data_encoding::BASE64;
use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use crate::encoding::{decode_base64, decode_utf16le, encode_utf16le};
use crate::error::KeySystemResult;

use super::header::local_name;

pub(crate) const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
pub(crate) const SOAP_ACTION: &str = "SOAPAction";
pub(crate) const ACQUIRE_LICENSE_ACTION: &str =
    "\"http://schemas.microsoft.com/DRM/2007/03/protocols/AcquireLicense\"";

/**
    Text encoding of the key messages produced by the PlayReady CDM.
*/
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageFormat {
    #[default]
    #[serde(rename = "utf-16")]
    Utf16,
    #[serde(rename = "utf-8")]
    Utf8,
}

impl MessageFormat {
    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Utf16 => "utf-16",
            Self::Utf8 => "utf-8",
        }
    }

    fn decode(self, message: &[u8]) -> KeySystemResult<String> {
        match self {
            Self::Utf16 => decode_utf16le(message),
            Self::Utf8 => Ok(core::str::from_utf8(message)?.to_owned()),
        }
    }
}

/**
    Contents of a `<PlayReadyKeyMessage>` envelope.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KeyMessage {
    pub challenge: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl KeyMessage {
    /**
        Parse a CDM message. `Ok(None)` means the message is not wrapped in
        a `<PlayReadyKeyMessage>` and is the license challenge itself.
    */
    pub fn parse(message: &[u8], format: MessageFormat) -> KeySystemResult<Option<Self>> {
        let Ok(text) = format.decode(message) else {
            return Ok(None);
        };
        Self::parse_xml(&text)
    }

    fn parse_xml(xml: &str) -> KeySystemResult<Option<Self>> {
        let mut reader = XmlReader::from_str(xml);
        let mut msg = Self::default();
        let mut seen_root = false;
        let mut current: Option<Vec<u8>> = None;
        let mut name = String::new();
        let mut value = String::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(_) if !seen_root => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            match event {
                Event::Start(e) => {
                    let tag = local_name(e.name().as_ref()).to_vec();
                    if !seen_root {
                        if tag != b"PlayReadyKeyMessage" {
                            return Ok(None);
                        }
                        seen_root = true;
                    }
                    if tag == b"HttpHeader" {
                        name.clear();
                        value.clear();
                    }
                    current = Some(tag);
                }
                Event::Empty(e) if !seen_root => {
                    if local_name(e.name().as_ref()) != b"PlayReadyKeyMessage" {
                        return Ok(None);
                    }
                    seen_root = true;
                    break;
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    match current.as_deref() {
                        Some(b"Challenge") => {
                            let challenge = msg.challenge.get_or_insert_with(String::new);
                            challenge.push_str(text.trim());
                        }
                        Some(b"name") => name.push_str(text.trim()),
                        Some(b"value") => value.push_str(text.trim()),
                        _ => {}
                    }
                }
                Event::End(e) => {
                    if local_name(e.name().as_ref()) == b"HttpHeader" && !name.is_empty() {
                        let value = mem::take(&mut value);
                        msg.headers.insert(mem::take(&mut name), value);
                    }
                    current = None;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Ok(None);
        }

        // Some CDMs send "Content" where "Content-Type" is meant
        if let Some(content) = msg.headers.remove("Content") {
            let content_type = CONTENT_TYPE.to_owned();
            msg.headers.entry(content_type).or_insert(content);
        }
        msg.headers
            .entry(CONTENT_TYPE.to_owned())
            .or_insert_with(|| DEFAULT_CONTENT_TYPE.to_owned());
        Ok(Some(msg))
    }

    /**
        The decoded license challenge.
    */
    pub fn challenge_bytes(&self) -> Option<KeySystemResult<Vec<u8>>> {
        self.challenge
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| decode_base64("Challenge", c))
    }
}

/**
    Headers for a license challenge sent without an envelope.
*/
pub(crate) fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (CONTENT_TYPE.to_owned(), DEFAULT_CONTENT_TYPE.to_owned()),
        (SOAP_ACTION.to_owned(), ACQUIRE_LICENSE_ACTION.to_owned()),
    ])
}

/**
    The UTF-16LE `<PlayReadyCDMData>` envelope carrying application custom
    data for license acquisition.
*/
pub(crate) fn cdm_data_envelope(custom_data: &str) -> Vec<u8> {
    let encoded = BASE64.encode(&encode_utf16le(custom_data));
    let xml = format!(
        concat!(
            r#"<PlayReadyCDMData type="LicenseAcquisition">"#,
            r#"<LicenseAcquisition version="1.0" Proactive="false">"#,
            r#"<CustomData encoding="base64encoded">{}</CustomData>"#,
            "</LicenseAcquisition></PlayReadyCDMData>",
        ),
        encoded
    );
    encode_utf16le(&xml)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::KeySystemError;

    pub(crate) const CHALLENGE: &str = "<soap:Envelope>challenge</soap:Envelope>";

    pub(crate) fn wrapped(challenge: Option<&str>, headers: &[(&str, &str)]) -> String {
        let mut xml = String::from(
            r#"<PlayReadyKeyMessage type="LicenseAcquisition"><LicenseAcquisition Version="1">"#,
        );
        if let Some(challenge) = challenge {
            xml.push_str(r#"<Challenge encoding="base64encoded">"#);
            xml.push_str(&BASE64.encode(challenge.as_bytes()));
            xml.push_str("</Challenge>");
        }
        xml.push_str("<HttpHeaders>");
        for (name, value) in headers {
            xml.push_str(&format!(
                "<HttpHeader><name>{name}</name><value>{value}</value></HttpHeader>"
            ));
        }
        xml.push_str("</HttpHeaders></LicenseAcquisition></PlayReadyKeyMessage>");
        xml
    }

    #[test]
    fn parses_wrapped_utf16_message() {
        let xml = wrapped(
            Some(CHALLENGE),
            &[("Content-Type", "text/xml; charset=utf-8"), ("SOAPAction", "urn:acquire")],
        );
        let msg = KeyMessage::parse(&encode_utf16le(&xml), MessageFormat::Utf16)
            .unwrap()
            .unwrap();
        assert_eq!(
            msg.challenge_bytes().unwrap().unwrap(),
            CHALLENGE.as_bytes()
        );
        assert_eq!(msg.headers["SOAPAction"], "urn:acquire");
        assert_eq!(msg.headers[CONTENT_TYPE], "text/xml; charset=utf-8");
    }

    #[test]
    fn content_header_is_renamed_and_defaulted() {
        let xml = wrapped(Some(CHALLENGE), &[("Content", "text/xml")]);
        let msg = KeyMessage::parse(xml.as_bytes(), MessageFormat::Utf8)
            .unwrap()
            .unwrap();
        assert_eq!(msg.headers.get("Content"), None);
        assert_eq!(msg.headers[CONTENT_TYPE], "text/xml");

        let bare = wrapped(Some(CHALLENGE), &[]);
        let msg = KeyMessage::parse(bare.as_bytes(), MessageFormat::Utf8)
            .unwrap()
            .unwrap();
        assert_eq!(msg.headers[CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
        assert_eq!(msg.headers.len(), 1);
    }

    #[test]
    fn unwrapped_messages_are_recognized() {
        assert_eq!(
            KeyMessage::parse(CHALLENGE.as_bytes(), MessageFormat::Utf8).unwrap(),
            None
        );
        // a UTF-8 challenge read as UTF-16 is not an envelope either
        assert_eq!(
            KeyMessage::parse(b"<a>xyz</a>", MessageFormat::Utf16).unwrap(),
            None
        );
        assert_eq!(
            KeyMessage::parse(&[0xff], MessageFormat::Utf16).unwrap(),
            None
        );
        assert_eq!(KeyMessage::parse(b"", MessageFormat::Utf8).unwrap(), None);
    }

    #[test]
    fn challenge_must_be_base64() {
        let xml = "<PlayReadyKeyMessage><LicenseAcquisition><Challenge>@@@</Challenge>\
                   </LicenseAcquisition></PlayReadyKeyMessage>";
        let msg = KeyMessage::parse(xml.as_bytes(), MessageFormat::Utf8)
            .unwrap()
            .unwrap();
        let Some(Err(KeySystemError::InvalidBase64 { field, .. })) = msg.challenge_bytes() else {
            panic!("expected a base64 error");
        };
        assert_eq!(field, "Challenge");

        let empty = wrapped(None, &[]);
        let msg = KeyMessage::parse(empty.as_bytes(), MessageFormat::Utf8)
            .unwrap()
            .unwrap();
        assert!(msg.challenge_bytes().is_none());
    }

    #[test]
    fn cdm_data_envelope_layout() {
        let bytes = cdm_data_envelope("token=abc");
        let xml = decode_utf16le(&bytes).unwrap();
        let custom = BASE64.encode(&encode_utf16le("token=abc"));
        assert_eq!(
            xml,
            format!(
                "<PlayReadyCDMData type=\"LicenseAcquisition\">\
                 <LicenseAcquisition version=\"1.0\" Proactive=\"false\">\
                 <CustomData encoding=\"base64encoded\">{custom}</CustomData>\
                 </LicenseAcquisition></PlayReadyCDMData>"
            )
        );
    }

    #[test]
    fn format_names() {
        assert_eq!(MessageFormat::default().to_name(), "utf-16");
        assert_eq!(
            serde_json::to_string(&MessageFormat::Utf8).unwrap(),
            "\"utf-8\""
        );
    }
}
