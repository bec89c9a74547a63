/*!
    PlayReady Header Object (PRO) handling.

    A PRO is a little-endian record table carried as the data of a PlayReady
    PSSH box or as `<mspr:pro>` in a manifest:

    ```text
    length        u32 LE   total size of the object
    record_count  u16 LE
    records[]     type u16 LE | length u16 LE | data
    ```

    Record type 1 is the WRM header, UTF-16LE XML whose `<LA_URL>` names the
    license server.
*/

use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;

use drm_core::{PsshBox, Reader, SystemId};

use crate::cenc;
use crate::encoding::decode_utf16le;
use crate::error::{KeySystemError, KeySystemResult};

const WRM_HEADER_RECORD: u16 = 0x0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProRecord<'a> {
    pub record_type: u16,
    pub data: &'a [u8],
}

pub(crate) fn parse_pro(pro: &[u8]) -> KeySystemResult<Vec<ProRecord<'_>>> {
    let mut r = Reader::new(pro);
    let length = r.read_u32_le("pro_length")? as usize;
    if length > pro.len() {
        return Err(KeySystemError::PlayReadyHeader(format!(
            "declared length {length} exceeds {} available bytes",
            pro.len()
        )));
    }
    let count = r.read_u16_le("record_count")?;

    let mut records = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let record_type = r.read_u16_le("record_type")?;
        let record_len = r.read_u16_le("record_length")?;
        let data = r.read_bytes(usize::from(record_len), "record_data")?;
        records.push(ProRecord { record_type, data });
    }
    Ok(records)
}

/**
    The decoded WRM header XML of a PRO.
*/
pub(crate) fn wrm_header(pro: &[u8]) -> KeySystemResult<String> {
    let record = parse_pro(pro)?
        .into_iter()
        .find(|r| r.record_type == WRM_HEADER_RECORD)
        .ok_or_else(|| KeySystemError::PlayReadyHeader("no WRM header record".into()))?;
    decode_utf16le(record.data)
}

/**
    Text of the first `<LA_URL>` element of a WRM header.
*/
pub(crate) fn la_url(wrm_header: &str) -> KeySystemResult<Option<String>> {
    let mut reader = XmlReader::from_str(wrm_header);
    let mut in_la_url = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => in_la_url = local_name(e.name().as_ref()) == b"LA_URL",
            Event::End(_) => in_la_url = false,
            Event::Text(e) if in_la_url => {
                let text = e.unescape()?;
                let url = text.trim();
                if !url.is_empty() {
                    return Ok(Some(url.to_owned()));
                }
            }
            Event::CData(e) if in_la_url => {
                let url = core::str::from_utf8(&e)?.trim();
                if !url.is_empty() {
                    return Ok(Some(url.to_owned()));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/**
    License acquisition URL embedded in PlayReady init data.

    `init_data` may hold several concatenated PSSH boxes; the first
    PlayReady box is used.
*/
pub(crate) fn license_server_url(init_data: &[u8]) -> KeySystemResult<Option<String>> {
    let Some(raw) = cenc::pssh_for_key_system(SystemId::PlayReady, init_data) else {
        return Ok(None);
    };
    let pssh = PsshBox::from_bytes(raw)?;
    la_url(&wrm_header(&pssh.data)?)
}

/**
    Wrap a PRO in a version 0 PlayReady PSSH box.
*/
pub(crate) fn pssh_from_pro(pro: &[u8]) -> Vec<u8> {
    PsshBox::new(SystemId::PlayReady, Vec::new(), pro.to_vec()).to_bytes()
}

/**
    Extract the local name from a possibly namespace-prefixed tag.
*/
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
