use data_encoding::BASE64;

use crate::constants::KID_LEN;
use crate::error::PsshError;
use crate::reader::Reader;
use crate::types::{Kid, SystemId};

const BOX_TYPE: &[u8; 4] = b"pssh";

// 4 (size) + 4 (type) + 1 (ver) + 3 (flags) + 16 (sysid) + 4 (data_size)
const MIN_BOX_LEN: usize = 32;

/**
    Parsed PSSH box. All ISOBMFF fields are kept so `to_bytes` reproduces the input.

    ISOBMFF PSSH box layout:
      [0..4]    box_size: u32 big-endian (total box size including this header)
      [4..8]    box_type: "pssh" (0x70737368)
      [8]       version: u8 (0 or 1)
      [9..12]   flags: u24 (typically 0x000000)
      [12..28]  system_id: 16 bytes
      if version == 1:
        [28..32]  key_id_count: u32 big-endian
        [32..]    key_ids: key_id_count * 16 bytes
      [..]      data_size: u32 big-endian
      [..]      data: data_size bytes
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsshBox {
    /**
        PSSH box version (0 or 1).
    */
    pub version: u8,
    /**
        3-byte flags field (typically all zeros).
    */
    pub flags: [u8; 3],
    /**
        16-byte DRM system identifier.
    */
    pub system_id: [u8; 16],
    /**
        Key IDs from the box header (v1 only). Empty for v0 boxes.
    */
    pub key_ids: Vec<Kid>,
    /**
        Raw data payload. For Widevine this is a serialized WidevinePsshData
        protobuf; for PlayReady it is a PlayReady Header Object; etc.
    */
    pub data: Vec<u8>,
}

impl PsshBox {
    /**
        Build a box for `system` around a data payload.

        The box is version 1 when header key IDs are given, version 0 otherwise.
    */
    pub fn new(system: SystemId, key_ids: Vec<Kid>, data: Vec<u8>) -> Self {
        Self {
            version: u8::from(!key_ids.is_empty()),
            flags: [0; 3],
            system_id: system.to_bytes(),
            key_ids,
            data,
        }
    }

    /**
        Parse a base64-encoded PSSH box.
    */
    pub fn from_base64(pssh: &str) -> Result<Self, PsshError> {
        let bytes = BASE64
            .decode(pssh.trim().as_bytes())
            .map_err(|e| PsshError::InvalidBase64(format!("PSSH: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /**
        Parse a PSSH box from raw bytes (full ISOBMFF box starting with box_size).

        Bytes past `box_size` are ignored, so this can be pointed at the start
        of a buffer holding several concatenated boxes.
    */
    pub fn from_bytes(input: &[u8]) -> Result<Self, PsshError> {
        let box_size = Reader::new(input).read_u32_be("box_size")? as usize;
        if box_size < MIN_BOX_LEN {
            return Err(malformed(format!(
                "box_size {box_size} is smaller than a PSSH header"
            )));
        }
        if box_size > input.len() {
            return Err(malformed(format!(
                "box_size {box_size} exceeds input length {}",
                input.len()
            )));
        }

        let mut r = Reader::new(&input[..box_size]);
        r.skip(4, "box_size")?;
        if &r.read_array::<4>("box_type")? != BOX_TYPE {
            return Err(malformed("box_type is not 'pssh'".into()));
        }

        let version = r.read_u8("version")?;
        if version > 1 {
            return Err(malformed(format!("unsupported version {version}")));
        }
        let flags = r.read_array("flags")?;
        let system_id = r.read_array("system_id")?;

        let mut key_ids = Vec::new();
        if version == 1 {
            let kid_count = r.read_u32_be("key_id_count")? as usize;
            if kid_count.saturating_mul(KID_LEN) > r.remaining() {
                return Err(malformed(format!(
                    "key_id_count {kid_count} exceeds box size"
                )));
            }
            key_ids.reserve(kid_count);
            for _ in 0..kid_count {
                key_ids.push(r.read_array("key_id")?);
            }
        }

        let data_size = r.read_u32_be("data_size")? as usize;
        let data = r.read_bytes(data_size, "data")?.to_vec();

        if !r.is_empty() {
            return Err(malformed(format!(
                "trailing bytes: consumed {}, box_size {box_size}",
                r.position()
            )));
        }

        Ok(Self {
            version,
            flags,
            system_id,
            key_ids,
            data,
        })
    }

    /**
        Serialize back to ISOBMFF PSSH box bytes.

        Produces identical bytes to the original input when round-tripping
        through `from_bytes` / `to_bytes`.
    */
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut size = 28usize;
        if self.version == 1 {
            size += 4 + self.key_ids.len() * KID_LEN;
        }
        size += 4 + self.data.len();

        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(&(size as u32).to_be_bytes());
        buf.extend_from_slice(BOX_TYPE);
        buf.push(self.version);
        buf.extend_from_slice(&self.flags);
        buf.extend_from_slice(&self.system_id);

        if self.version == 1 {
            buf.extend_from_slice(&(self.key_ids.len() as u32).to_be_bytes());
            for kid in &self.key_ids {
                buf.extend_from_slice(kid);
            }
        }

        buf.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }

    /**
        Serialize to a base64-encoded PSSH box string.
    */
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.to_bytes())
    }

    /**
        Key IDs from the box header (v1 only).

        For v0 boxes this is always empty; DRM-specific code must look into
        the data payload to find key IDs.
    */
    pub fn key_ids(&self) -> &[Kid] {
        &self.key_ids
    }

    /**
        Raw init data payload (the `data` field inside the PSSH box).
    */
    pub fn init_data(&self) -> &[u8] {
        &self.data
    }

    /**
        Identify the DRM system from the PSSH box's system ID.
    */
    pub fn system_id(&self) -> SystemId {
        SystemId::from_bytes(self.system_id)
    }

    /**
        Check that this PSSH box belongs to the given DRM system.
        Returns `Err(PsshError::SystemIdMismatch)` if it does not.
    */
    pub fn ensure_system_id(&self, expected: SystemId) -> Result<(), PsshError> {
        let actual = self.system_id();
        if actual == expected {
            Ok(())
        } else {
            Err(PsshError::SystemIdMismatch(actual, expected))
        }
    }
}

/**
    Iterate over concatenated PSSH boxes, such as the init data delivered
    with an `encrypted` event.

    See [`pssh_boxes`].
*/
#[derive(Debug, Clone)]
pub struct PsshBoxes<'a> {
    rest: &'a [u8],
}

/**
    Walk `input` box by box, yielding the raw bytes and the parsed form of
    every well-formed PSSH box.

    Boxes of other types are skipped. Iteration ends at the first box whose
    size field is unusable (zero, shorter than a box header, or running past
    the end of the input).
*/
pub fn pssh_boxes(input: &[u8]) -> PsshBoxes<'_> {
    PsshBoxes { rest: input }
}

impl<'a> Iterator for PsshBoxes<'a> {
    type Item = (&'a [u8], PsshBox);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut r = Reader::new(self.rest);
            let size = r.read_u32_be("box_size").ok()? as usize;
            let box_type = r.read_array::<4>("box_type").ok()?;
            if size < 8 || size > self.rest.len() {
                self.rest = &[];
                return None;
            }

            let (raw, tail) = self.rest.split_at(size);
            self.rest = tail;

            if &box_type != BOX_TYPE {
                continue;
            }
            if let Ok(pssh) = PsshBox::from_bytes(raw) {
                return Some((raw, pssh));
            }
        }
    }
}

fn malformed(msg: String) -> PsshError {
    PsshError::Malformed(msg)
}
