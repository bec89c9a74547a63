use thiserror::Error;

/**
    Error returned when a [`Reader`] runs past the end of its input.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: need {need} bytes at offset {offset}, only {available} available")]
pub struct ReadError {
    pub field: &'static str,
    pub offset: usize,
    pub need: usize,
    pub available: usize,
}

/**
    Bounds-checked cursor over a byte slice.

    ISO BMFF boxes are big-endian while PlayReady header records are
    little-endian, so both byte orders are provided. Every read names the
    field it is reading so truncation errors point at the offending field.
*/
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /**
        Current offset from the start of the input.
    */
    pub const fn position(&self) -> usize {
        self.pos
    }

    /**
        Number of unread bytes.
    */
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /**
        All unread bytes, without advancing.
    */
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn read_bytes(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ReadError> {
        if len > self.remaining() {
            return Err(ReadError {
                field,
                offset: self.pos,
                need: len,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_array<const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[u8; N], ReadError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, field)?);
        Ok(out)
    }

    pub fn skip(&mut self, len: usize, field: &'static str) -> Result<(), ReadError> {
        self.read_bytes(len, field).map(|_| ())
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, ReadError> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u16_be(&mut self, field: &'static str) -> Result<u16, ReadError> {
        self.read_array(field).map(u16::from_be_bytes)
    }

    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16, ReadError> {
        self.read_array(field).map(u16::from_le_bytes)
    }

    pub fn read_u32_be(&mut self, field: &'static str) -> Result<u32, ReadError> {
        self.read_array(field).map(u32::from_be_bytes)
    }

    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32, ReadError> {
        self.read_array(field).map(u32::from_le_bytes)
    }
}
