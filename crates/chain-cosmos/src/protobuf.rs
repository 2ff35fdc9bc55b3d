//! Protobuf wire format, written by hand for the handful of messages the
//! signer needs.
//!
//! Encoding follows proto3 canonical rules as emitted by the reference Cosmos
//! clients: fields in ascending field-number order, scalar fields omitted when
//! they hold their default value, embedded messages and repeated `bytes`
//! entries always written. Two encoders given the same document therefore
//! produce the same bytes, which is what makes the sign bytes reproducible.

use crate::error::CosmosError;

pub mod wire_type {
    pub const VARINT: u8 = 0;
    pub const FIXED64: u8 = 1;
    pub const LENGTH_DELIMITED: u8 = 2;
    pub const FIXED32: u8 = 5;
}

/// Longest legal varint for a 64-bit value.
const MAX_VARINT_LEN: usize = 10;

#[inline]
pub fn encode_varint(buf: &mut Vec<u8>, value: u64) {
    let mut v = value;
    while v >= 0x80 {
        buf.push((v as u8) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

#[inline]
pub fn encode_tag(buf: &mut Vec<u8>, field_number: u32, wire_type: u8) {
    encode_varint(buf, (u64::from(field_number) << 3) | u64::from(wire_type));
}

/// `uint32`/`enum` field; omitted when zero.
#[inline]
pub fn encode_uint32(buf: &mut Vec<u8>, field_number: u32, value: u32) {
    encode_uint64(buf, field_number, u64::from(value));
}

/// `uint64` field; omitted when zero.
#[inline]
pub fn encode_uint64(buf: &mut Vec<u8>, field_number: u32, value: u64) {
    if value == 0 {
        return;
    }
    encode_tag(buf, field_number, wire_type::VARINT);
    encode_varint(buf, value);
}

/// `string` field; omitted when empty.
#[inline]
pub fn encode_string(buf: &mut Vec<u8>, field_number: u32, value: &str) {
    encode_bytes(buf, field_number, value.as_bytes());
}

/// Singular `bytes` field; omitted when empty.
#[inline]
pub fn encode_bytes(buf: &mut Vec<u8>, field_number: u32, value: &[u8]) {
    if value.is_empty() {
        return;
    }
    encode_length_delimited(buf, field_number, value);
}

/// Embedded message or one entry of a repeated `bytes` field. Always
/// written, even when `value` is empty.
#[inline]
pub fn encode_length_delimited(buf: &mut Vec<u8>, field_number: u32, value: &[u8]) {
    encode_tag(buf, field_number, wire_type::LENGTH_DELIMITED);
    encode_varint(buf, value.len() as u64);
    buf.extend_from_slice(value);
}

/// `google.protobuf.Any`: a type URL plus the encoded message it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl Any {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.type_url.len() + self.value.len() + 4);
        encode_string(&mut buf, 1, &self.type_url);
        encode_bytes(&mut buf, 2, &self.value);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut any = Any::new("", Vec::new());
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => any.type_url = value.as_string("any.type_url")?,
                2 => any.value = value.as_bytes("any.value")?.to_vec(),
                _ => {}
            }
        }
        Ok(any)
    }
}

/// A decoded field payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl<'a> FieldValue<'a> {
    pub fn as_u64(&self, field: &str) -> Result<u64, CosmosError> {
        match self {
            FieldValue::Varint(v) => Ok(*v),
            other => Err(unexpected_wire(field, other)),
        }
    }

    pub fn as_u32(&self, field: &str) -> Result<u32, CosmosError> {
        let v = self.as_u64(field)?;
        u32::try_from(v)
            .map_err(|_| CosmosError::EncodingError(format!("{field} overflows uint32: {v}")))
    }

    pub fn as_bytes(&self, field: &str) -> Result<&'a [u8], CosmosError> {
        match self {
            FieldValue::Bytes(b) => Ok(b),
            other => Err(unexpected_wire(field, other)),
        }
    }

    pub fn as_string(&self, field: &str) -> Result<String, CosmosError> {
        let bytes = self.as_bytes(field)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CosmosError::InvalidFormat(format!("{field} is not utf-8: {e}")))
    }
}

fn unexpected_wire(field: &str, value: &FieldValue<'_>) -> CosmosError {
    CosmosError::InvalidFormat(format!("unexpected wire type for {field}: {value:?}"))
}

/// Sequential reader over the fields of one encoded message.
///
/// Unknown fields are returned like any other; callers skip what they do not
/// recognise.
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Next `(field_number, value)` pair, or `None` at end of input.
    pub fn next_field(&mut self) -> Result<Option<(u32, FieldValue<'a>)>, CosmosError> {
        if self.pos >= self.buf.len() {
            return Ok(None);
        }

        let key = self.read_varint()?;
        let field_number = u32::try_from(key >> 3)
            .map_err(|_| CosmosError::InvalidFormat(format!("field number too large: {key}")))?;
        if field_number == 0 {
            return Err(CosmosError::InvalidFormat("field number 0 is reserved".into()));
        }

        let value = match (key & 0x07) as u8 {
            wire_type::VARINT => FieldValue::Varint(self.read_varint()?),
            wire_type::FIXED64 => {
                let raw = self.take(8)?;
                let mut le = [0u8; 8];
                le.copy_from_slice(raw);
                FieldValue::Fixed64(u64::from_le_bytes(le))
            }
            wire_type::LENGTH_DELIMITED => {
                let len = self.read_varint()?;
                let len = usize::try_from(len).map_err(|_| {
                    CosmosError::InvalidFormat(format!("length prefix too large: {len}"))
                })?;
                FieldValue::Bytes(self.take(len)?)
            }
            wire_type::FIXED32 => {
                let raw = self.take(4)?;
                let mut le = [0u8; 4];
                le.copy_from_slice(raw);
                FieldValue::Fixed32(u32::from_le_bytes(le))
            }
            other => {
                return Err(CosmosError::InvalidFormat(format!(
                    "unsupported wire type {other} for field {field_number}"
                )))
            }
        };

        Ok(Some((field_number, value)))
    }

    fn read_varint(&mut self) -> Result<u64, CosmosError> {
        let mut result = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| CosmosError::InvalidFormat("truncated varint".into()))?;
            self.pos += 1;
            result |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(CosmosError::InvalidFormat("varint longer than 10 bytes".into()))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CosmosError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                CosmosError::InvalidFormat(format!(
                    "field needs {len} bytes, {} left",
                    self.buf.len() - self.pos
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}
