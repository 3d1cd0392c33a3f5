//! Primitive CBOR encoding/decoding for region payloads.
//!
//! Covers the subset of RFC 8949 a region can contain: integers, floats of
//! every width, byte and text strings (including chunked indefinite ones),
//! arrays, maps, tags and the `false`/`true`/`null` simple values.

use crate::codec::float::{FloatWidth, f16_bits_to_f32, shortest_float};
use crate::error::CborError;
use crate::limits::MAX_NESTING_DEPTH;
use crate::model::Value;

pub const MAJOR_UNSIGNED: u8 = 0;
pub const MAJOR_NEGATIVE: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_TEXT: u8 = 3;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_MAP: u8 = 5;
pub const MAJOR_TAG: u8 = 6;
pub const MAJOR_SIMPLE: u8 = 7;

const INFO_INDEFINITE: u8 = 31;
const BREAK: u8 = 0xFF;

/// A decoded initial byte plus its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub major: u8,
    pub info: u8,
    /// `None` for the indefinite-length marker.
    pub arg: Option<u64>,
}

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding CBOR data items.
///
/// Wraps a byte slice and tracks how many bytes the decoded items consumed,
/// which the tag decoder uses to locate the region that follows.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, CborError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(CborError::UnexpectedEof { context })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], CborError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(CborError::UnexpectedEof { context })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], CborError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Returns true if the next byte is a break marker.
    pub fn at_break(&self) -> bool {
        self.data.get(self.pos) == Some(&BREAK)
    }

    /// Reads an initial byte and its argument.
    pub fn read_head(&mut self) -> Result<Head, CborError> {
        let initial = self.read_byte("initial byte")?;
        let major = initial >> 5;
        let info = initial & 0x1F;
        let arg = match info {
            0..=23 => Some(info as u64),
            24 => Some(self.read_byte("argument")? as u64),
            25 => Some(u16::from_be_bytes(self.read_array("argument")?) as u64),
            26 => Some(u32::from_be_bytes(self.read_array("argument")?) as u64),
            27 => Some(u64::from_be_bytes(self.read_array("argument")?)),
            INFO_INDEFINITE => None,
            _ => return Err(CborError::ReservedAdditionalInfo { major, info }),
        };
        Ok(Head { major, info, arg })
    }

    /// Reads a definite length and checks it against the remaining input.
    fn checked_len(&self, len: u64, min_item_size: usize) -> Result<usize, CborError> {
        let remaining = self.remaining_len();
        match usize::try_from(len) {
            Ok(n) if n.saturating_mul(min_item_size) <= remaining => Ok(n),
            _ => Err(CborError::LengthExceedsInput { len, remaining }),
        }
    }

    /// Reads one complete data item.
    pub fn read_value(&mut self) -> Result<Value, CborError> {
        self.read_value_at(0)
    }

    fn read_value_at(&mut self, depth: usize) -> Result<Value, CborError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CborError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }

        let head = self.read_head()?;
        match (head.major, head.arg) {
            (MAJOR_UNSIGNED, Some(n)) => Ok(Value::Unsigned(n)),
            (MAJOR_NEGATIVE, Some(n)) => {
                let n = i64::try_from(n).map_err(|_| CborError::IntegerOutOfRange)?;
                Ok(Value::Signed(-1 - n))
            }
            (MAJOR_BYTES, _) => Ok(Value::Bytes(self.read_string_body(MAJOR_BYTES, head.arg)?)),
            (MAJOR_TEXT, _) => {
                let bytes = self.read_string_body(MAJOR_TEXT, head.arg)?;
                String::from_utf8(bytes)
                    .map(Value::Text)
                    .map_err(|_| CborError::InvalidUtf8)
            }
            (MAJOR_ARRAY, Some(len)) => {
                let len = self.checked_len(len, 1)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_value_at(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            (MAJOR_ARRAY, None) => {
                let mut items = Vec::new();
                while !self.consume_break()? {
                    items.push(self.read_value_at(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            (MAJOR_MAP, Some(len)) => {
                let len = self.checked_len(len, 2)?;
                let mut entries = Vec::with_capacity(len);
                for _ in 0..len {
                    let key = self.read_value_at(depth + 1)?;
                    let value = self.read_value_at(depth + 1)?;
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
            (MAJOR_MAP, None) => {
                let mut entries = Vec::new();
                while !self.consume_break()? {
                    let key = self.read_value_at(depth + 1)?;
                    let value = self.read_value_at(depth + 1)?;
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
            (MAJOR_TAG, Some(tag)) => {
                let inner = self.read_value_at(depth + 1)?;
                Ok(Value::Tagged(tag, Box::new(inner)))
            }
            (MAJOR_SIMPLE, _) => Self::read_simple(head),
            (major, None) => Err(CborError::UnexpectedIndefinite { major }),
            (_, Some(_)) => Err(CborError::ReservedAdditionalInfo {
                major: head.major,
                info: head.info,
            }),
        }
    }

    fn read_simple(head: Head) -> Result<Value, CborError> {
        match head.info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            // The head already consumed the float bits as its argument.
            25 => Ok(Value::Float(
                f16_bits_to_f32(head.arg.unwrap_or_default() as u16) as f64,
            )),
            26 => Ok(Value::Float(
                f32::from_bits(head.arg.unwrap_or_default() as u32) as f64,
            )),
            27 => Ok(Value::Float(f64::from_bits(head.arg.unwrap_or_default()))),
            INFO_INDEFINITE => Err(CborError::UnexpectedBreak),
            24 => Err(CborError::UnsupportedSimple {
                value: head.arg.unwrap_or_default() as u8,
            }),
            info => Err(CborError::UnsupportedSimple { value: info }),
        }
    }

    /// Consumes a break marker if one is next.
    fn consume_break(&mut self) -> Result<bool, CborError> {
        if self.is_empty() {
            return Err(CborError::UnexpectedEof {
                context: "indefinite container",
            });
        }
        if self.at_break() {
            self.pos += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Reads the content of a byte or text string, joining chunks.
    fn read_string_body(&mut self, major: u8, len: Option<u64>) -> Result<Vec<u8>, CborError> {
        if let Some(len) = len {
            let len = self.checked_len(len, 1)?;
            return Ok(self.read_bytes(len, "string")?.to_vec());
        }

        let mut out = Vec::new();
        while !self.consume_break()? {
            let chunk = self.read_head()?;
            if chunk.major != major {
                return Err(CborError::InvalidChunk {
                    expected: major,
                    found: chunk.major,
                });
            }
            let Some(len) = chunk.arg else {
                return Err(CborError::UnexpectedIndefinite { major });
            };
            let len = self.checked_len(len, 1)?;
            out.extend_from_slice(self.read_bytes(len, "string chunk")?);
        }
        Ok(out)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding CBOR data items.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes an initial byte with the shortest argument encoding.
    pub fn write_head(&mut self, major: u8, value: u64) {
        let major = major << 5;
        if value < 24 {
            self.buf.push(major | value as u8);
        } else if let Ok(v) = u8::try_from(value) {
            self.buf.extend_from_slice(&[major | 24, v]);
        } else if let Ok(v) = u16::try_from(value) {
            self.buf.push(major | 25);
            self.buf.extend_from_slice(&v.to_be_bytes());
        } else if let Ok(v) = u32::try_from(value) {
            self.buf.push(major | 26);
            self.buf.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buf.push(major | 27);
            self.buf.extend_from_slice(&value.to_be_bytes());
        }
    }

    pub fn write_unsigned(&mut self, value: u64) {
        self.write_head(MAJOR_UNSIGNED, value);
    }

    pub fn write_signed(&mut self, value: i64) {
        if value >= 0 {
            self.write_head(MAJOR_UNSIGNED, value as u64);
        } else {
            // -1 - value without overflow for i64::MIN
            self.write_head(MAJOR_NEGATIVE, !(value as u64));
        }
    }

    /// Writes a float in the narrowest width that holds it exactly.
    pub fn write_float(&mut self, value: f64) {
        match shortest_float(value) {
            FloatWidth::Half(bits) => {
                self.buf.push(0xF9);
                self.buf.extend_from_slice(&bits.to_be_bytes());
            }
            FloatWidth::Single(v) => {
                self.buf.push(0xFA);
                self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
            }
            FloatWidth::Double(v) => {
                self.buf.push(0xFB);
                self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
            }
        }
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(if value { 0xF5 } else { 0xF4 });
    }

    pub fn write_null(&mut self) {
        self.buf.push(0xF6);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_head(MAJOR_BYTES, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_text(&mut self, text: &str) {
        self.write_head(MAJOR_TEXT, text.len() as u64);
        self.buf.extend_from_slice(text.as_bytes());
    }

    /// Starts an array; `None` opens an indefinite one that needs a break.
    pub fn begin_array(&mut self, len: Option<usize>) {
        self.begin_container(MAJOR_ARRAY, len);
    }

    /// Starts a map; `None` opens an indefinite one that needs a break.
    pub fn begin_map(&mut self, len: Option<usize>) {
        self.begin_container(MAJOR_MAP, len);
    }

    fn begin_container(&mut self, major: u8, len: Option<usize>) {
        match len {
            Some(len) => self.write_head(major, len as u64),
            None => self.buf.push((major << 5) | INFO_INDEFINITE),
        }
    }

    pub fn write_break(&mut self) {
        self.buf.push(BREAK);
    }

    /// Writes a value; nested arrays and maps are definite only if asked.
    pub fn write_value(&mut self, value: &Value, definite: bool) {
        match value {
            Value::Unsigned(n) => self.write_unsigned(*n),
            Value::Signed(n) => self.write_signed(*n),
            Value::Float(f) => self.write_float(*f),
            Value::Bool(b) => self.write_bool(*b),
            Value::Null => self.write_null(),
            Value::Text(s) => self.write_text(s),
            Value::Bytes(b) => self.write_bytes(b),
            Value::Array(items) => {
                self.begin_array(definite.then_some(items.len()));
                for item in items {
                    self.write_value(item, definite);
                }
                if !definite {
                    self.write_break();
                }
            }
            Value::Map(entries) => {
                self.begin_map(definite.then_some(entries.len()));
                for (key, value) in entries {
                    self.write_value(key, definite);
                    self.write_value(value, definite);
                }
                if !definite {
                    self.write_break();
                }
            }
            Value::Tagged(tag, inner) => {
                self.write_head(MAJOR_TAG, *tag);
                self.write_value(inner, definite);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value, definite: bool) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_value(value, definite);
        writer.into_bytes()
    }

    #[test]
    fn test_head_widths() {
        let cases: [(u64, &[u8]); 6] = [
            (0, &[0x00]),
            (23, &[0x17]),
            (24, &[0x18, 0x18]),
            (256, &[0x19, 0x01, 0x00]),
            (65536, &[0x1A, 0x00, 0x01, 0x00, 0x00]),
            (
                1 << 32,
                &[0x1B, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00],
            ),
        ];
        for (value, expected) in cases {
            let mut writer = Writer::new();
            writer.write_unsigned(value);
            assert_eq!(writer.as_bytes(), expected, "failed for {}", value);
        }
    }

    #[test]
    fn test_negative_integers() {
        assert_eq!(encode(&Value::Signed(-1), true), [0x20]);
        assert_eq!(encode(&Value::Signed(-500), true), [0x39, 0x01, 0xF3]);

        let mut reader = Reader::new(&[0x3B, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(reader.read_value().unwrap(), Value::Signed(i64::MIN));

        let mut reader = Reader::new(&[0x3B, 0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(reader.read_value(), Err(CborError::IntegerOutOfRange));
    }

    #[test]
    fn test_float_widths() {
        assert_eq!(encode(&Value::Float(1.5), true), [0xF9, 0x3E, 0x00]);
        assert_eq!(encode(&Value::Float(100000.5), true)[0], 0xFA);
        assert_eq!(encode(&Value::Float(0.1), true)[0], 0xFB);

        for v in [1.5, 100000.5, 0.1, -0.0, f64::INFINITY] {
            let bytes = encode(&Value::Float(v), true);
            let decoded = Reader::new(&bytes).read_value().unwrap();
            assert_eq!(decoded, Value::Float(v), "failed for {}", v);
        }
    }

    #[test]
    fn test_container_forms() {
        let value = Value::Array(vec![Value::Unsigned(23)]);
        assert_eq!(encode(&value, true), [0x81, 0x17]);
        assert_eq!(encode(&value, false), [0x9F, 0x17, 0xFF]);

        let map = Value::Map(vec![(Value::Unsigned(1), Value::Text("a".into()))]);
        assert_eq!(encode(&map, true), [0xA1, 0x01, 0x61, 0x61]);
        assert_eq!(encode(&map, false), [0xBF, 0x01, 0x61, 0x61, 0xFF]);
    }

    #[test]
    fn test_read_consumes_exactly_one_item() {
        let data = [0xA1, 0x02, 0x18, 0xE2, 0xBF, 0xFF];
        let mut reader = Reader::new(&data);
        let value = reader.read_value().unwrap();
        assert_eq!(
            value,
            Value::Map(vec![(Value::Unsigned(2), Value::Unsigned(226))])
        );
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_chunked_strings() {
        let data = [0x7F, 0x62, b'a', b'b', 0x61, b'c', 0xFF];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_value().unwrap(), Value::Text("abc".into()));

        let data = [0x5F, 0x61, b'a', 0xFF];
        let mut reader = Reader::new(&data);
        assert_eq!(
            reader.read_value(),
            Err(CborError::InvalidChunk {
                expected: MAJOR_BYTES,
                found: MAJOR_TEXT
            })
        );
    }

    #[test]
    fn test_simple_values_and_tags() {
        let data = [0x83, 0xF4, 0xF5, 0xF6];
        let mut reader = Reader::new(&data);
        assert_eq!(
            reader.read_value().unwrap(),
            Value::Array(vec![Value::Bool(false), Value::Bool(true), Value::Null])
        );

        let tagged = Value::Tagged(1, Box::new(Value::Unsigned(1_739_371_290)));
        let bytes = encode(&tagged, true);
        assert_eq!(bytes[0], 0xC1);
        assert_eq!(Reader::new(&bytes).read_value().unwrap(), tagged);

        assert_eq!(
            Reader::new(&[0xF7]).read_value(),
            Err(CborError::UnsupportedSimple { value: 23 })
        );
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(
            Reader::new(&[0x1C]).read_value(),
            Err(CborError::ReservedAdditionalInfo { major: 0, info: 28 })
        );
        assert_eq!(
            Reader::new(&[0x1F]).read_value(),
            Err(CborError::UnexpectedIndefinite { major: 0 })
        );
        assert_eq!(Reader::new(&[0xFF]).read_value(), Err(CborError::UnexpectedBreak));
        assert!(matches!(
            Reader::new(&[0x9F, 0x01]).read_value(),
            Err(CborError::UnexpectedEof { .. })
        ));
        assert!(matches!(
            Reader::new(&[0x59, 0xFF, 0xFF, 0x00]).read_value(),
            Err(CborError::LengthExceedsInput { len: 65535, .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let data = vec![0x81; MAX_NESTING_DEPTH + 2];
        let result = Reader::new(&data).read_value();
        assert_eq!(
            result,
            Err(CborError::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            })
        );
    }
}
