//! Region encoding/decoding.
//!
//! A region is a CBOR map from small integer keys to values. Named fields
//! and unknowns are written together in ascending key order. Decoding reads
//! the whole map generically first, then assigns each key either to its
//! named field or to the region's unknowns, so keys this version does not
//! know survive a round trip.

use log::trace;
use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::codec::float::compress_float;
use crate::codec::primitives::{Reader, Writer};
use crate::error::{CborError, DecodeError, EncodeError};
use crate::limits::MAX_REGION_SIZE;
use crate::model::{Color, ContainerForm, FieldKind, FieldValue, FloatPrecision, Region, Timestamp, Value};

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a region to CBOR using the region's own options.
///
/// Fails with [`EncodeError::SizeExceeded`] if the result is larger than
/// [`MAX_REGION_SIZE`].
pub fn encode_region<R: Region>(region: &R) -> Result<Vec<u8>, EncodeError> {
    let options = *region.options();

    let mut entries: Vec<(i64, Value)> = region
        .present_fields()
        .into_iter()
        .map(|(descriptor, value)| {
            (
                descriptor.key as i64,
                field_to_wire(value, options.float_precision),
            )
        })
        .collect();
    entries.extend(region.unknowns().iter().map(|(key, value)| (key, value.clone())));
    entries.sort_by_key(|(key, _)| *key);

    let definite = match options.container {
        ContainerForm::Definite => true,
        ContainerForm::Indefinite => false,
        ContainerForm::Auto => entries.is_empty(),
    };
    let nested_definite = options.container == ContainerForm::Definite;

    let mut writer = Writer::with_capacity(64);
    writer.begin_map(definite.then_some(entries.len()));
    for (key, value) in &entries {
        writer.write_signed(*key);
        writer.write_value(value, nested_definite);
    }
    if !definite {
        writer.write_break();
    }

    let bytes = writer.into_bytes();
    trace!(
        "encoded {} region: {} entries, {} bytes",
        R::KIND,
        entries.len(),
        bytes.len()
    );
    if bytes.len() > MAX_REGION_SIZE {
        return Err(EncodeError::SizeExceeded {
            region: R::KIND,
            size: bytes.len(),
            max: MAX_REGION_SIZE,
        });
    }
    Ok(bytes)
}

/// Converts a field value to its wire value.
pub fn field_to_wire(value: FieldValue, precision: FloatPrecision) -> Value {
    match value {
        FieldValue::Unsigned(n) => Value::Unsigned(n),
        FieldValue::Signed(n) => Value::from(n),
        FieldValue::Float(f) => compress_float(f, precision),
        FieldValue::Text(s) => Value::Text(s),
        FieldValue::Color(c) => Value::Bytes(c.as_bytes().to_vec()),
        FieldValue::Timestamp(t) => Value::Unsigned(t.unix_seconds()),
        FieldValue::Uuid(u) => Value::Bytes(u.as_bytes().to_vec()),
        FieldValue::Enum { code, .. } => Value::Unsigned(code),
        FieldValue::EnumList { codes, .. } => {
            Value::Array(codes.into_iter().map(Value::Unsigned).collect())
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes one region from the start of `data`.
///
/// Returns the region and the number of bytes its map occupied. Trailing
/// bytes (padding, following regions) are not examined.
pub fn decode_region<R: Region>(data: &[u8]) -> Result<(R, usize), DecodeError> {
    let region_error = |source: CborError| DecodeError::Region {
        region: R::KIND,
        source,
    };

    let mut reader = Reader::new(data);
    let value = reader.read_value().map_err(region_error)?;
    let consumed = reader.position();

    let Value::Map(entries) = value else {
        let major = data.first().map_or(0, |b| b >> 5);
        return Err(region_error(CborError::NotAMap { major }));
    };

    let mut region = R::default();
    let mut seen = FxHashSet::with_capacity_and_hasher(entries.len(), Default::default());

    for (key, value) in entries {
        let key = key
            .as_i64()
            .ok_or_else(|| region_error(CborError::NonIntegerKey))?;
        if !seen.insert(key) {
            return Err(region_error(CborError::DuplicateKey { key }));
        }

        let descriptor = u32::try_from(key).ok().and_then(R::descriptor);
        match descriptor {
            Some(descriptor) => {
                let mismatch = || DecodeError::FieldTypeMismatch {
                    region: R::KIND,
                    key: descriptor.key,
                    expected: descriptor.kind,
                };
                let field = wire_to_field(descriptor.kind, value).ok_or_else(mismatch)?;
                region
                    .set_field(descriptor.key, field)
                    .map_err(|_| mismatch())?;
            }
            None => {
                region.unknowns_mut().insert(key, value);
            }
        }
    }

    trace!(
        "decoded {} region: {} unknown keys, {} bytes",
        R::KIND,
        region.unknowns().len(),
        consumed
    );
    Ok((region, consumed))
}

/// Converts a wire value to a field value of the given kind.
pub fn wire_to_field(kind: FieldKind, value: Value) -> Option<FieldValue> {
    match kind {
        FieldKind::Unsigned => value.as_u64().map(FieldValue::Unsigned),
        FieldKind::Signed => value.as_i64().map(FieldValue::Signed),
        FieldKind::Float => value.as_f64().map(FieldValue::Float),
        FieldKind::Text => match value {
            Value::Text(s) => Some(FieldValue::Text(s)),
            _ => None,
        },
        FieldKind::Color => match value {
            Value::Bytes(b) => Some(FieldValue::Color(Color::from_bytes(b))),
            _ => None,
        },
        FieldKind::Timestamp => value.as_u64().map(|s| FieldValue::Timestamp(Timestamp(s))),
        FieldKind::Uuid => value
            .as_bytes()
            .and_then(|b| Uuid::from_slice(b).ok())
            .map(FieldValue::Uuid),
        FieldKind::Enum(kind) => value.as_u64().map(|code| FieldValue::Enum { kind, code }),
        FieldKind::EnumList(kind) => {
            let codes = value
                .as_array()?
                .iter()
                .map(Value::as_u64)
                .collect::<Option<Vec<_>>>()?;
            Some(FieldValue::EnumList { kind, codes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuxRegion, MainRegion, MaterialClass, MetaRegion, RegionKind, TagFlag};

    #[test]
    fn test_meta_definite_encoding() {
        let mut meta = MetaRegion::default();
        meta.aux_region_offset = Some(226);
        assert_eq!(encode_region(&meta).unwrap(), vec![0xA1, 0x02, 0x18, 0xE2]);
    }

    #[test]
    fn test_auto_empty_region() {
        let aux = AuxRegion::default();
        assert_eq!(encode_region(&aux).unwrap(), vec![0xA0]);

        let mut aux = AuxRegion::default();
        aux.options.container = ContainerForm::Indefinite;
        assert_eq!(encode_region(&aux).unwrap(), vec![0xBF, 0xFF]);
    }

    #[test]
    fn test_auto_nonempty_region_is_indefinite() {
        let mut main = MainRegion::default();
        main.material_class = Some(MaterialClass::FFF);
        main.tags = Some(vec![TagFlag::GLITTER]);
        assert_eq!(
            encode_region(&main).unwrap(),
            vec![0xBF, 0x08, 0x00, 0x18, 0x1C, 0x9F, 0x17, 0xFF, 0xFF]
        );

        main.options.container = ContainerForm::Definite;
        assert_eq!(
            encode_region(&main).unwrap(),
            vec![0xA2, 0x08, 0x00, 0x18, 0x1C, 0x81, 0x17]
        );
    }

    #[test]
    fn test_keys_sorted_with_unknowns() {
        let mut meta = MetaRegion::default();
        meta.aux_region_offset = Some(1);
        meta.main_region_offset = Some(2);
        meta.set_unknown(1000, Value::Bool(true)).unwrap();
        meta.set_unknown(-1, Value::Null).unwrap();
        assert_eq!(
            encode_region(&meta).unwrap(),
            vec![0xA4, 0x20, 0xF6, 0x00, 0x02, 0x02, 0x01, 0x19, 0x03, 0xE8, 0xF5]
        );
    }

    #[test]
    fn test_float_compression_on_encode() {
        let mut aux = AuxRegion::default();
        aux.consumed_weight = Some(100.0);
        assert_eq!(encode_region(&aux).unwrap(), vec![0xBF, 0x00, 0x18, 0x64, 0xFF]);

        aux.consumed_weight = Some(0.2);
        aux.options.float_precision = FloatPrecision::P16;
        assert_eq!(
            encode_region(&aux).unwrap(),
            vec![0xBF, 0x00, 0xF9, 0x32, 0x66, 0xFF]
        );
    }

    #[test]
    fn test_decode_recovers_unknowns() {
        let mut main = MainRegion::default();
        main.material_class = Some(MaterialClass::SLA);
        main.set_unknown(99, Value::Text("future".into())).unwrap();
        let bytes = encode_region(&main).unwrap();

        let (decoded, consumed) = decode_region::<MainRegion>(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded.material_class, Some(MaterialClass::SLA));
        assert_eq!(decoded.unknown(99), Some(&Value::Text("future".into())));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let data = [0xA1, 0x00, 0x05, 0x00, 0x00, 0x00];
        let (meta, consumed) = decode_region::<MetaRegion>(&data).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(meta.main_region_offset, Some(5));
    }

    #[test]
    fn test_decode_rejects_bad_maps() {
        assert!(matches!(
            decode_region::<MetaRegion>(&[0x80]),
            Err(DecodeError::Region {
                region: RegionKind::Meta,
                source: CborError::NotAMap { major: 4 }
            })
        ));
        assert!(matches!(
            decode_region::<MetaRegion>(&[0xA1, 0x61, b'a', 0x01]),
            Err(DecodeError::Region {
                source: CborError::NonIntegerKey,
                ..
            })
        ));
        assert!(matches!(
            decode_region::<MetaRegion>(&[0xA2, 0x00, 0x01, 0x00, 0x02]),
            Err(DecodeError::Region {
                source: CborError::DuplicateKey { key: 0 },
                ..
            })
        ));
    }

    #[test]
    fn test_decode_type_mismatch() {
        // main_region_offset as a text string
        let result = decode_region::<MetaRegion>(&[0xA1, 0x00, 0x61, b'a']);
        assert_eq!(
            result.unwrap_err(),
            DecodeError::FieldTypeMismatch {
                region: RegionKind::Meta,
                key: 0,
                expected: FieldKind::Unsigned
            }
        );
    }

    #[test]
    fn test_size_ceiling() {
        let mut aux = AuxRegion::default();
        aux.set_vendor_field(655300, vec![0u8; 1024]).unwrap();
        let err = encode_region(&aux).unwrap_err();
        assert_eq!(
            err.to_string(),
            "region aux size of 1034 exceeds maximum permissible size of 512 bytes"
        );
    }
}
