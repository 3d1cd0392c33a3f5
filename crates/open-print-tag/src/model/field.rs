//! Typed field values and static field descriptors.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::error::FieldError;
use crate::model::enums::{
    EnumKind, Enumeration, MaterialCertification, MaterialClass, MaterialType, TagFlag,
    WriteProtection,
};

/// Semantic type of a named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Unsigned,
    Signed,
    Float,
    Text,
    Color,
    Timestamp,
    Uuid,
    Enum(EnumKind),
    EnumList(EnumKind),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Unsigned => f.write_str("unsigned integer"),
            FieldKind::Signed => f.write_str("signed integer"),
            FieldKind::Float => f.write_str("float"),
            FieldKind::Text => f.write_str("string"),
            FieldKind::Color => f.write_str("color"),
            FieldKind::Timestamp => f.write_str("timestamp"),
            FieldKind::Uuid => f.write_str("UUID"),
            FieldKind::Enum(kind) => write!(f, "{}", kind),
            FieldKind::EnumList(kind) => write!(f, "{} list", kind),
        }
    }
}

/// Presence constraints and length limit of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Constraints {
    pub required: bool,
    pub recommended: bool,
    pub max_length: Option<usize>,
}

impl Constraints {
    pub const NONE: Constraints = Constraints {
        required: false,
        recommended: false,
        max_length: None,
    };

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn recommended(mut self) -> Self {
        self.recommended = true;
        self
    }

    pub const fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }
}

/// Static metadata of one named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub key: u32,
    pub name: &'static str,
    pub kind: FieldKind,
    pub constraints: Constraints,
}

// =============================================================================
// VALUE TYPES
// =============================================================================

/// An RGB or RGBA color.
///
/// Well-formed colors are 3 or 4 bytes. Other lengths can arrive from the
/// wire and are kept so validation can report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(Vec<u8>);

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(vec![r, g, b])
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(vec![r, g, b, a])
    }

    /// Wraps raw bytes without checking their length.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Color(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true if the color is 3 or 4 bytes long.
    pub fn is_well_formed(&self) -> bool {
        matches!(self.0.len(), 3 | 4)
    }
}

impl FromStr for Color {
    type Err = FieldError;

    /// Parses `#rrggbb`, `#rrggbbaa` or the same without the `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if !matches!(digits.len(), 6 | 8) {
            return Err(FieldError::InvalidColor {
                input: s.to_string(),
            });
        }
        hex::decode(digits)
            .map(Color)
            .map_err(|_| FieldError::InvalidColor {
                input: s.to_string(),
            })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode(&self.0))
    }
}

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_unix(seconds: u64) -> Self {
        Timestamp(seconds)
    }

    pub fn unix_seconds(self) -> u64 {
        self.0
    }

    /// Converts a system time, truncating to whole seconds. Times before the
    /// epoch clamp to zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        Timestamp(
            time.duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        )
    }

    pub fn to_system_time(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.0)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Timestamp::from_system_time(time)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// FIELD VALUES
// =============================================================================

/// A named field's value, independent of its Rust field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Color(Color),
    Timestamp(Timestamp),
    Uuid(Uuid),
    Enum { kind: EnumKind, code: u64 },
    EnumList { kind: EnumKind, codes: Vec<u64> },
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Unsigned(_) => FieldKind::Unsigned,
            FieldValue::Signed(_) => FieldKind::Signed,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Color(_) => FieldKind::Color,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::Uuid(_) => FieldKind::Uuid,
            FieldValue::Enum { kind, .. } => FieldKind::Enum(*kind),
            FieldValue::EnumList { kind, .. } => FieldKind::EnumList(*kind),
        }
    }

    /// Returns the length checked against `max_length`, for sequence values.
    pub fn length(&self) -> Option<usize> {
        match self {
            FieldValue::Text(s) => Some(s.len()),
            FieldValue::EnumList { codes, .. } => Some(codes.len()),
            _ => None,
        }
    }

    /// Parses the text form of a value of the given kind.
    pub fn parse(kind: FieldKind, text: &str) -> Result<FieldValue, FieldError> {
        let unparsable = || FieldError::Unparsable {
            kind,
            input: text.to_string(),
        };
        let trimmed = text.trim();
        match kind {
            FieldKind::Unsigned => trimmed
                .parse()
                .map(FieldValue::Unsigned)
                .map_err(|_| unparsable()),
            FieldKind::Signed => trimmed
                .parse()
                .map(FieldValue::Signed)
                .map_err(|_| unparsable()),
            FieldKind::Float => trimmed
                .parse()
                .map(FieldValue::Float)
                .map_err(|_| unparsable()),
            FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
            FieldKind::Color => trimmed.parse().map(FieldValue::Color),
            FieldKind::Timestamp => trimmed
                .parse()
                .map(|s| FieldValue::Timestamp(Timestamp(s)))
                .map_err(|_| unparsable()),
            FieldKind::Uuid => Uuid::parse_str(trimmed)
                .map(FieldValue::Uuid)
                .map_err(|_| unparsable()),
            FieldKind::Enum(kind) => kind.parse(trimmed).map(|code| FieldValue::Enum { kind, code }),
            FieldKind::EnumList(kind) => {
                let inner = trimmed
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .unwrap_or(trimmed);
                let codes = inner
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| kind.parse(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldValue::EnumList { kind, codes })
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(n) => write!(f, "{}", n),
            FieldValue::Signed(n) => write!(f, "{}", n),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Color(c) => write!(f, "{}", c),
            FieldValue::Timestamp(t) => write!(f, "{}", t),
            FieldValue::Uuid(u) => write!(f, "{}", u.hyphenated()),
            FieldValue::Enum { kind, code } => f.write_str(&kind.format(*code)),
            FieldValue::EnumList { kind, codes } => {
                let names: Vec<String> = codes.iter().map(|c| kind.format(*c)).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

/// Conversion between a region struct's field type and [`FieldValue`].
pub trait FieldType: Sized {
    const KIND: FieldKind;

    fn into_field_value(self) -> FieldValue;

    fn from_field_value(value: FieldValue) -> Result<Self, FieldError>;
}

fn mismatch(expected: FieldKind, value: &FieldValue) -> FieldError {
    FieldError::TypeMismatch {
        expected,
        found: value.kind(),
    }
}

macro_rules! scalar_field_type {
    ($ty:ty, $variant:ident) => {
        impl FieldType for $ty {
            const KIND: FieldKind = FieldKind::$variant;

            fn into_field_value(self) -> FieldValue {
                FieldValue::$variant(self)
            }

            fn from_field_value(value: FieldValue) -> Result<Self, FieldError> {
                match value {
                    FieldValue::$variant(v) => Ok(v),
                    other => Err(mismatch(Self::KIND, &other)),
                }
            }
        }
    };
}

scalar_field_type!(u64, Unsigned);
scalar_field_type!(f64, Float);
scalar_field_type!(String, Text);
scalar_field_type!(Color, Color);
scalar_field_type!(Timestamp, Timestamp);
scalar_field_type!(Uuid, Uuid);

impl FieldType for i64 {
    const KIND: FieldKind = FieldKind::Signed;

    fn into_field_value(self) -> FieldValue {
        FieldValue::Signed(self)
    }

    /// Also accepts unsigned values that fit.
    fn from_field_value(value: FieldValue) -> Result<Self, FieldError> {
        match value {
            FieldValue::Signed(v) => Ok(v),
            FieldValue::Unsigned(v) => i64::try_from(v).map_err(|_| FieldError::TypeMismatch {
                expected: Self::KIND,
                found: FieldKind::Unsigned,
            }),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

macro_rules! enum_field_type {
    ($($ty:ty),*) => {$(
        impl FieldType for $ty {
            const KIND: FieldKind = FieldKind::Enum(<$ty as Enumeration>::KIND);

            fn into_field_value(self) -> FieldValue {
                FieldValue::Enum {
                    kind: <$ty as Enumeration>::KIND,
                    code: self.code(),
                }
            }

            fn from_field_value(value: FieldValue) -> Result<Self, FieldError> {
                match value {
                    FieldValue::Enum { kind, code } if kind == <$ty as Enumeration>::KIND => {
                        Ok(Self::from_code(code))
                    }
                    other => Err(mismatch(<Self as FieldType>::KIND, &other)),
                }
            }
        }
    )*};
}

enum_field_type!(
    MaterialClass,
    MaterialType,
    TagFlag,
    MaterialCertification,
    WriteProtection
);

impl<T: Enumeration> FieldType for Vec<T> {
    const KIND: FieldKind = FieldKind::EnumList(T::KIND);

    fn into_field_value(self) -> FieldValue {
        FieldValue::EnumList {
            kind: T::KIND,
            codes: self.into_iter().map(Enumeration::code).collect(),
        }
    }

    fn from_field_value(value: FieldValue) -> Result<Self, FieldError> {
        match value {
            FieldValue::EnumList { kind, codes } if kind == T::KIND => {
                Ok(codes.into_iter().map(T::from_code).collect())
            }
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!("#3d3e3d".parse::<Color>().unwrap(), Color::rgb(0x3d, 0x3e, 0x3d));
        assert_eq!(
            "FF000080".parse::<Color>().unwrap(),
            Color::rgba(0xff, 0, 0, 0x80)
        );
        for bad in ["#12345", "#1234567", "zzzzzz", "", "#"] {
            assert!(
                matches!(bad.parse::<Color>(), Err(FieldError::InvalidColor { .. })),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::rgb(0x3d, 0x3e, 0x3d).to_string(), "#3d3e3d");
        assert!(!Color::from_bytes(vec![1, 2]).is_well_formed());
    }

    #[test]
    fn test_timestamp_system_time() {
        let ts = Timestamp::from_unix(1_739_371_290);
        assert_eq!(Timestamp::from(ts.to_system_time()), ts);
    }

    #[test]
    fn test_field_type_mismatch() {
        let err = String::from_field_value(FieldValue::Unsigned(1)).unwrap_err();
        assert_eq!(
            err,
            FieldError::TypeMismatch {
                expected: FieldKind::Text,
                found: FieldKind::Unsigned
            }
        );
        assert_eq!(i64::from_field_value(FieldValue::Unsigned(7)), Ok(7));
        assert!(MaterialType::from_field_value(FieldValue::Enum {
            kind: EnumKind::MaterialClass,
            code: 0
        })
        .is_err());
    }

    #[test]
    fn test_parse_and_display() {
        let tags = FieldValue::parse(FieldKind::EnumList(EnumKind::TagFlag), "[glitter, 18]").unwrap();
        assert_eq!(
            tags,
            FieldValue::EnumList {
                kind: EnumKind::TagFlag,
                codes: vec![23, 18]
            }
        );
        assert_eq!(tags.to_string(), "[glitter, 18]");

        let class = FieldValue::parse(FieldKind::Enum(EnumKind::MaterialClass), "FFF").unwrap();
        assert_eq!(class.to_string(), "FFF");

        assert!(matches!(
            FieldValue::parse(FieldKind::Signed, "hot"),
            Err(FieldError::Unparsable { .. })
        ));
        assert_eq!(
            FieldValue::parse(FieldKind::Float, "1.75").unwrap(),
            FieldValue::Float(1.75)
        );
    }
}
