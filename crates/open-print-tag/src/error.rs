//! Error types for tag encoding/decoding, field values and storage access.

use thiserror::Error;

use crate::model::{FieldKind, RegionKind};

/// Error categories shared by encode and decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad magic or structure in the capability container, TLV or NDEF layers.
    MalformedContainer,
    /// No NDEF message TLV before the terminator.
    NdefNotFound,
    /// The NDEF message carries no tag record.
    RecordNotFound,
    /// A region's CBOR is structurally invalid or does not match the schema.
    RegionDecodeFailure,
    /// A region's encoded form exceeds the region ceiling.
    SizeExceeded,
    /// The tag cannot host even the minimum regions.
    InsufficientSpace,
    /// A region does not fit the span it is allotted.
    RegionTooSmall,
    /// A field value is malformed.
    InvalidFieldValue,
    /// Tag size or block size cannot be represented.
    InvalidConfiguration,
    /// The planner's own arithmetic went wrong.
    InvariantViolation,
}

/// Error during decoding of a single region's CBOR.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CborError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("reserved additional information {info} for major type {major}")]
    ReservedAdditionalInfo { major: u8, info: u8 },

    #[error("indefinite length not allowed for major type {major}")]
    UnexpectedIndefinite { major: u8 },

    #[error("break marker outside an indefinite container")]
    UnexpectedBreak,

    #[error("string chunk has major type {found}, expected {expected}")]
    InvalidChunk { expected: u8, found: u8 },

    #[error("invalid UTF-8 in text string")]
    InvalidUtf8,

    #[error("unsupported simple value {value}")]
    UnsupportedSimple { value: u8 },

    #[error("negative integer below i64 range")]
    IntegerOutOfRange,

    #[error("length {len} exceeds the remaining {remaining} bytes")]
    LengthExceedsInput { len: u64, remaining: usize },

    #[error("nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },

    #[error("expected a map, found major type {major}")]
    NotAMap { major: u8 },

    #[error("map key is not an integer")]
    NonIntegerKey,

    #[error("duplicate map key {key}")]
    DuplicateKey { key: i64 },
}

/// Error during binary decoding of a tag.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === Capability container / TLV / NDEF ===
    #[error("capability container magic number does not match: found {found:#04x}")]
    InvalidCapabilityContainer { found: u8 },

    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("malformed NDEF message: {context}")]
    MalformedNdef { context: &'static str },

    #[error("did not find NDEF TLV")]
    NdefNotFound,

    #[error("did not find a {record_type} record")]
    RecordNotFound { record_type: &'static str },

    // === Regions ===
    #[error("invalid {region} region: {source}")]
    Region {
        region: RegionKind,
        #[source]
        source: CborError,
    },

    #[error("{region} region field {key} does not hold a {expected} value")]
    FieldTypeMismatch {
        region: RegionKind,
        key: u32,
        expected: FieldKind,
    },

    #[error("{region} region offset {offset} lies outside the {len} byte payload")]
    RegionOutOfBounds {
        region: RegionKind,
        offset: usize,
        len: usize,
    },
}

impl DecodeError {
    /// Returns the error category for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::InvalidCapabilityContainer { .. }
            | DecodeError::UnexpectedEof { .. }
            | DecodeError::MalformedNdef { .. } => ErrorCode::MalformedContainer,
            DecodeError::NdefNotFound => ErrorCode::NdefNotFound,
            DecodeError::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            DecodeError::Region { .. }
            | DecodeError::FieldTypeMismatch { .. }
            | DecodeError::RegionOutOfBounds { .. } => ErrorCode::RegionDecodeFailure,
        }
    }
}

/// Error during binary encoding of a tag.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("tag size {size} {reason}")]
    InvalidTagSize { size: usize, reason: &'static str },

    #[error("block size must be >0")]
    InvalidBlockSize,

    #[error("there is not enough space even for the meta region: {available} bytes of payload, more than {required} needed")]
    InsufficientSpace { available: usize, required: usize },

    #[error("{region} region is too small: {available} bytes available, at least {minimum} required")]
    RegionTooSmall {
        region: RegionKind,
        available: usize,
        minimum: usize,
    },

    #[error("{region} region encodes to {size} bytes but only {available} are allotted")]
    RegionOverflow {
        region: RegionKind,
        size: usize,
        available: usize,
    },

    #[error("region {region} size of {size} exceeds maximum permissible size of {max} bytes")]
    SizeExceeded {
        region: RegionKind,
        size: usize,
        max: usize,
    },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl EncodeError {
    /// Returns the error category for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EncodeError::InvalidTagSize { .. } | EncodeError::InvalidBlockSize => {
                ErrorCode::InvalidConfiguration
            }
            EncodeError::InsufficientSpace { .. } => ErrorCode::InsufficientSpace,
            EncodeError::RegionTooSmall { .. } | EncodeError::RegionOverflow { .. } => {
                ErrorCode::RegionTooSmall
            }
            EncodeError::SizeExceeded { .. } => ErrorCode::SizeExceeded,
            EncodeError::InvariantViolation(_) => ErrorCode::InvariantViolation,
        }
    }
}

/// Error constructing or assigning a field value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("invalid color representation: {input} (should be #rrggbb(aa))")]
    InvalidColor { input: String },

    #[error("expected a {expected} value, got a {found} value")]
    TypeMismatch { expected: FieldKind, found: FieldKind },

    #[error("cannot parse {input:?} as a {kind} value")]
    Unparsable { kind: FieldKind, input: String },

    #[error("unknown enumeration name {name:?}")]
    UnknownEnumName { name: String },

    #[error("{region} region has no field with key {key}")]
    NoSuchKey { region: RegionKind, key: u32 },

    #[error("{region} region has no field named {name:?}")]
    NoSuchField { region: RegionKind, name: String },

    #[error("key {key} belongs to a named {region} field and cannot hold an unknown value")]
    KnownKey { region: RegionKind, key: i64 },

    #[error("NFC tag UID {reason}")]
    InvalidTagUid { reason: &'static str },
}

impl FieldError {
    /// Returns the error category for this error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidFieldValue
    }
}

/// Error accessing a tag's byte storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("range {start}..{end} is outside the {capacity} byte storage")]
    OutOfBounds {
        start: usize,
        end: usize,
        capacity: usize,
    },

    #[error("write start {start} is not aligned to the {block_size} byte block size")]
    Misaligned { start: usize, block_size: usize },

    #[error("storage transport failure: {0}")]
    Transport(String),
}

/// Error moving a tag between memory and storage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TagIoError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
