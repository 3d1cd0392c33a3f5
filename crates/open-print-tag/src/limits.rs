//! Format constants and size limits.
//!
//! These values are fixed by the tag format and the NFC Forum Type 5
//! container it lives in. The decoder relies on them to bound work on
//! untrusted input.

/// MIME type of the NDEF record carrying the CBOR regions.
pub const MIME_TYPE: &str = "application/vnd.openprinttag";

/// Maximum encoded size of a single region.
pub const MAX_REGION_SIZE: usize = 512;

/// Upper bound on the encoded meta region; the payload must exceed it.
pub const MAX_META_REGION_SIZE: usize = 8;

/// Default write-alignment granularity of the storage medium.
pub const DEFAULT_BLOCK_SIZE: usize = 4;

/// Maximum nesting depth of arrays/maps accepted when decoding a region.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Minimum distance between the main region start and the aux region start.
pub const MIN_MAIN_REGION_SIZE_WITH_AUX: usize = 4;

/// Minimum distance between the main region start and the payload end.
pub const MIN_MAIN_REGION_SIZE: usize = 8;

/// The aux region must be allotted strictly more than this many bytes.
pub const MIN_AUX_REGION_SIZE: usize = 4;

/// Bytes between the aux region offset and the payload end that are not
/// part of the requested aux allotment when a tag is read back.
pub const AUX_REGION_FRAMING_TAIL: usize = 3;

// =============================================================================
// CAPABILITY CONTAINER / TLV
// =============================================================================

/// Capability container magic (version 1, unrestricted read/write).
pub const CC_MAGIC: u8 = 0xE1;

/// Capability container version/access byte.
pub const CC_VERSION: u8 = 0x40;

/// Capability container feature byte (multiple block read supported).
pub const CC_FEATURES: u8 = 0x01;

/// Size of the capability container.
pub const CC_SIZE: usize = 4;

/// The CC expresses the tag size in units of this many bytes.
pub const CC_SIZE_UNIT: usize = 8;

/// TLV tag of an NDEF message block.
pub const TLV_NDEF_MESSAGE: u8 = 0x03;

/// TLV terminator block.
pub const TLV_TERMINATOR: u8 = 0xFE;

/// Length byte announcing a three-byte (extended) TLV length.
pub const TLV_EXTENDED_LENGTH: u8 = 0xFF;

/// Largest length expressible in the one-byte TLV length form.
pub const TLV_MAX_SHORT_LENGTH: usize = 0xFE;

/// Largest payload expressible in a short NDEF record.
pub const NDEF_MAX_SHORT_PAYLOAD: usize = 0xFF;
