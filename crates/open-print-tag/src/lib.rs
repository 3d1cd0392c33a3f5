//! OpenPrintTag: structured material metadata on NFC tags.
//!
//! This crate provides encoding, decoding, merging and validation for the
//! OpenPrintTag binary format used on filament spools and resin bottles.
//!
//! # Overview
//!
//! A tag carries three CBOR regions inside a single NDEF record:
//! - **meta**: where the other regions start
//! - **main**: static material, brand and package data
//! - **aux**: usage data that is rewritten over the tag's life
//!
//! Keys this version does not know are kept as unknowns and written back
//! unchanged, so older software never strips newer fields.
//!
//! # Quick Start
//!
//! ```rust
//! use open_print_tag::{Color, MaterialClass, MaterialType, Tag};
//!
//! let mut tag = Tag::new().with_size(304).with_aux_region_size(32);
//! let main = tag.main_mut();
//! main.material_class = Some(MaterialClass::FFF);
//! main.material_type = Some(MaterialType::PLA);
//! main.brand_name = Some("Prusament".to_string());
//! main.primary_color = Some("#3d3e3d".parse::<Color>().unwrap());
//!
//! // Encode to a tag image
//! let bytes = tag.encode().unwrap();
//! assert_eq!(bytes.len(), 304);
//! println!("{}", tag.stats().unwrap());
//!
//! // Decode back
//! let decoded = Tag::decode(&bytes).unwrap();
//! assert_eq!(decoded.main().brand_name.as_deref(), Some("Prusament"));
//! assert!(decoded.is_valid());
//! ```
//!
//! # Modules
//!
//! - [`model`]: Tag, regions, field types, enumerations and UUIDs
//! - [`codec`]: CBOR regions, NDEF framing and the layout planner
//! - [`validate`]: Presence, length and redundancy checks
//! - [`merge`]: Field-wise merging of tags
//! - [`stats`]: Byte accounting of the last encode
//! - [`storage`]: Block-addressed tag memory
//! - [`error`]: Error types
//! - [`limits`]: Format constants
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Region offsets are bounds checked against the payload
//! - CBOR nesting depth and lengths are limited
//! - Invalid data is rejected with descriptive errors
//!
//! # Wire Format
//!
//! ```text
//! capability container | TLV | [URI record] | tag record: meta, main, aux | 0xFE
//! ```
//!
//! The capability container can be left out for tags whose transport
//! supplies it.

pub mod codec;
pub mod error;
pub mod limits;
pub mod merge;
pub mod model;
pub mod stats;
pub mod storage;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{
    decode_tag, decode_tag_with_options, encode_tag, encode_tag_with_options, DecodeOptions,
    EncodeOptions, InvariantMode,
};
pub use error::{
    CborError, DecodeError, EncodeError, ErrorCode, FieldError, StorageError, TagIoError,
};
pub use model::{
    brand_uuid, instance_uuid, material_uuid, package_uuid, AuxRegion, Color, ContainerForm,
    DerivedUuids, EnumKind, Enumeration, FieldDescriptor, FieldKind, FieldValue, FloatPrecision,
    MainRegion, MaterialCertification, MaterialClass, MaterialType, MetaRegion, Region,
    RegionKind, RegionOptions, Tag, TagFlag, Timestamp, Value, WriteProtection,
};
pub use stats::{RegionStats, RootStats, Stats};
pub use storage::{MemoryStorage, TagStorage};
pub use validate::{opt_check, validate, ValidationIssue, ValidationReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
