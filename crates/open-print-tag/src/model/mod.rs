//! Data model types for OpenPrintTag.
//!
//! This module contains the in-memory form of a tag:
//! - Values (the generic CBOR value tree used for unknown keys)
//! - Field kinds, descriptors and typed field values
//! - Enumerations and deterministic UUIDs
//! - The meta, main and aux regions
//! - The tag aggregate tying them together

pub mod enums;
pub mod field;
pub mod id;
pub mod region;
pub mod schema;
pub mod tag;
pub mod value;

pub use enums::{
    EnumKind, Enumeration, MaterialCertification, MaterialClass, MaterialType, TagFlag,
    WriteProtection,
};
pub use field::{Color, Constraints, FieldDescriptor, FieldKind, FieldType, FieldValue, Timestamp};
pub use id::{
    brand_uuid, instance_uuid, material_uuid, package_uuid, BRAND_NAMESPACE, INSTANCE_NAMESPACE,
    MATERIAL_NAMESPACE, PACKAGE_NAMESPACE,
};
pub use region::{ContainerForm, FloatPrecision, Region, RegionKind, RegionOptions, Unknowns};
pub use schema::{AuxRegion, MainRegion, MetaRegion};
pub use tag::{DerivedUuids, Tag};
pub use value::Value;
