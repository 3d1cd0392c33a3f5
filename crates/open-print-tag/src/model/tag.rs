//! The tag aggregate.
//!
//! A [`Tag`] owns one meta and one main region, an optional aux region and
//! the sizing hints the layout planner needs. Encoding, decoding, merging and
//! validation are implemented in their own modules; the methods here are
//! thin entry points.

use uuid::Uuid;

use crate::codec::tag::{decode_tag_with_options, encode_tag_with_options, DecodeOptions, EncodeOptions};
use crate::error::{DecodeError, EncodeError};
use crate::limits::DEFAULT_BLOCK_SIZE;
use crate::model::id::{brand_uuid, material_uuid, package_uuid};
use crate::model::schema::{AuxRegion, MainRegion, MetaRegion};
use crate::stats::Stats;
use crate::validate::{self, ValidationReport};

/// An OpenPrintTag in memory.
///
/// A blank tag has empty meta and main regions and no aux region. The tag
/// size must be set before encoding.
///
/// ```
/// use open_print_tag::{MaterialClass, Tag};
///
/// let mut tag = Tag::new().with_size(304).with_aux_region_size(32);
/// tag.main_mut().material_class = Some(MaterialClass::FFF);
/// let bytes = tag.encode().unwrap();
/// assert_eq!(bytes.len(), 304);
///
/// let decoded = Tag::decode(&bytes).unwrap();
/// assert_eq!(decoded.main().material_class, Some(MaterialClass::FFF));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub(crate) meta: MetaRegion,
    pub(crate) main: MainRegion,
    pub(crate) aux: Option<AuxRegion>,
    pub(crate) size: usize,
    pub(crate) block_size: usize,
    pub(crate) uri: Option<String>,
    pub(crate) meta_region_size: usize,
    pub(crate) aux_region_size: usize,
    pub(crate) stats: Option<Stats>,
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            meta: MetaRegion::default(),
            main: MainRegion::default(),
            aux: None,
            size: 0,
            block_size: DEFAULT_BLOCK_SIZE,
            uri: None,
            meta_region_size: 0,
            aux_region_size: 0,
            stats: None,
        }
    }
}

/// Brand, material, package and instance UUIDs, explicit or derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedUuids {
    pub brand: Option<Uuid>,
    pub material: Option<Uuid>,
    pub package: Option<Uuid>,
    /// Only ever explicit; deriving it needs the NFC tag UID.
    pub instance: Option<Uuid>,
}

impl Tag {
    /// Creates a blank tag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total tag size in bytes, capability container included.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Pads the meta region to `size` bytes and records the main region
    /// offset explicitly.
    pub fn with_meta_region_size(mut self, size: usize) -> Self {
        self.meta_region_size = size;
        self
    }

    /// Adds an aux region (if absent) and sets its allotment.
    pub fn with_aux_region_size(mut self, size: usize) -> Self {
        self.aux.get_or_insert_with(AuxRegion::default);
        self.aux_region_size = size;
        self
    }

    /// Sets the storage block size the aux region is aligned to.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Adds a URI record ahead of the tag record.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn meta_region_size(&self) -> usize {
        self.meta_region_size
    }

    pub fn aux_region_size(&self) -> usize {
        self.aux_region_size
    }

    pub fn meta(&self) -> &MetaRegion {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut MetaRegion {
        &mut self.meta
    }

    pub fn main(&self) -> &MainRegion {
        &self.main
    }

    pub fn main_mut(&mut self) -> &mut MainRegion {
        &mut self.main
    }

    pub fn aux(&self) -> Option<&AuxRegion> {
        self.aux.as_ref()
    }

    /// Returns the aux region, creating an empty one if the tag has none.
    ///
    /// A region created this way has no allotment; set one with
    /// [`Tag::with_aux_region_size`] before encoding.
    pub fn aux_region_mut(&mut self) -> &mut AuxRegion {
        self.aux.get_or_insert_with(AuxRegion::default)
    }

    /// Removes the aux region together with its allotment and recorded offset.
    pub fn remove_aux_region(&mut self) {
        self.aux = None;
        self.aux_region_size = 0;
        self.meta.aux_region_offset = None;
    }

    /// Byte accounting from the last successful encode.
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    /// Encodes the tag with the capability container.
    ///
    /// Layout decisions are written back into the meta region, so encoding
    /// takes `&mut self`.
    pub fn encode(&mut self) -> Result<Vec<u8>, EncodeError> {
        encode_tag_with_options(self, EncodeOptions::default())
    }

    pub fn encode_with_options(&mut self, options: EncodeOptions) -> Result<Vec<u8>, EncodeError> {
        encode_tag_with_options(self, options)
    }

    /// Decodes a tag image that starts with a capability container.
    pub fn decode(data: &[u8]) -> Result<Tag, DecodeError> {
        decode_tag_with_options(data, DecodeOptions::default())
    }

    pub fn decode_with_options(data: &[u8], options: DecodeOptions) -> Result<Tag, DecodeError> {
        decode_tag_with_options(data, options)
    }

    /// Checks required and recommended fields.
    pub fn validate(&self) -> ValidationReport {
        validate::validate(self)
    }

    /// Checks lengths, colors and redundant derivable UUIDs.
    pub fn opt_check(&self) -> ValidationReport {
        validate::opt_check(self)
    }

    /// Returns true if validation reports no errors.
    pub fn is_valid(&self) -> bool {
        self.validate().errors.is_empty()
    }

    /// Reports each identity UUID, explicit if set, otherwise derived from
    /// the brand name, material name and GTIN where possible.
    pub fn derived_uuids(&self) -> DerivedUuids {
        let main = &self.main;
        let brand = main
            .brand_uuid
            .or_else(|| main.brand_name.as_deref().map(brand_uuid));
        let material = main.material_uuid.or_else(|| {
            let (name, brand) = (main.material_name.as_deref()?, brand.as_ref()?);
            Some(material_uuid(name, brand))
        });
        let package = main.package_uuid.or_else(|| {
            let (gtin, brand) = (main.gtin?, brand.as_ref()?);
            Some(package_uuid(gtin, brand))
        });
        DerivedUuids {
            brand,
            material,
            package,
            instance: main.instance_uuid,
        }
    }
}
