//! Byte-range access to a tag's memory.
//!
//! The transport layer (an NFC reader, a file, a buffer) only needs to move
//! bytes. Everything it must know about alignment is in the
//! [`TagStorage::write`] contract, which the layout planner already honors
//! for the aux region.

use log::debug;

use crate::codec::tag::{DecodeOptions, EncodeOptions};
use crate::error::{StorageError, TagIoError};
use crate::limits::{CC_SIZE, DEFAULT_BLOCK_SIZE};
use crate::model::Tag;

/// Block-addressed tag memory.
pub trait TagStorage {
    /// Write granularity in bytes.
    fn block_size(&self) -> usize;

    /// Total user memory in bytes.
    fn capacity(&self) -> usize;

    /// Reads `len` bytes starting at `start`.
    fn read(&mut self, start: usize, len: usize) -> Result<Vec<u8>, StorageError>;

    /// Writes `data` at `start`.
    ///
    /// `start` must be a multiple of the block size. A final partial block
    /// is padded with zero bytes.
    fn write(&mut self, start: usize, data: &[u8]) -> Result<(), StorageError>;
}

/// Tag memory held in a byte vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStorage {
    data: Vec<u8>,
    block_size: usize,
}

impl MemoryStorage {
    /// Creates zeroed memory of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Wraps an existing memory image.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Sets the block size. Zero is treated as one.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl TagStorage for MemoryStorage {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn read(&mut self, start: usize, len: usize) -> Result<Vec<u8>, StorageError> {
        let capacity = self.data.len();
        let end = start
            .checked_add(len)
            .filter(|&end| end <= capacity)
            .ok_or(StorageError::OutOfBounds {
                start,
                end: start.saturating_add(len),
                capacity,
            })?;
        Ok(self.data[start..end].to_vec())
    }

    fn write(&mut self, start: usize, data: &[u8]) -> Result<(), StorageError> {
        if start % self.block_size != 0 {
            return Err(StorageError::Misaligned {
                start,
                block_size: self.block_size,
            });
        }
        let capacity = self.data.len();
        let end = start
            .checked_add(data.len())
            .filter(|&end| end <= capacity)
            .ok_or(StorageError::OutOfBounds {
                start,
                end: start.saturating_add(data.len()),
                capacity,
            })?;
        self.data[start..end].copy_from_slice(data);

        let padded_end = end.div_ceil(self.block_size) * self.block_size;
        let padded_end = padded_end.min(capacity);
        self.data[end..padded_end].fill(0);
        Ok(())
    }
}

impl Tag {
    /// Encodes the tag and writes the whole image at the start of `storage`.
    ///
    /// The tag adopts the storage block size, so the aux region lands on a
    /// block boundary. A tag without a size takes the storage capacity (plus
    /// the capability container when it is left out, since the size always
    /// counts it).
    pub fn write_to<S: TagStorage>(
        &mut self,
        storage: &mut S,
        options: EncodeOptions,
    ) -> Result<(), TagIoError> {
        self.block_size = storage.block_size();
        if self.size == 0 {
            self.size = if options.capability_container {
                storage.capacity()
            } else {
                storage.capacity() + CC_SIZE
            };
        }
        let image = self.encode_with_options(options)?;
        debug!("writing {} byte tag image", image.len());
        storage.write(0, &image)?;
        Ok(())
    }

    /// Re-encodes the tag and rewrites only the span from the aux region to
    /// the end of the image.
    ///
    /// The aux region's absolute offset is block aligned, so the write
    /// starts on a block boundary and the main region's blocks are left
    /// untouched. Returns the number of bytes written, zero if the tag has
    /// no aux region.
    pub fn write_aux_region<S: TagStorage>(
        &mut self,
        storage: &mut S,
        options: EncodeOptions,
    ) -> Result<usize, TagIoError> {
        if self.aux.is_none() {
            return Ok(0);
        }
        let image = self.encode_with_options(options)?;
        let Some(aux) = self.stats.and_then(|stats| stats.aux) else {
            return Ok(0);
        };

        let skipped = if options.capability_container { 0 } else { CC_SIZE };
        let start = aux.absolute_offset - skipped;
        let start = start - start % storage.block_size().max(1);
        debug!("writing aux span of {} bytes at {}", image.len() - start, start);
        storage.write(start, &image[start..])?;
        Ok(image.len() - start)
    }

    /// Reads the whole storage and decodes it.
    pub fn read_from<S: TagStorage>(
        storage: &mut S,
        options: DecodeOptions,
    ) -> Result<Tag, TagIoError> {
        let capacity = storage.capacity();
        let image = storage.read(0, capacity)?;
        let mut tag = Tag::decode_with_options(&image, options)?;
        tag.block_size = storage.block_size();
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaterialClass;

    #[test]
    fn test_memory_storage_padding() {
        let mut storage = MemoryStorage::from_bytes(vec![0xAA; 12]);
        storage.write(4, &[1, 2]).unwrap();
        assert_eq!(
            storage.as_bytes(),
            &[0xAA, 0xAA, 0xAA, 0xAA, 1, 2, 0, 0, 0xAA, 0xAA, 0xAA, 0xAA]
        );
        assert_eq!(storage.read(4, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_memory_storage_errors() {
        let mut storage = MemoryStorage::new(8);
        assert_eq!(
            storage.write(2, &[1]),
            Err(StorageError::Misaligned {
                start: 2,
                block_size: 4
            })
        );
        assert_eq!(
            storage.write(4, &[0; 5]),
            Err(StorageError::OutOfBounds {
                start: 4,
                end: 9,
                capacity: 8
            })
        );
        assert!(storage.read(6, 4).is_err());
    }

    #[test]
    fn test_write_and_read_back() {
        let mut storage = MemoryStorage::new(304);
        let mut tag = Tag::new().with_aux_region_size(32);
        tag.main_mut().material_class = Some(MaterialClass::FFF);
        tag.write_to(&mut storage, EncodeOptions::default()).unwrap();
        assert_eq!(tag.size(), 304);

        let read = Tag::read_from(&mut storage, DecodeOptions::default()).unwrap();
        assert_eq!(read.main().material_class, Some(MaterialClass::FFF));
        assert_eq!(read.aux_region_size(), 32);
    }

    #[test]
    fn test_write_aux_region_only() {
        let mut storage = MemoryStorage::new(304);
        let mut tag = Tag::new().with_aux_region_size(32);
        tag.main_mut().material_class = Some(MaterialClass::FFF);
        tag.write_to(&mut storage, EncodeOptions::default()).unwrap();
        let before = storage.as_bytes().to_vec();

        tag.aux_region_mut().consumed_weight = Some(250.0);
        // A main region change must not reach storage through an aux write.
        tag.main_mut().material_class = Some(MaterialClass::SLA);
        let written = tag
            .write_aux_region(&mut storage, EncodeOptions::default())
            .unwrap();
        assert_eq!(written, 304 - 268);
        assert_eq!(&storage.as_bytes()[..268], &before[..268]);

        let read = Tag::read_from(&mut storage, DecodeOptions::default()).unwrap();
        assert_eq!(read.aux().unwrap().consumed_weight, Some(250.0));
        assert_eq!(read.main().material_class, Some(MaterialClass::FFF));
    }

    #[test]
    fn test_without_capability_container() {
        let mut storage = MemoryStorage::new(300);
        let mut tag = Tag::new().with_aux_region_size(32);
        let options = EncodeOptions::new().without_capability_container();
        tag.write_to(&mut storage, options).unwrap();
        assert_eq!(tag.size(), 304);

        tag.aux_region_mut().consumed_weight = Some(1.0);
        assert_eq!(tag.write_aux_region(&mut storage, options).unwrap(), 300 - 264);

        let read = Tag::read_from(
            &mut storage,
            DecodeOptions::new().without_capability_container(),
        )
        .unwrap();
        assert_eq!(read.aux().unwrap().consumed_weight, Some(1.0));
    }

    #[test]
    fn test_aux_region_aligned_to_storage_blocks() {
        let mut storage = MemoryStorage::new(304).with_block_size(8);
        let mut tag = Tag::new().with_aux_region_size(32);
        tag.main_mut().material_class = Some(MaterialClass::FFF);
        tag.write_to(&mut storage, EncodeOptions::default()).unwrap();
        assert_eq!(tag.block_size(), 8);
        let aux = tag.stats().unwrap().aux.unwrap();
        assert_eq!(aux.absolute_offset, 264);
        assert_eq!(aux.absolute_offset % 8, 0);
        let before = storage.as_bytes().to_vec();

        tag.aux_region_mut().consumed_weight = Some(5.0);
        let written = tag
            .write_aux_region(&mut storage, EncodeOptions::default())
            .unwrap();
        assert_eq!(written, 304 - 264);
        assert_eq!(&storage.as_bytes()[..264], &before[..264]);

        let read = Tag::read_from(&mut storage, DecodeOptions::default()).unwrap();
        assert_eq!(read.aux().unwrap().consumed_weight, Some(5.0));
        assert_eq!(read.main().material_class, Some(MaterialClass::FFF));
    }

    #[test]
    fn test_no_aux_region_writes_nothing() {
        let mut storage = MemoryStorage::new(304);
        let mut tag = Tag::new();
        tag.write_to(&mut storage, EncodeOptions::default()).unwrap();
        assert_eq!(
            tag.write_aux_region(&mut storage, EncodeOptions::default())
                .unwrap(),
            0
        );
    }
}
