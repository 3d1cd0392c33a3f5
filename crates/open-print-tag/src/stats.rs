//! Byte accounting from the most recent encode.
//!
//! Stats are diagnostic only. They are produced by a successful encode,
//! kept on the [`Tag`](crate::Tag) until the next one, and never written to
//! the tag image.

use std::fmt;

/// Whole-tag accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootStats {
    /// Total tag size, including the capability container.
    pub data_size: usize,
    /// Bytes available to the three regions.
    pub payload_size: usize,
    /// Framing bytes: `data_size - payload_size`.
    pub overhead: usize,
    /// Bytes actually occupied by region encodings.
    pub payload_used_size: usize,
    /// `payload_used_size + overhead`.
    pub total_used_size: usize,
}

/// Placement and usage of a single region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    /// Offset from the start of the payload.
    pub payload_offset: usize,
    /// Offset from the start of the tag image.
    pub absolute_offset: usize,
    /// Bytes allotted to the region.
    pub size: usize,
    /// Bytes the region's encoding occupies.
    pub used_size: usize,
}

impl RegionStats {
    /// Allotted bytes not used by the encoding.
    pub fn free_size(&self) -> usize {
        self.size.saturating_sub(self.used_size)
    }
}

/// Accounting for a whole encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub root: RootStats,
    pub meta: RegionStats,
    pub main: RegionStats,
    /// `None` when the tag has no aux region.
    pub aux: Option<RegionStats>,
}

impl fmt::Display for RegionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset {} (absolute {}), {}/{} bytes used",
            self.payload_offset, self.absolute_offset, self.used_size, self.size
        )
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = &self.root;
        writeln!(
            f,
            "tag: {} bytes, payload {} bytes, overhead {} bytes, {} bytes used ({} in payload)",
            root.data_size,
            root.payload_size,
            root.overhead,
            root.total_used_size,
            root.payload_used_size
        )?;
        writeln!(f, "meta: {}", self.meta)?;
        write!(f, "main: {}", self.main)?;
        if let Some(aux) = &self.aux {
            write!(f, "\naux: {}", aux)?;
        }
        Ok(())
    }
}
