//! Tag image encoding/decoding.
//!
//! An encoded tag is laid out as:
//!
//! ```text
//! [capability container: 4]  (optional)
//! [TLV header: 2 or 4]
//! [URI record]               (optional)
//! [tag record header]
//! [payload: meta | padding | main | padding | aux]
//! [TLV terminator: 1]
//! ```
//!
//! The NDEF message always fills the whole tag. The payload size is derived
//! backward from the tag size, and the layout planner then places the
//! regions inside it, recording the offsets in the meta region so decoding
//! never has to guess.

use log::debug;

use crate::codec::ndef::{
    capability_container, decode_message, decode_uri_payload, encode_record, encode_uri_record,
    find_ndef_message, find_records, record_header_len, tlv_header, Tnf,
};
use crate::codec::region::{decode_region, encode_region};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    AUX_REGION_FRAMING_TAIL, CC_SIZE, CC_SIZE_UNIT, DEFAULT_BLOCK_SIZE, MAX_META_REGION_SIZE,
    MIME_TYPE, MIN_AUX_REGION_SIZE, MIN_MAIN_REGION_SIZE, MIN_MAIN_REGION_SIZE_WITH_AUX,
    NDEF_MAX_SHORT_PAYLOAD, TLV_MAX_SHORT_LENGTH, TLV_TERMINATOR,
};
use crate::model::{AuxRegion, MainRegion, MetaRegion, RegionKind, Tag};
use crate::stats::{RegionStats, RootStats, Stats};

/// Largest NDEF message an extended TLV length can describe.
const MAX_TLV_LENGTH: usize = 0xFFFF;

// =============================================================================
// OPTIONS
// =============================================================================

/// How internal invariant violations are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvariantMode {
    /// Return [`EncodeError::InvariantViolation`].
    #[default]
    Error,
    /// Panic at the failing check. Useful when debugging the planner.
    Panic,
}

/// Options for encoding a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit the 4-byte capability container.
    ///
    /// Without it the image is the CC-bearing image minus its first four
    /// bytes: the tag size still counts the container and every offset is
    /// unchanged.
    pub capability_container: bool,
    pub invariants: InvariantMode,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            capability_container: true,
            invariants: InvariantMode::Error,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_capability_container(mut self) -> Self {
        self.capability_container = false;
        self
    }

    pub fn with_invariants(mut self, invariants: InvariantMode) -> Self {
        self.invariants = invariants;
        self
    }
}

/// Options for decoding a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Expect the image to start with a capability container.
    pub capability_container: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            capability_container: true,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_capability_container(mut self) -> Self {
        self.capability_container = false;
        self
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Framing decisions derived from the tag size alone.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Framing {
    tlv_header: Vec<u8>,
    message_len: usize,
    uri_record: Option<Vec<u8>>,
    long_record: bool,
    payload_start: usize,
    payload_size: usize,
}

fn plan_framing(size: usize, uri: Option<&str>) -> Result<Framing, EncodeError> {
    let insufficient = |available: usize| EncodeError::InsufficientSpace {
        available,
        required: MAX_META_REGION_SIZE,
    };

    // Capability container, short TLV header and terminator.
    let mut message_len = size.checked_sub(CC_SIZE + 2 + 1).ok_or(insufficient(0))?;
    let extended = message_len > TLV_MAX_SHORT_LENGTH;
    if extended {
        message_len -= 2;
    }
    if message_len > MAX_TLV_LENGTH {
        return Err(EncodeError::InvalidTagSize {
            size,
            reason: "is too large for an NDEF TLV",
        });
    }
    // Once the long form is chosen it is kept even if the shrunk message
    // would fit the short one, so the image still fills the tag exactly.
    let tlv_header = tlv_header(message_len, extended);

    let uri_record = uri.map(|uri| encode_uri_record(uri, true, false));
    let preceding = uri_record.as_ref().map_or(0, Vec::len);

    let mut record_header = record_header_len(MIME_TYPE.len(), 0, false);
    let mut payload_size = message_len
        .checked_sub(preceding + record_header)
        .ok_or(insufficient(0))?;
    if payload_size <= MAX_META_REGION_SIZE {
        return Err(insufficient(payload_size));
    }

    // A payload over 255 bytes needs the 4-byte record length, which eats
    // into the payload itself. Like the TLV header, the long form is kept
    // even if the shrunk payload would fit the short one.
    let long_record = payload_size > NDEF_MAX_SHORT_PAYLOAD;
    if long_record {
        let long_header = record_header_len(MIME_TYPE.len(), payload_size, true);
        payload_size -= long_header - record_header;
        record_header = long_header;
    }

    let payload_start = CC_SIZE + tlv_header.len() + preceding + record_header;
    debug!(
        "framing for {} byte tag: TLV header {} bytes, message {} bytes, payload {} bytes at {}",
        size,
        tlv_header.len(),
        message_len,
        payload_size,
        payload_start
    );

    Ok(Framing {
        tlv_header,
        message_len,
        uri_record,
        long_record,
        payload_start,
        payload_size,
    })
}

/// Encodes a tag with default options.
pub fn encode_tag(tag: &mut Tag) -> Result<Vec<u8>, EncodeError> {
    encode_tag_with_options(tag, EncodeOptions::default())
}

/// Encodes a tag into a `tag.size()` byte image (four bytes shorter without
/// the capability container).
///
/// The main region offset (when a meta region size is requested) and the aux
/// region offset are written into the tag's meta region. An aux offset that
/// is already recorded is reused as is. On success the tag's stats are
/// replaced; on failure they are cleared.
pub fn encode_tag_with_options(tag: &mut Tag, options: EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    tag.stats = None;
    let size = tag.size;
    let invariants = options.invariants;

    if options.capability_container {
        if size % CC_SIZE_UNIT != 0 {
            return Err(EncodeError::InvalidTagSize {
                size,
                reason: "must be divisible by 8 to be encodable in the capability container",
            });
        }
        if size / CC_SIZE_UNIT > u8::MAX as usize {
            return Err(EncodeError::InvalidTagSize {
                size,
                reason: "is too big to be representable in the capability container",
            });
        }
    }
    if tag.block_size == 0 {
        return Err(EncodeError::InvalidBlockSize);
    }

    let framing = plan_framing(size, tag.uri.as_deref())?;
    let payload_size = framing.payload_size;
    let payload_start = framing.payload_start;
    let block_size = tag.block_size;

    // Main region offset: explicit meta size, then a previously recorded
    // offset, then directly after the meta region.
    let mut main_offset = None;
    if tag.meta_region_size != 0 {
        tag.meta.main_region_offset = Some(tag.meta_region_size as u64);
        main_offset = Some(tag.meta_region_size);
    } else if let Some(offset) = tag.meta.main_region_offset {
        main_offset = Some(to_usize(offset));
    }

    // The aux region goes first: its offset ends up in the meta region. A
    // recorded offset without a region would announce an aux region that
    // is not there.
    let mut aux = None;
    if tag.aux.is_none() && tag.meta.aux_region_offset.take().is_some() {
        debug!("dropping aux region offset recorded for a tag without an aux region");
    }
    if let Some(region) = &tag.aux {
        if tag.aux_region_size <= MIN_AUX_REGION_SIZE {
            return Err(EncodeError::RegionTooSmall {
                region: RegionKind::Aux,
                available: tag.aux_region_size,
                minimum: MIN_AUX_REGION_SIZE + 1,
            });
        }
        let offset = match tag.meta.aux_region_offset.filter(|&offset| offset != 0) {
            Some(offset) => to_usize(offset),
            None => {
                let offset = payload_size
                    .checked_sub(tag.aux_region_size)
                    .and_then(|offset| {
                        offset.checked_sub((payload_start + offset) % block_size)
                    })
                    .ok_or(EncodeError::RegionTooSmall {
                        region: RegionKind::Main,
                        available: 0,
                        minimum: MIN_MAIN_REGION_SIZE_WITH_AUX,
                    })?;
                tag.meta.aux_region_offset = Some(offset as u64);
                offset
            }
        };
        let bytes = encode_region(region)?;
        let available = payload_size.saturating_sub(offset);
        if bytes.len() > available {
            return Err(EncodeError::RegionOverflow {
                region: RegionKind::Aux,
                size: bytes.len(),
                available,
            });
        }
        aux = Some((offset, bytes));
    }

    let meta = encode_region(&tag.meta)?;
    let main_offset = main_offset.unwrap_or(meta.len());
    if meta.len() > main_offset {
        return Err(EncodeError::RegionOverflow {
            region: RegionKind::Meta,
            size: meta.len(),
            available: main_offset,
        });
    }

    let (main_end, minimum) = match &aux {
        Some((aux_offset, _)) => (*aux_offset, MIN_MAIN_REGION_SIZE_WITH_AUX),
        None => (payload_size, MIN_MAIN_REGION_SIZE),
    };
    let main_available = main_end.checked_sub(main_offset).unwrap_or(0);
    if main_available < minimum {
        return Err(EncodeError::RegionTooSmall {
            region: RegionKind::Main,
            available: main_available,
            minimum,
        });
    }

    let main = encode_region(&tag.main)?;
    if main.len() > main_available {
        return Err(EncodeError::RegionOverflow {
            region: RegionKind::Main,
            size: main.len(),
            available: main_available,
        });
    }
    debug!(
        "layout: meta {} bytes at 0, main {} bytes at {}, aux {}",
        meta.len(),
        main.len(),
        main_offset,
        match &aux {
            Some((offset, bytes)) => format!("{} bytes at {}", bytes.len(), offset),
            None => "absent".to_string(),
        }
    );

    let mut payload = vec![0u8; payload_size];
    place(&mut payload, 0, &meta, invariants)?;
    place(&mut payload, main_offset, &main, invariants)?;
    if let Some((offset, bytes)) = &aux {
        place(&mut payload, *offset, bytes, invariants)?;
    }

    let mut message = Vec::with_capacity(framing.message_len);
    if let Some(uri_record) = &framing.uri_record {
        message.extend_from_slice(uri_record);
    }
    message.extend_from_slice(&encode_record(
        Tnf::Media,
        MIME_TYPE.as_bytes(),
        &payload,
        framing.uri_record.is_none(),
        true,
        framing.long_record,
    ));
    check(invariants, message.len() == framing.message_len, || {
        format!(
            "NDEF message not expected length: expected {}, actual {}",
            framing.message_len,
            message.len()
        )
    })?;

    let mut image = Vec::with_capacity(size);
    image.extend_from_slice(&capability_container(size));
    image.extend_from_slice(&framing.tlv_header);
    image.extend_from_slice(&message);
    image.push(TLV_TERMINATOR);

    check(invariants, image.len() == size, || {
        format!("image length {} does not match tag size {}", image.len(), size)
    })?;
    check(
        invariants,
        image.get(payload_start..payload_start + payload_size) == Some(&payload[..]),
        || format!("payload not at expected offset {}", payload_start),
    )?;

    let aux_stats = aux.as_ref().map(|(offset, bytes)| RegionStats {
        payload_offset: *offset,
        absolute_offset: payload_start + offset,
        size: payload_size - offset,
        used_size: bytes.len(),
    });
    let meta_stats = RegionStats {
        payload_offset: 0,
        absolute_offset: payload_start,
        size: meta.len(),
        used_size: meta.len(),
    };
    let main_stats = RegionStats {
        payload_offset: main_offset,
        absolute_offset: payload_start + main_offset,
        size: payload_size - meta_stats.size - aux_stats.map_or(0, |aux| aux.size),
        used_size: main.len(),
    };
    let overhead = size - payload_size;
    let payload_used_size = meta.len() + main.len() + aux_stats.map_or(0, |aux| aux.used_size);
    tag.stats = Some(Stats {
        root: RootStats {
            data_size: size,
            payload_size,
            overhead,
            payload_used_size,
            total_used_size: payload_used_size + overhead,
        },
        meta: meta_stats,
        main: main_stats,
        aux: aux_stats,
    });

    if !options.capability_container {
        image.drain(..CC_SIZE);
    }
    Ok(image)
}

fn place(
    payload: &mut [u8],
    offset: usize,
    bytes: &[u8],
    invariants: InvariantMode,
) -> Result<(), EncodeError> {
    let len = payload.len();
    match payload.get_mut(offset..offset + bytes.len()) {
        Some(target) => {
            target.copy_from_slice(bytes);
            Ok(())
        }
        None => check(invariants, false, || {
            format!(
                "{} bytes at offset {} overrun the {} byte payload",
                bytes.len(),
                offset,
                len
            )
        }),
    }
}

fn check(
    invariants: InvariantMode,
    condition: bool,
    message: impl FnOnce() -> String,
) -> Result<(), EncodeError> {
    if condition {
        return Ok(());
    }
    let message = message();
    match invariants {
        InvariantMode::Error => Err(EncodeError::InvariantViolation(message)),
        InvariantMode::Panic => panic!("internal invariant violated: {}", message),
    }
}

fn to_usize(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a tag image that starts with a capability container.
pub fn decode_tag(data: &[u8]) -> Result<Tag, DecodeError> {
    decode_tag_with_options(data, DecodeOptions::default())
}

/// Decodes a tag image.
///
/// The decoded tag has default region options and block size. Its size is
/// the image length (plus the capability container if the image has none),
/// and its aux allotment is the span from the aux offset to the end of the
/// payload less the NDEF framing tail, so re-encoding reproduces the layout.
pub fn decode_tag_with_options(data: &[u8], options: DecodeOptions) -> Result<Tag, DecodeError> {
    let message = find_ndef_message(data, options.capability_container)?;
    let records = decode_message(message)?;
    let (payload, uri) = find_records(&records, MIME_TYPE)?;
    let uri = uri.map(decode_uri_payload).transpose()?;

    let (meta, meta_len) = decode_region::<MetaRegion>(payload)?;
    let main_offset = match meta.main_region_offset {
        Some(offset) => region_offset(RegionKind::Main, offset, payload.len())?,
        None => meta_len,
    };
    let main_data = payload
        .get(main_offset..)
        .ok_or(DecodeError::RegionOutOfBounds {
            region: RegionKind::Main,
            offset: main_offset,
            len: payload.len(),
        })?;
    let (main, _) = decode_region::<MainRegion>(main_data)?;

    let mut aux = None;
    let mut aux_region_size = 0;
    // Offset 0 is the meta region itself and means no aux region.
    if let Some(offset) = meta.aux_region_offset.filter(|&offset| offset != 0) {
        let offset = region_offset(RegionKind::Aux, offset, payload.len())?;
        let (region, _) = decode_region::<AuxRegion>(&payload[offset..])?;
        aux = Some(region);
        aux_region_size = (payload.len() - offset).saturating_sub(AUX_REGION_FRAMING_TAIL);
    }
    debug!(
        "decoded {} byte payload: main at {}, aux at {:?}",
        payload.len(),
        main_offset,
        meta.aux_region_offset
    );

    let size = if options.capability_container {
        data.len()
    } else {
        data.len() + CC_SIZE
    };

    Ok(Tag {
        meta,
        main,
        aux,
        size,
        block_size: DEFAULT_BLOCK_SIZE,
        uri,
        meta_region_size: 0,
        aux_region_size,
        stats: None,
    })
}

fn region_offset(region: RegionKind, offset: u64, len: usize) -> Result<usize, DecodeError> {
    let offset = to_usize(offset);
    if offset >= len {
        return Err(DecodeError::RegionOutOfBounds { region, offset, len });
    }
    Ok(offset)
}
