//! Capability container, TLV and NDEF record framing.
//!
//! Only what a tag image needs: short and long records, the well-known URI
//! record type and MIME media records. Chunked records are rejected.

use log::warn;

use crate::error::DecodeError;
use crate::limits::{
    CC_FEATURES, CC_MAGIC, CC_SIZE, CC_SIZE_UNIT, CC_VERSION, NDEF_MAX_SHORT_PAYLOAD,
    TLV_EXTENDED_LENGTH, TLV_MAX_SHORT_LENGTH, TLV_NDEF_MESSAGE, TLV_TERMINATOR,
};

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// Type name format of an NDEF record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tnf {
    Empty = 0,
    WellKnown = 1,
    Media = 2,
    AbsoluteUri = 3,
    External = 4,
    Unknown = 5,
    Unchanged = 6,
    Reserved = 7,
}

impl Tnf {
    fn from_bits(bits: u8) -> Tnf {
        match bits & TNF_MASK {
            0 => Tnf::Empty,
            1 => Tnf::WellKnown,
            2 => Tnf::Media,
            3 => Tnf::AbsoluteUri,
            4 => Tnf::External,
            5 => Tnf::Unknown,
            6 => Tnf::Unchanged,
            _ => Tnf::Reserved,
        }
    }
}

/// Record type of the well-known URI record.
pub const URI_RECORD_TYPE: &[u8] = b"U";

/// URI identifier codes (NFC Forum URI RTD), indexed by code.
const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

// =============================================================================
// CAPABILITY CONTAINER / TLV
// =============================================================================

/// Builds the 4-byte capability container for a tag of `size` bytes.
///
/// The caller guarantees `size / 8` fits in a byte.
pub fn capability_container(size: usize) -> [u8; CC_SIZE] {
    [CC_MAGIC, CC_VERSION, (size / CC_SIZE_UNIT) as u8, CC_FEATURES]
}

/// Builds an NDEF message TLV header for a message of `len` bytes.
///
/// The three-byte length form is used when `len` needs it or when
/// `extended` asks for it.
pub fn tlv_header(len: usize, extended: bool) -> Vec<u8> {
    if !extended && len <= TLV_MAX_SHORT_LENGTH {
        vec![TLV_NDEF_MESSAGE, len as u8]
    } else {
        vec![
            TLV_NDEF_MESSAGE,
            TLV_EXTENDED_LENGTH,
            (len >> 8) as u8,
            (len & 0xFF) as u8,
        ]
    }
}

/// Returns the bytes following the first NDEF message TLV header.
///
/// Checks the capability container magic first when `capability_container`
/// is set. Other TLV blocks are skipped; a terminator or the end of input
/// before an NDEF TLV means there is no message.
pub fn find_ndef_message(data: &[u8], capability_container: bool) -> Result<&[u8], DecodeError> {
    let mut pos = 0;
    if capability_container {
        let cc = data.get(..CC_SIZE).ok_or(DecodeError::UnexpectedEof {
            context: "capability container",
        })?;
        if cc[0] != CC_MAGIC {
            return Err(DecodeError::InvalidCapabilityContainer { found: cc[0] });
        }
        pos = CC_SIZE;
    }

    loop {
        let (tag, len) = match data.get(pos..pos + 2) {
            Some(&[tag, len]) => (tag, len),
            _ => return Err(DecodeError::NdefNotFound),
        };
        if tag == TLV_TERMINATOR {
            return Err(DecodeError::NdefNotFound);
        }
        pos += 2;

        let mut block_len = len as usize;
        if len == TLV_EXTENDED_LENGTH {
            let ext = data.get(pos..pos + 2).ok_or(DecodeError::UnexpectedEof {
                context: "TLV extended length",
            })?;
            block_len = u16::from_be_bytes([ext[0], ext[1]]) as usize;
            pos += 2;
        }

        if tag == TLV_NDEF_MESSAGE {
            if pos >= data.len() {
                return Err(DecodeError::MalformedNdef {
                    context: "empty NDEF message",
                });
            }
            return Ok(&data[pos..]);
        }

        pos += block_len;
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A decoded NDEF record borrowing from the tag image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub tnf: Tnf,
    pub record_type: &'a [u8],
    pub id: &'a [u8],
    pub payload: &'a [u8],
}

/// Encodes one record.
///
/// Short form is used when the payload fits a byte, unless `long` forces
/// the 4-byte payload length.
pub fn encode_record(
    tnf: Tnf,
    record_type: &[u8],
    payload: &[u8],
    message_begin: bool,
    message_end: bool,
    long: bool,
) -> Vec<u8> {
    let short = !long && payload.len() <= NDEF_MAX_SHORT_PAYLOAD;
    let mut flags = tnf as u8;
    if message_begin {
        flags |= FLAG_MB;
    }
    if message_end {
        flags |= FLAG_ME;
    }
    if short {
        flags |= FLAG_SR;
    }

    let mut out = Vec::with_capacity(6 + record_type.len() + payload.len());
    out.push(flags);
    out.push(record_type.len() as u8);
    if short {
        out.push(payload.len() as u8);
    } else {
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    }
    out.extend_from_slice(record_type);
    out.extend_from_slice(payload);
    out
}

/// Returns the header size of a record with this type and payload length.
pub fn record_header_len(record_type_len: usize, payload_len: usize, long: bool) -> usize {
    let length_field = if long || payload_len > NDEF_MAX_SHORT_PAYLOAD { 4 } else { 1 };
    2 + length_field + record_type_len
}

/// Encodes a well-known URI record, abbreviating the longest known prefix.
pub fn encode_uri_record(uri: &str, message_begin: bool, message_end: bool) -> Vec<u8> {
    encode_record(
        Tnf::WellKnown,
        URI_RECORD_TYPE,
        &uri_payload(uri),
        message_begin,
        message_end,
        false,
    )
}

fn uri_payload(uri: &str) -> Vec<u8> {
    let (code, prefix) = URI_PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, prefix)| uri.starts_with(*prefix))
        .max_by_key(|(_, prefix)| prefix.len())
        .unwrap_or((0, &""));
    let mut payload = Vec::with_capacity(1 + uri.len() - prefix.len());
    payload.push(code as u8);
    payload.extend_from_slice(&uri.as_bytes()[prefix.len()..]);
    payload
}

/// Expands a URI record payload back into the full URI.
pub fn decode_uri_payload(payload: &[u8]) -> Result<String, DecodeError> {
    let (&code, rest) = payload.split_first().ok_or(DecodeError::MalformedNdef {
        context: "empty URI record",
    })?;
    let rest = std::str::from_utf8(rest).map_err(|_| DecodeError::MalformedNdef {
        context: "URI is not UTF-8",
    })?;
    // Reserved codes carry no prefix.
    let prefix = URI_PREFIXES.get(code as usize).copied().unwrap_or("");
    Ok(format!("{}{}", prefix, rest))
}

/// Decodes records until one carries the message-end flag.
pub fn decode_message(data: &[u8]) -> Result<Vec<Record<'_>>, DecodeError> {
    let mut records = Vec::new();
    let mut pos = 0;

    loop {
        let flags = take(data, &mut pos, 1, "NDEF record header")?[0];
        if flags & FLAG_CF != 0 {
            return Err(DecodeError::MalformedNdef {
                context: "chunked records are not supported",
            });
        }
        if records.is_empty() && flags & FLAG_MB == 0 {
            return Err(DecodeError::MalformedNdef {
                context: "first record lacks the message-begin flag",
            });
        }

        let type_len = take(data, &mut pos, 1, "NDEF type length")?[0] as usize;
        let payload_len = if flags & FLAG_SR != 0 {
            take(data, &mut pos, 1, "NDEF payload length")?[0] as usize
        } else {
            let b = take(data, &mut pos, 4, "NDEF payload length")?;
            u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize
        };
        let id_len = if flags & FLAG_IL != 0 {
            take(data, &mut pos, 1, "NDEF id length")?[0] as usize
        } else {
            0
        };

        let record_type = take(data, &mut pos, type_len, "NDEF record type")?;
        let id = take(data, &mut pos, id_len, "NDEF record id")?;
        let payload = take(data, &mut pos, payload_len, "NDEF payload")?;

        records.push(Record {
            tnf: Tnf::from_bits(flags),
            record_type,
            id,
            payload,
        });

        if flags & FLAG_ME != 0 {
            return Ok(records);
        }
    }
}

fn take<'a>(
    data: &'a [u8],
    pos: &mut usize,
    n: usize,
    context: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let end = pos
        .checked_add(n)
        .filter(|&end| end <= data.len())
        .ok_or(DecodeError::UnexpectedEof { context })?;
    let bytes = &data[*pos..end];
    *pos = end;
    Ok(bytes)
}

/// Locates the tag record (by MIME type) and any URI record in a message.
///
/// When a type occurs more than once the last occurrence wins.
pub fn find_records<'a>(
    records: &[Record<'a>],
    mime_type: &str,
) -> Result<(&'a [u8], Option<&'a [u8]>), DecodeError> {
    let mut payload = None;
    let mut uri = None;
    for record in records {
        if record.record_type == URI_RECORD_TYPE {
            if uri.is_some() {
                warn!("NDEF message carries more than one URI record");
            }
            uri = Some(record.payload);
        }
        if record.record_type == mime_type.as_bytes() {
            if payload.is_some() {
                warn!("NDEF message carries more than one {} record", mime_type);
            }
            payload = Some(record.payload);
        }
    }
    let payload = payload.ok_or(DecodeError::RecordNotFound {
        record_type: "open print tag",
    })?;
    Ok((payload, uri))
}
