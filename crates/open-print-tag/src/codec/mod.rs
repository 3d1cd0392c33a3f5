//! Binary encoding/decoding for OpenPrintTag.
//!
//! Layers, innermost first:
//! - `primitives` / `float`: the CBOR subset regions are written in
//! - `region`: one region as a CBOR map
//! - `ndef`: capability container, TLV and NDEF record framing
//! - `tag`: the layout planner and the full tag image

pub mod float;
pub mod ndef;
pub mod primitives;
pub mod region;
pub mod tag;

pub use float::{compress_float, shortest_float, FloatWidth};
pub use primitives::{Reader, Writer};
pub use region::{decode_region, encode_region};
pub use tag::{
    decode_tag, decode_tag_with_options, encode_tag, encode_tag_with_options, DecodeOptions,
    EncodeOptions, InvariantMode,
};
