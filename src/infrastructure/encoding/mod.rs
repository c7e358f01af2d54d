// ============================================================
// ENCODING INFRASTRUCTURE
// ============================================================
// BOM/byte-range detection and encoding_rs based codec

mod codec;
mod detector;

pub use codec::{
    decode, encode, encode_like_source, find_unmappable, resolve_encoding, Decoded, Unmappable,
};
pub use detector::{detect_encoding, SourceEncoding};
