//! Byte decoding for legacy source exports.

use encoding_rs::{Encoding, WINDOWS_1251};
use log::warn;

use crate::error::{Result, TransitError};

/// BOM artifact some upstream tools prepend before re-saving the file in
/// its original code page.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Resolves an encoding label, defaulting to the windows-1251 code page
/// the source systems emit.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| TransitError::UnknownEncoding(value.to_string())),
        None => Ok(WINDOWS_1251),
    }
}

/// Decodes raw input bytes with a fixed code page.
///
/// A leading UTF-8 BOM is stripped before decoding; BOM sniffing is
/// disabled so the artifact cannot silently switch the decode to UTF-8.
/// Unmappable bytes become replacement characters with a warning instead
/// of failing the load.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM.as_slice()).unwrap_or(bytes);
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        warn!(
            "input has bytes that do not map under {}; replacement characters inserted",
            encoding.name()
        );
    }
    text.into_owned()
}
