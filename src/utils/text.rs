use encoding::{DecoderTrap, EncodingRef};
use log::trace;

/// Decodes a NUL padded, fixed size string.
///
/// Everything from the first NUL onwards is dropped; bytes past it are not assumed to be zero.
pub fn decode_fixed_text(bytes: &[u8], ansi_codec: EncodingRef) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = &bytes[..end];

    if text.is_ascii() {
        // Every ansi codec we accept is ascii compatible.
        return text.iter().map(|&b| b as char).collect();
    }

    match ansi_codec.decode(text, DecoderTrap::Replace) {
        Ok(s) => s,
        Err(message) => {
            trace!(
                "failed to decode {} bytes with {}: {}",
                text.len(),
                ansi_codec.name(),
                message
            );
            String::from_utf8_lossy(text).into_owned()
        }
    }
}
