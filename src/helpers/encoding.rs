//! Byte-to-text decoding for delimited files produced by different tools.
//!
//! Files written by spreadsheet software on Russian-locale Windows are often
//! plain Windows-1251, newer tooling writes UTF-8 with or without a BOM.

use crate::config::ConfigError;
use crate::error::UpdError;
use encoding_rs::Encoding;
use tracing::debug;

/// Decodes raw file content to a string.
///
/// The order of detection is: byte order mark, valid UTF-8, then the fallback
/// Windows code page.
pub(crate) fn decode_text(bytes: &[u8], fallback_code_page: u16) -> Result<String, UpdError> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return Ok(text.into_owned());
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_owned());
    }

    let encoding = codepage::to_encoding(fallback_code_page).ok_or_else(|| {
        ConfigError::Invalid(format!("unsupported code page {}", fallback_code_page))
    })?;
    debug!("Decoding text as {}", encoding.name());
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        debug!("Malformed sequences replaced while decoding as {}", encoding.name());
    }
    Ok(text.into_owned())
}
