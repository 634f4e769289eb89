use std::io::Read;

use encoding_rs::UTF_8;
use flate2::bufread::GzDecoder;

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub was_gzip: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decompress gzip stream: {0}")]
    Decompression(String),
    #[error("payload is not valid UTF-8")]
    Encoding,
}

/// Decode a fetched body into text.
///
/// Compression is detected by sniffing the gzip magic number, never from
/// response headers. A leading UTF-8 BOM is dropped.
pub fn decode_payload(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let inflated = inflate_members(bytes)?;
        return Ok(DecodedText {
            text: decode_utf8(&inflated)?,
            was_gzip: true,
        });
    }
    Ok(DecodedText {
        text: decode_utf8(bytes)?,
        was_gzip: false,
    })
}

/// Inflates consecutive gzip members. NUL padding after a member is skipped.
fn inflate_members(mut input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut inflated = Vec::new();
    while !input.is_empty() {
        let mut member = GzDecoder::new(input);
        member
            .read_to_end(&mut inflated)
            .map_err(|err| DecodeError::Decompression(err.to_string()))?;
        input = member.into_inner();
        let padding = input.iter().take_while(|byte| **byte == 0).count();
        input = &input[padding..];
    }
    Ok(inflated)
}

fn decode_utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(DecodeError::Encoding);
    }
    Ok(text.into_owned())
}
