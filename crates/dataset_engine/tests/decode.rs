use std::io::Write;

use dataset_engine::{decode_payload, DecodeError, GZIP_MAGIC};
use flate2::write::GzEncoder;
use flate2::Compression;

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn gzip_payload_is_inflated() {
    let text = r#"[{"title":"Sofa – like new","price":80}]"#;
    let compressed = gzip(text.as_bytes());
    assert!(compressed.starts_with(&GZIP_MAGIC));

    let decoded = decode_payload(&compressed).unwrap();
    assert!(decoded.was_gzip);
    assert_eq!(decoded.text, text);
}

#[test]
fn concatenated_gzip_members_are_all_read() {
    let mut compressed = gzip(b"{\"a\":1}\n");
    compressed.extend(gzip(b"{\"a\":2}\n"));

    let decoded = decode_payload(&compressed).unwrap();
    assert_eq!(decoded.text, "{\"a\":1}\n{\"a\":2}\n");
}

#[test]
fn plain_payload_is_decoded_directly() {
    let decoded = decode_payload("{\"émoji\":\"✓\"}".as_bytes()).unwrap();
    assert!(!decoded.was_gzip);
    assert_eq!(decoded.text, "{\"émoji\":\"✓\"}");
}

#[test]
fn byte_order_mark_is_dropped() {
    let decoded = decode_payload(b"\xEF\xBB\xBF[1,2]").unwrap();
    assert_eq!(decoded.text, "[1,2]");
}

#[test]
fn truncated_gzip_is_a_decompression_error() {
    let compressed = gzip(b"[{\"a\":1},{\"a\":2},{\"a\":3}]");
    let truncated = &compressed[..compressed.len() / 2];
    assert!(matches!(
        decode_payload(truncated),
        Err(DecodeError::Decompression(_))
    ));
}

#[test]
fn magic_alone_is_not_enough() {
    assert!(matches!(
        decode_payload(&[0x1F, 0x8B, 0x00, 0x01, 0x02]),
        Err(DecodeError::Decompression(_))
    ));
}

#[test]
fn invalid_utf8_is_an_encoding_error() {
    assert_eq!(decode_payload(&[b'[', 0xFF, 0xFE, b']']), Err(DecodeError::Encoding));
    assert_eq!(decode_payload(&gzip(&[0xC3, 0x28])), Err(DecodeError::Encoding));
}

#[test]
fn single_magic_byte_is_plain_text_attempt() {
    // 0x1F alone is a valid (control) UTF-8 character, not a gzip header.
    let decoded = decode_payload(&[0x1F]).unwrap();
    assert!(!decoded.was_gzip);
    assert_eq!(decoded.text, "\u{1F}");
}

#[test]
fn nul_padding_after_members_is_skipped() {
    let mut compressed = gzip(b"{\"a\":1}\n");
    compressed.extend_from_slice(&[0, 0, 0]);
    compressed.extend(gzip(b"{\"a\":2}\n"));
    compressed.extend_from_slice(&[0, 0, 0, 0]);

    let decoded = decode_payload(&compressed).unwrap();
    assert!(decoded.was_gzip);
    assert_eq!(decoded.text, "{\"a\":1}\n{\"a\":2}\n");
}

#[test]
fn trailing_garbage_after_member_is_rejected() {
    let mut compressed = gzip(b"[1]");
    compressed.extend_from_slice(b"junk");
    assert!(matches!(
        decode_payload(&compressed),
        Err(DecodeError::Decompression(_))
    ));
}
