use staticdeploy_engine::content_type::{ContentTypeResolver, OCTET_STREAM, TEXT_PLAIN, sniff};
use std::collections::BTreeMap;

#[test]
fn common_web_extensions() {
    let resolver = ContentTypeResolver::new();
    assert_eq!(resolver.resolve("index.html", b""), "text/html");
    assert_eq!(resolver.resolve("data.json", b""), "application/json");
    assert_eq!(resolver.resolve("logo.svg", b""), "image/svg+xml");
}

#[test]
fn extension_beats_sniffing() {
    let resolver = ContentTypeResolver::new();
    // GIF magic under a .txt name stays text/plain.
    assert_eq!(resolver.resolve("notes.txt", b"GIF89a"), "text/plain");
}

#[test]
fn unknown_extension_falls_back_to_magic_bytes() {
    let resolver = ContentTypeResolver::new();
    assert_eq!(resolver.resolve("blob.zzq", b"GIF89a\x01\x00"), "image/gif");
    assert_eq!(resolver.resolve("doc", b"%PDF-1.7\n"), "application/pdf");
}

#[test]
fn unknown_binary_is_octet_stream() {
    let resolver = ContentTypeResolver::new();
    assert_eq!(resolver.resolve("blob", &[0u8, 159, 146, 150]), OCTET_STREAM);
}

#[test]
fn unknown_text_is_plain_utf8() {
    let resolver = ContentTypeResolver::new();
    assert_eq!(resolver.resolve("CHANGELOG", "ünïcode\nlines\n".as_bytes()), TEXT_PLAIN);
}

#[test]
fn overrides_are_case_insensitive() {
    let mut overrides = BTreeMap::new();
    overrides.insert("JS".to_string(), "application/javascript".to_string());
    let resolver = ContentTypeResolver::with_overrides(&overrides);

    assert_eq!(resolver.resolve("bundle.js", b""), "application/javascript");
    assert_eq!(resolver.resolve("bundle.JS", b""), "application/javascript");
}

#[test]
fn control_characters_mark_binary() {
    assert_eq!(sniff(b"abc\x07def"), OCTET_STREAM);
    assert_eq!(sniff(b"tab\tand\r\nnewline"), TEXT_PLAIN);
}
