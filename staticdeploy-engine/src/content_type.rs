//! Content-type resolution for uploaded objects.
//!
//! Order: operator overrides, the extension table, magic-byte sniffing, and
//! finally a text/binary guess.

use std::collections::BTreeMap;
use std::path::Path;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolves the `Content-Type` an archive entry is uploaded with.
#[derive(Clone, Debug, Default)]
pub struct ContentTypeResolver {
    /// Lowercased extension to MIME type.
    overrides: BTreeMap<String, String>,
}

impl ContentTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        Self {
            overrides: overrides
                .iter()
                .map(|(ext, mime)| (ext.to_ascii_lowercase(), mime.clone()))
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str, payload: &[u8]) -> String {
        self.lookup_extension(name)
            .unwrap_or_else(|| sniff(payload).to_string())
    }

    /// Extension-table lookup only.
    pub fn lookup_extension(&self, name: &str) -> Option<String> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        if let Some(mime) = self.overrides.get(&ext) {
            return Some(mime.clone());
        }
        mime_guess::from_ext(&ext).first_raw().map(str::to_string)
    }
}

/// Guesses a content type from the leading bytes of a payload.
pub fn sniff(payload: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(payload) {
        return kind.mime_type();
    }
    if looks_like_text(payload) {
        TEXT_PLAIN
    } else {
        OCTET_STREAM
    }
}

fn looks_like_text(payload: &[u8]) -> bool {
    let head = &payload[..payload.len().min(512)];
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // A multi-byte sequence cut at the window edge is still text.
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&head[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };
    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c'))
}
