//! Text decoding with an ordered encoding fallback chain.

use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result of decoding raw bytes to text.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    /// Label of the candidate that decoded the bytes, as configured.
    pub encoding: String,
    /// Set when no candidate decoded strictly and replacement characters
    /// were substituted.
    pub lossy: bool,
}

/// Resolve an encoding label such as `utf-8`, `latin-1` or `cp1252`.
///
/// Labels follow the WHATWG registry; spellings that only differ by `-`/`_`
/// (`latin-1` for `latin1`) are accepted too.
pub fn resolve_encoding(label: &str) -> Option<&'static Encoding> {
    let trimmed = label.trim();
    Encoding::for_label(trimmed.as_bytes()).or_else(|| {
        let compact: String = trimmed
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect();
        Encoding::for_label(compact.as_bytes())
    })
}

fn strip_utf8_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Decode `bytes` with the first candidate that succeeds without replacement.
///
/// When every candidate fails the bytes are decoded as UTF-8 with
/// replacement characters and the result is flagged as lossy.
pub fn decode_with_fallback(bytes: &[u8], candidates: &[String]) -> DecodedText {
    for label in candidates {
        let Some(encoding) = resolve_encoding(label) else {
            debug!("Skipping unknown encoding label '{}'", label);
            continue;
        };

        let payload = if encoding == UTF_8 {
            strip_utf8_bom(bytes)
        } else {
            bytes
        };

        match encoding.decode_without_bom_handling_and_without_replacement(payload) {
            Some(text) => {
                debug!("Decoded {} bytes as {}", bytes.len(), label);
                return DecodedText {
                    text: text.into_owned(),
                    encoding: label.clone(),
                    lossy: false,
                };
            }
            None => debug!("Decoding as {} failed, trying next candidate", label),
        }
    }

    warn!("No candidate encoding decoded the input cleanly; using lossy UTF-8");
    let (text, _) = UTF_8.decode_without_bom_handling(strip_utf8_bom(bytes));
    DecodedText {
        text: text.into_owned(),
        encoding: UTF_8.name().to_ascii_lowercase(),
        lossy: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_common_labels() {
        assert_eq!(resolve_encoding("utf-8"), Some(UTF_8));
        assert!(resolve_encoding("latin-1").is_some());
        assert!(resolve_encoding("cp1252").is_some());
        assert!(resolve_encoding("ISO-8859-1").is_some());
        assert!(resolve_encoding("not-an-encoding").is_none());
    }

    #[test]
    fn test_utf8_wins_first() {
        let decoded = decode_with_fallback("name\nZoë\n".as_bytes(), &labels(&["utf-8", "latin-1"]));
        assert_eq!(decoded.encoding, "utf-8");
        assert!(decoded.text.contains("Zoë"));
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_falls_back_to_single_byte_encoding() {
        let bytes = b"city\nM\xfcnchen\n";
        let decoded = decode_with_fallback(bytes, &labels(&["utf-8", "latin-1"]));
        assert_eq!(decoded.encoding, "latin-1");
        assert!(decoded.text.contains("München"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let decoded = decode_with_fallback(b"\xEF\xBB\xBFa,b\n1,2\n", &labels(&["utf-8"]));
        assert!(decoded.text.starts_with("a,b"));
    }

    #[test]
    fn test_lossy_last_resort() {
        let decoded = decode_with_fallback(b"a\n\xff\xfe\xfd\n", &labels(&["utf-8"]));
        assert!(decoded.lossy);
        assert_eq!(decoded.encoding, "utf-8");
        assert!(decoded.text.contains('\u{FFFD}'));
    }
}
