//! Hex memo text decoding
//!
//! Memo sub-fields arrive hex-encoded on the wire. Decoding failures are
//! cosmetic, not structural, so this decoder fails closed to the empty
//! string and never returns an error.

/// A pure memo text decoder, injectable into the materializer
pub type MemoDecoder = fn(Option<&str>) -> String;

/// Decode hex-encoded memo text to UTF-8
///
/// Accepts an optional `\x` or `0x` prefix. Null, empty, or malformed input
/// (odd length, non-hex digits, invalid UTF-8) yields `""`.
pub fn decode(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    if text.is_empty() {
        return String::new();
    }

    let stripped = text
        .strip_prefix("\\x")
        .or_else(|| text.strip_prefix("0x"))
        .unwrap_or(text);

    match hex::decode(stripped) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_default(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_hex() {
        assert_eq!(decode(Some("68656C6C6F")), "hello");
    }

    #[test]
    fn test_decode_lowercase_hex() {
        assert_eq!(decode(Some("68656c6c6f")), "hello");
    }

    #[test]
    fn test_decode_with_0x_prefix() {
        assert_eq!(decode(Some("0x68656C6C6F")), "hello");
    }

    #[test]
    fn test_decode_with_bytea_prefix() {
        assert_eq!(decode(Some("\\x68656C6C6F")), "hello");
    }

    #[test]
    fn test_decode_none_is_empty() {
        assert_eq!(decode(None), "");
    }

    #[test]
    fn test_decode_empty_is_empty() {
        assert_eq!(decode(Some("")), "");
    }

    #[test]
    fn test_decode_malformed_hex_is_empty() {
        assert_eq!(decode(Some("not hex at all")), "");
        assert_eq!(decode(Some("ABC")), ""); // odd length
    }

    #[test]
    fn test_decode_invalid_utf8_is_empty() {
        assert_eq!(decode(Some("FFFE")), "");
    }
}
