//! Script identity keys.
//!
//! Inline scripts are identified by a 32-bit rolling hash of their text. The
//! hash is for cheap identity only: it is not collision resistant, and two
//! different inline scripts can share a key (`"Aa"` and `"BB"` do). A shared
//! key means both scripts are treated as present whenever either is.

/// `h = h * 31 + unit` over UTF-16 code units with signed 32-bit wraparound.
pub fn content_hash(content: &str) -> i32 {
    content.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// `src` when present and non-empty, otherwise `inline:<hash of text>`.
pub fn script_key(src: Option<&str>, text: &str) -> String {
    match src {
        Some(src) if !src.is_empty() => src.to_owned(),
        _ => format!("inline:{}", content_hash(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::content_hash;
    use super::script_key;

    #[test]
    fn empty_text_hashes_to_zero() {
        assert_eq!(content_hash(""), 0);
        assert_eq!(script_key(None, ""), "inline:0");
    }

    #[test]
    fn known_fixtures() {
        assert_eq!(content_hash("a"), 97);
        assert_eq!(content_hash("hello"), 99_162_322);
        assert_eq!(content_hash("hello world"), 1_794_106_052);
        assert_eq!(content_hash("console.log(1)"), -1_456_905_485);
    }

    #[test]
    fn hashes_utf16_code_units() {
        // U+1F600 is the surrogate pair D83D DE00.
        assert_eq!(content_hash("\u{1F600}"), 1_772_899);
    }

    #[test]
    fn distinct_text_gives_distinct_keys() {
        assert_ne!(script_key(None, "hello"), script_key(None, "hello world"));
        assert_eq!(script_key(None, "hello"), script_key(None, "hello"));
    }

    #[test]
    fn known_collision_is_deterministic() {
        assert_eq!(script_key(None, "Aa"), script_key(None, "BB"));
    }

    #[test]
    fn src_takes_precedence_unless_empty() {
        assert_eq!(script_key(Some("/app.js"), "ignored"), "/app.js");
        assert_eq!(script_key(Some(""), "a"), "inline:97");
    }
}
