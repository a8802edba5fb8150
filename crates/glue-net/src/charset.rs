//! Response body text decoding.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;

const META_SNIFF_BYTES: usize = 1024;

/// Decodes an HTML response body.
///
/// Precedence: byte-order mark, `<meta charset>` in the first kilobyte, the
/// `charset` parameter of `Content-Type`, then UTF-8. Malformed sequences
/// become U+FFFD rather than failing.
pub fn decode_html(body: &[u8], content_type: Option<&str>) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(body) {
        let (decoded, _) = encoding.decode_without_bom_handling(&body[bom_len..]);
        return decoded.into_owned();
    }

    let encoding = sniff_meta_charset(body)
        .or_else(|| content_type.and_then(charset_from_content_type))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (decoded, _) = encoding.decode_without_bom_handling(body);
    decoded.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|parameter| {
        let (name, value) = parameter.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches(|ch| ch == '"' || ch == '\'');
        (!label.is_empty()).then(|| label.to_owned())
    })
}

fn sniff_meta_charset(body: &[u8]) -> Option<String> {
    let prefix = &body[..body.len().min(META_SNIFF_BYTES)];
    let text = String::from_utf8_lossy(prefix).to_ascii_lowercase();

    let mut from = 0;
    while let Some(offset) = text[from..].find("charset=") {
        let value_start = from + offset + "charset=".len();
        if let Some(label) = read_label(&text[value_start..]) {
            return Some(label);
        }
        from = value_start;
    }

    None
}

fn read_label(input: &str) -> Option<String> {
    let trimmed = input.trim_start();
    let unquoted = trimmed
        .strip_prefix('"')
        .or_else(|| trimmed.strip_prefix('\''))
        .unwrap_or(trimmed);
    let end = unquoted
        .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
        .unwrap_or(unquoted.len());
    let label = &unquoted[..end];
    (!label.is_empty()).then(|| label.to_owned())
}
