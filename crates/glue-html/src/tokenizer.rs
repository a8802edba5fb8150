//! Markup tokenizer. Walks the source as `&str` slices; every delimiter it
//! looks for is ASCII, so slicing at a found offset stays on a char boundary.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
    Comment(String),
}

/// Elements whose content is taken verbatim up to the matching end tag.
pub(crate) fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes")
}

/// Elements whose content is text with character references decoded.
pub(crate) fn is_rcdata_tag(tag: &str) -> bool {
    matches!(tag, "title" | "textarea")
}

const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '\u{a9}'),
    ("hellip", '\u{2026}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
];

// Longest reference body looked at before a `&` is taken literally.
const MAX_REFERENCE_LEN: usize = 32;

pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut scanner = Scanner {
        source,
        pos: 0,
        tokens: Vec::new(),
    };
    while scanner.pos < source.len() {
        scanner.step();
    }
    scanner.tokens
}

struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn step(&mut self) {
        let rest = self.rest();

        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], end + "<!---->".len()),
                None => (body, rest.len()),
            };
            self.tokens.push(Token::Comment(comment.to_owned()));
            self.pos += consumed;
            return;
        }

        // Doctypes, CDATA and processing instructions carry nothing the tree keeps.
        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.pos += rest[2..].find('>').map_or(rest.len(), |gt| gt + 3);
            return;
        }

        if rest.starts_with("</") {
            if let Some((name, consumed)) = end_tag(rest) {
                self.tokens.push(Token::End { name });
                self.pos += consumed;
                return;
            }
        } else if rest.starts_with('<') {
            if let Some((token, consumed)) = start_tag(rest) {
                self.pos += consumed;
                self.open(token);
                return;
            }
        }

        self.text();
    }

    /// Emits a start tag; raw text and RCDATA elements also swallow their
    /// body and end tag here so markup inside them is never tokenized.
    fn open(&mut self, token: Token) {
        let verbatim = match &token {
            Token::Start {
                name,
                self_closing: false,
                ..
            } if is_raw_text_tag(name) || is_rcdata_tag(name) => Some(name.clone()),
            _ => None,
        };
        self.tokens.push(token);

        let Some(name) = verbatim else {
            return;
        };
        let body = self.rest();
        let (text, consumed) = match closing_tag(body, &name) {
            Some((text_end, close_end)) => (&body[..text_end], close_end),
            None => (body, body.len()),
        };
        if !text.is_empty() {
            let text = if is_rcdata_tag(&name) {
                decode_entities(text)
            } else {
                text.to_owned()
            };
            self.tokens.push(Token::Text(text));
        }
        self.tokens.push(Token::End { name });
        self.pos += consumed;
    }

    /// Text up to the next `<`. The first char is always taken, so a `<`
    /// that opened nothing becomes literal text.
    fn text(&mut self) {
        let rest = self.rest();
        let first = rest.chars().next().map_or(0, char::len_utf8);
        let end = rest[first..].find('<').map_or(rest.len(), |lt| first + lt);
        self.tokens.push(Token::Text(decode_entities(&rest[..end])));
        self.pos += end;
    }
}

/// Offsets of `</name>` in `body` (case-insensitive, whitespace allowed
/// before `>`): where the text stops and where the end tag finishes.
fn closing_tag(body: &str, name: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(offset) = body[from..].find("</") {
        let open = from + offset;
        let after = &body[open + 2..];
        let matches_name = after
            .as_bytes()
            .get(..name.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        if matches_name {
            let tail = skip_space(&after[name.len()..]);
            if tail.starts_with('>') {
                return Some((open, body.len() - tail.len() + 1));
            }
        }
        from = open + 2;
    }
    None
}

fn end_tag(markup: &str) -> Option<(String, usize)> {
    let after = skip_space(&markup[2..]);
    let name_len = after.find(|ch: char| !is_name_char(ch)).unwrap_or(after.len());
    if name_len == 0 {
        return None;
    }
    let gt = after.find('>')?;
    let consumed = markup.len() - after.len() + gt + 1;
    Some((after[..name_len].to_ascii_lowercase(), consumed))
}

fn start_tag(markup: &str) -> Option<(Token, usize)> {
    let body = &markup[1..];
    if !body.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
        return None;
    }

    let name_len = body.find(|ch: char| !is_name_char(ch)).unwrap_or(body.len());
    let name = body[..name_len].to_ascii_lowercase();
    let mut tail = &body[name_len..];
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        tail = skip_space(tail);
        let mut chars = tail.chars();
        match chars.next()? {
            '>' => {
                tail = chars.as_str();
                break;
            }
            '/' => {
                self_closing = true;
                tail = chars.as_str();
                continue;
            }
            _ => {}
        }

        let attr_len = tail.find(|ch: char| !is_attr_name_char(ch)).unwrap_or(tail.len());
        if attr_len == 0 {
            tail = chars.as_str();
            continue;
        }
        // `/` only closes the tag when nothing follows it.
        self_closing = false;

        let attr_name = tail[..attr_len].to_ascii_lowercase();
        tail = skip_space(&tail[attr_len..]);
        let mut value = "";
        if let Some(assigned) = tail.strip_prefix('=') {
            (value, tail) = attribute_value(skip_space(assigned));
        }

        // First occurrence of a duplicated attribute wins.
        if !attrs.iter().any(|(existing, _)| *existing == attr_name) {
            attrs.push((attr_name, decode_entities(value)));
        }
    }

    let token = Token::Start {
        name,
        attrs,
        self_closing,
    };
    Some((token, markup.len() - tail.len()))
}

/// Splits a quoted or bare attribute value off the front of `input`.
fn attribute_value(input: &str) -> (&str, &str) {
    match input.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = &input[1..];
            match inner.find(quote) {
                Some(end) => (&inner[..end], &inner[end + 1..]),
                None => (inner, ""),
            }
        }
        _ => {
            let end = input
                .find(|ch: char| ch.is_ascii_whitespace() || ch == '>')
                .unwrap_or(input.len());
            input.split_at(end)
        }
    }
}

pub(crate) fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let reference = after
            .find(';')
            .filter(|semi| *semi <= MAX_REFERENCE_LEN)
            .and_then(|semi| Some((decode_reference(&after[..semi])?, semi)));

        match reference {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(reference: &str) -> Option<char> {
    let Some(numeric) = reference.strip_prefix('#') else {
        return NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == reference)
            .map(|(_, ch)| *ch);
    };

    let code = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => numeric.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

fn skip_space(input: &str) -> &str {
    input.trim_start_matches(|ch: char| ch.is_ascii_whitespace())
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':')
}

fn is_attr_name_char(ch: char) -> bool {
    !ch.is_ascii_whitespace() && !matches!(ch, '>' | '/' | '=' | '"' | '\'' | '<')
}
