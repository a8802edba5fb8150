//! Headers and status codes as seen by a navigation fetch.

use glue_core::GlueError;
use glue_core::GlueResult;

/// One header line. The name is an HTTP token and the value never contains
/// a line break, so a header can always be written onto the wire verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: &str, value: &str) -> GlueResult<Self> {
        if name.is_empty() || !name.chars().all(is_token_char) {
            return Err(GlueError::host(
                "net.header.name_invalid",
                format!("`{name}` is not a valid header name"),
            ));
        }

        if value.contains(['\r', '\n', '\0']) {
            return Err(GlueError::host(
                "net.header.value_invalid",
                format!("value of header `{name}` contains a line break or NUL"),
            ));
        }

        Ok(Self {
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Case-insensitive lookup of the first header named `name`.
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|header| header.is(name))
        .map(|header| header.value.as_str())
}

/// Comma-separated list values of every `name` header, trimmed and lowercased.
pub fn header_tokens(headers: &[Header], name: &str) -> Vec<String> {
    headers
        .iter()
        .filter(|header| header.is(name))
        .flat_map(|header| header.value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Status code of a navigation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HttpStatusCode(u16);

impl HttpStatusCode {
    pub fn new(code: u16) -> GlueResult<Self> {
        if !(100..=599).contains(&code) {
            return Err(GlueError::network(
                "net.status.out_of_range",
                format!("status code {code} is outside 100-599"),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 / 100 == 2
    }

    /// Statuses whose `Location` the client follows. `300` and `304` are not
    /// redirects a document fetch can act on.
    pub fn is_followed_redirect(self) -> bool {
        matches!(self.0, 301 | 302 | 303 | 307 | 308)
    }

    pub fn carries_body(self) -> bool {
        !(self.0 / 100 == 1 || self.0 == 204 || self.0 == 304)
    }
}

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(ch)
}
