//! Navigation URL resolution and the canonical URL used on the wire.

use glue_core::GlueError;
use glue_core::GlueResult;
use url::Position;
use url::Url;

/// Absolute `http`/`https` URL with its fragment removed, as put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpUrl(Url);

impl HttpUrl {
    pub fn parse(input: &str) -> GlueResult<Self> {
        let url = Url::parse(input).map_err(|error| {
            GlueError::host(
                "net.url.unparsable",
                format!("`{input}` is not an absolute URL: {error}"),
            )
        })?;
        Self::fetchable(url)
    }

    fn fetchable(mut url: Url) -> GlueResult<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GlueError::host(
                "net.url.scheme_unsupported",
                format!("`{}:` URLs cannot be fetched", url.scheme()),
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(GlueError::host(
                "net.url.host_missing",
                format!("`{url}` has no host"),
            ));
        }

        url.set_fragment(None);
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_secure(&self) -> bool {
        self.0.scheme() == "https"
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.0.port_or_known_default().unwrap_or(80)
    }

    /// `Host` header value. The url crate drops default ports while parsing,
    /// so any port still present is an explicit one.
    pub fn authority(&self) -> String {
        match self.0.port() {
            Some(port) => format!("{}:{port}", self.host()),
            None => self.host().to_owned(),
        }
    }

    /// Request target: path plus query, never empty for http(s).
    pub fn path_and_query(&self) -> &str {
        &self.0[Position::BeforePath..Position::AfterQuery]
    }

    /// Resolves a `Location` header value against this URL.
    pub fn join(&self, reference: &str) -> GlueResult<Self> {
        let joined = self.0.join(reference).map_err(|error| {
            GlueError::network(
                "net.url.redirect_invalid",
                format!("invalid redirect target `{reference}`: {error}"),
            )
        })?;
        Self::fetchable(joined)
    }
}

/// Canonical form of a window location (`new URL(href).href`).
pub fn normalize_location(href: &str) -> GlueResult<String> {
    let parsed = Url::parse(href).map_err(|error| {
        GlueError::host(
            "net.url.location_invalid",
            format!("window location `{href}` is not an absolute URL: {error}"),
        )
    })?;
    Ok(parsed.to_string())
}

/// Resolves a navigation target against the origin of `location`.
///
/// Relative paths resolve from the origin root, not from the current path:
/// `docs` on `https://a.test/x/y` becomes `https://a.test/docs`.
pub fn resolve_navigation_url(location: &str, input: &str) -> GlueResult<String> {
    let current = Url::parse(location).map_err(|error| {
        GlueError::host(
            "net.url.location_invalid",
            format!("window location `{location}` is not an absolute URL: {error}"),
        )
    })?;

    let origin = current.origin();
    if !origin.is_tuple() {
        return Err(GlueError::host(
            "net.url.origin_opaque",
            format!("location `{location}` has no navigable origin"),
        ));
    }

    let base = Url::parse(&format!("{}/", origin.ascii_serialization())).map_err(|error| {
        GlueError::host(
            "net.url.origin_invalid",
            format!("origin of `{location}` cannot be used as a base: {error}"),
        )
    })?;

    let resolved = base.join(input).map_err(|error| {
        GlueError::host(
            "net.url.target_invalid",
            format!("cannot resolve navigation target `{input}`: {error}"),
        )
    })?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved.to_string()),
        other => Err(GlueError::host(
            "net.url.scheme_unsupported",
            format!("navigation to `{other}:` URLs is not supported"),
        )),
    }
}
