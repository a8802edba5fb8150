//! Router configuration: marker attributes, request header, cache bound.

use glue_core::GlueError;
use glue_core::GlueResult;
use glue_net::Header;

pub const CACHE_CAPACITY_ENV: &str = "GLUE_CACHE_CAPACITY";
pub const REQUEST_HEADER_ENV: &str = "GLUE_REQUEST_HEADER";

/// Attribute names and transport settings shared by every router component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Marks the single element whose content is swapped on every navigation.
    pub page_marker: String,
    /// Marks a named layout region; the attribute value is the region name.
    pub layout_marker: String,
    pub script_marker: String,
    pub head_marker: String,
    /// Attached to head elements the router inserted itself.
    pub dynamic_marker: String,
    /// Attributes with this prefix are not copied onto re-created scripts.
    pub internal_prefix: String,
    pub request_header_name: String,
    pub request_header_value: String,
    /// `None` keeps every snapshot for the session.
    pub cache_capacity: Option<usize>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            page_marker: "data-glue-page".to_owned(),
            layout_marker: "data-glue-layout".to_owned(),
            script_marker: "data-glue-script".to_owned(),
            head_marker: "data-glue-head".to_owned(),
            dynamic_marker: "data-glue-dynamic".to_owned(),
            internal_prefix: "data-glue".to_owned(),
            request_header_name: "X-Glue-Request".to_owned(),
            request_header_value: "true".to_owned(),
            cache_capacity: None,
        }
    }
}

impl RouterConfig {
    /// Defaults overlaid with `GLUE_CACHE_CAPACITY` and `GLUE_REQUEST_HEADER`.
    pub fn from_env() -> GlueResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, then validates.
    ///
    /// `GLUE_CACHE_CAPACITY` accepts a positive integer or `unbounded`;
    /// `GLUE_REQUEST_HEADER` takes the form `Name: value`.
    pub fn with_overrides<F>(mut self, lookup: F) -> GlueResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CACHE_CAPACITY_ENV) {
            self.cache_capacity = parse_capacity(raw.trim())?;
        }

        if let Some(raw) = lookup(REQUEST_HEADER_ENV) {
            let (name, value) = raw.split_once(':').ok_or_else(|| {
                GlueError::config(
                    "router.config.header_malformed",
                    format!("{REQUEST_HEADER_ENV} must look like `Name: value`, got `{raw}`"),
                )
            })?;
            self.request_header_name = name.trim().to_owned();
            self.request_header_value = value.trim().to_owned();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn with_cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_request_header(mut self, name: &str, value: &str) -> Self {
        self.request_header_name = name.to_owned();
        self.request_header_value = value.to_owned();
        self
    }

    pub fn validate(&self) -> GlueResult<()> {
        let markers = [
            ("page_marker", &self.page_marker),
            ("layout_marker", &self.layout_marker),
            ("script_marker", &self.script_marker),
            ("head_marker", &self.head_marker),
            ("dynamic_marker", &self.dynamic_marker),
        ];
        for (field, value) in markers {
            if value.trim().is_empty() {
                return Err(GlueError::config(
                    "router.config.marker_empty",
                    format!("`{field}` must name an attribute"),
                ));
            }
        }

        if self.cache_capacity == Some(0) {
            return Err(GlueError::config(
                "router.config.capacity_zero",
                "cache capacity must be at least 1; use `None` for unbounded",
            ));
        }

        Header::new(&self.request_header_name, &self.request_header_value).map_err(|error| {
            GlueError::config(
                "router.config.header_invalid",
                format!("request header is not sendable: {}", error.message),
            )
        })?;

        Ok(())
    }
}

fn parse_capacity(raw: &str) -> GlueResult<Option<usize>> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }

    raw.parse::<usize>().map(Some).map_err(|error| {
        GlueError::config(
            "router.config.capacity_invalid",
            format!("{CACHE_CAPACITY_ENV} must be a positive integer, got `{raw}`: {error}"),
        )
    })
}
