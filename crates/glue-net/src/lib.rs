//! Networking for page navigation: URL resolution, the `Network` seam the
//! router fetches through, and a blocking HTTP/1.1 client behind it.

pub mod charset;
pub mod client;
pub mod http;
pub mod threaded;
pub mod tls;
pub mod url;

use futures::future::LocalBoxFuture;
use glue_core::GlueResult;
use std::rc::Rc;

pub use client::Http11Client;
pub use http::Header;
pub use http::HttpStatusCode;
pub use threaded::ThreadedNetwork;
pub use url::HttpUrl;
pub use url::normalize_location;
pub use url::resolve_navigation_url;

/// GET request issued for a navigation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    pub headers: Vec<Header>,
}

impl NavigationRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> GlueResult<Self> {
        self.headers.push(Header::new(name, value)?);
        Ok(self)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        http::header_value(&self.headers, name)
    }
}

/// Completed response for a navigation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
    /// URLs that answered with a redirect before `url`, in the order visited.
    pub redirects: Vec<String>,
}

impl NavigationResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        http::header_value(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body decoded as HTML text.
    pub fn text(&self) -> String {
        charset::decode_html(&self.body, self.content_type())
    }
}

/// Asynchronous fetch seam used by the router.
///
/// Implementations must not call back into the router; the returned future
/// is polled on the router's single-threaded executor.
pub trait Network {
    fn send(
        &self,
        request: NavigationRequest,
    ) -> LocalBoxFuture<'static, GlueResult<NavigationResponse>>;
}

impl<N> Network for Rc<N>
where
    N: Network + ?Sized,
{
    fn send(
        &self,
        request: NavigationRequest,
    ) -> LocalBoxFuture<'static, GlueResult<NavigationResponse>> {
        (**self).send(request)
    }
}
