//! Blocking HTTP/1.1 client that fetches navigation documents.
//!
//! Every request opens its own connection and sends `Connection: close`.
//! Redirects are followed with the caller's headers re-sent on each hop, and
//! the hops are reported on the [`NavigationResponse`]. Only `gzip` and `br`
//! are advertised, so those are the only content codings decoded.

use crate::NavigationRequest;
use crate::NavigationResponse;
use crate::http::Header;
use crate::http::HttpStatusCode;
use crate::http::header_tokens;
use crate::http::header_value;
use crate::tls::NavigationStream;
use crate::tls::TlsConnector;
use crate::url::HttpUrl;
use brotli::Decompressor;
use flate2::read::GzDecoder;
use glue_core::GlueError;
use glue_core::GlueResult;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;
use tracing::debug;

const MAX_HEAD_BYTES: u64 = 64 * 1024;
const MAX_CHUNK_LINE_BYTES: u64 = 4 * 1024;
const DEFAULT_USER_AGENT: &str = concat!("glue-router/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";
const ACCEPT_ENCODING: &str = "gzip, br";

/// Headers the client always writes itself; caller copies are dropped.
const CONNECTION_HEADERS: [&str; 3] = ["host", "connection", "accept-encoding"];

#[derive(Debug, Clone)]
pub struct Http11Client {
    tls: TlsConnector,
    connect_timeout: Duration,
    io_timeout: Duration,
    max_redirects: usize,
    user_agent: String,
}

impl Http11Client {
    pub fn new() -> GlueResult<Self> {
        Ok(Self {
            tls: TlsConnector::new()?,
            connect_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// GETs the document for `request`, following redirects.
    ///
    /// Non-2xx statuses come back as responses, not errors.
    pub fn fetch(&self, request: &NavigationRequest) -> GlueResult<NavigationResponse> {
        let mut chain = RedirectChain::new(HttpUrl::parse(&request.url)?, self.max_redirects);

        loop {
            let url = chain.current().clone();
            debug!(url = url.as_str(), hop = chain.hops(), "fetching navigation document");
            let reply = self.exchange(&url, &request.headers)?;

            let Some(next) = reply.redirect_target(&url)? else {
                return Ok(chain.finish(reply));
            };
            debug!(
                from = url.as_str(),
                to = next.as_str(),
                status = reply.status.as_u16(),
                "following redirect"
            );
            chain.follow(next)?;
        }
    }

    fn exchange(&self, url: &HttpUrl, headers: &[Header]) -> GlueResult<Reply> {
        let mut stream = self.connect(url)?;
        let head = request_head(url, &self.user_agent, headers);
        stream
            .write_all(head.as_bytes())
            .and_then(|()| stream.flush())
            .map_err(|error| {
                GlueError::network(
                    "net.http.send",
                    format!("sending request to `{}`: {error}", url.as_str()),
                )
            })?;

        read_reply(&mut BufReader::new(stream))
    }

    fn connect(&self, url: &HttpUrl) -> GlueResult<NavigationStream> {
        let host = url.host().trim_start_matches('[').trim_end_matches(']');
        let addresses = (host, url.port()).to_socket_addrs().map_err(|error| {
            GlueError::network("net.connect.resolve", format!("resolving `{host}`: {error}"))
        })?;

        let mut last_failure = None;
        for address in addresses {
            let socket = match TcpStream::connect_timeout(&address, self.connect_timeout) {
                Ok(socket) => socket,
                Err(error) => {
                    last_failure = Some(format!("{address}: {error}"));
                    continue;
                }
            };

            socket
                .set_read_timeout(Some(self.io_timeout))
                .and_then(|()| socket.set_write_timeout(Some(self.io_timeout)))
                .map_err(|error| {
                    GlueError::network("net.connect.timeouts", format!("{address}: {error}"))
                })?;

            return if url.is_secure() {
                self.tls.wrap(socket, host)
            } else {
                Ok(NavigationStream::Plain(socket))
            };
        }

        let detail = last_failure.unwrap_or_else(|| "no addresses".to_owned());
        Err(GlueError::network(
            "net.connect.failed",
            format!("cannot connect to `{}`: {detail}", url.authority()),
        ))
    }
}

/// URLs visited while following redirects for one navigation.
#[derive(Debug)]
struct RedirectChain {
    current: HttpUrl,
    visited: Vec<String>,
    limit: usize,
}

impl RedirectChain {
    fn new(start: HttpUrl, limit: usize) -> Self {
        Self {
            current: start,
            visited: Vec::new(),
            limit,
        }
    }

    fn current(&self) -> &HttpUrl {
        &self.current
    }

    fn hops(&self) -> usize {
        self.visited.len()
    }

    fn follow(&mut self, next: HttpUrl) -> GlueResult<()> {
        if self.visited.len() >= self.limit {
            return Err(GlueError::network(
                "net.redirect.limit",
                format!(
                    "more than {} redirects starting from `{}`",
                    self.limit,
                    self.visited.first().map_or(self.current.as_str(), String::as_str)
                ),
            ));
        }

        let previous = std::mem::replace(&mut self.current, next);
        self.visited.push(previous.as_str().to_owned());
        if self.visited.iter().any(|seen| seen == self.current.as_str()) {
            return Err(GlueError::network(
                "net.redirect.loop",
                format!("redirect loop back to `{}`", self.current.as_str()),
            ));
        }
        Ok(())
    }

    fn finish(self, reply: Reply) -> NavigationResponse {
        NavigationResponse {
            url: self.current.as_str().to_owned(),
            status: reply.status.as_u16(),
            headers: reply.headers,
            body: reply.body,
            redirects: self.visited,
        }
    }
}

/// One response off the wire, body already de-framed and decoded.
#[derive(Debug)]
struct Reply {
    status: HttpStatusCode,
    headers: Vec<Header>,
    body: Vec<u8>,
}

impl Reply {
    fn redirect_target(&self, base: &HttpUrl) -> GlueResult<Option<HttpUrl>> {
        if !self.status.is_followed_redirect() {
            return Ok(None);
        }
        header_value(&self.headers, "location")
            .map(|location| base.join(location))
            .transpose()
    }
}

fn request_head(url: &HttpUrl, user_agent: &str, headers: &[Header]) -> String {
    let mut head = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n",
        url.path_and_query(),
        url.authority(),
    );
    head.push_str("Accept-Encoding: ");
    head.push_str(ACCEPT_ENCODING);
    head.push_str("\r\n");

    let defaults = [("User-Agent", user_agent), ("Accept", ACCEPT)];
    let missing_defaults = defaults
        .into_iter()
        .filter(|(name, _)| header_value(headers, name).is_none());
    let caller = headers
        .iter()
        .filter(|header| !CONNECTION_HEADERS.iter().any(|fixed| header.is(fixed)))
        .map(|header| (header.name.as_str(), header.value.as_str()));

    for (name, value) in missing_defaults.chain(caller) {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head
}

fn read_reply<R: BufRead>(reader: &mut R) -> GlueResult<Reply> {
    // Interim 1xx responses such as 103 Early Hints precede the real one.
    let (status, headers) = loop {
        let (status, headers) = read_head(reader)?;
        if status.as_u16() >= 200 {
            break (status, headers);
        }
        debug!(status = status.as_u16(), "skipping interim response");
    };

    let framing = BodyFraming::of(status, &headers)?;
    let raw = framing.read(reader)?;
    let body = decode_content(&headers, raw)?;
    Ok(Reply {
        status,
        headers,
        body,
    })
}

fn read_head<R: BufRead>(reader: &mut R) -> GlueResult<(HttpStatusCode, Vec<Header>)> {
    let mut head = reader.by_ref().take(MAX_HEAD_BYTES);
    let truncated = || {
        GlueError::network(
            "net.http.head_truncated",
            format!("response head ended early or exceeded {MAX_HEAD_BYTES} bytes"),
        )
    };

    let status_line = next_line(&mut head)?.ok_or_else(truncated)?;
    let status = parse_status_line(&status_line)?;

    let mut headers = Vec::new();
    loop {
        let line = next_line(&mut head)?.ok_or_else(truncated)?;
        if line.is_empty() {
            return Ok((status, headers));
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(GlueError::network(
                "net.http.header_line",
                format!("malformed header line `{line}`"),
            ));
        };
        headers.push(Header::new(name.trim(), value.trim())?);
    }
}

fn parse_status_line(line: &str) -> GlueResult<HttpStatusCode> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let code = parts.next().and_then(|code| code.parse::<u16>().ok());

    match code {
        Some(code) if version.starts_with("HTTP/1.") => HttpStatusCode::new(code),
        _ => Err(GlueError::network(
            "net.http.status_line",
            format!("malformed status line `{line}`"),
        )),
    }
}

/// Next LF-terminated line with any trailing CR removed, or `None` when the
/// input ends before a line terminator.
fn next_line<R: BufRead>(reader: &mut R) -> GlueResult<Option<String>> {
    let mut raw = Vec::new();
    reader.read_until(b'\n', &mut raw).map_err(receive_error)?;
    if raw.pop() != Some(b'\n') {
        return Ok(None);
    }
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }

    String::from_utf8(raw).map(Some).map_err(|_| {
        GlueError::network("net.http.framing_not_text", "response framing line is not UTF-8")
    })
}

/// How the end of a response body is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    Empty,
    Length(u64),
    Chunked,
    UntilClose,
}

impl BodyFraming {
    fn of(status: HttpStatusCode, headers: &[Header]) -> GlueResult<Self> {
        if !status.carries_body() {
            return Ok(Self::Empty);
        }

        let transfer = header_tokens(headers, "transfer-encoding");
        if !transfer.is_empty() {
            if transfer.iter().all(|coding| coding == "chunked") {
                return Ok(Self::Chunked);
            }
            return Err(GlueError::network(
                "net.http.transfer_coding",
                format!("unsupported transfer coding `{}`", transfer.join(", ")),
            ));
        }

        match header_value(headers, "content-length") {
            Some(raw) => raw.trim().parse::<u64>().map(Self::Length).map_err(|_| {
                GlueError::network(
                    "net.http.content_length",
                    format!("invalid Content-Length `{raw}`"),
                )
            }),
            None => Ok(Self::UntilClose),
        }
    }

    fn read<R: BufRead>(self, reader: &mut R) -> GlueResult<Vec<u8>> {
        let mut body = Vec::new();
        match self {
            Self::Empty => {}
            Self::Length(length) => {
                reader
                    .by_ref()
                    .take(length)
                    .read_to_end(&mut body)
                    .map_err(receive_error)?;
                if (body.len() as u64) < length {
                    return Err(GlueError::network(
                        "net.http.body_truncated",
                        format!("connection closed after {} of {length} body bytes", body.len()),
                    ));
                }
            }
            Self::Chunked => read_chunks(reader, &mut body)?,
            Self::UntilClose => {
                reader.read_to_end(&mut body).map_err(receive_error)?;
            }
        }
        Ok(body)
    }
}

fn read_chunks<R: BufRead>(reader: &mut R, body: &mut Vec<u8>) -> GlueResult<()> {
    let framing_error = |detail: String| GlueError::network("net.http.chunk", detail);

    loop {
        let size_line = next_line(&mut reader.by_ref().take(MAX_CHUNK_LINE_BYTES))?
            .ok_or_else(|| framing_error("body ended before the last chunk".to_owned()))?;
        let size_field = size_line.split(';').next().unwrap_or_default().trim();
        let size = u64::from_str_radix(size_field, 16)
            .map_err(|_| framing_error(format!("invalid chunk size `{size_field}`")))?;
        if size == 0 {
            break;
        }

        let before = body.len();
        reader
            .by_ref()
            .take(size)
            .read_to_end(body)
            .map_err(receive_error)?;
        if ((body.len() - before) as u64) < size {
            return Err(framing_error(format!("chunk of {size} bytes cut short")));
        }
        if next_line(reader)?.as_deref() != Some("") {
            return Err(framing_error("chunk data not followed by CRLF".to_owned()));
        }
    }

    // Trailer fields are ignored. EOF here only drops the final blank line.
    while let Some(line) = next_line(&mut reader.by_ref().take(MAX_CHUNK_LINE_BYTES))? {
        if line.is_empty() {
            break;
        }
    }
    Ok(())
}

fn decode_content(headers: &[Header], body: Vec<u8>) -> GlueResult<Vec<u8>> {
    if body.is_empty() {
        return Ok(body);
    }

    // Codings are listed in the order applied, so undo them last to first.
    header_tokens(headers, "content-encoding")
        .iter()
        .rev()
        .try_fold(body, |body, coding| match coding.as_str() {
            "identity" => Ok(body),
            "gzip" | "x-gzip" => inflate(GzDecoder::new(body.as_slice()), coding),
            "br" => inflate(Decompressor::new(body.as_slice(), 8 * 1024), coding),
            other => Err(GlueError::network(
                "net.http.content_coding",
                format!("server sent `{other}` content, only {ACCEPT_ENCODING} were accepted"),
            )),
        })
}

fn inflate(mut decoder: impl Read, coding: &str) -> GlueResult<Vec<u8>> {
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded).map_err(|error| {
        GlueError::network(
            "net.http.content_corrupt",
            format!("`{coding}` body does not decode: {error}"),
        )
    })?;
    Ok(decoded)
}

fn receive_error(error: io::Error) -> GlueError {
    GlueError::network("net.http.receive", format!("reading response: {error}"))
}

#[cfg(test)]
mod tests {
    use super::BodyFraming;
    use super::Http11Client;
    use super::RedirectChain;
    use super::Reply;
    use super::read_reply;
    use super::request_head;
    use crate::NavigationRequest;
    use crate::http::Header;
    use crate::http::HttpStatusCode;
    use crate::url::HttpUrl;
    use brotli::CompressorWriter;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use glue_core::GlueResult;
    use std::io::BufRead;
    use std::io::BufReader;
    use std::io::Cursor;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn url(raw: &str) -> HttpUrl {
        match HttpUrl::parse(raw) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }

    fn header(name: &str, value: &str) -> Header {
        match Header::new(name, value) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }

    fn reply_from(wire: &[u8]) -> GlueResult<Reply> {
        read_reply(&mut Cursor::new(wire.to_vec()))
    }

    fn body_of(wire: &[u8]) -> Vec<u8> {
        match reply_from(wire) {
            Ok(reply) => reply.body,
            Err(error) => panic!("{error}"),
        }
    }

    fn error_code(wire: &[u8]) -> &'static str {
        match reply_from(wire) {
            Ok(reply) => panic!("expected failure, got status {}", reply.status.as_u16()),
            Err(error) => error.code,
        }
    }

    #[test]
    fn request_head_carries_marker_and_owns_connection_headers() {
        let headers = [
            header("X-Glue-Request", "true"),
            header("Connection", "keep-alive"),
            header("User-Agent", "docs-bot/1"),
        ];
        let head = request_head(&url("https://site.test/docs?page=2#intro"), "glue/0", &headers);

        assert!(head.starts_with("GET /docs?page=2 HTTP/1.1\r\nHost: site.test\r\n"));
        assert!(head.contains("\r\nX-Glue-Request: true\r\n"));
        assert!(head.contains("\r\nConnection: close\r\n"));
        assert!(!head.contains("keep-alive"));
        assert_eq!(head.matches("User-Agent:").count(), 1);
        assert!(head.contains("User-Agent: docs-bot/1\r\n"));
        assert!(head.contains("Accept: text/html"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn length_framed_document_ignores_trailing_bytes() {
        let body = body_of(b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\n\r\n<p>hi</p>\r\nleftover");
        assert_eq!(body, b"<p>hi</p>\r\n");
    }

    #[test]
    fn early_hints_precede_the_document() {
        let reply = reply_from(
            b"HTTP/1.1 103 Early Hints\r\nLink: </site.css>; rel=preload\r\n\r\n\
              HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok",
        );
        let reply = match reply {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(reply.status.as_u16(), 200);
        assert_eq!(reply.body, b"ok");
        assert!(reply.headers.iter().all(|header| !header.is("link")));
    }

    #[test]
    fn chunked_document_is_joined_and_trailers_skipped() {
        let body = body_of(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              4;name=head\r\n<h1>\r\nA\r\nhello page\r\n0\r\nServer-Timing: db;dur=4\r\n\r\n",
        );
        assert_eq!(body, b"<h1>hello page");
    }

    #[test]
    fn chunk_framing_errors_are_reported() {
        let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n";
        let bad_size = format!("{head}zz\r\nabc\r\n0\r\n\r\n");
        assert_eq!(error_code(bad_size.as_bytes()), "net.http.chunk");

        let cut = format!("{head}10\r\nshort");
        assert_eq!(error_code(cut.as_bytes()), "net.http.chunk");
    }

    #[test]
    fn close_delimited_document_reads_to_eof() {
        let body = body_of(b"HTTP/1.0 200 OK\r\nContent-Type: text/html\r\n\r\n<main>all</main>");
        assert_eq!(body, b"<main>all</main>");
    }

    #[test]
    fn short_body_is_an_error() {
        let wire = b"HTTP/1.1 200 OK\r\nContent-Length: 50\r\n\r\n<p>";
        assert_eq!(error_code(wire), "net.http.body_truncated");
    }

    #[test]
    fn not_modified_has_no_body_even_when_encoded() {
        let body = body_of(b"HTTP/1.1 304 Not Modified\r\nContent-Encoding: gzip\r\n\r\ngarbage");
        assert!(body.is_empty());
    }

    #[test]
    fn framing_choice_follows_headers() {
        let ok = match HttpStatusCode::new(200) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let framing = |headers: &[Header]| BodyFraming::of(ok, headers);

        assert_eq!(framing(&[]), Ok(BodyFraming::UntilClose));
        assert_eq!(
            framing(&[header("Content-Length", " 42 ")]),
            Ok(BodyFraming::Length(42))
        );
        assert_eq!(
            framing(&[
                header("Transfer-Encoding", "chunked"),
                header("Content-Length", "42"),
            ]),
            Ok(BodyFraming::Chunked)
        );
        let layered = framing(&[header("Transfer-Encoding", "gzip, chunked")]);
        assert!(layered.is_err_and(|error| error.code == "net.http.transfer_coding"));
    }

    #[test]
    fn gzip_and_brotli_documents_are_inflated() {
        let page = b"<main data-glue-page>compressed</main>";

        let mut gzipped = GzEncoder::new(Vec::new(), Compression::fast());
        assert!(gzipped.write_all(page).is_ok());
        let gzipped = match gzipped.finish() {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        let mut brotli = Vec::new();
        {
            let mut writer = CompressorWriter::new(&mut brotli, 4096, 5, 22);
            assert!(writer.write_all(page).is_ok());
        }

        for (coding, encoded) in [("gzip", gzipped), ("br", brotli)] {
            let mut wire = format!(
                "HTTP/1.1 200 OK\r\nContent-Encoding: {coding}\r\nContent-Length: {}\r\n\r\n",
                encoded.len()
            )
            .into_bytes();
            wire.extend_from_slice(&encoded);
            assert_eq!(body_of(&wire), page.to_vec(), "{coding}");
        }
    }

    #[test]
    fn unrequested_content_coding_is_rejected() {
        let wire = b"HTTP/1.1 200 OK\r\nContent-Encoding: deflate\r\nContent-Length: 3\r\n\r\nabc";
        assert_eq!(error_code(wire), "net.http.content_coding");
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut wire = b"HTTP/1.1 200 OK\r\nX-Padding: ".to_vec();
        wire.extend(std::iter::repeat_n(b'a', 70 * 1024));
        wire.extend_from_slice(b"\r\n\r\nbody");
        assert_eq!(error_code(&wire), "net.http.head_truncated");
    }

    #[test]
    fn redirect_target_resolves_location_only_for_followed_statuses() {
        let base = url("https://site.test/docs/intro");
        let reply = |code: u16, location: &str| Reply {
            status: match HttpStatusCode::new(code) {
                Ok(value) => value,
                Err(error) => panic!("{error}"),
            },
            headers: vec![header("Location", location)],
            body: Vec::new(),
        };

        let moved = reply(301, "../guide?x=1");
        let target = match moved.redirect_target(&base) {
            Ok(value) => value.map(|next| next.as_str().to_owned()),
            Err(error) => panic!("{error}"),
        };
        assert_eq!(target.as_deref(), Some("https://site.test/guide?x=1"));

        assert!(reply(304, "/elsewhere").redirect_target(&base).is_ok_and(|next| next.is_none()));
        assert!(reply(200, "/elsewhere").redirect_target(&base).is_ok_and(|next| next.is_none()));
    }

    #[test]
    fn redirect_chain_records_hops_and_stops_loops() {
        let mut chain = RedirectChain::new(url("https://site.test/a"), 5);
        assert!(chain.follow(url("https://site.test/b")).is_ok());
        assert!(chain.follow(url("https://site.test/c")).is_ok());
        assert_eq!(chain.hops(), 2);
        assert_eq!(chain.current().as_str(), "https://site.test/c");

        let looped = chain.follow(url("https://site.test/a"));
        assert!(looped.is_err_and(|error| error.code == "net.redirect.loop"));

        let mut short = RedirectChain::new(url("https://site.test/a"), 1);
        assert!(short.follow(url("https://site.test/b")).is_ok());
        let exhausted = short.follow(url("https://site.test/c"));
        assert!(exhausted.is_err_and(|error| error.code == "net.redirect.limit"));
    }

    /// Serves `replies` in order on a loopback port, one connection each, and
    /// returns the request heads it received.
    fn serve(replies: Vec<&'static str>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = match TcpListener::bind("127.0.0.1:0") {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let address = match listener.local_addr() {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        let server = thread::spawn(move || {
            let mut heads = Vec::new();
            for reply in replies {
                let Ok((socket, _)) = listener.accept() else {
                    break;
                };
                let mut reader = BufReader::new(socket);
                let mut head = String::new();
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => head.push_str(&line),
                    }
                }
                heads.push(head);
                let _ = reader.get_mut().write_all(reply.as_bytes());
            }
            heads
        });

        (format!("http://{address}"), server)
    }

    #[test]
    fn fetch_follows_redirect_and_resends_marker_header() {
        let (base, server) = serve(vec![
            "HTTP/1.1 302 Found\r\nLocation: /landing\r\nContent-Length: 0\r\n\r\n",
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\
             Content-Length: 13\r\n\r\n<p>landed</p>",
        ]);

        let client = match Http11Client::new() {
            Ok(value) => value.with_io_timeout(Duration::from_secs(5)),
            Err(error) => panic!("{error}"),
        };
        let request = match NavigationRequest::get(format!("{base}/start"))
            .with_header("X-Glue-Request", "true")
        {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        let response = match client.fetch(&request) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(response.status, 200);
        assert_eq!(response.url, format!("{base}/landing"));
        assert_eq!(response.redirects, [format!("{base}/start")]);
        assert_eq!(response.text(), "<p>landed</p>");

        let heads = match server.join() {
            Ok(value) => value,
            Err(_) => panic!("loopback server panicked"),
        };
        assert_eq!(heads.len(), 2);
        assert!(heads[0].starts_with("GET /start HTTP/1.1\r\n"));
        assert!(heads[1].starts_with("GET /landing HTTP/1.1\r\n"));
        assert!(heads.iter().all(|head| head.contains("X-Glue-Request: true\r\n")));
    }
}
