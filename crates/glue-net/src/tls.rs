//! Connection streams for navigation fetches, plain or TLS.

use glue_core::GlueError;
use glue_core::GlueResult;
use std::io;
use std::io::Read;
use std::io::Write;
use std::net::TcpStream;

#[cfg(feature = "tls-rustls")]
use rustls::ClientConfig;
#[cfg(feature = "tls-rustls")]
use rustls::ClientConnection;
#[cfg(feature = "tls-rustls")]
use rustls::RootCertStore;
#[cfg(feature = "tls-rustls")]
use rustls::StreamOwned;
#[cfg(feature = "tls-rustls")]
use rustls::pki_types::ServerName;
#[cfg(feature = "tls-rustls")]
use std::sync::Arc;

/// Socket a single navigation request is written to and read from.
pub enum NavigationStream {
    Plain(TcpStream),
    #[cfg(feature = "tls-rustls")]
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for NavigationStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            #[cfg(feature = "tls-rustls")]
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for NavigationStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            #[cfg(feature = "tls-rustls")]
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            #[cfg(feature = "tls-rustls")]
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Wraps connected sockets in TLS, trusting the WebPKI roots and offering
/// only `http/1.1` over ALPN.
#[derive(Debug, Clone)]
pub struct TlsConnector {
    #[cfg(feature = "tls-rustls")]
    config: Arc<ClientConfig>,
}

#[cfg(feature = "tls-rustls")]
impl TlsConnector {
    pub fn new() -> GlueResult<Self> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let mut config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|error| GlueError::network("net.tls.setup", error.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Completes the TLS handshake on `socket` before returning.
    pub fn wrap(&self, mut socket: TcpStream, host: &str) -> GlueResult<NavigationStream> {
        let handshake_error = |detail: String| {
            GlueError::network("net.tls.handshake", format!("TLS with `{host}`: {detail}"))
        };

        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|error| handshake_error(error.to_string()))?;
        let mut session = ClientConnection::new(Arc::clone(&self.config), server_name)
            .map_err(|error| handshake_error(error.to_string()))?;

        while session.is_handshaking() {
            session
                .complete_io(&mut socket)
                .map_err(|error| handshake_error(error.to_string()))?;
        }

        Ok(NavigationStream::Tls(Box::new(StreamOwned::new(session, socket))))
    }
}

#[cfg(not(feature = "tls-rustls"))]
impl TlsConnector {
    pub fn new() -> GlueResult<Self> {
        Ok(Self {})
    }

    pub fn wrap(&self, _socket: TcpStream, host: &str) -> GlueResult<NavigationStream> {
        Err(GlueError::network(
            "net.tls.disabled",
            format!("`{host}` needs HTTPS but glue-net was built without `tls-rustls`"),
        ))
    }
}
