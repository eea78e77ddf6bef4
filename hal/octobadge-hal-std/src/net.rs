//! Host networking through `ureq`
//!
//! Requests are blocking, but the body is handed back as a reader so the
//! runtime still pulls it one bounded chunk per frame tick.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use log::{debug, warn};
use octobadge_hal::{ByteStream, Header, NetError, NetworkLink, Transport};
use ureq::{Agent, AgentBuilder};

/// Connect and read timeout for each request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// HTTPS transport backed by a shared `ureq` agent
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: AgentBuilder::new()
                .timeout_connect(timeout)
                .timeout_read(timeout)
                .build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    type Stream = UreqStream;

    fn open(&mut self, url: &str, headers: &[Header<'_>]) -> Result<UreqStream, NetError> {
        let request = headers
            .iter()
            .fold(self.agent.get(url), |request, header| {
                request.set(header.name, header.value)
            });

        match request.call() {
            Ok(response) => {
                let content_length = response
                    .header("Content-Length")
                    .and_then(|value| value.trim().parse().ok());
                debug!("GET {} -> {} ({:?} bytes)", url, response.status(), content_length);
                Ok(UreqStream {
                    reader: response.into_reader(),
                    content_length,
                })
            }
            Err(ureq::Error::Status(code, _)) => {
                warn!("GET {} -> {}", url, code);
                Err(NetError::Status(code))
            }
            Err(ureq::Error::Transport(e)) => {
                warn!("GET {} failed: {}", url, e);
                match e.kind() {
                    ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
                        Err(NetError::InvalidRequest)
                    }
                    _ => Err(NetError::Connect),
                }
            }
        }
    }
}

/// Response body of a [`UreqTransport`] request
pub struct UreqStream {
    reader: Box<dyn Read + Send + Sync + 'static>,
    content_length: Option<usize>,
}

impl core::fmt::Debug for UreqStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UreqStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl ByteStream for UreqStream {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("Body read failed: {}", e);
                    return Err(NetError::Read);
                }
            }
        }
    }

    fn content_length(&self) -> Option<usize> {
        self.content_length
    }
}

/// The host's own network connection
///
/// Joining is a no-op; the link reports up once a join was requested.
#[derive(Debug, Clone, Default)]
pub struct HostLink {
    joined: bool,
}

impl NetworkLink for HostLink {
    fn begin_connect(&mut self, ssid: &str, _password: Option<&str>) -> Result<(), NetError> {
        debug!("Host link: pretending to join {}", ssid);
        self.joined = true;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.joined
    }
}
