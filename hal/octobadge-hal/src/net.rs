//! Network abstractions
//!
//! HTTP details (TLS, redirects, status interpretation, auth) live behind
//! [`Transport`]. The runtime only sees a byte stream it can read a bounded
//! chunk at a time, and an opaque error when anything goes wrong.

/// A single request header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

impl<'a> Header<'a> {
    pub const fn new(name: &'a str, value: &'a str) -> Self {
        Self { name, value }
    }
}

/// Errors from network operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetError {
    /// Could not establish the connection
    Connect,
    /// Server answered with a non-success status
    Status(u16),
    /// Error while reading the body
    Read,
    /// Link is down
    NotConnected,
    /// Request could not be built (URL or header rejected)
    InvalidRequest,
}

/// Response body readable in bounded chunks
pub trait ByteStream {
    /// Read up to `buf.len()` bytes
    ///
    /// # Returns
    /// The number of bytes read, 0 at end of stream.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, NetError>;

    /// Total body length if the server announced one
    fn content_length(&self) -> Option<usize> {
        None
    }
}

/// Opens byte streams for URLs
pub trait Transport {
    /// Stream type produced by [`Transport::open`]
    type Stream: ByteStream;

    /// Issue a GET request and return the response body
    ///
    /// Any non-success status must be reported as an error.
    fn open(&mut self, url: &str, headers: &[Header<'_>]) -> Result<Self::Stream, NetError>;
}

/// Wireless link management
pub trait NetworkLink {
    /// Start joining a network; returns immediately
    fn begin_connect(&mut self, ssid: &str, password: Option<&str>) -> Result<(), NetError>;

    /// Whether the link is currently up
    fn is_connected(&mut self) -> bool;
}
