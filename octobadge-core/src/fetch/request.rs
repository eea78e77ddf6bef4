//! Fixed-capacity HTTP GET request description

use core::fmt::{self, Write};

use heapless::{String, Vec};
use octobadge_hal::Header;

use super::FetchError;

/// Maximum URL length
pub const MAX_URL_LEN: usize = 256;

/// Maximum headers per request
pub const MAX_HEADERS: usize = 4;

/// Maximum header name length
pub const MAX_HEADER_NAME_LEN: usize = 32;

/// Maximum header value length (fits `token <pat>`)
pub const MAX_HEADER_VALUE_LEN: usize = 160;

/// A GET request: URL plus headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String<MAX_URL_LEN>,
    headers: Vec<(String<MAX_HEADER_NAME_LEN>, String<MAX_HEADER_VALUE_LEN>), MAX_HEADERS>,
}

impl FetchRequest {
    /// Request for a literal URL
    pub fn get(url: &str) -> Result<Self, FetchError> {
        let mut request = Self {
            url: String::new(),
            headers: Vec::new(),
        };
        request
            .url
            .push_str(url)
            .map_err(|_| FetchError::RequestTooLarge)?;
        Ok(request)
    }

    /// Request for a URL built from format arguments
    pub fn get_fmt(args: fmt::Arguments<'_>) -> Result<Self, FetchError> {
        let mut url = String::new();
        url.write_fmt(args).map_err(|_| FetchError::RequestTooLarge)?;
        Ok(Self {
            url,
            headers: Vec::new(),
        })
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, FetchError> {
        self.push_header(name, format_args!("{}", value))?;
        Ok(self)
    }

    /// Add a header whose value is built from format arguments
    pub fn with_header_fmt(
        mut self,
        name: &str,
        value: fmt::Arguments<'_>,
    ) -> Result<Self, FetchError> {
        self.push_header(name, value)?;
        Ok(self)
    }

    fn push_header(&mut self, name: &str, value: fmt::Arguments<'_>) -> Result<(), FetchError> {
        let mut header_name = String::new();
        header_name
            .push_str(name)
            .map_err(|_| FetchError::RequestTooLarge)?;
        let mut header_value = String::new();
        header_value
            .write_fmt(value)
            .map_err(|_| FetchError::RequestTooLarge)?;
        self.headers
            .push((header_name, header_value))
            .map_err(|_| FetchError::RequestTooLarge)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Borrowed headers in the form the transport takes
    pub fn header_refs(&self) -> Vec<Header<'_>, MAX_HEADERS> {
        self.headers
            .iter()
            .map(|(name, value)| Header::new(name, value))
            .collect()
    }
}
