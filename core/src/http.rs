//! HTTP transport types shared by the client and its transports.
//!
//! # Design
//! Requests and responses are plain data. `SlideClient` builds an
//! `HttpRequest`, hands it to a `Transport`, and interprets the returned
//! `HttpResponse`. Keeping the wire exchange as values lets the digest
//! handshake be tested without a socket.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross the FFI
//! boundary without lifetime concerns.

/// The only method the device RPC API accepts.
pub const METHOD: &str = "POST";

/// A JSON POST described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// RPC path exactly as sent, e.g. `/rpc/Slide.GetInfo`. Also the digest `uri`.
    pub path: String,
    /// Absolute URL, `http://{host}{path}`.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Return a copy of this request with one extra header appended.
    pub fn with_header(&self, name: &str, value: String) -> Self {
        let mut next = self.clone();
        next.headers.push((name.to_string(), value));
        next
    }
}

/// An HTTP response described as plain data.
///
/// Non-2xx statuses are carried here rather than as errors; status
/// interpretation is the client's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
