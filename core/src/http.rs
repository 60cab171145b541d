//! HTTP exchange types shared by the operation layer and the transport.
//!
//! # Design
//! Requests and responses are plain data. `OutlineApi` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network;
//! `Transport` is the only place that turns one into the other. Keeping the
//! boundary as data lets the operation layer be tested without a server.

use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is always freshly composed from the client's base URL and the
/// resolved route; it is never written back to the client.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
