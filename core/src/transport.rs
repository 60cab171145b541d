//! HTTPS transport for `HttpRequest` values.
//!
//! # Design
//! One `reqwest::Client` (rustls) per `OutlineClient`, configured with the
//! client's timeout and TLS verification mode. Idle pooling is disabled, so
//! every exchange opens its own connection and tears it down when the
//! response has been read. The transport never interprets status codes; it
//! returns every response as data and leaves judgement to `OutlineApi`.

use reqwest::{Certificate, Client, Method};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, TlsVerification};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .http1_only();

        builder = match config.tls() {
            TlsVerification::Disabled => {
                warn!("TLS certificate verification is disabled for the Outline API");
                builder.danger_accept_invalid_certs(true)
            }
            TlsVerification::SystemRoots => builder,
            TlsVerification::Pinned(pem) => {
                let cert = Certificate::from_pem(pem.as_bytes())
                    .map_err(|e| ApiError::Config(format!("invalid trust certificate: {e}")))?;
                builder.tls_built_in_root_certs(false).add_root_certificate(cert)
            }
        };

        let client = builder.build().map_err(ApiError::from_transport)?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: Url) -> Result<HttpResponse, ApiError> {
        self.execute(bare(HttpMethod::Get, url)).await
    }

    pub async fn post(&self, url: Url, body: String) -> Result<HttpResponse, ApiError> {
        self.execute(with_json(HttpMethod::Post, url, body)).await
    }

    pub async fn put(&self, url: Url, body: String) -> Result<HttpResponse, ApiError> {
        self.execute(with_json(HttpMethod::Put, url, body)).await
    }

    pub async fn delete(&self, url: Url) -> Result<HttpResponse, ApiError> {
        self.execute(bare(HttpMethod::Delete, url)).await
    }

    /// Perform one request/response exchange.
    ///
    /// The URL path carries the API secret, so only the host is recorded.
    #[instrument(
        skip_all,
        fields(method = request.method.as_str(), host = request.url.host_str().unwrap_or_default())
    )]
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.client.request(method(request.method), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        debug!("sending request");
        let response = builder.send().await.map_err(ApiError::from_transport)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| ApiError::Parse(format!("response body is not UTF-8: {e}")))?;
        debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse { status, headers, body })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn bare(method: HttpMethod, url: Url) -> HttpRequest {
    HttpRequest {
        method,
        url,
        headers: Vec::new(),
        body: None,
    }
}

fn with_json(method: HttpMethod, url: Url, body: String) -> HttpRequest {
    HttpRequest {
        method,
        url,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    }
}
