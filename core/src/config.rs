//! Client configuration: API URL, TLS verification and timeout.
//!
//! # Design
//! `ClientConfig` is validated once at construction and read by every call.
//! Outline servers ship a self-signed certificate, so the default TLS mode
//! skips verification; the transport logs that choice when it builds the
//! HTTP client. Supplying a certificate switches to pinned verification.

use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_API_URL: &str = "OUTLINE_API_URL";
pub const ENV_API_CERT: &str = "OUTLINE_API_CERT";
pub const ENV_TIMEOUT_SECS: &str = "OUTLINE_API_TIMEOUT_SECS";

/// How the server certificate is checked during the TLS handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Accept any certificate.
    #[default]
    Disabled,
    /// Verify against the bundled web PKI roots.
    SystemRoots,
    /// Trust only this PEM-encoded certificate as the root anchor. A
    /// self-signed CA certificate served as the leaf does not verify.
    Pinned(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_url: Url,
    tls: TlsVerification,
    timeout: Duration,
}

impl ClientConfig {
    /// Parse the management API URL, e.g. `https://203.0.113.7:8081/XyZsecret`.
    pub fn new(api_url: &str) -> Result<Self, ApiError> {
        let url = Url::parse(api_url)
            .map_err(|e| ApiError::Parse(format!("unable to parse API URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Parse(format!(
                "unsupported API URL scheme: {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() || url.cannot_be_a_base() {
            return Err(ApiError::Parse("API URL must name a host".to_string()));
        }
        Ok(Self {
            api_url: url,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Load the configuration from `OUTLINE_API_URL`, `OUTLINE_API_CERT`
    /// (path to a PEM file) and `OUTLINE_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_url =
            var(ENV_API_URL).ok_or_else(|| ApiError::Config(format!("{ENV_API_URL} is not set")))?;
        let mut config = Self::new(&api_url)?;

        if let Some(path) = var(ENV_API_CERT) {
            let pem = std::fs::read_to_string(&path)
                .map_err(|e| ApiError::Config(format!("unable to read {ENV_API_CERT} ({path}): {e}")))?;
            config = config.with_tls(TlsVerification::Pinned(pem));
        }

        if let Some(raw) = var(ENV_TIMEOUT_SECS) {
            config = config.with_timeout(parse_timeout_secs(&raw)?);
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    /// Shorthand for pinned verification against `pem`.
    pub fn with_certificate(self, pem: impl Into<String>) -> Self {
        self.with_tls(TlsVerification::Pinned(pem.into()))
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn tls(&self) -> &TlsVerification {
        &self.tls
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, ApiError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ApiError::Config(format!(
            "{ENV_TIMEOUT_SECS} must be a positive number of seconds, got {raw:?}"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("https://203.0.113.7:8081/XyZsecret").unwrap();
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.tls(), &TlsVerification::Disabled);
        assert_eq!(config.api_url().port(), Some(8081));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::new("https://example.com/secret")
            .unwrap()
            .with_timeout(Duration::from_secs(10))
            .with_certificate("-----BEGIN CERTIFICATE-----");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(matches!(config.tls(), TlsVerification::Pinned(_)));
    }

    #[test]
    fn malformed_url_is_parse_error() {
        let err = ClientConfig::new("not a url").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn non_http_scheme_is_parse_error() {
        for url in ["ftp://example.com/secret", "mailto:admin@example.com"] {
            let err = ClientConfig::new(url).unwrap_err();
            assert!(matches!(err, ApiError::Parse(_)), "url {url}");
        }
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn env_requires_api_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn env_reads_url_and_timeout() {
        let vars = [
            (ENV_API_URL, "https://203.0.113.7:8081/XyZsecret"),
            (ENV_TIMEOUT_SECS, "9"),
        ];
        let config = ClientConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.api_url().path(), "/XyZsecret");
        assert_eq!(config.timeout(), Duration::from_secs(9));
        assert_eq!(config.tls(), &TlsVerification::Disabled);
    }

    #[test]
    fn env_certificate_path_pins_its_contents() {
        let path = std::env::temp_dir().join(format!("outline-core-cert-{}.pem", std::process::id()));
        std::fs::write(&path, "-----BEGIN CERTIFICATE-----\n").unwrap();
        let path_str = path.to_str().unwrap().to_string();
        let vars = [(ENV_API_URL, "https://example.com/secret"), (ENV_API_CERT, path_str.as_str())];

        let config = ClientConfig::from_lookup(lookup(&vars)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            config.tls(),
            &TlsVerification::Pinned("-----BEGIN CERTIFICATE-----\n".to_string())
        );
    }

    #[test]
    fn env_rejects_unreadable_certificate_and_bad_timeout() {
        let vars = [(ENV_API_URL, "https://example.com/secret"), (ENV_API_CERT, "/nonexistent/outline.pem")];
        assert!(matches!(ClientConfig::from_lookup(lookup(&vars)), Err(ApiError::Config(_))));

        let vars = [(ENV_API_URL, "https://example.com/secret"), (ENV_TIMEOUT_SECS, "0")];
        assert!(matches!(ClientConfig::from_lookup(lookup(&vars)), Err(ApiError::Config(_))));
    }

    #[test]
    fn timeout_parsing() {
        assert_eq!(parse_timeout_secs(" 12 ").unwrap(), Duration::from_secs(12));
        assert!(matches!(parse_timeout_secs("0"), Err(ApiError::Config(_))));
        assert!(matches!(parse_timeout_secs("soon"), Err(ApiError::Config(_))));
    }
}
