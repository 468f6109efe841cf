/// HTTP transport for the classification backend.
///
/// Talks to the backend using the synchronous `ureq` client. Each call
/// blocks the calling thread only; the controller may have several calls in
/// flight from different threads.
///
/// There is no retry and, unless `api.timeout_ms` is set, no timeout: a
/// hung backend keeps the affected slot in its loading state.
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use super::{MODEL_INFO_PATH, Transport};
use crate::config::schema::ApiConfig;

/// Synchronous JSON-over-HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    agent: ureq::Agent,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Build a transport from the resolved `[api]` config.
    pub fn from_config(config: &ApiConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            base_url: normalize_base_url(&config.base_url),
            agent: builder.build(),
            timeout,
        }
    }

    /// The normalized base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configured request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check whether the backend answers the metadata endpoint.
    pub fn is_healthy(&self) -> bool {
        self.get_json(MODEL_INFO_PATH).is_ok()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, "GET");

        let resp = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("GET {path} failed"))?;

        resp.into_json()
            .with_context(|| format!("GET {path} returned a non-JSON body"))
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, "POST");

        let resp = self
            .agent
            .post(&url)
            .send_json(body)
            .with_context(|| format!("POST {path} failed"))?;

        resp.into_json()
            .with_context(|| format!("POST {path} returned a non-JSON body"))
    }

    fn resource_url(&self, path: &str) -> String {
        self.url(path)
    }
}

/// Strip the trailing slash and pin `localhost` to IPv4.
///
/// "localhost" may resolve to `::1` first, which stalls every request when
/// the backend only binds IPv4.
fn normalize_base_url(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('/')
        .replace("://localhost", "://127.0.0.1")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_from_default_config() {
        let transport = HttpTransport::from_config(&ApiConfig::default());
        assert_eq!(transport.base_url(), "http://127.0.0.1:8000");
        assert_eq!(transport.timeout(), None);
    }

    #[test]
    fn transport_strips_trailing_slash_and_localhost() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            timeout_ms: 2500,
        };
        let transport = HttpTransport::from_config(&config);
        assert_eq!(transport.base_url(), "http://127.0.0.1:8000");
        assert_eq!(transport.timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn resource_url_is_absolute() {
        let transport = HttpTransport::from_config(&ApiConfig::default());
        assert_eq!(
            transport.resource_url("/eda/roc_curve.png"),
            "http://127.0.0.1:8000/eda/roc_curve.png"
        );
    }

    #[test]
    fn unreachable_backend_is_unhealthy() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 500,
        };
        assert!(!HttpTransport::from_config(&config).is_healthy());
    }
}
