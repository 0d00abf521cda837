// Endpoint discovery: GET <origin>/baseurl -> "host[:port]" for the stats socket

use crate::error::MonitorError;
use crate::version::user_agent;
use reqwest::Url;
use std::time::Duration;

/// Path of the discovery endpoint on the origin.
pub const BASEURL_PATH: &str = "/baseurl";

/// The origin the monitor acts on behalf of; its scheme decides `ws:` vs `wss:`.
#[derive(Debug, Clone)]
pub struct PageOrigin {
    url: Url,
}

impl PageOrigin {
    pub fn parse(origin: &str) -> Result<Self, MonitorError> {
        let invalid = |reason: String| MonitorError::InvalidOrigin {
            origin: origin.to_string(),
            reason,
        };
        let url = Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme {:?}", other))),
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }
        Ok(Self { url })
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// `wss:` for an https origin, `ws:` otherwise.
    pub fn socket_scheme(&self) -> &'static str {
        if self.is_secure() { "wss:" } else { "ws:" }
    }

    pub fn baseurl_endpoint(&self) -> Result<Url, MonitorError> {
        self.url
            .join(BASEURL_PATH)
            .map_err(|e| MonitorError::InvalidOrigin {
                origin: self.url.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Resolves the stream's base address with one request per call.
pub struct EndpointResolver {
    client: reqwest::Client,
    origin: PageOrigin,
}

impl EndpointResolver {
    pub fn new(origin: PageOrigin, timeout: Duration) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(|e| MonitorError::StartupResolution(format!("building client: {}", e)))?;
        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &PageOrigin {
        &self.origin
    }

    /// `GET /baseurl`; the trimmed body must be non-empty.
    pub async fn resolve(&self) -> Result<String, MonitorError> {
        let url = self.origin.baseurl_endpoint()?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MonitorError::StartupResolution(format!("GET {}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::StartupResolution(format!(
                "GET {} returned {}",
                url, status
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| MonitorError::StartupResolution(format!("reading body: {}", e)))?;
        let base = body.trim();
        if base.is_empty() {
            return Err(MonitorError::StartupResolution(format!(
                "GET {} returned an empty body",
                url
            )));
        }
        tracing::debug!(base, "resolved stream endpoint");
        Ok(base.to_string())
    }
}
