// src/fetch/http.rs
// =============================================================================
// This module downloads target pages.
//
// Key functionality:
// - One shared reqwest Client, configured once (timeouts, resolver, TLS)
// - Browser-like User-Agent and Accept headers
// - Certificate checks are OFF: recon targets often have self-signed or
//   expired certificates and we still want their links
// - Anything but a 200 is reported as a failure
//
// The caller gets the live Response back and streams its body; dropping the
// Response releases the connection.
// =============================================================================

use super::dns::{DnsConfig, FallbackResolver};
use super::error::FetchError;
use crate::targets::Target;
use anyhow::{Context, Result};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/97.0.4692.99 Safari/537.36";
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Everything the HTTP client is built from.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// `None` means we do not send our HTML-preferring Accept header.
    pub accept: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub keep_alive: Duration,
    pub dns: DnsConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            accept: Some(ACCEPT_HTML.to_string()),
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(30),
            keep_alive: Duration::from_secs(15),
            dns: DnsConfig::default(),
        }
    }
}

pub struct Fetcher {
    client: Client,
    accept: Option<HeaderValue>,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let resolver = FallbackResolver::new(config.dns);

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .tcp_keepalive(config.keep_alive)
            .dns_resolver(Arc::new(resolver))
            .build()
            .context("failed to build HTTP client")?;

        let accept = config
            .accept
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .context("invalid Accept header value")?;

        Ok(Self { client, accept })
    }

    /// GETs the target page.
    ///
    /// Transport failures are classified (see error.rs); a response with any
    /// status other than 200 is dropped and reported as `FetchError::Status`.
    pub async fn fetch(&self, target: &Target) -> Result<Response, FetchError> {
        let mut request = self.client.get(target.url().clone());
        // Without ours, reqwest still sends its default `Accept: */*`
        if let Some(accept) = &self.accept {
            request = request.header(ACCEPT, accept.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(page = %target, %status, "response received");

        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }
        Ok(response)
    }
}
