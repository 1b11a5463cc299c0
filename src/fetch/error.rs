// src/fetch/error.rs
// =============================================================================
// Why a target could not be fetched.
//
// reqwest reports every transport problem as one opaque error type. We sort
// them into the categories the console reports on:
//   TLS -> timeout -> DNS/connect -> anything else
// in that order, because a TLS handshake failure is also a connect failure
// as far as reqwest is concerned.
//
// We look at the actual error types in the cause chain first (rustls errors,
// our DnsError, io::ErrorKind) and only fall back to matching words in the
// messages when nothing structural is there.
// =============================================================================

use super::dns::DnsError;
use reqwest::StatusCode;
use std::error::Error as StdError;
use std::io;
use thiserror::Error;

const TLS_MARKERS: &[&str] = &["certificate", "tls", "ssl", "handshake"];
const CONNECT_MARKERS: &[&str] = &["dns", "lookup", "resolve", "connect"];

/// Every way a fetch can fail. None of them stop the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("TLS error: {0}")]
    Tls(#[source] reqwest::Error),

    #[error("timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("DNS or connection error: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
}

impl FetchError {
    /// Short label for log lines.
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::Request(_) => "request",
            FetchError::Tls(_) => "tls",
            FetchError::Timeout(_) => "timeout",
            FetchError::Connect(_) => "connect",
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::Request(err)
        } else if is_tls_failure(&err) {
            FetchError::Tls(err)
        } else if err.is_timeout() || is_timeout(&err) {
            FetchError::Timeout(err)
        } else if err.is_connect() || is_connect_failure(&err) {
            FetchError::Connect(err)
        } else {
            FetchError::Transport(err)
        }
    }
}

/// The causes below `err`, with the payload of any io::Error spliced in.
///
/// `err` itself is skipped: reqwest's own message contains the URL, and a
/// host like `tls.example.com` must not look like a TLS failure.
fn causes<'a>(err: &'a (dyn StdError + 'static)) -> Vec<&'a (dyn StdError + 'static)> {
    let mut found: Vec<&'a (dyn StdError + 'static)> = Vec::new();
    let mut next = err.source();

    while let Some(cause) = next {
        found.push(cause);
        // io::Error::source() skips its payload, so dig it out by hand
        if let Some(payload) = cause.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            found.push(payload);
        }
        next = cause.source();
    }

    found
}

fn mentions(err: &dyn StdError, markers: &[&str]) -> bool {
    let text = err.to_string().to_ascii_lowercase();
    markers.iter().any(|marker| text.contains(marker))
}

fn io_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    err.downcast_ref::<io::Error>().map(io::Error::kind)
}

fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let causes = causes(err);
    causes.iter().any(|cause| cause.is::<rustls::Error>())
        || causes.iter().any(|cause| mentions(*cause, TLS_MARKERS))
}

fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
    causes(err)
        .iter()
        .any(|cause| io_kind(*cause) == Some(io::ErrorKind::TimedOut))
}

fn is_connect_failure(err: &(dyn StdError + 'static)) -> bool {
    let causes = causes(err);
    let structural = causes.iter().any(|cause| {
        cause.is::<DnsError>()
            || matches!(
                io_kind(*cause),
                Some(
                    io::ErrorKind::ConnectionRefused
                        | io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::AddrNotAvailable
                )
            )
    });
    structural || causes.iter().any(|cause| mentions(*cause, CONNECT_MARKERS))
}
