// src/extract/scope.rs
// =============================================================================
// This module decides which raw links we keep.
//
// Every raw link goes through the same checks, in order. The first failing
// check rejects it:
//   1. it must parse as a URL (relative references are fine)
//   2. relative references are resolved against the target page
//   3. mailto:/tel: style links are dropped
//   4. the host must be the target's host or a subdomain of it
//   5. media, fonts, archives, documents and XML are dropped
//   6. .js paths are kept only in --js mode, and only they are kept there
//   7. a link pointing back at the target itself is dropped
// =============================================================================

use crate::targets::Target;
use std::fmt;
use url::Url;

/// File suffixes that are never interesting, whatever the other filters say.
const JUNK_EXTENSIONS: &[&str] = &[
    ".css", ".jpeg", ".jpg", ".png", ".gif", ".svg", ".ico", ".webp", //
    ".mp4", ".mov", ".avi", ".webm", ".mkv", //
    ".woff", ".woff2", ".ttf", ".eot", ".otf", //
    ".pdf", ".docx", ".xlsx", ".pptx", ".zip", ".rar", ".7z", //
    ".xml",
];

/// Which rule turned a link away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unparseable,
    Scheme,
    OutOfScope,
    JunkExtension,
    ScriptFilter,
    SelfReference,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Unparseable => "unparseable",
            Rejection::Scheme => "non-web scheme",
            Rejection::OutOfScope => "out of scope",
            Rejection::JunkExtension => "junk extension",
            Rejection::ScriptFilter => "filtered by .js mode",
            Rejection::SelfReference => "points at the target itself",
        };
        f.write_str(reason)
    }
}

/// The resolve-and-filter stage of the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkFilter {
    /// Keep only `.js` paths instead of dropping them.
    pub js_only: bool,
}

impl LinkFilter {
    pub fn new(js_only: bool) -> Self {
        Self { js_only }
    }

    /// Resolves `raw` against `target` and runs every scope rule over it.
    ///
    /// Returns the absolute URL when the link is kept.
    pub fn evaluate(&self, raw: &str, target: &Target) -> Result<Url, Rejection> {
        // Url::options().base_url() does both steps at once: absolute input
        // is taken as-is, anything else is resolved like a browser would
        let resolved = Url::options()
            .base_url(Some(target.url()))
            .parse(raw)
            .map_err(|_| Rejection::Unparseable)?;

        let scheme = resolved.scheme();
        if scheme.starts_with("mail") || scheme.starts_with("tel") {
            return Err(Rejection::Scheme);
        }

        match resolved.host_str() {
            Some(host) if in_scope(host, target.host()) => {}
            _ => return Err(Rejection::OutOfScope),
        }

        let path = resolved.path();
        if is_junk_path(path) {
            return Err(Rejection::JunkExtension);
        }

        if path.ends_with(".js") != self.js_only {
            return Err(Rejection::ScriptFilter);
        }

        // Compared as text against the target as given, so `/` on
        // `http://example.com` is kept as `http://example.com/`
        if resolved.as_str() == target.as_str() || raw == target.as_str() {
            return Err(Rejection::SelfReference);
        }

        Ok(resolved)
    }
}

/// Same host, or a subdomain of it. The target is always the anchor:
/// `example.com.evil.com` is not in scope for `example.com`.
pub fn in_scope(host: &str, target_host: &str) -> bool {
    host == target_host
        || host
            .strip_suffix(target_host)
            .map_or(false, |prefix| prefix.ends_with('.'))
}

pub fn is_junk_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    JUNK_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
