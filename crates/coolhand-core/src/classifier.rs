//! Destination and content-type classification.
//!
//! Every predicate here is lexical and total: malformed input resolves to the
//! conservative answer (`false`) instead of an error. No DNS lookups.
//!
//! ```text
//! URL → host_of → is_local? ──yes──→ not of interest
//!                     │no
//!                     ▼
//!             is_known_provider? ──no──→ not of interest
//!                     │yes
//!                     ▼
//!               of interest (capture)
//! ```

use std::net::Ipv4Addr;

use url::{Host, Url};

use crate::providers::provider_for_host;

/// Media types whose bodies are streamed and must never be buffered.
pub const STREAMING_CONTENT_TYPES: &[&str] = &["text/event-stream", "application/x-ndjson"];

/// Returns the lowercase host of a URL.
///
/// IPv6 hosts keep their brackets (`[::1]`). Returns `None` for relative or
/// unparseable URLs.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Checks if a URL points at the local machine.
///
/// True for `localhost`, `127.0.0.1`, `0.0.0.0` and `[::1]`, whatever the
/// scheme, port or path.
///
/// # Examples
///
/// ```
/// use coolhand_core::is_local;
///
/// assert!(is_local("http://localhost:8000/api"));
/// assert!(is_local("http://[::1]:8000/api"));
/// assert!(!is_local("https://api.openai.com/v1/chat"));
/// ```
pub fn is_local(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    match parsed.host() {
        Some(Host::Domain(domain)) => {
            // Non-special schemes leave IP literals as opaque domains.
            let domain = domain.trim_end_matches('.');
            domain.eq_ignore_ascii_case("localhost") || domain == "127.0.0.1" || domain == "0.0.0.0"
        }
        Some(Host::Ipv4(ip)) => ip == Ipv4Addr::LOCALHOST || ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Checks if a URL points at a known LLM provider API.
///
/// # Examples
///
/// ```
/// use coolhand_core::is_known_provider;
///
/// assert!(is_known_provider("https://api.anthropic.com/v1/messages"));
/// assert!(!is_known_provider("https://anagramica.com/solve"));
/// ```
pub fn is_known_provider(url: &str) -> bool {
    match host_of(url) {
        Some(host) => provider_for_host(&host).is_some(),
        None => false,
    }
}

/// Checks if a content type denotes a streaming body.
///
/// Parameters such as `charset` are ignored, and the comparison is
/// case-insensitive on the type/subtype.
pub fn is_streaming_content_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    STREAMING_CONTENT_TYPES
        .iter()
        .any(|streaming| media_type.eq_ignore_ascii_case(streaming))
}

/// Checks if a call to this URL should be captured.
///
/// Local destinations win over provider matches, so a provider-shaped URL
/// served from loopback is never captured.
pub fn is_of_interest(url: &str) -> bool {
    is_known_provider(url) && !is_local(url)
}
