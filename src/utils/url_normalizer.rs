//! URL normalization and sanitization utilities.
//!
//! Ensures a consistent representation of long URLs so that reuse lookups on
//! `(long_url, kind, owner)` match equivalent spellings of the same target.

use url::{ParseError, Url};

/// Scheme assumed for inputs that omit one, e.g. `example.com/page`.
const DEFAULT_SCHEME_PREFIX: &str = "https://";

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must have a host")]
    MissingHost,
}

/// Normalizes a URL to a canonical form.
///
/// # Normalization Rules
///
/// 1. **Missing scheme**: `https://` is prepended, also for `host:port/path` input
/// 2. **Protocol**: Only HTTP and HTTPS are allowed
/// 3. **Hostname**: Converted to lowercase
/// 4. **Default ports**: Removed (80 for HTTP, 443 for HTTPS)
/// 5. **Fragments**: Removed
/// 6. **Path and query**: Preserved as-is
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed URLs.
/// Returns [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes
/// such as `javascript:` or `data:`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM:443/Path#top").unwrap(),
///     "https://example.com/Path"
/// );
/// assert_eq!(normalize_url("example.com").unwrap(), "https://example.com/");
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let input = input.trim();

    let mut url = match Url::parse(input) {
        Ok(url) if !is_host_with_port(&url) => url,
        Ok(_) | Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("{DEFAULT_SCHEME_PREFIX}{input}"))
                .map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?
        }
        Err(e) => return Err(UrlNormalizationError::InvalidFormat(e.to_string())),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    url.set_fragment(None);

    // Url::parse already lowercases hosts and drops default ports for special schemes.
    Ok(url.to_string())
}

/// True for schemeless `host:port` input such as `example.com:8080/x`, which
/// parses with the host as its scheme.
fn is_host_with_port(url: &Url) -> bool {
    let scheme = url.scheme();
    scheme.contains('.') || scheme == "localhost"
}
