//! Canonical form of user-supplied URLs.
//!
//! The normalized string is the key a link is stored under, so
//! `example.com`, `HTTPS://Example.com:443/` and `https://example.com/#top`
//! all map to one link per owner.

use url::Url;

/// Scheme assumed when the input names none.
const DEFAULT_SCHEME: &str = "https";

/// Schemes written as `name:rest` that may legitimately contain an `@`.
const OPAQUE_SCHEMES: &[&str] = &[
    "mailto",
    "javascript",
    "data",
    "tel",
    "sms",
    "file",
    "vbscript",
];

/// Why an input could not be turned into a link target.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlNormalizationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed, got '{0}'")]
    UnsupportedProtocol(String),
}

/// Normalizes `input` into the form links are stored and resolved with.
///
/// - surrounding whitespace is ignored
/// - `https://` is prepended when no scheme is given
/// - only `http` and `https` are accepted, and a host is required
/// - host is lowercased and a default port dropped (done by [`Url`])
/// - the fragment is removed; path and query are kept verbatim
///
/// # Errors
///
/// Returns [`UrlNormalizationError::Empty`] for blank input,
/// [`UrlNormalizationError::UnsupportedProtocol`] for other schemes and
/// [`UrlNormalizationError::InvalidFormat`] for anything [`Url`] rejects.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    let candidate = match explicit_scheme(input) {
        Some(_) => input.to_string(),
        None => format!("{DEFAULT_SCHEME}://{input}"),
    };

    let mut url =
        Url::parse(&candidate).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol(
            url.scheme().to_string(),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::InvalidFormat(
            "URL has no host".to_string(),
        ));
    }

    url.set_fragment(None);
    Ok(url.into())
}

/// The scheme `input` starts with, if it names one.
///
/// `host:port` is not a scheme: a colon followed by a digit is a port.
/// Neither is `user:password@host`, unless `user` is a known opaque scheme
/// such as `mailto`.
fn explicit_scheme(input: &str) -> Option<&str> {
    if let Some((scheme, _)) = input.split_once("://") {
        return Some(scheme);
    }

    let (scheme, rest) = input.split_once(':')?;
    let mut chars = scheme.chars();
    let valid_name = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if !valid_name || rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let has_userinfo = rest.split('/').next().is_some_and(|authority| authority.contains('@'));
    let opaque = OPAQUE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str());
    (!has_userinfo || opaque).then_some(scheme)
}
