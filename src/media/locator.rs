use std::path::PathBuf;

use super::MediaError;

/// Where a locator points once it has been understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A local file.
    File(PathBuf),
    /// An `http://` or `https://` URL, fetched before decoding.
    Remote(String),
}

/// Classify a media locator.
///
/// Plain paths are taken as-is, `file://` URIs are percent-decoded and
/// `http(s)://` URLs (the backend's stream endpoints) are kept as remote
/// sources. Any other scheme (`s3://`, `ftp://`, ...) is rejected.
pub fn resolve_locator(locator: &str) -> Result<Locator, MediaError> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(MediaError::UnsupportedLocator(String::new()));
    }

    if let Some(rest) = locator.strip_prefix("file://") {
        // file://host/path is not something we can open; file:///path is.
        let path = rest.strip_prefix("localhost").unwrap_or(rest);
        if !path.starts_with('/') {
            return Err(MediaError::UnsupportedLocator(locator.to_string()));
        }
        let decoded = urlencoding::decode(path)
            .map_err(|_| MediaError::UnsupportedLocator(locator.to_string()))?;
        return Ok(Locator::File(PathBuf::from(decoded.into_owned())));
    }

    match scheme(locator) {
        Some(s) if s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https") => {
            Ok(Locator::Remote(locator.to_string()))
        }
        Some(_) => Err(MediaError::UnsupportedLocator(locator.to_string())),
        None => Ok(Locator::File(PathBuf::from(locator))),
    }
}

/// RFC 3986 scheme followed by "://". Windows drive letters ("C:\") do not
/// match because of the required slashes.
fn scheme(locator: &str) -> Option<&str> {
    let (scheme, _) = locator.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}
