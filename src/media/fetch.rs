//! Download of remote sources into memory.
//!
//! rodio decoders need `Read + Seek`, which an HTTP body is not, so a
//! remote track is fetched whole and decoded from a shared buffer.

use std::sync::Arc;
use std::time::Duration;

use super::MediaError;

/// Remote bodies larger than this are refused.
pub(super) const MAX_REMOTE_BYTES: usize = 200 * 1024 * 1024;

/// Fetch `url` and return its body.
pub(super) fn fetch(url: &str, timeout: Duration) -> Result<Arc<[u8]>, MediaError> {
    let fail = |message: String| MediaError::Fetch {
        locator: url.to_string(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| fail(e.to_string()))?;
    let response = client.get(url).send().map_err(|e| fail(e.to_string()))?;

    if !response.status().is_success() {
        return Err(fail(format!("status {}", response.status())));
    }
    if response
        .content_length()
        .is_some_and(|len| len > MAX_REMOTE_BYTES as u64)
    {
        return Err(fail("body too large".to_string()));
    }

    let bytes = response.bytes().map_err(|e| fail(e.to_string()))?;
    if bytes.is_empty() {
        return Err(fail("empty body".to_string()));
    }
    if bytes.len() > MAX_REMOTE_BYTES {
        return Err(fail("body too large".to_string()));
    }

    tracing::debug!(url, len = bytes.len(), "fetched remote source");
    Ok(Arc::from(bytes.as_ref()))
}
