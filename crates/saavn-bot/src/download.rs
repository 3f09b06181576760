//! Size-capped streaming downloads.

#[cfg(test)]
#[path = "download_tests.rs"]
mod download_tests;

use std::path::Path;

use futures::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("file exceeds the {limit_bytes} byte limit")]
    TooLarge { limit_bytes: u64 },

    #[error("could not write download: {0}")]
    Io(#[from] std::io::Error),
}

/// Stream `url` into `dest`, giving up as soon as the transfer would exceed
/// `max_bytes`. Redirects are followed by the client itself; the declared
/// Content-Length is checked up front, and the streamed byte count is
/// checked as chunks arrive in case the server lied about the length.
///
/// On any error the partial file is removed before returning.
pub async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    max_bytes: Option<u64>,
) -> Result<u64, DownloadError> {
    let result = stream_to_file(client, url, dest, max_bytes).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(dest).await {
            debug!("No partial file to remove at {}: {}", dest.display(), e);
        }
    }
    result
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    max_bytes: Option<u64>,
) -> Result<u64, DownloadError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(DownloadError::Status(resp.status()));
    }

    if let (Some(limit), Some(declared)) = (max_bytes, resp.content_length()) {
        if declared > limit {
            return Err(DownloadError::TooLarge { limit_bytes: limit });
        }
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = resp.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        if let Some(limit) = max_bytes {
            if written > limit {
                return Err(DownloadError::TooLarge { limit_bytes: limit });
            }
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    debug!("Downloaded {} bytes to {}", written, dest.display());
    Ok(written)
}
