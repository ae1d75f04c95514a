//! Remote workbook download

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{SheetError, SheetResult};

/// Connect timeout for remote workbook downloads
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Some file hosts answer 403 to clients without a browser agent
pub const FETCH_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 5.0; Windows NT; DigExt)";

/// Percent-decode a file URL as handed over by upstream services
pub fn decode_url(raw: &str) -> SheetResult<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SheetError::Fetch(format!("Invalid file URL '{}': {}", raw, e)))
}

/// Download the full body at `url`. Connect failures, timeouts and non-2xx
/// statuses are errors.
pub async fn fetch_remote(url: &str) -> SheetResult<Vec<u8>> {
    let decoded = decode_url(url)?;

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(FETCH_USER_AGENT)
        .build()
        .map_err(|e| SheetError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

    debug!("Fetching workbook from {}", decoded);
    let response = client.get(&decoded).send().await.map_err(|e| {
        warn!("Workbook fetch failed for {}: {}", decoded, e);
        if e.is_timeout() || e.is_connect() {
            SheetError::Fetch(format!("Could not connect to {}: {}", decoded, e))
        } else {
            SheetError::Fetch(format!("Request to {} failed: {}", decoded, e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SheetError::Fetch(format!(
            "Fetching {} returned HTTP {}",
            decoded, status
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| SheetError::Fetch(format!("Failed to read body from {}: {}", decoded, e)))?;
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_url() {
        assert_eq!(
            decode_url("https://files.example.com/a%20b/%E6%8A%A5%E8%A1%A8.xlsx").unwrap(),
            "https://files.example.com/a b/报表.xlsx"
        );
        assert_eq!(
            decode_url("https://files.example.com/plain.xls").unwrap(),
            "https://files.example.com/plain.xls"
        );
    }

    #[test]
    fn test_decode_url_rejects_invalid_utf8() {
        assert!(matches!(
            decode_url("https://x/%FF%FE.xlsx"),
            Err(SheetError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_error() {
        let result = fetch_remote("not a url").await;
        assert!(matches!(result, Err(SheetError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_refused_connection_is_error() {
        // Port 9 (discard) is closed on loopback in test environments
        let result = fetch_remote("http://127.0.0.1:9/book.xlsx").await;
        assert!(matches!(result, Err(SheetError::Fetch(_))));
    }
}
