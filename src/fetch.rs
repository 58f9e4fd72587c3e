use std::time::Duration;

use async_trait::async_trait;

/// Per-request ceiling applied to descriptor downloads. No retries; a timed
/// out fetch fails like any other.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub enum FetchError {
    /// Transport failure, including timeout.
    Http(reqwest::Error),
    /// Non-2xx response.
    Status(u16),
    /// 2xx response with no body. Description documents are never empty, so
    /// this is a failure, distinct from a transport error.
    Empty,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(e) => write!(f, "http error: {e}"),
            FetchError::Status(code) => write!(f, "unexpected status {code}"),
            FetchError::Empty => write!(f, "empty response body"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Retrieval of a description document given its URL.
#[async_trait]
pub trait DocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [DocumentFetcher] over a shared reqwest client.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = res.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::FetchError;

    #[test]
    fn error_display() {
        assert_eq!(FetchError::Status(404).to_string(), "unexpected status 404");
        assert_eq!(FetchError::Empty.to_string(), "empty response body");
    }
}
