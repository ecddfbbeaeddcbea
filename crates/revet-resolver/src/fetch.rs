use crate::reference::RemoteRef;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, timeout).
    #[error("transport failure for '{reference}': {reason}")]
    Transport { reference: String, reason: String },

    /// The host answered with something other than success or a plain
    /// not-found, so absence cannot be assumed.
    #[error("'{reference}' fetch returned HTTP {status}")]
    Status { reference: String, status: u16 },
}

/// Retrieves the raw text behind a remote reference.
///
/// `Ok(None)` means the file definitively does not exist at that location,
/// which lets the resolver move on to the next candidate extension.
/// Transport and auth failures are errors, never silent absence.
pub trait RefFetcher: Send {
    fn fetch(&self, reference: &RemoteRef) -> Result<Option<String>, FetchError>;
}

const DEFAULT_RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher backed by the raw-content endpoint of a GitHub-style host.
pub struct RawContentFetcher {
    client: reqwest::blocking::Client,
    base: String,
    token: Option<String>,
}

impl RawContentFetcher {
    pub fn new(base: Option<String>, token: Option<String>) -> Result<RawContentFetcher, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| FetchError::Transport {
                reference: "<client setup>".to_string(),
                reason: err.to_string(),
            })?;
        Ok(RawContentFetcher {
            client,
            base: base.unwrap_or_else(|| DEFAULT_RAW_CONTENT_BASE.to_string()),
            token,
        })
    }

    fn url_for(&self, reference: &RemoteRef) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.base.trim_end_matches('/'),
            reference.owner,
            reference.repo,
            reference.branch,
            reference.path
        )
    }
}

impl RefFetcher for RawContentFetcher {
    fn fetch(&self, reference: &RemoteRef) -> Result<Option<String>, FetchError> {
        let url = self.url_for(reference);
        debug!(%url, "fetching remote module");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|err| FetchError::Transport {
            reference: reference.to_string(),
            reason: err.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                reference: reference.to_string(),
                status: status.as_u16(),
            });
        }
        let text = response.text().map_err(|err| FetchError::Transport {
            reference: reference.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_follows_the_raw_content_layout() {
        let fetcher = RawContentFetcher::new(None, None).expect("client builds");
        let reference = RemoteRef::parse_root("org/repo/checks/length.ts@develop")
            .expect("parses");
        assert_eq!(
            fetcher.url_for(&reference),
            "https://raw.githubusercontent.com/org/repo/develop/checks/length.ts"
        );
    }

    #[test]
    fn custom_base_loses_its_trailing_slash() {
        let fetcher = RawContentFetcher::new(
            Some("https://ghe.example.com/raw/".to_string()),
            None,
        )
        .expect("client builds");
        let reference = RemoteRef::parse_root("org/repo/a.js").expect("parses");
        assert_eq!(
            fetcher.url_for(&reference),
            "https://ghe.example.com/raw/org/repo/main/a.js"
        );
    }
}
