use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Everything that can go wrong between an input row and its records.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL has no `/p/` or `/reel/` segment to take a media code from.
    #[error("could not extract a media code from url: {0}")]
    InvalidUrlFormat(String),

    #[error("no facebook page matched client name: {0}")]
    NoMatchingPage(String),

    #[error("no instagram business account connected to page {0}")]
    NoInstagramAccount(String),

    #[error("no media found with code {0}")]
    MediaNotFound(String),

    /// An HTTP call failed outright. Transport-level failures (timeouts,
    /// connection refused) carry a status of 0.
    #[error("api request failed (status {status}): {body}")]
    ApiRequestFailed { status: u16, body: String },

    /// A page fetch failed partway through a media scan. Carries the last
    /// cursor seen so the caller knows how far the scan got.
    #[error("pagination failed after cursor {last_cursor:?}: {reason}")]
    PaginationError {
        last_cursor: Option<String>,
        reason: String,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map_or(0, |s| s.as_u16());
        // reqwest embeds the full request URL in its display text, and our
        // request URLs carry the access token as a query parameter. Drop
        // the URL before the message can reach a log line.
        FetchError::ApiRequestFailed {
            status,
            body: err.without_url().to_string(),
        }
    }
}

impl FetchError {
    /// Whether this failure looks like a Graph API throttle. 429 is the
    /// transport-level signal; error codes 4, 17 and 32 are the app-,
    /// user- and page-level rate limits in the response body.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            FetchError::ApiRequestFailed { status, body } => {
                *status == 429
                    || ["\"code\":4,", "\"code\":17,", "\"code\":32,"]
                        .iter()
                        .any(|code| body.contains(code))
            }
            _ => false,
        }
    }
}
