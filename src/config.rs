use std::num::NonZeroU32;
use std::time::Duration;

use crate::matching::DEFAULT_MATCH_THRESHOLD;

/// Pacing and matching knobs for a harvesting run.
///
/// The defaults are tuned for the Graph API's documented rate limits; tests
/// typically zero the delays.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use grampull::FetchConfig;
///
/// let config = FetchConfig::new()
///     .comment_cap(500)
///     .inter_post_delay(Duration::from_secs(10));
/// ```
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub(crate) inter_page_delay: Duration,
    pub(crate) inter_post_delay: Duration,
    pub(crate) request_timeout: Duration,
    pub(crate) comment_cap: usize,
    pub(crate) match_threshold: f64,
    pub(crate) requests_per_minute: NonZeroU32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            inter_page_delay: Duration::from_secs(1),
            inter_post_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            comment_cap: 30_000,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            requests_per_minute: NonZeroU32::new(120).unwrap(),
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause between consecutive page fetches within one pagination walk.
    #[must_use]
    pub fn inter_page_delay(mut self, delay: Duration) -> Self {
        self.inter_page_delay = delay;
        self
    }

    /// Pause between input rows, on top of the inter-page delay.
    #[must_use]
    pub fn inter_post_delay(mut self, delay: Duration) -> Self {
        self.inter_post_delay = delay;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Upper bound on comments plus replies accumulated per post.
    #[must_use]
    pub fn comment_cap(mut self, cap: usize) -> Self {
        self.comment_cap = cap;
        self
    }

    /// Minimum similarity for a fuzzy page-name match to be accepted.
    #[must_use]
    pub fn match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    #[must_use]
    pub fn requests_per_minute(mut self, quota: NonZeroU32) -> Self {
        self.requests_per_minute = quota;
        self
    }
}
