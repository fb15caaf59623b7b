use std::sync::Arc;

use async_stream::stream;
use futures::pin_mut;
use futures::stream::{Stream, StreamExt};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::matching::similarity;
use crate::models::{
    Comment, CommentStub, Envelope, MediaItem, PageAccount, PageDetail, Reply, ReplyStub,
};
use crate::url::media_code_from_url;

type GraphRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

const GRAPH_URL: &str = "https://graph.facebook.com";
const API_VERSION: &str = "v22.0";
const PAGE_SIZE: u8 = 100;

/// An opinionated asynchronous `Client` for the Graph API's Instagram
/// comment surface.
///
/// Every request is gated behind a per-client rate limiter, and pagination
/// walks sleep between pages on top of that. The client is [`Send`] and
/// [`Sync`], and cloning it shares the underlying connection pool and
/// limiter.
///
/// # Example
/// ```rust,no_run
/// use grampull::Client;
///
/// # #[tokio::main]
/// # async fn main() -> grampull::Result<()> {
/// let client = Client::new("access-token");
///
/// let account_id = client.resolve_business_account("Acme").await?;
/// let media_id = client.locate_media(&account_id, "C1aB2cD3eF4").await?;
/// let comments = client.harvest_comments(&media_id).await?;
///
/// println!("harvested {} top-level comments", comments.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    token: String,
    config: FetchConfig,
    base_url: String,
    limiter: Arc<GraphRateLimiter>,
}

impl Client {
    /// Creates a client with the default [`FetchConfig`].
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(token, FetchConfig::default())
    }

    pub fn with_config(token: impl Into<String>, config: FetchConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build http client");
        Self::with_client(http, token, config)
    }

    /// Creates a client backed by the given [`reqwest::Client`]. The caller
    /// is responsible for configuring a finite request timeout on it.
    pub fn with_client(
        http: reqwest::Client,
        token: impl Into<String>,
        config: FetchConfig,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(
            config.requests_per_minute,
        )));
        Self {
            http,
            token: token.into(),
            config,
            base_url: GRAPH_URL.to_string(),
            limiter,
        }
    }

    /// Points the client at a different Graph API host. Intended for tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn endpoint(&self, tail: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, tail)
    }

    /// Resolves a client name to the ID of the Instagram Business Account
    /// connected to the best-matching Facebook Page.
    ///
    /// An exact (case-insensitive) page-name match wins outright; otherwise
    /// the highest-scoring fuzzy candidate above the configured threshold is
    /// used. Two HTTP calls, no shared state, safe to repeat.
    pub async fn resolve_business_account(&self, client_name: &str) -> Result<String> {
        let url = format!(
            "{}?access_token={}",
            self.endpoint("me/accounts"),
            self.token
        );
        let accounts: Envelope<PageAccount> = self.fetch_json(&url).await?;

        info!(
            client_name,
            candidates = accounts.data.len(),
            "searching managed pages"
        );

        let mut selected: Option<&PageAccount> = None;
        let mut best: Option<(f64, &PageAccount)> = None;

        for page in &accounts.data {
            if page.name.to_lowercase() == client_name.to_lowercase() {
                info!(page_name = %page.name, page_id = %page.id, "exact page name match");
                selected = Some(page);
                break;
            }

            let score = similarity(client_name, &page.name);
            debug!(page_name = %page.name, score, "fuzzy candidate");
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, page));
            }
        }

        let page = match selected {
            Some(page) => page,
            None => match best {
                Some((score, page)) if score > self.config.match_threshold => {
                    info!(page_name = %page.name, score, "fuzzy page name match");
                    page
                }
                _ => return Err(FetchError::NoMatchingPage(client_name.to_string())),
            },
        };

        let url = format!(
            "{}?fields=instagram_business_account&access_token={}",
            self.endpoint(&page.id),
            self.token
        );
        let detail: PageDetail = self.fetch_json(&url).await?;

        match detail.instagram_business_account {
            Some(account) => {
                info!(account_id = %account.id, "resolved instagram business account");
                Ok(account.id)
            }
            None => Err(FetchError::NoInstagramAccount(page.id.clone())),
        }
    }

    /// Scans the account's media list, newest first, for the item whose
    /// permalink carries `media_code`, and returns its internal media ID.
    ///
    /// The scan is deliberately exhaustive: a post can be arbitrarily far
    /// back in the account's history, so the only stop conditions are a
    /// match, the API running out of pages ([`FetchError::MediaNotFound`]),
    /// or a failed page fetch ([`FetchError::PaginationError`]).
    pub async fn locate_media(&self, account_id: &str, media_code: &str) -> Result<String> {
        let first = format!(
            "{}?fields=id,permalink,timestamp,collaborators,tagged_accounts,mentioned_profiles,branded_content_partner&limit={}&access_token={}",
            self.endpoint(&format!("{account_id}/media")),
            PAGE_SIZE,
            self.token
        );

        info!(account_id, media_code, "scanning media list");

        let pages = self.pages::<MediaItem>(first);
        pin_mut!(pages);

        let mut last_cursor: Option<String> = None;
        let mut page_no = 0u32;
        let mut scanned = 0usize;

        while let Some(result) = pages.next().await {
            let envelope = match result {
                Ok(envelope) => envelope,
                Err(err) => {
                    return Err(FetchError::PaginationError {
                        last_cursor,
                        reason: err.to_string(),
                    })
                }
            };

            page_no += 1;
            scanned += envelope.data.len();

            for media in &envelope.data {
                if let Ok(code) = media_code_from_url(&media.permalink) {
                    if code == media_code {
                        info!(media_id = %media.id, page = page_no, "found matching media");
                        log_collaboration(media);
                        return Ok(media.id.clone());
                    }
                }
            }

            if let Some(oldest) = envelope.data.last().and_then(|m| m.timestamp.as_deref()) {
                debug!(page = page_no, oldest, "no match on this page yet");
            }

            last_cursor = envelope
                .paging
                .and_then(|paging| paging.cursors)
                .and_then(|cursors| cursors.after);
        }

        warn!(media_code, pages = page_no, scanned, "media scan exhausted");
        Err(FetchError::MediaNotFound(media_code.to_string()))
    }

    /// Harvests the media's comments and their direct replies, up to the
    /// configured cap on comments plus replies.
    ///
    /// Comments come back in API order; each comment's replies in reply-
    /// pagination order. A failure on the very first comments page is an
    /// error; any later page failure, outer or inner, keeps whatever has
    /// been accumulated so far, since partial data is still useful here.
    /// When the cap lands mid-way through a comment's reply walk, the
    /// replies already fetched are kept and the remaining pages abandoned.
    pub async fn harvest_comments(&self, media_id: &str) -> Result<Vec<Comment>> {
        let cap = self.config.comment_cap;
        let first = format!(
            "{}?fields=id,text,timestamp,username,like_count,replies{{id,text,timestamp,username,like_count}}&limit={}&access_token={}",
            self.endpoint(&format!("{media_id}/comments")),
            PAGE_SIZE,
            self.token
        );

        info!(media_id, cap, "harvesting comments");

        let mut stubs: Vec<CommentStub> = Vec::new();
        let mut total = 0usize;

        {
            let pages = self.pages::<CommentStub>(first);
            pin_mut!(pages);
            let mut page_no = 0u32;

            while total < cap {
                let Some(result) = pages.next().await else {
                    break;
                };
                page_no += 1;

                match result {
                    Ok(envelope) => {
                        if envelope.data.is_empty() {
                            break;
                        }
                        total += envelope.data.len();
                        debug!(
                            page = page_no,
                            count = envelope.data.len(),
                            total,
                            "comments page"
                        );
                        stubs.extend(envelope.data);
                    }
                    // Nothing harvested yet, so there is nothing partial to keep.
                    Err(err) if page_no == 1 => return Err(err),
                    Err(err) => {
                        log_branch_failure(&err, "comments");
                        break;
                    }
                }
            }
        }

        let mut comments = Vec::with_capacity(stubs.len());

        for stub in stubs {
            let mut replies: Vec<Reply> = Vec::new();
            let mut next_url: Option<String> = None;

            if let Some(envelope) = stub.replies {
                replies.extend(envelope.data.into_iter().map(Reply::from));
                next_url = envelope.paging.and_then(|paging| paging.next);
            }
            total += replies.len();

            while let Some(url) = next_url.take() {
                if total >= cap {
                    info!(comment_id = %stub.id, total, "cap reached, abandoning remaining reply pages");
                    break;
                }

                tokio::time::sleep(self.config.inter_page_delay).await;

                match self.fetch_json::<Envelope<ReplyStub>>(&url).await {
                    Ok(envelope) => {
                        if envelope.data.is_empty() {
                            break;
                        }
                        total += envelope.data.len();
                        debug!(
                            comment_id = %stub.id,
                            count = envelope.data.len(),
                            "replies page"
                        );
                        replies.extend(envelope.data.into_iter().map(Reply::from));
                        next_url = envelope.paging.and_then(|paging| paging.next);
                    }
                    Err(err) => {
                        log_branch_failure(&err, "replies");
                        break;
                    }
                }
            }

            comments.push(Comment {
                remote_id: stub.id,
                date: stub.timestamp,
                likes: stub.like_count,
                text: stub.text.unwrap_or_default(),
                author: stub.username.unwrap_or_default(),
                replies,
            });
        }

        info!(comments = comments.len(), total, "harvest complete");
        Ok(comments)
    }

    /// Follows a Graph collection's `paging.next` links, yielding one
    /// envelope per page with the inter-page delay applied between fetches.
    /// The stream ends after yielding its first error; the caller decides
    /// whether that is fatal.
    fn pages<T>(&self, first_url: String) -> impl Stream<Item = Result<Envelope<T>>> + '_
    where
        T: DeserializeOwned + 'static,
    {
        stream! {
            let mut next = Some(first_url);
            let mut page = 0u32;

            while let Some(url) = next.take() {
                page += 1;
                if page > 1 {
                    tokio::time::sleep(self.config.inter_page_delay).await;
                }

                match self.fetch_json::<Envelope<T>>(&url).await {
                    Ok(envelope) => {
                        next = envelope.paging.as_ref().and_then(|paging| paging.next.clone());
                        debug!(
                            page,
                            items = envelope.data.len(),
                            has_next = next.is_some(),
                            "fetched page"
                        );
                        yield Ok(envelope);
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        }
    }

    /// One rate-limited GET. Non-2xx responses become
    /// [`FetchError::ApiRequestFailed`] with the body kept for diagnostics.
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.limiter.until_ready().await;

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Comments on a collaborative post owned by the partner account can be
/// invisible to this token, so any collaboration data on the matched item
/// is worth having in the trace when the harvest comes up short.
fn log_collaboration(media: &MediaItem) {
    for (field, value) in [
        ("collaborators", &media.collaborators),
        ("tagged_accounts", &media.tagged_accounts),
        ("mentioned_profiles", &media.mentioned_profiles),
        ("branded_content_partner", &media.branded_content_partner),
    ] {
        if let Some(value) = value {
            info!(field, %value, "matched media has collaboration data");
        }
    }
}

/// Pagination failures inside a harvest keep whatever was fetched so far.
/// Rate limits are logged distinctly so operators can tell them apart, but
/// the handling is the same: stop this branch.
fn log_branch_failure(err: &FetchError, branch: &str) {
    if err.is_rate_limit() {
        warn!(branch, %err, "rate limited, keeping partial results");
    } else {
        warn!(branch, %err, "page fetch failed, keeping partial results");
    }
}
