//! # grampull
//!
//! The `grampull` crate provides a convenient, opinionated, asynchronous
//! client for pulling Instagram comments through the
//! [Facebook Graph API](https://developers.facebook.com/docs/instagram-api).
//!
//! Given a client name and a post (or reel) URL, it resolves the connected
//! Instagram Business Account, scans the account's media history for the
//! post, walks the comment and reply pagination exhaustively under the
//! API's rate limits, and flattens the result into numbered, analytics-ready
//! records.
//!
//! ## Harvesting a batch of posts
//!
//! ```rust,no_run
//! use grampull::{harvest_all, Client, PostRequest};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = Client::new("access-token");
//!
//! let requests = vec![PostRequest {
//!     client: "Acme".into(),
//!     url: "https://www.instagram.com/p/C1aB2cD3eF4/".into(),
//! }];
//!
//! let outcome = harvest_all(&client, &requests).await;
//! for record in &outcome.records {
//!     println!("{}{}: {}", record.id, record.sub_id, record.comment);
//! }
//! # }
//! ```
//!
//! A row that cannot be resolved is reported in
//! [`RunOutcome::failures`] and does not stop the rest of the run.
//!
//! ## Driving the stages yourself
//!
//! The individual stages are exposed on [`Client`] for callers that want
//! finer control:
//!
//! ```rust,no_run
//! use grampull::{media_code_from_url, Client};
//!
//! # #[tokio::main]
//! # async fn main() -> grampull::Result<()> {
//! let client = Client::new("access-token");
//!
//! let code = media_code_from_url("https://www.instagram.com/reel/Xy-Z_9/")?;
//! let account_id = client.resolve_business_account("Acme").await?;
//! let media_id = client.locate_media(&account_id, &code).await?;
//! let comments = client.harvest_comments(&media_id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! **NOTE**: completeness is best-effort by design. The API hides some
//! comments (collaborative posts owned by another account, filtered or
//! GIF-only comments), and a pagination failure mid-harvest keeps the
//! partial result rather than discarding it. Two runs over the same post
//! may legitimately differ.

pub mod models;
pub mod records;

mod client;
mod config;
mod error;
mod matching;
mod pipeline;
mod url;

pub use client::Client;
pub use config::FetchConfig;
pub use error::{FetchError, Result};
pub use matching::{similarity, DEFAULT_MATCH_THRESHOLD};
pub use pipeline::{harvest_all, PostRequest, RowFailure, RunOutcome};
pub use records::{format_records, week_monday, OutputRecord};
pub use url::media_code_from_url;
