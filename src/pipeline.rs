//! Row-by-row driver: extract, resolve, locate, harvest, format, with
//! per-row failure isolation and an inter-post delay between rows.
use tracing::{error, info};

use crate::client::Client;
use crate::error::{FetchError, Result};
use crate::records::{format_records, OutputRecord};
use crate::url::media_code_from_url;

/// One input row: a client name (possibly several, comma separated) and
/// the post URL to harvest.
#[derive(Clone, Debug)]
pub struct PostRequest {
    pub client: String,
    pub url: String,
}

/// A row that produced no records, with the error that stopped it.
#[derive(Debug)]
pub struct RowFailure {
    pub client: String,
    pub url: String,
    pub error: FetchError,
}

/// Everything a run produced: the flat record sequence plus the rows that
/// failed. Records keep input-row order, then API order within a row.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub records: Vec<OutputRecord>,
    pub failures: Vec<RowFailure>,
}

/// Processes every request in order, one at a time. A failed row is
/// reported in the outcome and the run moves on to the next row.
pub async fn harvest_all(client: &Client, requests: &[PostRequest]) -> RunOutcome {
    let mut outcome = RunOutcome::default();

    for (index, request) in requests.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(client.config().inter_post_delay).await;
        }

        info!(client = %request.client, url = %request.url, "processing post");

        match process_request(client, request).await {
            Ok(records) => {
                info!(records = records.len(), url = %request.url, "post processed");
                outcome.records.extend(records);
            }
            Err(error) => {
                error!(%error, client = %request.client, url = %request.url, "post failed");
                outcome.failures.push(RowFailure {
                    client: request.client.clone(),
                    url: request.url.clone(),
                    error,
                });
            }
        }
    }

    info!(
        records = outcome.records.len(),
        failed_rows = outcome.failures.len(),
        "run finished"
    );
    outcome
}

/// Runs the full resolution chain for one row. The records copy the
/// request's `client` and `url` fields verbatim, even when resolution
/// matched a different candidate name.
async fn process_request(client: &Client, request: &PostRequest) -> Result<Vec<OutputRecord>> {
    let media_code = media_code_from_url(&request.url)?;
    let account_id = resolve_any(client, &request.client).await?;
    let media_id = client.locate_media(&account_id, &media_code).await?;
    let comments = client.harvest_comments(&media_id).await?;

    Ok(format_records(&request.client, &request.url, &comments))
}

/// The client column may hold several mapped names ("Acme, Acme Global");
/// each is tried in order and the first that resolves wins.
async fn resolve_any(client: &Client, names: &str) -> Result<String> {
    let mut last_error = FetchError::NoMatchingPage(names.to_string());

    for name in names.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        match client.resolve_business_account(name).await {
            Ok(account_id) => return Ok(account_id),
            Err(error) => last_error = error,
        }
    }

    Err(last_error)
}
