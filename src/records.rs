//! Flattening harvested comment trees into analytics-ready rows.
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::Comment;

const PLATFORM: &str = "instagram";
const VIEW_SOURCE: &str = "view comment";
const LIVE_VIDEO_TIMESTAMP: &str = "-";

/// One flat output row.
///
/// Field order matches the downstream table's column contract, so
/// serializers that respect declaration order produce the expected layout.
#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    /// Position of the top-level comment within its post, starting at 1.
    pub id: u32,
    /// Empty for top-level comments, `"N.M"` for the M-th reply to comment N.
    pub sub_id: String,
    /// When the comment itself was written.
    pub date: DateTime<Utc>,
    /// Monday of the ISO week containing `date`, as `YYYY-MM-DD`.
    pub week: String,
    pub likes: i64,
    pub live_video_timestamp: String,
    pub comment: String,
    pub image_urls: String,
    pub view_source: String,
    /// When this record was produced, not when the comment was written.
    pub timestamp: String,
    pub client: String,
    pub url: String,
    pub platform: String,
    pub author: String,
}

/// Monday of the ISO week containing `date`.
pub fn week_monday(date: DateTime<Utc>) -> NaiveDate {
    let day = date.date_naive();
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Flattens `comments` into numbered rows: top-level comments get `id`
/// 1..N in harvest order with an empty `sub_id`; the M-th reply to comment
/// N shares its parent's `id` and gets a `sub_id` of `"N.M"`. The `client`
/// and `url` columns are copied verbatim onto every row.
pub fn format_records(client: &str, url: &str, comments: &[Comment]) -> Vec<OutputRecord> {
    let processed = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut records = Vec::new();

    for (i, comment) in comments.iter().enumerate() {
        let id = i as u32 + 1;
        records.push(record(
            id,
            String::new(),
            comment.date,
            comment.likes,
            &comment.text,
            &comment.author,
            client,
            url,
            &processed,
        ));

        for (j, reply) in comment.replies.iter().enumerate() {
            records.push(record(
                id,
                format!("{}.{}", id, j + 1),
                reply.date,
                reply.likes,
                &reply.text,
                &reply.author,
                client,
                url,
                &processed,
            ));
        }
    }

    records
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: u32,
    sub_id: String,
    date: DateTime<Utc>,
    likes: i64,
    text: &str,
    author: &str,
    client: &str,
    url: &str,
    processed: &str,
) -> OutputRecord {
    OutputRecord {
        id,
        sub_id,
        date,
        week: week_monday(date).format("%Y-%m-%d").to_string(),
        likes,
        live_video_timestamp: LIVE_VIDEO_TIMESTAMP.to_string(),
        comment: text.to_string(),
        image_urls: String::new(),
        view_source: VIEW_SOURCE.to_string(),
        timestamp: processed.to_string(),
        client: client.to_string(),
        url: url.to_string(),
        platform: PLATFORM.to_string(),
        author: author.to_string(),
    }
}
