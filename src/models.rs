//! The data model underlying the Graph API comment endpoints.
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One page of any Graph API collection endpoint.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub paging: Option<Paging>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Paging {
    /// Absolute URL of the next page, absent on the last one.
    pub next: Option<String>,
    pub cursors: Option<Cursors>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Cursors {
    pub after: Option<String>,
}

/// A Facebook Page the access token can manage.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PageAccount {
    pub id: String,
    pub name: String,
}

/// Response of `GET /{page_id}?fields=instagram_business_account`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PageDetail {
    pub instagram_business_account: Option<ConnectedAccount>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ConnectedAccount {
    pub id: String,
}

/// One item from an account's media list.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub permalink: String,
    /// Raw ISO timestamp, only used to log how far back a scan has reached.
    pub timestamp: Option<String>,
    /// Collaboration fields, present only on posts involving other
    /// accounts. Comments on a post owned by the collaborator can be
    /// hidden from this token, so the trace keeps whatever shows up here.
    pub collaborators: Option<serde_json::Value>,
    pub tagged_accounts: Option<serde_json::Value>,
    pub mentioned_profiles: Option<serde_json::Value>,
    pub branded_content_partner: Option<serde_json::Value>,
}

/// A top-level comment as returned by `/{media_id}/comments`, with its
/// first batch of replies inlined by the field expansion.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CommentStub {
    pub id: String,
    #[serde(with = "graph_ts")]
    pub timestamp: DateTime<Utc>,
    /// GIF-only comments come back with no text field at all.
    pub text: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub like_count: i64,
    pub replies: Option<Envelope<ReplyStub>>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ReplyStub {
    pub id: String,
    #[serde(with = "graph_ts")]
    pub timestamp: DateTime<Utc>,
    pub text: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub like_count: i64,
}

/// A harvested top-level comment together with all of its direct replies.
#[derive(Clone, Debug)]
pub struct Comment {
    /// The API's own comment ID.
    pub remote_id: String,
    pub date: DateTime<Utc>,
    pub likes: i64,
    pub text: String,
    pub author: String,
    pub replies: Vec<Reply>,
}

/// A direct reply to a [`Comment`]. The API exposes no deeper nesting
/// through this endpoint, so replies carry no children of their own.
#[derive(Clone, Debug)]
pub struct Reply {
    pub remote_id: String,
    pub date: DateTime<Utc>,
    pub likes: i64,
    pub text: String,
    pub author: String,
}

impl From<ReplyStub> for Reply {
    fn from(stub: ReplyStub) -> Self {
        Reply {
            remote_id: stub.id,
            date: stub.timestamp,
            likes: stub.like_count,
            text: stub.text.unwrap_or_default(),
            author: stub.username.unwrap_or_default(),
        }
    }
}

/// Deserialization for Graph API timestamps, which use a compact UTC offset
/// (`2024-01-15T10:30:00+0000`) that the stock RFC 3339 parser rejects.
pub(crate) mod graph_ts {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%z")
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parses_compact_offset_timestamps() {
        let stub: CommentStub = serde_json::from_str(
            r#"{"id":"17895","timestamp":"2024-01-15T10:30:00+0000","text":"nice","username":"sam","like_count":3}"#,
        )
        .unwrap();
        assert_eq!(
            stub.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_text_and_username_default() {
        // A GIF-only comment: no text, no username, no replies.
        let stub: CommentStub =
            serde_json::from_str(r#"{"id":"1","timestamp":"2024-01-15T10:30:00+0000"}"#).unwrap();
        assert!(stub.text.is_none());
        assert!(stub.username.is_none());
        assert_eq!(stub.like_count, 0);
        assert!(stub.replies.is_none());
    }

    #[test]
    fn test_envelope_without_data_defaults_to_empty() {
        let envelope: Envelope<CommentStub> = serde_json::from_str(r#"{}"#).unwrap();
        assert!(envelope.data.is_empty());
        assert!(envelope.paging.is_none());
    }
}
