use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Input for the apidojo/twitter-scraper-lite actor (handle-based).
#[derive(Debug, Clone, Serialize)]
pub struct TweetScraperInput {
    #[serde(rename = "twitterHandles")]
    pub twitter_handles: Vec<String>,
    #[serde(rename = "maxItems")]
    pub max_items: u32,
    pub sort: String,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl TweetScraperInput {
    /// Input for the newest posts of the given handles.
    pub fn latest(handles: &[String], max_items: u32) -> Self {
        Self {
            twitter_handles: handles
                .iter()
                .map(|h| h.trim_start_matches('@').to_string())
                .collect(),
            max_items,
            sort: "Latest".to_string(),
            start: None,
            end: None,
        }
    }

    /// Restrict the scrape to an inclusive date range. `None` bounds are
    /// left open.
    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start.map(|d| d.format("%Y-%m-%d").to_string());
        self.end = end.map(|d| d.format("%Y-%m-%d").to_string());
        self
    }
}

/// Author info nested inside a tweet.
#[derive(Debug, Clone, Deserialize)]
pub struct TweetAuthor {
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    pub name: Option<String>,
}

/// A single tweet from the Apify dataset.
///
/// The actor's output schema has drifted across versions, so the same fact can
/// arrive under several names (`id` vs `postId`, `text` vs `fullText`). Each
/// spelling gets its own optional field; the accessor methods collapse them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetItem {
    pub id: Option<String>,
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "postText")]
    pub post_text: Option<String>,
    #[serde(rename = "fullText", alias = "full_text")]
    pub full_text: Option<String>,
    /// Epoch milliseconds, when the actor emits a numeric timestamp.
    pub timestamp: Option<i64>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<String>,
    #[serde(rename = "inReplyToStatusId")]
    pub in_reply_to_status_id: Option<String>,
    #[serde(rename = "inReplyToPostId")]
    pub in_reply_to_post_id: Option<String>,
    #[serde(rename = "inReplyTo")]
    pub in_reply_to: Option<String>,
    #[serde(rename = "parentPostId")]
    pub parent_post_id: Option<String>,
    #[serde(rename = "isRetweet")]
    pub is_retweet: Option<bool>,
    pub url: Option<String>,
    #[serde(rename = "postUrl")]
    pub post_url: Option<String>,
    #[serde(rename = "twitterUrl")]
    pub twitter_url: Option<String>,
    pub author: Option<TweetAuthor>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<i64>,
    #[serde(rename = "retweetCount")]
    pub retweet_count: Option<i64>,
    #[serde(rename = "replyCount")]
    pub reply_count: Option<i64>,
    #[serde(rename = "bookmarkCount")]
    pub bookmark_count: Option<i64>,
    #[serde(rename = "viewCount")]
    pub view_count: Option<i64>,
}

impl TweetItem {
    /// Returns whichever id field is populated, preferring `postId`.
    pub fn canonical_id(&self) -> Option<&str> {
        self.post_id.as_deref().or(self.id.as_deref())
    }

    /// Returns whichever text field is populated, preferring the full forms.
    pub fn content(&self) -> Option<&str> {
        self.post_text
            .as_deref()
            .or(self.full_text.as_deref())
            .or(self.text.as_deref())
    }

    /// First non-empty reply marker in upstream precedence order.
    pub fn reply_marker(&self) -> Option<&str> {
        [
            &self.in_reply_to_status_id,
            &self.in_reply_to_post_id,
            &self.in_reply_to,
            &self.parent_post_id,
        ]
        .into_iter()
        .find_map(|m| m.as_deref().filter(|v| !v.is_empty()))
    }

    /// Returns whichever post URL field is populated, preferring `postUrl`.
    pub fn link(&self) -> Option<&str> {
        self.post_url
            .as_deref()
            .or(self.url.as_deref())
            .or(self.twitter_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliased_fields_collapse_to_canonical_values() {
        let json = r#"{
            "postId": "123",
            "postText": "hello",
            "inReplyToStatusId": "99",
            "postUrl": "https://x.com/a/status/123"
        }"#;
        let item: TweetItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.canonical_id(), Some("123"));
        assert_eq!(item.content(), Some("hello"));
        assert_eq!(item.reply_marker(), Some("99"));
        assert_eq!(item.link(), Some("https://x.com/a/status/123"));
    }

    #[test]
    fn reply_marker_skips_empty_strings() {
        let item = TweetItem {
            in_reply_to_status_id: Some(String::new()),
            parent_post_id: Some("7".to_string()),
            ..TweetItem::default()
        };
        assert_eq!(item.reply_marker(), Some("7"));
    }

    #[test]
    fn date_bounds_are_omitted_when_unset() {
        let input = TweetScraperInput::latest(&["@elonmusk".to_string()], 5);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["twitterHandles"][0], "elonmusk");
        assert_eq!(json["maxItems"], 5);
        assert_eq!(json["sort"], "Latest");
        assert!(json.get("start").is_none());
        assert!(json.get("end").is_none());
    }

    #[test]
    fn date_bounds_serialize_as_plain_dates() {
        let input = TweetScraperInput::latest(&["nasa".to_string()], 5).between(
            NaiveDate::from_ymd_opt(2025, 5, 1),
            NaiveDate::from_ymd_opt(2025, 5, 31),
        );
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["start"], "2025-05-01");
        assert_eq!(json["end"], "2025-05-31");
    }
}
