use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};

use apify_client::{ApifyClient, TweetItem, TweetScraperInput};
use piggyback_common::{Engagement, Post};

use crate::traits::PostFetcher;

/// Apify-backed fetcher. One `fetch` drives a full actor run (start, poll,
/// dataset download) and collapses every known raw field alias into the
/// canonical `Post` shape.
pub struct ApifyPostFetcher {
    client: ApifyClient,
}

impl ApifyPostFetcher {
    pub fn new(client: ApifyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PostFetcher for ApifyPostFetcher {
    async fn fetch(
        &self,
        handles: &[String],
        max_items: u32,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Post>> {
        let input = TweetScraperInput::latest(handles, max_items).between(start_date, end_date);
        let items = self.client.scrape_tweets(&input).await?;
        Ok(items.iter().map(canonical_post).collect())
    }
}

/// Collapse one raw dataset item. Ids and text fall back to empty strings so
/// downstream filters (empty-text skip, group-key fallback) see one shape.
fn canonical_post(item: &TweetItem) -> Post {
    Post {
        id: item.canonical_id().unwrap_or_default().to_string(),
        text: item.content().unwrap_or_default().to_string(),
        timestamp_ms: item
            .timestamp
            .or_else(|| item.created_at.as_deref().and_then(parse_created_at)),
        conversation_id: item.conversation_id.clone(),
        in_reply_to: item.reply_marker().map(str::to_string),
        is_retweet: item.is_retweet.unwrap_or(false),
        url: item.link().map(str::to_string),
        author_handle: item.author.as_ref().and_then(|a| a.user_name.clone()),
        engagement: Engagement {
            likes: item.like_count.unwrap_or(0),
            reposts: item.retweet_count.unwrap_or(0),
            replies: item.reply_count.unwrap_or(0),
            bookmarks: item.bookmark_count.unwrap_or(0),
            views: item.view_count.unwrap_or(0),
        },
    }
}

/// `createdAt` arrives either in the legacy `Tue Dec 10 07:24:05 +0000 2024`
/// form or as RFC 3339. Anything else means no timestamp.
fn parse_created_at(raw: &str) -> Option<i64> {
    DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn numeric_timestamp_wins_over_created_at() {
        let item = TweetItem {
            timestamp: Some(1_700_000_000_000),
            created_at: Some("Tue Dec 10 07:24:05 +0000 2024".to_string()),
            ..TweetItem::default()
        };
        assert_eq!(canonical_post(&item).timestamp_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn legacy_created_at_parses_to_millis() {
        let expected = Utc
            .with_ymd_and_hms(2024, 12, 10, 7, 24, 5)
            .unwrap()
            .timestamp_millis();
        assert_eq!(
            parse_created_at("Tue Dec 10 07:24:05 +0000 2024"),
            Some(expected)
        );
    }

    #[test]
    fn rfc3339_created_at_parses_to_millis() {
        let expected = Utc
            .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
            .unwrap()
            .timestamp_millis();
        assert_eq!(parse_created_at("2025-01-02T03:04:05Z"), Some(expected));
    }

    #[test]
    fn garbage_created_at_means_no_timestamp() {
        assert_eq!(parse_created_at("yesterday-ish"), None);
        let item = TweetItem {
            created_at: Some("yesterday-ish".to_string()),
            ..TweetItem::default()
        };
        assert_eq!(canonical_post(&item).timestamp_ms, None);
    }

    #[test]
    fn missing_counters_become_zero() {
        let post = canonical_post(&TweetItem::default());
        assert_eq!(post.engagement, Engagement::default());
        assert_eq!(post.id, "");
        assert_eq!(post.text, "");
        assert!(!post.is_retweet);
    }

    #[test]
    fn author_handle_comes_from_user_name() {
        let item = TweetItem {
            author: Some(apify_client::TweetAuthor {
                user_name: Some("nasa".to_string()),
                name: Some("NASA".to_string()),
            }),
            ..TweetItem::default()
        };
        assert_eq!(canonical_post(&item).author_handle.as_deref(), Some("nasa"));
    }
}
