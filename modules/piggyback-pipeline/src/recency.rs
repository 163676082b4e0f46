use chrono::{DateTime, Duration, Utc};
use piggyback_common::Post;

/// Whether a post falls inside the lookback window ending at `now`.
///
/// Posts without a parseable timestamp are not recent. Filtering must never
/// let a post of unknown age through to the expensive stages.
pub fn is_recent(post: &Post, lookback_days: i64, now: DateTime<Utc>) -> bool {
    let Some(ts_ms) = post.timestamp_ms else {
        return false;
    };
    let Some(ts) = DateTime::from_timestamp_millis(ts_ms) else {
        return false;
    };
    ts >= now - Duration::days(lookback_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use piggyback_common::Engagement;

    fn post_at(timestamp_ms: Option<i64>) -> Post {
        Post {
            id: "1".to_string(),
            text: "hello".to_string(),
            timestamp_ms,
            conversation_id: None,
            in_reply_to: None,
            is_retweet: false,
            url: None,
            author_handle: None,
            engagement: Engagement::default(),
        }
    }

    #[test]
    fn missing_timestamp_is_never_recent() {
        let now = Utc::now();
        assert!(!is_recent(&post_at(None), 1, now));
        assert!(!is_recent(&post_at(None), 10_000, now));
    }

    #[test]
    fn cutoff_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let cutoff_ms = (now - Duration::days(30)).timestamp_millis();
        assert!(is_recent(&post_at(Some(cutoff_ms)), 30, now));
        assert!(!is_recent(&post_at(Some(cutoff_ms - 1)), 30, now));
    }

    #[test]
    fn future_timestamps_count_as_recent() {
        let now = Utc::now();
        let post = post_at(Some(now.timestamp_millis() + 60_000));
        assert!(is_recent(&post, 1, now));
    }

    #[test]
    fn unrepresentable_millis_are_not_recent() {
        assert!(!is_recent(&post_at(Some(i64::MAX)), 30, Utc::now()));
    }
}
