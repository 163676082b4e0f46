use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use piggyback_common::{ClassifiedPost, Post};
use tracing::debug;

use crate::traits::RecordStore;

/// Every classified post lands here, matched or not, with the model's
/// reasoning attached.
pub const AUDIT_HEADER: [&str; 15] = [
    "scraped_at",
    "profile_url",
    "author",
    "post_content",
    "timestamp",
    "likes",
    "reposts",
    "replies",
    "bookmarks",
    "views",
    "llm_decision",
    "llm_reason",
    "prompt_used",
    "reply_recommendation",
    "post_link",
];

/// Matched posts only. The trailing `post_id` column is what the duplicate
/// index reads back at the start of the next run.
pub const OUTPUT_HEADER: [&str; 12] = [
    "profile_url",
    "post_content",
    "timestamp",
    "likes",
    "reposts",
    "replies",
    "bookmarks",
    "views",
    "author",
    "reply_recommendation",
    "post_link",
    "post_id",
];

/// Append every classified post to the audit collection, skipping rows whose
/// (profile_url, author, content) triple is already present. Returns the
/// number of rows appended.
pub async fn write_audit(
    store: &dyn RecordStore,
    collection: &str,
    posts: &[ClassifiedPost],
    scraped_at: DateTime<Utc>,
) -> Result<u32> {
    if posts.is_empty() {
        return Ok(0);
    }
    store.ensure_collection(collection, &AUDIT_HEADER).await?;

    let existing = store.read_values(collection).await?;
    let mut seen: HashSet<(String, String, String)> = existing
        .iter()
        .filter(|row| row.len() >= 4)
        .map(|row| {
            (
                row[1].trim().to_string(),
                row[2].trim().to_string(),
                row[3].trim().to_string(),
            )
        })
        .collect();

    let stamp = scraped_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let mut rows = Vec::new();
    for cp in posts {
        let author = cp.post.author_handle.clone().unwrap_or_default();
        let content = flatten(&cp.post.text);
        let key = (
            cp.profile_url.trim().to_string(),
            author.trim().to_string(),
            content.trim().to_string(),
        );
        if !seen.insert(key) {
            continue;
        }
        rows.push(vec![
            stamp.clone(),
            cp.profile_url.clone(),
            author,
            content,
            format_timestamp(cp.post.timestamp_ms),
            cp.post.engagement.likes.to_string(),
            cp.post.engagement.reposts.to_string(),
            cp.post.engagement.replies.to_string(),
            cp.post.engagement.bookmarks.to_string(),
            cp.post.engagement.views.to_string(),
            cp.decision.decision_text.clone(),
            cp.decision.reason.clone(),
            cp.decision.prompt_used.clone(),
            cp.reply_suggestion.clone().unwrap_or_default(),
            post_link(&cp.post),
        ]);
    }

    let written = rows.len() as u32;
    store.append_rows(collection, rows).await?;
    debug!(collection, written, "Audit rows appended");
    Ok(written)
}

/// Append matched posts to the output collection, skipping rows whose
/// (profile_url, content, timestamp) triple is already present. Returns the
/// number of rows appended.
pub async fn write_output(
    store: &dyn RecordStore,
    collection: &str,
    posts: &[ClassifiedPost],
) -> Result<u32> {
    let matched: Vec<&ClassifiedPost> = posts.iter().filter(|p| p.decision.decision).collect();
    if matched.is_empty() {
        return Ok(0);
    }
    store.ensure_collection(collection, &OUTPUT_HEADER).await?;

    let existing = store.read_values(collection).await?;
    let mut seen: HashSet<(String, String, String)> = existing
        .into_iter()
        .map(normalize_row)
        .filter(|row| row.len() >= 3)
        .map(|row| {
            (
                row[0].trim().to_string(),
                row[1].trim().to_string(),
                row[2].trim().to_string(),
            )
        })
        .collect();

    let mut rows = Vec::new();
    for cp in matched {
        let content = flatten(&cp.post.text);
        let stamp = format_timestamp(cp.post.timestamp_ms);
        let key = (
            cp.profile_url.trim().to_string(),
            content.trim().to_string(),
            stamp.trim().to_string(),
        );
        if !seen.insert(key) {
            continue;
        }
        rows.push(vec![
            cp.profile_url.clone(),
            content,
            stamp,
            cp.post.engagement.likes.to_string(),
            cp.post.engagement.reposts.to_string(),
            cp.post.engagement.replies.to_string(),
            cp.post.engagement.bookmarks.to_string(),
            cp.post.engagement.views.to_string(),
            cp.post.author_handle.clone().unwrap_or_default(),
            cp.reply_suggestion.clone().unwrap_or_default(),
            post_link(&cp.post),
            cp.post.id.clone(),
        ]);
    }

    let written = rows.len() as u32;
    store.append_rows(collection, rows).await?;
    debug!(collection, written, "Output rows appended");
    Ok(written)
}

/// Epoch milliseconds to `2024-12-10 07:24 AM` in UTC. Missing or
/// unrepresentable values render as an empty string.
pub fn format_timestamp(timestamp_ms: Option<i64>) -> String {
    timestamp_ms
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %I:%M %p").to_string())
        .unwrap_or_default()
}

/// Prefer the scraped permalink; fall back to the status redirect URL.
fn post_link(post: &Post) -> String {
    match post.url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => format!("https://x.com/i/web/status/{}", post.id),
    }
}

fn flatten(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

/// Manual edits sometimes leave rows shifted right by leading blank cells;
/// shift them back so positional keys line up.
fn normalize_row(row: Vec<String>) -> Vec<String> {
    let skip = row.iter().take_while(|c| c.trim().is_empty()).count();
    row.into_iter().skip(skip).collect()
}
