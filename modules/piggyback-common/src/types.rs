use serde::{Deserialize, Serialize};

// --- Post Types ---

/// A scraped post with every upstream field alias already collapsed.
///
/// Raw scraper records spell the same field several ways (`postId` vs `id`,
/// `postText` vs `text`, four different reply markers). Normalization happens
/// once at the fetch boundary; everything downstream works with this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// May become a comma-joined composite after thread merging.
    pub id: String,
    pub text: String,
    /// Epoch milliseconds. `None` means the upstream record had no parseable
    /// timestamp; such posts are never considered recent.
    pub timestamp_ms: Option<i64>,
    pub conversation_id: Option<String>,
    /// Id of the post this one replies to, taken from the first non-empty
    /// upstream reply marker.
    pub in_reply_to: Option<String>,
    pub is_retweet: bool,
    pub url: Option<String>,
    pub author_handle: Option<String>,
    pub engagement: Engagement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: i64,
    pub reposts: i64,
    pub replies: i64,
    pub bookmarks: i64,
    pub views: i64,
}

// --- Profile Types ---

/// A validated scrape target: bare handle plus its canonical profile URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub handle: String,
    pub profile_url: String,
}

// --- Classification Types ---

/// Outcome of the relevance decision for one merged post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    pub decision: bool,
    /// "yes", "no", or "error" when the model call itself failed.
    pub decision_text: String,
    pub reason: String,
    /// Name of the prompt template that produced this decision.
    pub prompt_used: String,
}

/// A merged post together with its decision and optional reply draft, ready
/// for the sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedPost {
    pub profile_url: String,
    pub post: Post,
    pub decision: ClassificationDecision,
    pub reply_suggestion: Option<String>,
}
