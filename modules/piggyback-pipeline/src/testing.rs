// Test mocks for the collection pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockFetcher (PostFetcher) — HashMap-based handle→posts
// - MockLlm (RelevanceLlm) — scripted content→reply with call recording
// - MemoryStore (RecordStore) — stateful in-memory worksheet grids
//
// Plus helpers for constructing Post and ClassifiedPost values.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use piggyback_common::{ClassificationDecision, ClassifiedPost, Engagement, Post};

use crate::traits::{PostFetcher, RecordStore, RelevanceLlm};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// HashMap-based post fetcher. Returns `Err` for unregistered handles.
/// Builder pattern: `.on_handle()`, `.failing_for()`.
pub struct MockFetcher {
    posts: HashMap<String, Vec<Post>>,
    fail_for: HashSet<String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            posts: HashMap::new(),
            fail_for: HashSet::new(),
        }
    }

    pub fn on_handle(mut self, handle: &str, posts: Vec<Post>) -> Self {
        self.posts.insert(handle.to_string(), posts);
        self
    }

    /// Make `fetch` fail whenever this handle is requested.
    pub fn failing_for(mut self, handle: &str) -> Self {
        self.fail_for.insert(handle.to_string());
        self
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostFetcher for MockFetcher {
    async fn fetch(
        &self,
        handles: &[String],
        _max_items: u32,
        _start_date: Option<NaiveDate>,
        _end_date: Option<NaiveDate>,
    ) -> Result<Vec<Post>> {
        let mut all = Vec::new();
        for handle in handles {
            if self.fail_for.contains(handle) {
                bail!("MockFetcher: forced failure for {handle}");
            }
            match self.posts.get(handle) {
                Some(posts) => all.extend(posts.clone()),
                None => bail!("MockFetcher: no posts registered for {handle}"),
            }
        }
        Ok(all)
    }
}

// ---------------------------------------------------------------------------
// MockLlm
// ---------------------------------------------------------------------------

struct MockLlmInner {
    responses: HashMap<String, String>,
    default_response: Option<String>,
    fail_all: bool,
    /// (system prompt, user content) per call, in order.
    calls: Vec<(String, String)>,
}

/// Scripted completion model. Replies are keyed by user content; a default
/// covers everything else. Records every call for assertions.
pub struct MockLlm {
    inner: Mutex<MockLlmInner>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockLlmInner {
                responses: HashMap::new(),
                default_response: None,
                fail_all: false,
                calls: Vec::new(),
            }),
        }
    }

    pub fn on_content(self, content: &str, reply: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .responses
            .insert(content.to_string(), reply.to_string());
        self
    }

    pub fn with_default(self, reply: &str) -> Self {
        self.inner.lock().unwrap().default_response = Some(reply.to_string());
        self
    }

    /// Make every `complete` call return an error.
    pub fn failing(self) -> Self {
        self.inner.lock().unwrap().fail_all = true;
        self
    }

    // --- Assertion helpers ---

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }

    /// Count calls whose system prompt contains `needle`.
    pub fn calls_with_prompt(&self, needle: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(system, _)| system.contains(needle))
            .count()
    }

    /// Whether any call carried this user content.
    pub fn saw_content(&self, content: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .any(|(_, user)| user == content)
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelevanceLlm for MockLlm {
    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        _max_tokens: u32,
    ) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_all {
            bail!("MockLlm: forced failure");
        }
        inner
            .calls
            .push((system_prompt.to_string(), user_content.to_string()));
        let reply = inner
            .responses
            .get(user_content)
            .cloned()
            .or_else(|| inner.default_response.clone());
        match reply {
            Some(r) => Ok(r),
            None => bail!("MockLlm: no response registered for {user_content}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

struct MemoryStoreInner {
    collections: HashMap<String, Vec<Vec<String>>>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Stateful in-memory worksheet store. Reading a collection that does not
/// exist is an error, matching the remote API. Thread-safe via interior
/// Mutex.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner {
                collections: HashMap::new(),
                fail_reads: false,
                fail_writes: false,
            }),
        }
    }

    /// Pre-populate a collection with raw rows (header included if wanted).
    pub fn seed(&self, collection: &str, rows: Vec<Vec<String>>) {
        self.inner
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), rows);
    }

    /// Seed from string literals.
    pub fn seed_grid(&self, collection: &str, rows: &[&[&str]]) {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        self.seed(collection, rows);
    }

    /// Make every read return an error.
    pub fn failing_reads(self) -> Self {
        self.inner.lock().unwrap().fail_reads = true;
        self
    }

    /// Make every write return an error.
    pub fn failing_writes(self) -> Self {
        self.inner.lock().unwrap().fail_writes = true;
        self
    }

    // --- Assertion helpers ---

    pub fn has_collection(&self, collection: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .collections
            .contains_key(collection)
    }

    pub fn rows_in(&self, collection: &str) -> Vec<Vec<String>> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read_records(&self, collection: &str) -> Result<Vec<HashMap<String, String>>> {
        let rows = self.read_values(collection).await?;
        Ok(sheets_client::records_from_rows(rows))
    }

    async fn read_values(&self, collection: &str) -> Result<Vec<Vec<String>>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            bail!("MemoryStore: forced read failure");
        }
        match inner.collections.get(collection) {
            Some(rows) => Ok(rows.clone()),
            None => bail!("MemoryStore: no collection named {collection}"),
        }
    }

    async fn ensure_collection(&self, collection: &str, header: &[&str]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            bail!("MemoryStore: forced write failure");
        }
        let rows = inner.collections.entry(collection.to_string()).or_default();
        let has_content = rows
            .iter()
            .any(|row| row.iter().any(|cell| !cell.trim().is_empty()));
        if !has_content {
            rows.push(header.iter().map(|h| h.to_string()).collect());
        }
        Ok(())
    }

    async fn append_rows(&self, collection: &str, rows: Vec<Vec<String>>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            bail!("MemoryStore: forced write failure");
        }
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A root post with a fixed timestamp and full ancillary fields.
pub fn post_with_text(id: &str, text: &str) -> Post {
    Post {
        id: id.to_string(),
        text: text.to_string(),
        timestamp_ms: Some(1_733_815_445_000),
        conversation_id: Some(id.to_string()),
        in_reply_to: None,
        is_retweet: false,
        url: Some(format!("https://x.com/u/status/{id}")),
        author_handle: Some("tester".to_string()),
        engagement: Engagement {
            likes: 3,
            reposts: 1,
            replies: 0,
            bookmarks: 0,
            views: 50,
        },
    }
}

/// A root post stamped one minute ago, safely inside any lookback window.
pub fn recent_post(id: &str, text: &str) -> Post {
    let mut post = post_with_text(id, text);
    post.timestamp_ms = Some(Utc::now().timestamp_millis() - 60_000);
    post
}

/// A root post stamped 400 days ago, safely outside any default window.
pub fn stale_post(id: &str, text: &str) -> Post {
    let mut post = post_with_text(id, text);
    post.timestamp_ms = Some(Utc::now().timestamp_millis() - 400 * 24 * 3_600 * 1_000);
    post
}

/// A recent post inside someone else's conversation.
pub fn reply_post(id: &str, conversation: &str, text: &str) -> Post {
    let mut post = recent_post(id, text);
    post.conversation_id = Some(conversation.to_string());
    post
}

/// A post with a scripted decision, reply attached when matched.
pub fn classified(profile_url: &str, post: Post, matched: bool) -> ClassifiedPost {
    ClassifiedPost {
        profile_url: profile_url.to_string(),
        post,
        decision: ClassificationDecision {
            decision: matched,
            decision_text: if matched { "yes" } else { "no" }.to_string(),
            reason: "scripted".to_string(),
            prompt_used: "match_prompt".to_string(),
        },
        reply_suggestion: matched.then(|| "A thoughtful reply.".to_string()),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore self-tests
// ---------------------------------------------------------------------------
