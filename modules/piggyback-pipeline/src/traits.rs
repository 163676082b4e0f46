// Trait abstractions for the pipeline's three service boundaries.
//
// PostFetcher — the scrape actor behind one async call.
// RelevanceLlm — one prompt-in, text-out completion call.
// RecordStore — header-keyed worksheet reads and appends.
//
// These enable deterministic testing with MockFetcher, MockLlm and
// MemoryStore: no network, no credentials. `cargo test` in seconds.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use piggyback_common::Post;

// ---------------------------------------------------------------------------
// PostFetcher — absorbs the start-run/poll/fetch-dataset three-step
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PostFetcher: Send + Sync {
    /// Fetch the latest posts for the given handles, in the order the
    /// upstream actor returns them. Field aliases are already collapsed
    /// into the canonical `Post` shape by the time this returns.
    async fn fetch(
        &self,
        handles: &[String],
        max_items: u32,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Post>>;
}

// ---------------------------------------------------------------------------
// RelevanceLlm — one completion call
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RelevanceLlm: Send + Sync {
    /// Run one chat completion and return the assistant text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        max_tokens: u32,
    ) -> Result<String>;
}

#[async_trait]
impl RelevanceLlm for ai_client::OpenAi {
    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        max_tokens: u32,
    ) -> Result<String> {
        self.chat_completion(system_prompt, user_content, max_tokens)
            .await
    }
}

// ---------------------------------------------------------------------------
// RecordStore — worksheet reads and appends
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read a worksheet as header-keyed records, one map per data row.
    async fn read_records(&self, collection: &str) -> Result<Vec<HashMap<String, String>>>;

    /// Read a worksheet as a raw grid of strings, header row included.
    async fn read_values(&self, collection: &str) -> Result<Vec<Vec<String>>>;

    /// Create the collection with the given header when it does not exist,
    /// and write the header when the collection exists but is empty.
    async fn ensure_collection(&self, collection: &str, header: &[&str]) -> Result<()>;

    /// Append rows after the current data. Empty input is a no-op.
    async fn append_rows(&self, collection: &str, rows: Vec<Vec<String>>) -> Result<()>;
}
