//! Runner boundary tests — one stage handoff at a time.
//!
//! Each test follows MOCK → FUNCTION → OUTPUT: seed the in-memory store,
//! script the fetcher and the model, call `run()` once, assert rows and
//! counters.

use std::sync::Arc;

use crate::runner::{PipelineRunner, RunOptions, SheetTarget};
use crate::testing::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn seed_profiles(store: &MemoryStore, links: &[&str]) {
    let mut rows = vec![vec!["name".to_string(), "X(link)".to_string()]];
    for (i, link) in links.iter().enumerate() {
        rows.push(vec![format!("profile-{i}"), link.to_string()]);
    }
    store.seed("Profiles", rows);
}

fn profiles_target(store: &Arc<MemoryStore>) -> SheetTarget {
    SheetTarget::new(store.clone(), "Profiles")
}

// ---------------------------------------------------------------------------
// Profiles → fetcher → classifier → sinks
//
// The full happy path: one resolved profile, one recent post, a scripted
// "yes", rows land in both sinks.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn matched_post_reaches_both_sinks() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    let fetcher = Arc::new(
        MockFetcher::new().on_handle("ada", vec![recent_post("101", "Raising our next fund")]),
    );
    let llm = Arc::new(
        MockLlm::new().on_content("Raising our next fund", "yes\nActive fundraise."),
    );

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_audit(SheetTarget::new(store.clone(), "Audit"))
    .with_output(SheetTarget::new(store.clone(), "Output"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.profiles_total, 1);
    assert_eq!(stats.profiles_processed, 1);
    assert_eq!(stats.posts_fetched, 1);
    assert_eq!(stats.posts_recent, 1);
    assert_eq!(stats.posts_merged, 1);
    assert_eq!(stats.posts_new, 1);
    assert_eq!(stats.posts_classified, 1);
    assert_eq!(stats.posts_matched, 1);
    assert_eq!(stats.audit_rows_written, 1);
    assert_eq!(stats.output_rows_written, 1);

    let audit = store.rows_in("Audit");
    assert_eq!(audit.len(), 2, "header plus one row");
    assert_eq!(audit[1][1], "https://x.com/ada");
    assert_eq!(audit[1][3], "Raising our next fund");
    assert_eq!(audit[1][10], "yes");
    assert_eq!(audit[1][11], "Active fundraise.");
    assert_eq!(audit[1][12], "match_prompt");

    let output = store.rows_in("Output");
    assert_eq!(output.len(), 2);
    assert_eq!(output[1][0], "https://x.com/ada");
    assert_eq!(output[1][11], "101", "post id closes the output row");
}

#[tokio::test]
async fn unmatched_post_stays_out_of_output() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    let fetcher =
        Arc::new(MockFetcher::new().on_handle("ada", vec![recent_post("101", "Lunch photos")]));
    let llm = Arc::new(MockLlm::new().with_default("no\nNot relevant"));

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_audit(SheetTarget::new(store.clone(), "Audit"))
    .with_output(SheetTarget::new(store.clone(), "Output"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.posts_matched, 0);
    assert_eq!(stats.audit_rows_written, 1);
    assert_eq!(stats.output_rows_written, 0);
    assert_eq!(store.rows_in("Audit")[1][10], "no");
    assert!(
        !store.has_collection("Output"),
        "no match, no output worksheet"
    );
    assert_eq!(llm.call_count(), 1, "no reply drafted for a non-match");
}

#[tokio::test]
async fn empty_profile_sheet_is_a_clean_noop() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &[]);

    let runner = PipelineRunner::new(
        Arc::new(MockFetcher::new()),
        Arc::new(MockLlm::new()),
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_audit(SheetTarget::new(store.clone(), "Audit"))
    .with_output(SheetTarget::new(store.clone(), "Output"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.profiles_total, 0);
    assert_eq!(stats.posts_fetched, 0);
    assert!(!store.has_collection("Audit"));
    assert!(!store.has_collection("Output"));
}

// ---------------------------------------------------------------------------
// Failure containment
//
// A failing profile, model, or sink degrades that one stage and nothing
// else. Only an unreadable profiles sheet fails the run.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_profile_does_not_stop_the_run() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada", "https://x.com/bad"]);

    let fetcher = Arc::new(
        MockFetcher::new()
            .on_handle("ada", vec![recent_post("101", "Alpha thread")])
            .failing_for("bad"),
    );
    let llm = Arc::new(MockLlm::new().with_default("no\nNot relevant"));

    let runner = PipelineRunner::new(
        fetcher,
        llm,
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_audit(SheetTarget::new(store.clone(), "Audit"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.profiles_processed, 1);
    assert_eq!(stats.profiles_failed, 1);
    assert_eq!(stats.audit_rows_written, 1);
    assert_eq!(store.rows_in("Audit")[1][3], "Alpha thread");
}

#[tokio::test]
async fn llm_failure_still_audits_the_post() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    let fetcher =
        Arc::new(MockFetcher::new().on_handle("ada", vec![recent_post("101", "Market recap")]));
    let llm = Arc::new(MockLlm::new().failing());

    let runner = PipelineRunner::new(
        fetcher,
        llm,
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_audit(SheetTarget::new(store.clone(), "Audit"))
    .with_output(SheetTarget::new(store.clone(), "Output"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.posts_classified, 1);
    assert_eq!(stats.posts_matched, 0);
    assert_eq!(stats.output_rows_written, 0);

    let audit = store.rows_in("Audit");
    assert_eq!(audit[1][10], "error");
    assert!(audit[1][11].starts_with("Error getting LLM decision:"));
}

#[tokio::test]
async fn failing_audit_write_reports_zero_rows() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);
    let audit_store = Arc::new(MemoryStore::new().failing_writes());

    let fetcher = Arc::new(
        MockFetcher::new().on_handle("ada", vec![recent_post("101", "Protocol deep dive")]),
    );
    let llm = Arc::new(MockLlm::new().with_default("yes\nSolid analysis."));

    let runner = PipelineRunner::new(
        fetcher,
        llm,
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_audit(SheetTarget::new(audit_store, "Audit"))
    .with_output(SheetTarget::new(store.clone(), "Output"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.audit_rows_written, 0);
    assert_eq!(stats.output_rows_written, 1, "output sink is independent");
}

// ---------------------------------------------------------------------------
// Recency, replies, merging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_posts_drop_before_classification() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    let fetcher = Arc::new(MockFetcher::new().on_handle(
        "ada",
        vec![
            recent_post("1", "Fresh take"),
            stale_post("2", "Old news"),
        ],
    ));
    let llm = Arc::new(MockLlm::new().with_default("no\nNot relevant"));

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    );

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.posts_fetched, 2);
    assert_eq!(stats.posts_recent, 1);
    assert_eq!(stats.posts_classified, 1);
    assert!(llm.saw_content("Fresh take"));
    assert!(!llm.saw_content("Old news"));
}

#[tokio::test]
async fn reply_fragments_merge_into_one_thread() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    // Two reply fragments in the same conversation plus a plain root. With
    // any replies present, only the reply subset is classified.
    let fetcher = Arc::new(MockFetcher::new().on_handle(
        "ada",
        vec![
            reply_post("201", "900", "Part one of the thread"),
            reply_post("202", "900", "and part two"),
            recent_post("300", "A root post"),
        ],
    ));
    let llm = Arc::new(MockLlm::new().with_default("no\nNot relevant"));

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    );

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.posts_recent, 3);
    assert_eq!(stats.posts_replies, 2);
    assert_eq!(stats.posts_merged, 1);
    assert_eq!(stats.posts_classified, 1);
    assert!(llm.saw_content("Part one of the thread and part two"));
    assert!(!llm.saw_content("A root post"));
}

#[tokio::test]
async fn blank_posts_are_never_classified() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    let fetcher =
        Arc::new(MockFetcher::new().on_handle("ada", vec![recent_post("401", "   ")]));
    let llm = Arc::new(MockLlm::new().with_default("yes\nNever reached."));

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_audit(SheetTarget::new(store.clone(), "Audit"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.posts_new, 1);
    assert_eq!(stats.posts_classified, 0);
    assert_eq!(stats.audit_rows_written, 0);
    assert_eq!(llm.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Deduplication against the output sheet
// ---------------------------------------------------------------------------

#[tokio::test]
async fn known_post_ids_skip_classification() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);
    store.seed_grid("Output", &[&["post_id"], &["101"]]);

    let fetcher = Arc::new(MockFetcher::new().on_handle(
        "ada",
        vec![
            recent_post("101", "Seen before"),
            recent_post("102", "Brand new"),
        ],
    ));
    let llm = Arc::new(MockLlm::new().with_default("yes\nWorth a look."));

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_output(SheetTarget::new(store.clone(), "Output"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.posts_merged, 2);
    assert_eq!(stats.posts_new, 1);
    assert!(!llm.saw_content("Seen before"));
    assert!(llm.saw_content("Brand new"));

    let output = store.rows_in("Output");
    assert_eq!(output.len(), 3, "seeded rows plus the new one");
    assert_eq!(output[2][11], "102");
}

#[tokio::test]
async fn missing_output_sheet_is_created_on_first_write() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    let fetcher =
        Arc::new(MockFetcher::new().on_handle("ada", vec![recent_post("101", "Fund flows")]));
    let llm = Arc::new(MockLlm::new().with_default("yes\nOn topic."));

    let runner = PipelineRunner::new(
        fetcher,
        llm,
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_output(SheetTarget::new(store.clone(), "Output"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.output_rows_written, 1);
    let output = store.rows_in("Output");
    assert_eq!(output[0][0], "profile_url", "header written first");
    assert_eq!(output[0].len(), 12);
    assert_eq!(output.len(), 2);
}

// ---------------------------------------------------------------------------
// Prompt overrides
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sheet_prompts_reach_the_model() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);
    store.seed_grid(
        "Prompts",
        &[
            &["name", "prompt"],
            &["match_prompt", "Classify lunar posts. yes or no."],
            &["reply_prompt", "Reply like a pirate."],
        ],
    );

    let fetcher =
        Arc::new(MockFetcher::new().on_handle("ada", vec![recent_post("101", "Moon update")]));
    let llm = Arc::new(MockLlm::new().with_default("yes\nMoon shot."));

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_prompts(SheetTarget::new(store.clone(), "Prompts"));

    runner.run().await.unwrap();

    assert_eq!(llm.calls_with_prompt("Classify lunar posts"), 1);
    assert_eq!(llm.calls_with_prompt("Reply like a pirate."), 1);
    assert_eq!(llm.calls_with_prompt("liquid fund investor"), 0);
}

#[tokio::test]
async fn missing_prompts_sheet_falls_back_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(&store, &["https://x.com/ada"]);

    let fetcher =
        Arc::new(MockFetcher::new().on_handle("ada", vec![recent_post("101", "Chain data")]));
    let llm = Arc::new(MockLlm::new().with_default("no\nNot relevant"));

    let runner = PipelineRunner::new(
        fetcher,
        llm.clone(),
        profiles_target(&store),
        RunOptions::default(),
    )
    .with_prompts(SheetTarget::new(store.clone(), "Prompts"));

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.posts_classified, 1);
    assert_eq!(llm.calls_with_prompt("liquid fund investor"), 1);
}

// ---------------------------------------------------------------------------
// Batch windows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_window_applies_before_the_cap() {
    let store = Arc::new(MemoryStore::new());
    seed_profiles(
        &store,
        &[
            "https://x.com/a",
            "https://x.com/b",
            "https://x.com/c",
            "https://x.com/d",
        ],
    );

    // Window [1, 3) selects b and c, the cap then keeps only b. Only b has
    // registered posts, so any other fetch would fail the profile.
    let fetcher =
        Arc::new(MockFetcher::new().on_handle("b", vec![recent_post("501", "B post")]));
    let llm = Arc::new(MockLlm::new().with_default("no\nNot relevant"));

    let options = RunOptions {
        batch_start: 1,
        batch_size: 2,
        max_profiles: 1,
        ..RunOptions::default()
    };
    let runner = PipelineRunner::new(fetcher, llm, profiles_target(&store), options);

    let stats = runner.run().await.unwrap();

    assert_eq!(stats.profiles_total, 1);
    assert_eq!(stats.profiles_processed, 1);
    assert_eq!(stats.profiles_failed, 0);
    assert_eq!(stats.posts_fetched, 1);
}
