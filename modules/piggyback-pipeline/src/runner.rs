use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use piggyback_common::{ClassifiedPost, Post, ProfileRef};

use crate::dedup::{self, DuplicateIndex};
use crate::merge;
use crate::profiles::ProfileResolver;
use crate::prompts::PromptSet;
use crate::recency;
use crate::relevance::RelevanceClassifier;
use crate::replies;
use crate::sinks;
use crate::stats::RunStats;
use crate::traits::{PostFetcher, RecordStore, RelevanceLlm};

/// A worksheet within a specific store. Targets may share a store or span
/// several spreadsheets.
#[derive(Clone)]
pub struct SheetTarget {
    pub store: Arc<dyn RecordStore>,
    pub collection: String,
}

impl SheetTarget {
    pub fn new(store: Arc<dyn RecordStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }
}

/// Tuning knobs for one run. Zero means "unlimited" for the profile caps.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub lookback_days: i64,
    pub post_limit: u32,
    pub max_profiles: usize,
    pub batch_start: usize,
    pub batch_size: usize,
    pub merge_window_ms: i64,
    /// Output column the duplicate index reads post ids from.
    pub post_id_column: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            post_limit: 5,
            max_profiles: 0,
            batch_start: 0,
            batch_size: 0,
            merge_window_ms: 120_000,
            post_id_column: "post_id".to_string(),
        }
    }
}

/// Sequences one collection run: resolve targets, fetch, filter, merge,
/// dedup, classify, persist. Profiles are processed strictly in sequence; a
/// failing profile is logged and skipped, a failing sink is logged and
/// reported as zero rows written. Only the initial profiles read is fatal.
pub struct PipelineRunner {
    fetcher: Arc<dyn PostFetcher>,
    classifier: RelevanceClassifier,
    profiles: SheetTarget,
    prompts: Option<SheetTarget>,
    audit: Option<SheetTarget>,
    output: Option<SheetTarget>,
    options: RunOptions,
}

impl PipelineRunner {
    pub fn new(
        fetcher: Arc<dyn PostFetcher>,
        llm: Arc<dyn RelevanceLlm>,
        profiles: SheetTarget,
        options: RunOptions,
    ) -> Self {
        Self {
            fetcher,
            classifier: RelevanceClassifier::new(llm),
            profiles,
            prompts: None,
            audit: None,
            output: None,
            options,
        }
    }

    pub fn with_prompts(mut self, target: SheetTarget) -> Self {
        self.prompts = Some(target);
        self
    }

    pub fn with_audit(mut self, target: SheetTarget) -> Self {
        self.audit = Some(target);
        self
    }

    pub fn with_output(mut self, target: SheetTarget) -> Self {
        self.output = Some(target);
        self
    }

    /// Execute one full collection run.
    pub async fn run(&self) -> Result<RunStats> {
        let started = Instant::now();
        let mut stats = RunStats::default();

        // Without profile targets there is nothing to do, so this read is
        // the one fatal call of the run.
        let records = self
            .profiles
            .store
            .read_records(&self.profiles.collection)
            .await
            .context("reading profiles worksheet")?;
        let raw_rows = self
            .profiles
            .store
            .read_values(&self.profiles.collection)
            .await
            .context("reading profiles worksheet")?;
        let resolved = ProfileResolver::new().resolve(&records, &raw_rows);
        stats.profiles_rejected = resolved.rejected as u32;

        let targets = self.batch(resolved.profiles);
        stats.profiles_total = targets.len() as u32;
        info!(
            profiles = targets.len(),
            rejected = resolved.rejected,
            "Resolved profile targets"
        );

        let prompts = self.load_prompts().await;
        let index = self.load_duplicate_index().await;

        let mut collected: Vec<ClassifiedPost> = Vec::new();
        for profile in &targets {
            match self
                .collect_profile(profile, &prompts, &index, &mut stats, &mut collected)
                .await
            {
                Ok(()) => stats.profiles_processed += 1,
                Err(e) => {
                    stats.profiles_failed += 1;
                    warn!(
                        profile_url = %profile.profile_url,
                        error = %e,
                        "Profile failed, continuing with the next one"
                    );
                }
            }
        }

        self.write_sinks(&collected, &mut stats).await;

        info!(
            elapsed_secs = started.elapsed().as_secs(),
            matched = stats.posts_matched,
            "Collection run finished"
        );
        Ok(stats)
    }

    /// Batch windowing comes before the overall cap, mirroring how operators
    /// split a long profile list across scheduled runs.
    fn batch(&self, mut profiles: Vec<ProfileRef>) -> Vec<ProfileRef> {
        if self.options.batch_size > 0 {
            let start = self.options.batch_start.min(profiles.len());
            let end = (start + self.options.batch_size).min(profiles.len());
            profiles = profiles[start..end].to_vec();
        }
        if self.options.max_profiles > 0 && profiles.len() > self.options.max_profiles {
            profiles.truncate(self.options.max_profiles);
        }
        profiles
    }

    async fn load_prompts(&self) -> PromptSet {
        let Some(target) = &self.prompts else {
            return PromptSet::default();
        };
        match target.store.read_records(&target.collection).await {
            Ok(records) => PromptSet::default().with_overrides(&records),
            Err(e) => {
                warn!(error = %e, "Prompts worksheet unreadable, using defaults");
                PromptSet::default()
            }
        }
    }

    /// One snapshot per run, never refreshed mid-run. An unreadable output
    /// worksheet downgrades to an empty index: posts may repeat, but the run
    /// proceeds.
    async fn load_duplicate_index(&self) -> DuplicateIndex {
        let Some(target) = &self.output else {
            return DuplicateIndex::default();
        };
        match target.store.read_records(&target.collection).await {
            Ok(records) => {
                let index = DuplicateIndex::from_records(&records, &self.options.post_id_column);
                info!(known = index.len(), "Loaded duplicate index");
                index
            }
            Err(e) => {
                warn!(error = %e, "Output worksheet unreadable, starting with an empty duplicate index");
                DuplicateIndex::default()
            }
        }
    }

    async fn collect_profile(
        &self,
        profile: &ProfileRef,
        prompts: &PromptSet,
        index: &DuplicateIndex,
        stats: &mut RunStats,
        collected: &mut Vec<ClassifiedPost>,
    ) -> Result<()> {
        let now = Utc::now();
        let start_date = (now - Duration::days(self.options.lookback_days)).date_naive();
        let fetched = self
            .fetcher
            .fetch(
                &[profile.handle.clone()],
                self.options.post_limit,
                Some(start_date),
                None,
            )
            .await?;
        stats.posts_fetched += fetched.len() as u32;

        let recent: Vec<Post> = fetched
            .into_iter()
            .filter(|p| recency::is_recent(p, self.options.lookback_days, now))
            .collect();
        stats.posts_recent += recent.len() as u32;

        let reply_subset: Vec<Post> = recent
            .iter()
            .filter(|p| replies::is_reply(p))
            .cloned()
            .collect();
        stats.posts_replies += reply_subset.len() as u32;

        // Replies carry the thread fragments worth merging; a profile with
        // no recent replies falls back to its plain timeline.
        let to_merge = if reply_subset.is_empty() {
            recent
        } else {
            reply_subset
        };
        let merged = merge::merge(to_merge, self.options.merge_window_ms);
        stats.posts_merged += merged.len() as u32;

        let fresh = dedup::filter_new(merged, index);
        stats.posts_new += fresh.len() as u32;

        for post in fresh {
            if post.text.trim().is_empty() {
                continue;
            }
            let decision = self
                .classifier
                .classify(&prompts.match_prompt, &post.text)
                .await;
            stats.posts_classified += 1;
            if decision.decision {
                stats.posts_matched += 1;
            }
            let reply_suggestion = if decision.decision {
                Some(
                    self.classifier
                        .suggest_reply(&prompts.reply_prompt, &post.text)
                        .await,
                )
            } else {
                None
            };
            collected.push(ClassifiedPost {
                profile_url: profile.profile_url.clone(),
                post,
                decision,
                reply_suggestion,
            });
        }
        Ok(())
    }

    async fn write_sinks(&self, collected: &[ClassifiedPost], stats: &mut RunStats) {
        if let Some(target) = &self.audit {
            match sinks::write_audit(
                target.store.as_ref(),
                &target.collection,
                collected,
                Utc::now(),
            )
            .await
            {
                Ok(written) => stats.audit_rows_written = written,
                Err(e) => warn!(error = %e, "Audit sink write failed"),
            }
        }
        if let Some(target) = &self.output {
            match sinks::write_output(target.store.as_ref(), &target.collection, collected).await {
                Ok(written) => stats.output_rows_written = written,
                Err(e) => warn!(error = %e, "Output sink write failed"),
            }
        }
    }
}
