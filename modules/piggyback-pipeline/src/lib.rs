pub mod dedup;
pub mod fetcher;
pub mod merge;
pub mod profiles;
pub mod prompts;
pub mod recency;
pub mod relevance;
pub mod replies;
pub mod runner;
pub mod sinks;
pub mod stats;
pub mod store;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod runner_tests;

pub use runner::{PipelineRunner, RunOptions, SheetTarget};
pub use stats::RunStats;
