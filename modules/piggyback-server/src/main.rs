use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_cron_scheduler::JobScheduler;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ai_client::OpenAi;
use apify_client::ApifyClient;
use piggyback_common::Config;
use piggyback_pipeline::fetcher::ApifyPostFetcher;
use piggyback_pipeline::store::SheetStore;
use piggyback_pipeline::traits::{PostFetcher, RelevanceLlm};
use piggyback_pipeline::{PipelineRunner, RunOptions, SheetTarget};
use sheets_client::SheetsClient;

mod routes;
mod scheduled;

/// Outcome of the most recent collection run, scheduled or manual.
#[derive(Debug, Clone, Serialize)]
pub struct LastRun {
    pub ok: bool,
    pub finished_at: DateTime<Utc>,
    pub detail: String,
}

/// Shared run bookkeeping. The counter reports overlap rather than
/// preventing it; a manual trigger may land while a scheduled run is live.
pub struct RunState {
    pub runner: Arc<PipelineRunner>,
    pub active_runs: AtomicUsize,
    pub last_run: Mutex<Option<LastRun>>,
}

impl RunState {
    pub fn new(runner: Arc<PipelineRunner>) -> Self {
        Self {
            runner,
            active_runs: AtomicUsize::new(0),
            last_run: Mutex::new(None),
        }
    }
}

pub struct AppState {
    pub runs: Arc<RunState>,
    pub scheduler: JobScheduler,
    pub job_id: Uuid,
    pub schedule_label: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("piggyback=info".parse()?))
        .init();

    info!("Piggyback collection server starting...");

    let config = Config::from_env();

    let fetcher: Arc<dyn PostFetcher> =
        Arc::new(ApifyPostFetcher::new(ApifyClient::new(config.apify_token.clone())));
    let llm: Arc<dyn RelevanceLlm> =
        Arc::new(OpenAi::new(&config.openai_api_key, &config.openai_model));
    let sheets = Arc::new(SheetsClient::from_key_file(&config.service_account_path)?);

    let profiles = SheetTarget::new(
        Arc::new(SheetStore::new(sheets.clone(), config.profiles_sheet_id.clone())),
        config.profiles_worksheet.clone(),
    );

    let options = RunOptions {
        lookback_days: config.lookback_days,
        post_limit: config.post_limit,
        max_profiles: config.max_profiles,
        batch_start: config.batch_start,
        batch_size: config.batch_size,
        merge_window_ms: config.merge_window_ms,
        post_id_column: config.post_id_column.clone(),
    };

    let mut runner = PipelineRunner::new(fetcher, llm, profiles, options);
    if let Some(sheet_id) = &config.prompts_sheet_id {
        runner = runner.with_prompts(SheetTarget::new(
            Arc::new(SheetStore::new(sheets.clone(), sheet_id.clone())),
            config.prompts_worksheet.clone(),
        ));
    }
    if let Some(sheet_id) = &config.audit_sheet_id {
        runner = runner.with_audit(SheetTarget::new(
            Arc::new(SheetStore::new(sheets.clone(), sheet_id.clone())),
            config.audit_worksheet.clone(),
        ));
    }
    if let Some(sheet_id) = &config.output_sheet_id {
        runner = runner.with_output(SheetTarget::new(
            Arc::new(SheetStore::new(sheets.clone(), sheet_id.clone())),
            config.output_worksheet.clone(),
        ));
    }

    let runs = Arc::new(RunState::new(Arc::new(runner)));
    let (scheduler, job_id) = scheduled::start(runs.clone(), &config).await?;

    let state = Arc::new(AppState {
        runs,
        scheduler,
        job_id,
        schedule_label: format!(
            "{:02}:{:02} daily ({})",
            config.schedule_hour, config.schedule_minute, config.schedule_timezone
        ),
    });

    let app = routes::build_router(state);
    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Web endpoints listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
