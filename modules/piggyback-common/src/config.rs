use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // External APIs
    pub apify_token: String,
    pub openai_api_key: String,
    pub openai_model: String,

    // Google Sheets
    pub service_account_path: String,
    pub profiles_sheet_id: String,
    pub profiles_worksheet: String,
    pub prompts_sheet_id: Option<String>,
    pub prompts_worksheet: String,
    pub audit_sheet_id: Option<String>,
    pub audit_worksheet: String,
    pub output_sheet_id: Option<String>,
    pub output_worksheet: String,
    pub post_id_column: String,

    // Pipeline tuning
    pub lookback_days: i64,
    pub post_limit: u32,
    pub max_profiles: usize,
    pub batch_start: usize,
    pub batch_size: usize,
    pub merge_window_ms: i64,

    // Schedule
    pub schedule_hour: u32,
    pub schedule_minute: u32,
    pub schedule_timezone: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            apify_token: required_env("APIFY_TOKEN"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-5.2".to_string()),
            service_account_path: required_env("GOOGLE_SERVICE_ACCOUNT_PATH"),
            profiles_sheet_id: required_env("GOOGLE_SHEET_ID"),
            profiles_worksheet: env::var("GOOGLE_X_PROFILES_WORKSHEET")
                .unwrap_or_else(|_| "profiles".to_string()),
            prompts_sheet_id: env::var("GOOGLE_X_PROMPTS_SHEET_ID").ok(),
            prompts_worksheet: env::var("GOOGLE_X_PROMPTS_WORKSHEET")
                .unwrap_or_else(|_| "prompts".to_string()),
            audit_sheet_id: env::var("GOOGLE_X_TESTING_SHEET_ID").ok(),
            audit_worksheet: env::var("GOOGLE_X_TESTING_WORKSHEET")
                .unwrap_or_else(|_| "all-point".to_string()),
            output_sheet_id: env::var("GOOGLE_X_SCRAPE_OUTPUT").ok(),
            output_worksheet: env::var("GOOGLE_X_SCRAPE_OUTPUT_WORKSHEET")
                .unwrap_or_else(|_| "scrape_output".to_string()),
            post_id_column: env::var("POST_ID_COLUMN").unwrap_or_else(|_| "post_id".to_string()),
            lookback_days: numeric_env("LOOKBACK_DAYS", "30"),
            post_limit: numeric_env("POST_RESULTS_LIMIT", "5"),
            max_profiles: numeric_env("MAX_PROFILE_URLS", "0"),
            batch_start: numeric_env("PROFILE_BATCH_START", "0"),
            batch_size: numeric_env("PROFILE_BATCH_SIZE", "0"),
            merge_window_ms: numeric_env("MERGE_WINDOW_MS", "120000"),
            schedule_hour: numeric_env("COLLECTION_SCHEDULE_HOUR", "8"),
            schedule_minute: numeric_env("COLLECTION_SCHEDULE_MINUTE", "0"),
            schedule_timezone: env::var("SCHEDULE_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Taipei".to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: numeric_env("WEB_PORT", "3000"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn numeric_env<T: std::str::FromStr>(key: &str, default: &str) -> T {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a number"))
}
