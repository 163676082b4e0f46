pub mod auth;
pub mod error;
pub mod types;

pub use auth::ServiceAccountKey;
pub use error::{Result, SheetsError};

use std::collections::HashMap;
use std::time::Duration;

use auth::TokenProvider;
use types::{
    AddSheetRequest, AddSheetWrapper, AppendRequest, BatchUpdateRequest, GridProperties,
    NewSheetProperties, SpreadsheetMeta, ValueRange,
};

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Grid size for worksheets created on demand.
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLS: u32 = 20;

pub struct SheetsClient {
    client: reqwest::Client,
    tokens: TokenProvider,
}

impl SheetsClient {
    /// Build a client from a service account key file.
    pub fn from_key_file(path: &str) -> Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        Ok(Self::new(key))
    }

    pub fn new(key: ServiceAccountKey) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            tokens: TokenProvider::new(key, client.clone()),
            client,
        }
    }

    /// Read a worksheet as a raw grid of cell strings.
    pub async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{}/{}/values/{}",
            BASE_URL,
            spreadsheet_id,
            encode_range(worksheet)
        );
        tracing::debug!(spreadsheet_id, worksheet, "Reading sheet values");

        let token = self.tokens.bearer_token().await?;
        let resp = self.client.get(&url).bearer_auth(&token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let range: ValueRange = resp.json().await?;
        Ok(range
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    /// Read a worksheet as header-keyed records, one map per data row.
    pub async fn read_records(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Vec<HashMap<String, String>>> {
        let rows = self.read_values(spreadsheet_id, worksheet).await?;
        Ok(records_from_rows(rows))
    }

    /// Append rows after the worksheet's existing data. An empty row list is
    /// a no-op.
    pub async fn append_rows(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            BASE_URL,
            spreadsheet_id,
            encode_range(worksheet)
        );
        tracing::debug!(spreadsheet_id, worksheet, count = rows.len(), "Appending rows");

        let token = self.tokens.bearer_token().await?;
        let body = AppendRequest { values: rows };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    /// Titles of all worksheets in the spreadsheet.
    pub async fn worksheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}?fields=sheets.properties.title", BASE_URL, spreadsheet_id);
        let token = self.tokens.bearer_token().await?;
        let resp = self.client.get(&url).bearer_auth(&token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let meta: SpreadsheetMeta = resp.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Create a new worksheet.
    pub async fn add_worksheet(&self, spreadsheet_id: &str, title: &str) -> Result<()> {
        let url = format!("{}/{}:batchUpdate", BASE_URL, spreadsheet_id);
        tracing::info!(spreadsheet_id, title, "Creating worksheet");

        let token = self.tokens.bearer_token().await?;
        let body = BatchUpdateRequest {
            requests: vec![AddSheetWrapper {
                add_sheet: AddSheetRequest {
                    properties: NewSheetProperties {
                        title: title.to_string(),
                        grid_properties: GridProperties {
                            row_count: NEW_SHEET_ROWS,
                            column_count: NEW_SHEET_COLS,
                        },
                    },
                },
            }],
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }
}

/// Worksheet titles go into the URL path as an A1 range; spaces are the one
/// character that shows up in practice and must be escaped.
fn encode_range(worksheet: &str) -> String {
    worksheet.replace(' ', "%20")
}

fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First row is the header; remaining rows become header-keyed maps. Short
/// rows pad with empty strings, surplus cells are dropped.
pub fn records_from_rows(rows: Vec<Vec<String>>) -> Vec<HashMap<String, String>> {
    let mut iter = rows.into_iter();
    let Some(header) = iter.next() else {
        return Vec::new();
    };
    iter.map(|row| {
        header
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect()
    })
    .collect()
}
