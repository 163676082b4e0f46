use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sheets_client::SheetsClient;
use tracing::info;

use crate::traits::RecordStore;

/// Google Sheets-backed record store: one spreadsheet, worksheets as
/// collections. Stores for different spreadsheets can share the same
/// `SheetsClient` and with it the cached access token.
pub struct SheetStore {
    client: Arc<SheetsClient>,
    spreadsheet_id: String,
}

impl SheetStore {
    pub fn new(client: Arc<SheetsClient>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }
}

#[async_trait]
impl RecordStore for SheetStore {
    async fn read_records(&self, collection: &str) -> Result<Vec<HashMap<String, String>>> {
        Ok(self
            .client
            .read_records(&self.spreadsheet_id, collection)
            .await?)
    }

    async fn read_values(&self, collection: &str) -> Result<Vec<Vec<String>>> {
        Ok(self
            .client
            .read_values(&self.spreadsheet_id, collection)
            .await?)
    }

    async fn ensure_collection(&self, collection: &str, header: &[&str]) -> Result<()> {
        let titles = self.client.worksheet_titles(&self.spreadsheet_id).await?;
        if !titles.iter().any(|t| t == collection) {
            self.client
                .add_worksheet(&self.spreadsheet_id, collection)
                .await?;
        }

        // A worksheet full of blank cells counts as empty too.
        let rows = self
            .client
            .read_values(&self.spreadsheet_id, collection)
            .await?;
        let has_content = rows
            .iter()
            .any(|row| row.iter().any(|cell| !cell.trim().is_empty()));
        if !has_content {
            info!(collection, "Writing header row");
            let header_row: Vec<String> = header.iter().map(|h| h.to_string()).collect();
            self.client
                .append_rows(&self.spreadsheet_id, collection, vec![header_row])
                .await?;
        }
        Ok(())
    }

    async fn append_rows(&self, collection: &str, rows: Vec<Vec<String>>) -> Result<()> {
        Ok(self
            .client
            .append_rows(&self.spreadsheet_id, collection, rows)
            .await?)
    }
}
