use serde::{Deserialize, Serialize};

/// Response body for a values range read. `values` is absent entirely when
/// the range is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Option<Vec<Vec<serde_json::Value>>>,
}

/// Request body for a values append.
#[derive(Debug, Clone, Serialize)]
pub struct AppendRequest {
    pub values: Vec<Vec<String>>,
}

/// Spreadsheet metadata, trimmed to worksheet titles.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetProperties {
    pub title: String,
}

/// batchUpdate request carrying a single addSheet operation.
#[derive(Debug, Serialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<AddSheetWrapper>,
}

#[derive(Debug, Serialize)]
pub struct AddSheetWrapper {
    #[serde(rename = "addSheet")]
    pub add_sheet: AddSheetRequest,
}

#[derive(Debug, Serialize)]
pub struct AddSheetRequest {
    pub properties: NewSheetProperties,
}

#[derive(Debug, Serialize)]
pub struct NewSheetProperties {
    pub title: String,
    #[serde(rename = "gridProperties")]
    pub grid_properties: GridProperties,
}

#[derive(Debug, Serialize)]
pub struct GridProperties {
    #[serde(rename = "rowCount")]
    pub row_count: u32,
    #[serde(rename = "columnCount")]
    pub column_count: u32,
}
