use std::path::Path;

use serde::Serialize;

/// One scraped variable, fields in CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableRecord {
    pub variable_name: String,
    pub main_description: String,
    pub main_type: String,
    pub label: String,
    pub type_length: String,
    pub available_in: String,
    pub format: String,
    pub value: String,
    pub links: String,
}

/// Header row, kept in sync with the `VariableRecord` field order.
pub const COLUMNS: [&str; 9] = [
    "variable_name",
    "main_description",
    "main_type",
    "label",
    "type_length",
    "available_in",
    "format",
    "value",
    "links",
];

/// Whole-file write: header plus one row per record, traversal order. The
/// header is written unconditionally so an empty scrape still yields a valid
/// CSV skeleton.
pub fn write_csv(path: &Path, records: &[VariableRecord]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;

    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.flush().map_err(Into::into)
}
