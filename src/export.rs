//! CSV and JSON export of the assembled tables.

use crate::assembler::OutputTables;
use crate::error::Result;
use crate::ratios::RatioCode;
use crate::schema::FinancialPeriodRecord;
use crate::utils::{compare_codes, is_statement_code};
use log::info;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const QUARTERLY_FILE: &str = "dfsectorquarter.csv";
pub const YEARLY_FILE: &str = "dfsectoryear.csv";

const KEY_COLUMNS: [&str; 7] = [
    "entity_id",
    "period_key",
    "year",
    "period_length",
    "end_date",
    "sector_type",
    "origin",
];

/// Statement codes present on any record, in natural order.
fn line_item_columns(records: &[FinancialPeriodRecord]) -> Vec<&str> {
    let codes: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.line_items.codes())
        .filter(|code| is_statement_code(code))
        .collect();
    let mut codes: Vec<&str> = codes.into_iter().collect();
    codes.sort_by(|a, b| compare_codes(a, b));
    codes
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes one flattened row per record; null cells are empty.
pub fn write_csv<W: Write>(records: &[FinancialPeriodRecord], writer: W) -> Result<()> {
    let codes = line_item_columns(records);
    let mut wtr = csv::Writer::from_writer(writer);

    let header = KEY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(codes.iter().map(|c| c.to_string()))
        .chain(RatioCode::ALL.iter().map(|r| r.code()));
    wtr.write_record(header)?;

    for record in records {
        let mut row = vec![
            record.entity_id.to_string(),
            record.period_key().to_string(),
            record.year.to_string(),
            record.period_length.get().to_string(),
            record.end_date.to_string(),
            record
                .sector_type
                .map(|t| t.label().to_string())
                .unwrap_or_default(),
            record.origin.label().to_string(),
        ];
        row.extend(codes.iter().map(|code| format_value(record.line_items.get(code))));
        row.extend(RatioCode::ALL.iter().map(|code| format_value(record.ratio(*code))));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

impl OutputTables {
    /// Writes both tables as CSV files into `dir`, creating it if needed.
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        write_csv(&self.quarterly, File::create(dir.join(QUARTERLY_FILE))?)?;
        write_csv(&self.yearly, File::create(dir.join(YEARLY_FILE))?)?;

        info!(
            "Wrote {} and {} to {}",
            QUARTERLY_FILE,
            YEARLY_FILE,
            dir.display()
        );
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
