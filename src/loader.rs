//! Reads the raw statement tables from a directory of CSV exports.

use crate::error::{BankRatioError, Result};
use crate::forecast::ForecastEntry;
use crate::ingestion::{BankClassification, CodeMapping, RawStatements, StatementRow, WriteOffRow};
use crate::utils::{parse_end_date, parse_value};
use csv::StringRecord;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const INCOME_STATEMENT_FILE: &str = "IS_Bank.csv";
pub const BALANCE_SHEET_FILE: &str = "BS_Bank.csv";
pub const NOTES_FILE: &str = "Note_Bank.csv";
pub const CLASSIFICATION_FILE: &str = "Bank_Type.csv";
pub const CODE_MAPPING_FILE: &str = "KeyCodes.csv";
pub const WRITE_OFF_FILE: &str = "writeoffs.csv";
pub const FORECAST_FILE: &str = "FORECAST_bank.csv";

const TICKER: &str = "TICKER";
const YEAR: &str = "YEARREPORT";
const LENGTH: &str = "LENGTHREPORT";
const END_DATE: &str = "ENDDATE";
const EXCHANGE: &str = "EXCHANGE";

impl RawStatements {
    /// Loads every table from `dir`. The forecast file is optional.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let open = |name: &str| -> Result<File> {
            let path = dir.join(name);
            if !path.exists() {
                return Err(BankRatioError::MissingInput(path.display().to_string()));
            }
            Ok(File::open(path)?)
        };

        let mut raw = RawStatements {
            income_statement: read_statement_table(INCOME_STATEMENT_FILE, open(INCOME_STATEMENT_FILE)?)?,
            balance_sheet: read_statement_table(BALANCE_SHEET_FILE, open(BALANCE_SHEET_FILE)?)?,
            notes: read_statement_table(NOTES_FILE, open(NOTES_FILE)?)?,
            code_mapping: read_code_mapping(CODE_MAPPING_FILE, open(CODE_MAPPING_FILE)?)?,
            classification: read_classification(CLASSIFICATION_FILE, open(CLASSIFICATION_FILE)?)?,
            write_offs: read_write_offs(WRITE_OFF_FILE, open(WRITE_OFF_FILE)?)?,
            forecast: Vec::new(),
        };

        if dir.join(FORECAST_FILE).exists() {
            raw.forecast = read_forecast(FORECAST_FILE, open(FORECAST_FILE)?)?;
        } else {
            debug!("No {} in {}", FORECAST_FILE, dir.display());
        }

        info!(
            "Loaded {} IS, {} BS, {} notes rows, {} write-off cells, {} forecast entries from {}",
            raw.income_statement.len(),
            raw.balance_sheet.len(),
            raw.notes.len(),
            raw.write_offs.len(),
            raw.forecast.len(),
            dir.display()
        );
        Ok(raw)
    }
}

struct Table {
    source_name: String,
    headers: StringRecord,
    columns: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl Table {
    fn read<R: Read>(source_name: &str, reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), i))
            .collect();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            source_name: source_name.to_string(),
            headers,
            columns,
            rows,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.columns.get(name).copied().ok_or_else(|| BankRatioError::Parse {
            source_name: self.source_name.clone(),
            row: 1,
            details: format!("missing column {}", name),
        })
    }

    fn parse_error(&self, row: usize, details: String) -> BankRatioError {
        BankRatioError::Parse {
            source_name: self.source_name.clone(),
            // Header is line 1.
            row: row + 2,
            details,
        }
    }

    fn cell<'r>(record: &'r StringRecord, column: usize) -> &'r str {
        record.get(column).unwrap_or("")
    }

    fn parse_cell<T: std::str::FromStr>(
        &self,
        index: usize,
        record: &StringRecord,
        column: usize,
    ) -> Result<T> {
        let raw = Self::cell(record, column);
        raw.parse::<T>().map_err(|_| {
            self.parse_error(
                index,
                format!("invalid {} value '{}'", &self.headers[column], raw),
            )
        })
    }
}

/// Reads a wide statement table: `TICKER, YEARREPORT, LENGTHREPORT, ENDDATE`
/// followed by one column per line-item code.
pub fn read_statement_table<R: Read>(source_name: &str, reader: R) -> Result<Vec<StatementRow>> {
    let table = Table::read(source_name, reader)?;
    let ticker = table.column(TICKER)?;
    let year = table.column(YEAR)?;
    let length = table.column(LENGTH)?;
    let end_date = table.column(END_DATE)?;

    let value_columns: Vec<(usize, &str)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| ![ticker, year, length, end_date].contains(i))
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut unparsed = 0usize;

    for (index, record) in table.rows.iter().enumerate() {
        let mut values = BTreeMap::new();
        for (column, code) in &value_columns {
            let raw = Table::cell(record, *column);
            match parse_value(raw) {
                Some(value) => {
                    values.insert(code.to_string(), value);
                }
                None if !raw.is_empty() => unparsed += 1,
                None => {}
            }
        }

        rows.push(StatementRow {
            ticker: Table::cell(record, ticker).to_string(),
            year: table.parse_cell(index, record, year)?,
            period_length: table.parse_cell(index, record, length)?,
            end_date: parse_end_date(Table::cell(record, end_date)),
            values,
        });
    }

    if unparsed > 0 {
        warn!("{}: {} non-numeric cells treated as null", source_name, unparsed);
    }
    debug!("{}: {} rows, {} value columns", source_name, rows.len(), value_columns.len());
    Ok(rows)
}

/// Reads `DWHCode, KeyCode`.
pub fn read_code_mapping<R: Read>(source_name: &str, reader: R) -> Result<CodeMapping> {
    let table = Table::read(source_name, reader)?;
    let dwh = table.column("DWHCode")?;
    let key = table.column("KeyCode")?;

    Ok(table
        .rows
        .iter()
        .map(|r| (Table::cell(r, dwh), Table::cell(r, key)))
        .filter(|(dwh, key)| !dwh.is_empty() && !key.is_empty())
        .collect())
}

/// Reads `TICKER, Type`.
pub fn read_classification<R: Read>(source_name: &str, reader: R) -> Result<BankClassification> {
    let table = Table::read(source_name, reader)?;
    let ticker = table.column(TICKER)?;
    let bank_type = table.column("Type")?;

    let mut classification = BankClassification::new();
    for record in &table.rows {
        let label = Table::cell(record, bank_type);
        if !classification.insert_label(Table::cell(record, ticker), label) {
            warn!(
                "{}: unknown bank type '{}' for {}; treated as unclassified",
                source_name,
                label,
                Table::cell(record, ticker)
            );
        }
    }
    Ok(classification)
}

/// Reads the wide write-off sheet `TICKER, EXCHANGE, Q12019, Q22019, ...`
/// into one row per cell.
pub fn read_write_offs<R: Read>(source_name: &str, reader: R) -> Result<Vec<WriteOffRow>> {
    let table = Table::read(source_name, reader)?;
    let ticker = table.column(TICKER)?;
    let exchange = table.columns.get(EXCHANGE).copied();

    let periods: Vec<(usize, &str)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ticker && Some(*i) != exchange)
        .collect();

    let mut rows = Vec::new();
    for record in &table.rows {
        for (column, period) in &periods {
            rows.push(WriteOffRow {
                ticker: Table::cell(record, ticker).to_string(),
                exchange: exchange
                    .map(|c| Table::cell(record, c))
                    .filter(|e| !e.is_empty())
                    .map(str::to_string),
                period: period.to_string(),
                amount: parse_value(Table::cell(record, *column)),
            });
        }
    }
    Ok(rows)
}

/// Reads `TICKER, DATE, KEYCODE, Formula, VALUE`; `DATE` is the forecast year.
/// Rows without a numeric value are skipped.
pub fn read_forecast<R: Read>(source_name: &str, reader: R) -> Result<Vec<ForecastEntry>> {
    let table = Table::read(source_name, reader)?;
    let ticker = table.column(TICKER)?;
    let date = table.column("DATE")?;
    let key_code = table.column("KEYCODE")?;
    let formula = table.column("Formula")?;
    let value = table.column("VALUE")?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for (index, record) in table.rows.iter().enumerate() {
        let Some(amount) = parse_value(Table::cell(record, value)) else {
            skipped += 1;
            continue;
        };
        let formula_text = Table::cell(record, formula);

        entries.push(ForecastEntry {
            ticker: Table::cell(record, ticker).to_string(),
            year: table.parse_cell(index, record, date)?,
            key_code: Table::cell(record, key_code).to_string(),
            formula: (!formula_text.is_empty()).then(|| formula_text.to_string()),
            value: amount,
        });
    }

    if skipped > 0 {
        warn!("{}: skipped {} forecast rows without a value", source_name, skipped);
    }
    Ok(entries)
}
