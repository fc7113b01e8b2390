use crate::config::PipelineConfig;
use crate::error::{BankRatioError, Result};
use crate::forecast::ForecastEntry;
use crate::period::{PeriodKey, PeriodLength};
use crate::schema::{BankType, EntityId, FinancialPeriodRecord, LineItems, RecordOrigin};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

/// Line item written by the write-off table.
pub const WRITE_OFF_CODE: &str = "Nt.220";

/// One row of a wide statement table (income statement, balance sheet or notes).
#[derive(Debug, Clone)]
pub struct StatementRow {
    pub ticker: String,
    pub year: i32,
    pub period_length: u8,
    pub end_date: Option<NaiveDate>,
    pub values: BTreeMap<String, f64>,
}

/// Data-warehouse column code to canonical statement code.
#[derive(Debug, Clone, Default)]
pub struct CodeMapping(HashMap<String, String>);

impl CodeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dwh_code: impl Into<String>, key_code: impl Into<String>) {
        self.0.insert(dwh_code.into(), key_code.into());
    }

    /// Canonical code for `code`; unmapped codes pass through unchanged.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        self.0.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CodeMapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut mapping = CodeMapping::new();
        for (dwh, key) in iter {
            mapping.insert(dwh, key);
        }
        mapping
    }
}

/// Ticker to sub-sector. Tickers absent here, or carrying an unknown label,
/// are unclassified and only join the whole-market group.
#[derive(Debug, Clone, Default)]
pub struct BankClassification(HashMap<String, BankType>);

impl BankClassification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: impl Into<String>, bank_type: BankType) {
        self.0.insert(ticker.into(), bank_type);
    }

    /// Records `label` for `ticker`; returns false when the label is not a
    /// known sub-sector.
    pub fn insert_label(&mut self, ticker: impl Into<String>, label: &str) -> bool {
        match BankType::parse(label) {
            Some(bank_type) => {
                self.insert(ticker, bank_type);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, ticker: &str) -> Option<BankType> {
        self.0.get(ticker.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One cell of the wide write-off sheet (`TICKER, EXCHANGE, Q12019, ...`).
#[derive(Debug, Clone)]
pub struct WriteOffRow {
    pub ticker: String,
    pub exchange: Option<String>,
    /// `Q{n}{yyyy}`, e.g. `Q32021`.
    pub period: String,
    /// In millions; `None` for blank or non-numeric cells.
    pub amount: Option<f64>,
}

/// Everything the pipeline reads, before any merging.
#[derive(Debug, Clone, Default)]
pub struct RawStatements {
    pub income_statement: Vec<StatementRow>,
    pub balance_sheet: Vec<StatementRow>,
    pub notes: Vec<StatementRow>,
    pub code_mapping: CodeMapping,
    pub classification: BankClassification,
    pub write_offs: Vec<WriteOffRow>,
    pub forecast: Vec<ForecastEntry>,
}

type RowKey = (String, i32, u8);

/// Splits `Q{n}{yyyy}` into `(year, quarter)`.
pub fn parse_write_off_period(label: &str) -> Result<(i32, u8)> {
    let label = label.trim();
    let invalid = || BankRatioError::InvalidPeriodLabel(label.to_string());

    let quarter = label
        .get(1..2)
        .and_then(|q| q.parse::<u8>().ok())
        .filter(|q| (1..=4).contains(q))
        .ok_or_else(invalid)?;
    let year = label
        .get(2..)
        .and_then(|y| y.parse::<i32>().ok())
        .ok_or_else(invalid)?;

    Ok((year, quarter))
}

/// Scaled write-offs keyed by `(ticker, year, period_length)`, including a
/// `period_length = 5` row per ticker and year that sums its quarters.
pub fn prepare_write_offs(
    rows: &[WriteOffRow],
    config: &PipelineConfig,
) -> Result<BTreeMap<RowKey, f64>> {
    let mut prepared = BTreeMap::new();
    let mut yearly: BTreeMap<(String, i32), f64> = BTreeMap::new();
    let mut excluded = 0usize;

    for row in rows {
        if row
            .exchange
            .as_deref()
            .is_some_and(|e| config.is_excluded_exchange(e))
        {
            excluded += 1;
            continue;
        }

        let ticker = row.ticker.trim().to_string();
        let (year, quarter) = parse_write_off_period(&row.period)?;
        let amount = row.amount.map(|a| a * config.writeoff_scale);

        // Yearly totals exist even when every quarter is blank.
        let total = yearly.entry((ticker.clone(), year)).or_insert(0.0);
        if let Some(amount) = amount {
            *total += amount;
            prepared.insert((ticker, year, quarter), amount);
        }
    }

    for ((ticker, year), total) in yearly {
        prepared.insert((ticker, year, PeriodLength::YEARLY.get()), total);
    }

    debug!(
        "Prepared {} write-off values ({} rows on excluded exchanges)",
        prepared.len(),
        excluded
    );
    Ok(prepared)
}

fn renamed(values: &BTreeMap<String, f64>, mapping: &CodeMapping) -> BTreeMap<String, f64> {
    values
        .iter()
        .map(|(code, value)| (mapping.resolve(code).to_string(), *value))
        .collect()
}

fn index_rows(rows: &[StatementRow]) -> HashMap<RowKey, &StatementRow> {
    let mut index = HashMap::new();
    for row in rows {
        index
            .entry((row.ticker.trim().to_string(), row.year, row.period_length))
            .or_insert(row);
    }
    index
}

/// Joins the three statement tables with classification and write-offs into
/// one record per bank and period.
pub fn merge_statements(
    raw: &RawStatements,
    config: &PipelineConfig,
) -> Result<Vec<FinancialPeriodRecord>> {
    if raw.income_statement.is_empty() {
        return Err(BankRatioError::MissingInput("income statement table".to_string()));
    }
    if raw.balance_sheet.is_empty() {
        return Err(BankRatioError::MissingInput("balance sheet table".to_string()));
    }
    if raw.notes.is_empty() {
        return Err(BankRatioError::MissingInput("notes table".to_string()));
    }

    let write_offs = prepare_write_offs(&raw.write_offs, config)?;
    let balance_sheet = index_rows(&raw.balance_sheet);
    let notes = index_rows(&raw.notes);

    let mut merged = Vec::new();
    let mut without_end_date = 0usize;

    for income in &raw.income_statement {
        let ticker = income.ticker.trim().to_string();
        let key = (ticker.clone(), income.year, income.period_length);
        let (Some(bs), Some(nt)) = (balance_sheet.get(&key), notes.get(&key)) else {
            continue;
        };

        let Some(end_date) = income.end_date else {
            without_end_date += 1;
            continue;
        };

        let entity_id = EntityId::bank(&ticker)?;
        let period_length = PeriodLength::new(income.period_length)?;

        let mut line_items = LineItems::new();
        for table in [&income.values, &bs.values, &nt.values] {
            for (code, value) in renamed(table, &raw.code_mapping) {
                if !line_items.contains(&code) {
                    line_items.insert(code, value);
                }
            }
        }
        if let Some(amount) = write_offs.get(&key) {
            line_items.insert(WRITE_OFF_CODE, *amount);
        }

        merged.push(
            FinancialPeriodRecord::new(entity_id, income.year, period_length, end_date)
                .with_sector_type(raw.classification.get(&ticker))
                .with_origin(RecordOrigin::Reported)
                .with_line_items(line_items),
        );
    }

    if without_end_date > 0 {
        warn!("Dropped {} statement rows without an end date", without_end_date);
    }

    let deduplicated = deduplicate(merged);
    let before_filter = deduplicated.len();
    let records: Vec<FinancialPeriodRecord> = deduplicated
        .into_iter()
        .filter(|r| r.year >= config.min_year)
        .collect();

    info!(
        "Merged {} bank periods ({} before {} dropped)",
        records.len(),
        before_filter - records.len(),
        config.min_year
    );
    Ok(records)
}

/// Keeps one record per `(entity, period_key)`: the first after sorting by
/// `(entity, end_date)`, with its null line items filled from later
/// duplicates.
pub fn deduplicate(mut records: Vec<FinancialPeriodRecord>) -> Vec<FinancialPeriodRecord> {
    records.sort_by(|a, b| {
        a.entity_id
            .cmp(&b.entity_id)
            .then_with(|| a.end_date.cmp(&b.end_date))
    });

    let mut kept: Vec<FinancialPeriodRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<(EntityId, PeriodKey), usize> = HashMap::new();

    for record in records {
        let key = (record.entity_id.clone(), record.period_key());
        match positions.get(&key) {
            Some(&position) => {
                let first = &mut kept[position];
                for (code, value) in record.line_items.iter() {
                    if !first.line_items.contains(code) {
                        first.line_items.insert(code, value);
                    }
                }
                if first.sector_type.is_none() {
                    first.sector_type = record.sector_type;
                }
            }
            None => {
                positions.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    kept
}
