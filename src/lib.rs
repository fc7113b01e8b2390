//! # Bank Ratio Builder
//!
//! Derives the `CA.1`..`CA.25` ratio set for Vietnamese listed banks and for
//! the banking sector as a whole, from quarterly and yearly statements.
//!
//! ## Core Concepts
//!
//! - **Line items**: raw statement figures keyed by code (`BS.13`, `IS.3`, `Nt.67`)
//! - **Groups**: `Sector`, `SOCB` and `Private_1..3` rows, built by summing member
//!   banks' line items per period. Group ratios are computed from the sums, never
//!   averaged from member ratios
//! - **Period kinds**: quarterly rows (`period_length` 1-4) and yearly rows (5) are
//!   processed separately; average-balance ratios use a multiplier of 8 for
//!   quarterly and 2 for yearly rows
//! - **Null ratios**: a ratio with a missing input, no prior period, or a zero
//!   denominator is null with a recorded reason, never an error
//!
//! ## Example
//!
//! ```rust,ignore
//! use bank_ratio_builder::*;
//!
//! let config = PipelineConfig::default();
//! let raw = RawStatements::load_dir("Data")?;
//! let tables = BankRatioProcessor::process(&raw, &config)?;
//!
//! let sector = EntityId::Group(GroupLabel::Sector);
//! for row in tables.entity_rows(&sector, PeriodKind::Quarterly) {
//!     println!("{} NIM {:?}", row.period_key(), row.ratio(RatioCode::Ca13));
//! }
//! tables.write_dir("output")?;
//! ```

pub mod aggregation;
pub mod assembler;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod ingestion;
pub mod loader;
pub mod period;
pub mod ratios;
pub mod schema;
pub mod utils;

pub use aggregation::{partition_by_kind, EntityAggregator};
pub use assembler::OutputTables;
pub use config::PipelineConfig;
pub use error::{BankRatioError, Result};
pub use export::{write_csv, QUARTERLY_FILE, YEARLY_FILE};
pub use forecast::{build_forecast_records, EquationSystem, ForecastEntry, Formula};
pub use ingestion::*;
pub use period::{PeriodKey, PeriodKind, PeriodLength};
pub use ratios::{NullReason, RatioCode, RatioEngine, RatioValue};
pub use schema::*;

use log::{debug, info};
use std::path::Path;

pub struct BankRatioProcessor;

impl BankRatioProcessor {
    /// Runs the full pipeline over raw statement tables.
    pub fn process(raw: &RawStatements, config: &PipelineConfig) -> Result<OutputTables> {
        config.validate()?;

        info!(
            "Processing {} income statement rows with {} classified banks",
            raw.income_statement.len(),
            raw.classification.len()
        );

        let mut records = merge_statements(raw, config)?;
        let forecasts = build_forecast_records(
            &raw.forecast,
            &records,
            &raw.classification,
            config.forecast_horizon,
        )?;
        records.extend(forecasts);

        Self::process_records(records)
    }

    /// Runs aggregation, ratio computation and assembly over merged bank records.
    pub fn process_records(records: Vec<FinancialPeriodRecord>) -> Result<OutputTables> {
        if let Some(group_row) = records.iter().find(|r| r.entity_id.is_group()) {
            return Err(BankRatioError::InvalidEntityId(format!(
                "{} is a group label; group rows are built by aggregation",
                group_row.entity_id
            )));
        }

        let (quarterly, yearly) = partition_by_kind(records);
        debug!(
            "Partitioned into {} quarterly and {} yearly bank records",
            quarterly.len(),
            yearly.len()
        );

        let quarterly = compute_partition(quarterly)?;
        let yearly = compute_partition(yearly)?;

        OutputTables::assemble(quarterly, yearly)
    }
}

/// Loads the CSV tables from `dir` and runs the pipeline.
pub fn process_directory(dir: impl AsRef<Path>, config: &PipelineConfig) -> Result<OutputTables> {
    let raw = RawStatements::load_dir(dir)?;
    BankRatioProcessor::process(&raw, config)
}

fn compute_partition(records: Vec<FinancialPeriodRecord>) -> Result<Vec<EntityTimeSeries>> {
    let group_rows: Vec<FinancialPeriodRecord> = EntityAggregator::new(&records)
        .aggregate_all()
        .into_iter()
        .flat_map(|(_, rows)| rows)
        .collect();

    let mut all = records;
    all.extend(group_rows);

    let mut series = EntityTimeSeries::group_by_entity(all)?;
    for entity_series in &mut series {
        RatioEngine::compute(entity_series);
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{quarter_end, year_end};

    fn record(
        ticker: &str,
        sector: BankType,
        year: i32,
        length: u8,
        items: &[(&str, f64)],
    ) -> FinancialPeriodRecord {
        let end_date = if length == 5 {
            year_end(year)
        } else {
            quarter_end(year, length)
        };
        FinancialPeriodRecord::new(
            EntityId::bank(ticker).unwrap(),
            year,
            PeriodLength::new(length).unwrap(),
            end_date,
        )
        .with_sector_type(Some(sector))
        .with_line_items(items.iter().map(|(c, v)| (*c, *v)).collect())
    }

    #[test]
    fn test_end_to_end_processing() {
        let records = vec![
            record("ACB", BankType::Private1, 2024, 1, &[("BS.13", 100.0), ("BS.56", 200.0)]),
            record("ACB", BankType::Private1, 2024, 2, &[("BS.13", 120.0), ("BS.56", 220.0)]),
            record("VCB", BankType::Socb, 2024, 1, &[("BS.13", 300.0), ("BS.56", 300.0)]),
            record("ACB", BankType::Private1, 2024, 5, &[("BS.13", 130.0), ("BS.56", 260.0)]),
        ];

        let tables = BankRatioProcessor::process_records(records).unwrap();

        // ACB x2, VCB, Sector x2, SOCB, Private_1 x2
        assert_eq!(tables.quarterly.len(), 8);
        // ACB, Sector, Private_1
        assert_eq!(tables.yearly.len(), 3);

        let sector = EntityId::Group(GroupLabel::Sector);
        let q1 = tables
            .find(&sector, PeriodKey::parse("1Q24").unwrap())
            .unwrap();
        assert_eq!(q1.line_items.get("BS.13"), Some(400.0));
        assert!((q1.ratio(RatioCode::Ca1).unwrap() - 400.0 / 500.0).abs() < 1e-12);

        // VCB has no 2Q24 row, so SOCB has none either.
        assert!(tables
            .find(&EntityId::Group(GroupLabel::Socb), PeriodKey::parse("2Q24").unwrap())
            .is_none());
    }

    #[test]
    fn test_group_rows_are_rejected_as_input() {
        let mut row = record("ACB", BankType::Private1, 2024, 1, &[]);
        row.entity_id = EntityId::Group(GroupLabel::Sector);
        assert!(matches!(
            BankRatioProcessor::process_records(vec![row]),
            Err(BankRatioError::InvalidEntityId(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_ingestion() {
        let config = PipelineConfig {
            forecast_horizon: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            BankRatioProcessor::process(&RawStatements::default(), &config),
            Err(BankRatioError::InvalidConfig(_))
        ));
    }
}
