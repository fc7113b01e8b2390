//! Forecast years.
//!
//! Analysts supply forecast entries per bank and year, either as a direct
//! value for a statement code (`BS.13 = 1.2e15`) or as the value of a
//! composite formula (`BS.13+BS.16 = 1.5e15`). The entries are solved into
//! statement line items and turned into yearly records that flow through
//! aggregation and the ratio engine like reported years.

use crate::error::{BankRatioError, Result};
use crate::ingestion::{BankClassification, WRITE_OFF_CODE};
use crate::period::PeriodLength;
use crate::schema::{EntityId, FinancialPeriodRecord, LineItems, RecordOrigin};
use crate::utils::{is_statement_code, year_end};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_SOLVE_PASSES: usize = 20;

/// Customer loans; also read by the ratio engine as an override of `BS.13 + BS.16`.
pub const CUSTOMER_LOAN_CODE: &str = "CA.14";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub ticker: String,
    pub year: i32,
    pub key_code: String,
    #[serde(default)]
    pub formula: Option<String>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// A single code assigned directly.
    Direct(String),
    Sum(Vec<String>),
    Difference(String, String),
    Product(String, String),
    Quotient(String, String),
}

impl Formula {
    /// Parses one operator kind per formula; `None` for anything else.
    pub fn parse(formula: &str) -> Option<Self> {
        let formula = formula.trim();
        if formula.is_empty() {
            return None;
        }

        let operands = |sep: char| -> Vec<String> {
            formula.split(sep).map(|p| p.trim().to_string()).collect()
        };
        let pair = |sep: char| -> Option<(String, String)> {
            let parts = operands(sep);
            match parts.as_slice() {
                [a, b] => Some((a.clone(), b.clone())),
                _ => None,
            }
        };

        if formula.contains('+') {
            Some(Formula::Sum(operands('+')))
        } else if formula.matches('-').count() == 1 && !formula.starts_with('-') {
            pair('-').map(|(a, b)| Formula::Difference(a, b))
        } else if formula.contains('*') {
            pair('*').map(|(a, b)| Formula::Product(a, b))
        } else if formula.contains('/') {
            pair('/').map(|(a, b)| Formula::Quotient(a, b))
        } else {
            Some(Formula::Direct(formula.to_string()))
        }
    }
}

#[derive(Debug, Clone)]
struct Equation {
    formula: Formula,
    value: f64,
}

/// Direct assignments plus composite equations for one bank and year.
#[derive(Debug, Clone, Default)]
pub struct EquationSystem {
    assignments: BTreeMap<String, f64>,
    equations: BTreeMap<String, Equation>,
}

impl EquationSystem {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ForecastEntry>) -> Self {
        let mut system = Self::default();
        for entry in entries {
            let Some(formula) = entry.formula.as_deref().and_then(Formula::parse) else {
                continue;
            };
            match formula {
                Formula::Direct(code) => {
                    system.assignments.insert(code, entry.value);
                }
                composite => {
                    system.equations.insert(
                        entry.key_code.clone(),
                        Equation {
                            formula: composite,
                            value: entry.value,
                        },
                    );
                }
            }
        }
        system
    }

    /// Value of the composite equation registered under `key_code`.
    pub fn composite_value(&self, key_code: &str) -> Option<f64> {
        self.equations.get(key_code).map(|e| e.value)
    }

    /// Repeatedly solves equations with exactly one unknown operand.
    /// Known values are never overwritten.
    pub fn solve(&self) -> BTreeMap<String, f64> {
        let mut solved = self.assignments.clone();

        for pass in 0..MAX_SOLVE_PASSES {
            let mut changed = false;
            for (key_code, equation) in &self.equations {
                if let Some((code, value)) = solve_one(&equation.formula, equation.value, &solved) {
                    debug!(
                        "Solved {} = {:.2e} from {} (pass {})",
                        code,
                        value,
                        key_code,
                        pass + 1
                    );
                    solved.insert(code, value);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        solved
    }
}

fn solve_one(
    formula: &Formula,
    target: f64,
    solved: &BTreeMap<String, f64>,
) -> Option<(String, f64)> {
    let known = |code: &String| solved.get(code).copied();

    match formula {
        Formula::Direct(_) => None,
        Formula::Sum(operands) => {
            let unknown: Vec<&String> = operands.iter().filter(|c| known(*c).is_none()).collect();
            let [missing] = unknown.as_slice() else {
                return None;
            };
            let known_sum: f64 = operands.iter().filter_map(known).sum();
            Some(((*missing).clone(), target - known_sum))
        }
        Formula::Difference(a, b) => match (known(a), known(b)) {
            (Some(a_val), None) => Some((b.clone(), a_val - target)),
            (None, Some(b_val)) => Some((a.clone(), target + b_val)),
            _ => None,
        },
        Formula::Product(a, b) => match (known(a), known(b)) {
            (Some(a_val), None) if a_val != 0.0 => Some((b.clone(), target / a_val)),
            (None, Some(b_val)) if b_val != 0.0 => Some((a.clone(), target / b_val)),
            _ => None,
        },
        Formula::Quotient(a, b) => match (known(a), known(b)) {
            (None, Some(b_val)) if b_val != 0.0 => Some((a.clone(), target * b_val)),
            (Some(a_val), None) if target != 0.0 => Some((b.clone(), a_val / target)),
            _ => None,
        },
    }
}

/// Builds forecast records for the years after the latest reported full
/// year, up to `horizon` years ahead.
///
/// `history` is every merged bank record; only its yearly rows are read.
pub fn build_forecast_records(
    entries: &[ForecastEntry],
    history: &[FinancialPeriodRecord],
    classification: &BankClassification,
    horizon: u32,
) -> Result<Vec<FinancialPeriodRecord>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let Some(latest_year) = history
        .iter()
        .filter(|r| r.period_length.is_yearly() && r.origin == RecordOrigin::Reported)
        .map(|r| r.year)
        .max()
    else {
        warn!("Ignoring {} forecast entries: no reported full year", entries.len());
        return Ok(Vec::new());
    };

    let last_year = i32::try_from(horizon)
        .ok()
        .and_then(|h| latest_year.checked_add(h))
        .ok_or_else(|| {
            BankRatioError::InvalidConfig(format!(
                "forecast horizon {} from {} is out of range",
                horizon, latest_year
            ))
        })?;
    let forecast_years = (latest_year + 1)..=last_year;

    let mut by_year: BTreeMap<i32, BTreeMap<String, Vec<&ForecastEntry>>> = BTreeMap::new();
    let mut ignored = 0usize;
    for entry in entries {
        if forecast_years.contains(&entry.year) {
            by_year
                .entry(entry.year)
                .or_default()
                .entry(entry.ticker.trim().to_string())
                .or_default()
                .push(entry);
        } else {
            ignored += 1;
        }
    }
    if ignored > 0 {
        warn!(
            "Ignored {} forecast entries outside {}..={}",
            ignored,
            forecast_years.start(),
            forecast_years.end()
        );
    }

    // Provision balance of each bank's previous year, for forecast write-offs.
    let mut prior_provision: BTreeMap<String, Option<f64>> = BTreeMap::new();
    let mut yearly_history: Vec<&FinancialPeriodRecord> = history
        .iter()
        .filter(|r| r.period_length.is_yearly())
        .collect();
    yearly_history.sort_by_key(|r| r.end_date);
    for record in yearly_history {
        prior_provision.insert(
            record.entity_id.label().to_string(),
            record.line_items.get("BS.14"),
        );
    }

    let mut records = Vec::new();
    for (year, tickers) in by_year {
        for (ticker, ticker_entries) in tickers {
            let system = EquationSystem::from_entries(ticker_entries.iter().copied());
            let mut line_items = forecast_line_items(&system);

            // Nt.220 = -(BS.14 - BS.14[t-1] - IS.17)
            let previous = prior_provision.get(&ticker).copied().flatten();
            if let (Some(provision), Some(previous), Some(charge)) =
                (line_items.get("BS.14"), previous, line_items.get("IS.17"))
            {
                line_items.insert(WRITE_OFF_CODE, -(provision - previous - charge));
            }
            prior_provision.insert(ticker.clone(), line_items.get("BS.14"));

            records.push(
                FinancialPeriodRecord::new(
                    EntityId::bank(&ticker)?,
                    year,
                    PeriodLength::YEARLY,
                    year_end(year),
                )
                .with_sector_type(classification.get(&ticker))
                .with_origin(RecordOrigin::Forecast)
                .with_line_items(line_items),
            );
        }
    }

    info!("Built {} forecast records", records.len());
    Ok(records)
}

fn forecast_line_items(system: &EquationSystem) -> LineItems {
    let solved = system.solve();
    let mut items: LineItems = solved
        .iter()
        .filter(|(code, _)| is_statement_code(code))
        .map(|(code, value)| (code.as_str(), *value))
        .collect();

    let customer_loan = system
        .composite_value(CUSTOMER_LOAN_CODE)
        .or_else(|| solved.get(CUSTOMER_LOAN_CODE).copied());
    if let Some(customer_loan) = customer_loan {
        items.insert(CUSTOMER_LOAN_CODE, customer_loan);
        match (items.get("BS.13"), items.get("BS.16")) {
            (None, Some(other)) => items.insert("BS.13", customer_loan - other),
            (Some(loans), None) => items.insert("BS.16", customer_loan - loans),
            _ => {}
        }
    }

    items
}
