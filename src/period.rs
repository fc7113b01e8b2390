//! Reporting periods and the quarterly/yearly dispatch.
//!
//! A record's `period_length` is 1-4 for a quarterly filing (the quarter
//! index within the year) and 5 for the full-year filing. Every ratio that
//! averages two balances reads its multiplier from [`PeriodKind`], so the
//! quarterly/yearly decision is made once per series.

use crate::error::{BankRatioError, Result};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PeriodLength(u8);

impl PeriodLength {
    pub const YEARLY: PeriodLength = PeriodLength(5);

    pub fn new(length: u8) -> Result<Self> {
        if !(1..=5).contains(&length) {
            return Err(BankRatioError::InvalidPeriodLength(length));
        }
        Ok(Self(length))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_yearly(self) -> bool {
        self.0 == 5
    }

    pub fn kind(self) -> PeriodKind {
        if self.is_yearly() {
            PeriodKind::Yearly
        } else {
            PeriodKind::Quarterly
        }
    }
}

impl TryFrom<u8> for PeriodLength {
    type Error = BankRatioError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PeriodLength> for u8 {
    fn from(value: PeriodLength) -> Self {
        value.0
    }
}

impl JsonSchema for PeriodLength {
    fn schema_name() -> String {
        "PeriodLength".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        u8::json_schema(gen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum PeriodKind {
    Quarterly,
    Yearly,
}

impl PeriodKind {
    /// Distance, in records of the same sorted series, between a period and
    /// the "prior" period used by every lagged ratio.
    pub const LAG: usize = 1;

    /// Index of the prior period of `index` in a sorted series, if any.
    pub fn prior_index(index: usize) -> Option<usize> {
        index.checked_sub(Self::LAG)
    }

    /// Multiplier applied to `flow / (balance_t + balance_t-1)`.
    ///
    /// Quarterly income lines are year-to-date figures, so the quarterly
    /// factor is 8 rather than 4; yearly rows only undo the two-balance
    /// average.
    pub fn annualization_multiplier(self) -> f64 {
        match self {
            PeriodKind::Quarterly => 8.0,
            PeriodKind::Yearly => 2.0,
        }
    }

    /// Decides the kind of a series from its period lengths.
    ///
    /// Returns `Ok(None)` for an empty series and an error when quarterly
    /// and yearly rows are mixed.
    pub fn detect<I>(entity: &str, lengths: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = PeriodLength>,
    {
        let mut detected = None;
        for length in lengths {
            let kind = length.kind();
            match detected {
                None => detected = Some(kind),
                Some(existing) if existing != kind => {
                    return Err(BankRatioError::MixedPeriodKinds {
                        entity: entity.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(detected)
    }
}

/// Display/sort label of a period: `"3Q21"` for quarters, `"2021"` for years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub length: PeriodLength,
}

impl PeriodKey {
    pub fn new(year: i32, length: PeriodLength) -> Self {
        Self { year, length }
    }

    pub fn is_yearly(&self) -> bool {
        self.length.is_yearly()
    }

    /// Parses `"{n}Q{yy}"` or `"{yyyy}"`. Two-digit years below 50 are read
    /// as 20xx, the rest as 19xx.
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        let invalid = || BankRatioError::InvalidPeriodLabel(label.to_string());

        if let Some((quarter, year)) = label.split_once('Q') {
            let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
            if !(1..=4).contains(&quarter) {
                return Err(invalid());
            }
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let year = match year {
                0..=49 => 2000 + year,
                50..=99 => 1900 + year,
                _ => year,
            };
            return Ok(Self::new(year, PeriodLength::new(quarter)?));
        }

        let year: i32 = label.parse().map_err(|_| invalid())?;
        Ok(Self::new(year, PeriodLength::YEARLY))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_yearly() {
            write!(f, "{}", self.year)
        } else {
            write!(
                f,
                "{}Q{:02}",
                self.length.get(),
                self.year.rem_euclid(100)
            )
        }
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.length).cmp(&(other.year, other.length))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_length_bounds() {
        assert!(PeriodLength::new(0).is_err());
        assert!(PeriodLength::new(6).is_err());
        assert!(PeriodLength::new(4).unwrap().kind() == PeriodKind::Quarterly);
        assert!(PeriodLength::new(5).unwrap().is_yearly());
    }

    #[test]
    fn test_multipliers_are_distinct() {
        assert_eq!(PeriodKind::Quarterly.annualization_multiplier(), 8.0);
        assert_eq!(PeriodKind::Yearly.annualization_multiplier(), 2.0);
    }

    #[test]
    fn test_detect_kind() {
        let quarters = [1, 2, 3].map(|l| PeriodLength::new(l).unwrap());
        assert_eq!(
            PeriodKind::detect("ACB", quarters).unwrap(),
            Some(PeriodKind::Quarterly)
        );
        assert_eq!(PeriodKind::detect("ACB", std::iter::empty()).unwrap(), None);

        let mixed = [PeriodLength::new(4).unwrap(), PeriodLength::YEARLY];
        assert!(matches!(
            PeriodKind::detect("ACB", mixed),
            Err(BankRatioError::MixedPeriodKinds { .. })
        ));
    }

    #[test]
    fn test_period_key_labels() {
        let q = PeriodKey::new(2024, PeriodLength::new(1).unwrap());
        assert_eq!(q.to_string(), "1Q24");
        let y = PeriodKey::new(2024, PeriodLength::YEARLY);
        assert_eq!(y.to_string(), "2024");
        let early = PeriodKey::new(2005, PeriodLength::new(3).unwrap());
        assert_eq!(early.to_string(), "3Q05");

        assert_eq!(PeriodKey::parse("1Q24").unwrap(), q);
        assert_eq!(PeriodKey::parse("2024").unwrap(), y);
        assert_eq!(PeriodKey::parse("3Q05").unwrap(), early);
        assert!(PeriodKey::parse("5Q24").is_err());
        assert!(PeriodKey::parse("Q").is_err());
    }

    #[test]
    fn test_period_key_ordering() {
        let mut keys: Vec<PeriodKey> = ["2Q24", "4Q23", "1Q24", "3Q23"]
            .iter()
            .map(|l| PeriodKey::parse(l).unwrap())
            .collect();
        keys.sort();
        let labels: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, vec!["3Q23", "4Q23", "1Q24", "2Q24"]);
    }
}
