//! Derived ratio computation (`CA.1` .. `CA.25`).
//!
//! Ratios are evaluated per entity, in code order, over a series sorted by
//! end date. Later ratios read earlier ratios of the same period, and the
//! lagged ratios read the immediately preceding record of the same series.
//! A ratio that cannot be computed is stored as [`RatioValue::Null`] with
//! the reason; the engine never fails on missing data.

use crate::period::PeriodKind;
use crate::schema::{EntityTimeSeries, FinancialPeriodRecord};
use log::debug;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum RatioCode {
    #[serde(rename = "CA.1")]
    Ca1,
    #[serde(rename = "CA.2")]
    Ca2,
    #[serde(rename = "CA.3")]
    Ca3,
    #[serde(rename = "CA.4")]
    Ca4,
    #[serde(rename = "CA.5")]
    Ca5,
    #[serde(rename = "CA.6")]
    Ca6,
    #[serde(rename = "CA.7")]
    Ca7,
    #[serde(rename = "CA.8")]
    Ca8,
    #[serde(rename = "CA.9")]
    Ca9,
    #[serde(rename = "CA.10")]
    Ca10,
    #[serde(rename = "CA.11")]
    Ca11,
    #[serde(rename = "CA.12")]
    Ca12,
    #[serde(rename = "CA.13")]
    Ca13,
    #[serde(rename = "CA.14")]
    Ca14,
    #[serde(rename = "CA.15")]
    Ca15,
    #[serde(rename = "CA.16")]
    Ca16,
    #[serde(rename = "CA.17")]
    Ca17,
    #[serde(rename = "CA.18")]
    Ca18,
    #[serde(rename = "CA.19")]
    Ca19,
    #[serde(rename = "CA.20")]
    Ca20,
    #[serde(rename = "CA.21")]
    Ca21,
    #[serde(rename = "CA.22")]
    Ca22,
    #[serde(rename = "CA.23")]
    Ca23,
    #[serde(rename = "CA.24")]
    Ca24,
    #[serde(rename = "CA.25")]
    Ca25,
}

impl RatioCode {
    /// Evaluation order.
    pub const ALL: [RatioCode; 25] = [
        RatioCode::Ca1,
        RatioCode::Ca2,
        RatioCode::Ca3,
        RatioCode::Ca4,
        RatioCode::Ca5,
        RatioCode::Ca6,
        RatioCode::Ca7,
        RatioCode::Ca8,
        RatioCode::Ca9,
        RatioCode::Ca10,
        RatioCode::Ca11,
        RatioCode::Ca12,
        RatioCode::Ca13,
        RatioCode::Ca14,
        RatioCode::Ca15,
        RatioCode::Ca16,
        RatioCode::Ca17,
        RatioCode::Ca18,
        RatioCode::Ca19,
        RatioCode::Ca20,
        RatioCode::Ca21,
        RatioCode::Ca22,
        RatioCode::Ca23,
        RatioCode::Ca24,
        RatioCode::Ca25,
    ];

    /// Ratios that read the prior period and are null on an entity's first row.
    pub const LAGGED: [RatioCode; 10] = [
        RatioCode::Ca13,
        RatioCode::Ca15,
        RatioCode::Ca16,
        RatioCode::Ca17,
        RatioCode::Ca19,
        RatioCode::Ca20,
        RatioCode::Ca22,
        RatioCode::Ca23,
        RatioCode::Ca24,
        RatioCode::Ca25,
    ];

    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn code(self) -> String {
        format!("CA.{}", self.number())
    }

    pub fn parse(code: &str) -> Option<Self> {
        let number: usize = code.trim().strip_prefix("CA.")?.parse().ok()?;
        Self::ALL.get(number.checked_sub(1)?).copied()
    }

    pub fn is_lagged(self) -> bool {
        Self::LAGGED.contains(&self)
    }

    pub fn description(self) -> &'static str {
        match self {
            RatioCode::Ca1 => "LDR",
            RatioCode::Ca2 => "CASA",
            RatioCode::Ca3 => "NPL ratio",
            RatioCode::Ca4 => "Absolute NPL",
            RatioCode::Ca5 => "Group 2 ratio",
            RatioCode::Ca6 => "CIR",
            RatioCode::Ca7 => "NPL coverage",
            RatioCode::Ca8 => "Credit size",
            RatioCode::Ca9 => "Provision / loan",
            RatioCode::Ca10 => "Leverage",
            RatioCode::Ca11 => "Interest earning assets",
            RatioCode::Ca12 => "Interest bearing liabilities",
            RatioCode::Ca13 => "NIM",
            RatioCode::Ca14 => "Customer loan",
            RatioCode::Ca15 => "Loan yield",
            RatioCode::Ca16 => "ROAA",
            RatioCode::Ca17 => "ROAE",
            RatioCode::Ca18 => "Deposit balance",
            RatioCode::Ca19 => "Deposit yield",
            RatioCode::Ca20 => "Fees / assets",
            RatioCode::Ca21 => "Retail loan share",
            RatioCode::Ca22 => "NPL formation",
            RatioCode::Ca23 => "NPL formation (%)",
            RatioCode::Ca24 => "Group 2 formation",
            RatioCode::Ca25 => "Group 2 formation (%)",
        }
    }
}

impl fmt::Display for RatioCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CA.{}", self.number())
    }
}

/// Why a ratio is null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "reason", content = "code", rename_all = "snake_case")]
pub enum NullReason {
    /// A line item (or earlier ratio) the formula needs is null.
    MissingInput(String),
    /// The entity has no record before this one.
    NoPriorPeriod,
    ZeroDenominator,
}

impl fmt::Display for NullReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullReason::MissingInput(code) => write!(f, "missing input {}", code),
            NullReason::NoPriorPeriod => f.write_str("no prior period"),
            NullReason::ZeroDenominator => f.write_str("zero denominator"),
        }
    }
}

/// Serializes as a nullable number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "Option<f64>")]
pub enum RatioValue {
    Value(f64),
    Null(NullReason),
}

impl RatioValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            RatioValue::Value(v) => Some(*v),
            RatioValue::Null(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&NullReason> {
        match self {
            RatioValue::Value(_) => None,
            RatioValue::Null(reason) => Some(reason),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RatioValue::Null(_))
    }
}

impl From<Computed> for RatioValue {
    fn from(value: Computed) -> Self {
        match value {
            Ok(v) => RatioValue::Value(v),
            Err(reason) => RatioValue::Null(reason),
        }
    }
}

impl From<RatioValue> for Option<f64> {
    fn from(value: RatioValue) -> Self {
        value.value()
    }
}

impl JsonSchema for RatioValue {
    fn schema_name() -> String {
        "RatioValue".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <Option<f64>>::json_schema(gen)
    }
}

type Computed = std::result::Result<f64, NullReason>;

pub struct RatioEngine {
    multiplier: f64,
}

// Ratios of one period as they are filled in, in evaluation order.
struct PeriodRatios {
    values: BTreeMap<RatioCode, Computed>,
}

impl PeriodRatios {
    fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    fn set(&mut self, code: RatioCode, value: Computed) {
        self.values.insert(code, value);
    }

    fn get(&self, code: RatioCode) -> Computed {
        self.values
            .get(&code)
            .cloned()
            .unwrap_or_else(|| Err(NullReason::MissingInput(code.code())))
    }

    fn into_values(self) -> BTreeMap<RatioCode, RatioValue> {
        self.values
            .into_iter()
            .map(|(code, value)| (code, RatioValue::from(value)))
            .collect()
    }
}

impl RatioEngine {
    pub fn new(kind: PeriodKind) -> Self {
        Self {
            multiplier: kind.annualization_multiplier(),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Fills `derived_ratios` on every record of `series`.
    pub fn compute(series: &mut EntityTimeSeries) {
        let engine = Self::new(series.kind());
        let entity = series.entity_id().to_string();
        let records = series.records_mut();

        let mut null_count = 0;
        for index in 0..records.len() {
            let (before, rest) = records.split_at_mut(index);
            let previous = PeriodKind::prior_index(index).and_then(|i| before.get(i));
            let ratios = engine.derive_period(&rest[0], previous);
            null_count += ratios.values().filter(|v| v.is_null()).count();
            rest[0].derived_ratios = ratios;
        }

        debug!(
            "Computed ratios for {} over {} periods ({} null values)",
            entity,
            records.len(),
            null_count
        );
    }

    /// Ratios of `current`, given the preceding record of the same entity.
    ///
    /// `previous` must already carry its own derived ratios.
    pub fn derive_period(
        &self,
        current: &FinancialPeriodRecord,
        previous: Option<&FinancialPeriodRecord>,
    ) -> BTreeMap<RatioCode, RatioValue> {
        let item = |code: &str| line_item(current, code);
        let prior_item = |code: &str| match previous {
            Some(prev) => line_item(prev, code),
            None => Err(NullReason::NoPriorPeriod),
        };
        let prior_ratio = |code: RatioCode| match previous {
            Some(prev) => match prev.derived_ratios.get(&code) {
                Some(RatioValue::Value(v)) => Ok(*v),
                Some(RatioValue::Null(reason)) => Err(reason.clone()),
                None => Err(NullReason::MissingInput(code.code())),
            },
            None => Err(NullReason::NoPriorPeriod),
        };

        let mut r = PeriodRatios::new();

        r.set(RatioCode::Ca1, divide(item("BS.13"), item("BS.56")));
        r.set(
            RatioCode::Ca2,
            divide(sum(current, &["Nt.121", "Nt.124", "Nt.125"]), item("BS.56")),
        );

        let npl = sum(current, &["Nt.68", "Nt.69", "Nt.70"]);
        r.set(RatioCode::Ca3, divide(npl.clone(), item("Nt.65")));
        r.set(RatioCode::Ca4, npl.clone());
        r.set(RatioCode::Ca5, divide(item("Nt.67"), item("Nt.65")));
        r.set(RatioCode::Ca6, divide(negate(item("IS.15")), item("IS.14")));
        r.set(RatioCode::Ca7, divide(negate(item("BS.14")), npl));
        r.set(
            RatioCode::Ca8,
            sum(current, &["BS.13", "BS.16", "Nt.97", "Nt.112"]),
        );
        r.set(RatioCode::Ca9, divide(negate(item("BS.14")), item("BS.13")));
        r.set(RatioCode::Ca10, divide(item("BS.1"), item("BS.65")));
        r.set(
            RatioCode::Ca11,
            sum(
                current,
                &[
                    "BS.3", "BS.5", "BS.6", "BS.9", "BS.13", "BS.16", "BS.19", "BS.20",
                ],
            ),
        );
        r.set(
            RatioCode::Ca12,
            sum(current, &["BS.52", "BS.53", "BS.56", "BS.58", "BS.59"]),
        );
        r.set(
            RatioCode::Ca13,
            self.average_balance_ratio(
                item("IS.3"),
                r.get(RatioCode::Ca11),
                prior_ratio(RatioCode::Ca11),
            ),
        );

        // A forecast may supply customer loans directly.
        let customer_loan = match current.line_items.get("CA.14") {
            Some(v) => Ok(v),
            None => sum(current, &["BS.13", "BS.16"]),
        };
        r.set(RatioCode::Ca14, customer_loan);
        r.set(
            RatioCode::Ca15,
            self.average_balance_ratio(
                item("Nt.143"),
                r.get(RatioCode::Ca14),
                prior_ratio(RatioCode::Ca14),
            ),
        );
        r.set(
            RatioCode::Ca16,
            self.average_balance_ratio(item("IS.22"), item("BS.1"), prior_item("BS.1")),
        );
        r.set(
            RatioCode::Ca17,
            self.average_balance_ratio(item("IS.24"), item("BS.65"), prior_item("BS.65")),
        );
        r.set(RatioCode::Ca18, sum(current, &["BS.3", "BS.5", "BS.6"]));
        r.set(
            RatioCode::Ca19,
            self.average_balance_ratio(
                item("Nt.144"),
                r.get(RatioCode::Ca18),
                prior_ratio(RatioCode::Ca18),
            ),
        );
        r.set(
            RatioCode::Ca20,
            self.average_balance_ratio(item("IS.6"), item("BS.1"), prior_item("BS.1")),
        );
        r.set(RatioCode::Ca21, divide(item("Nt.89"), item("BS.12")));

        // Write-offs leave the NPL book before the period-on-period change.
        let npl_formation = subtract(
            subtract(r.get(RatioCode::Ca4), item("Nt.220")),
            prior_ratio(RatioCode::Ca4),
        );
        r.set(RatioCode::Ca22, npl_formation);
        r.set(
            RatioCode::Ca23,
            divide(r.get(RatioCode::Ca22), prior_item("BS.13")),
        );
        r.set(
            RatioCode::Ca24,
            subtract(
                add(item("Nt.67"), r.get(RatioCode::Ca22)),
                prior_item("Nt.67"),
            ),
        );
        r.set(
            RatioCode::Ca25,
            divide(r.get(RatioCode::Ca24), prior_item("BS.13")),
        );

        r.into_values()
    }

    /// `flow / (balance_t + balance_t-1) * multiplier`, shared by NIM, loan
    /// yield, ROAA, ROAE, deposit yield and fees/assets.
    fn average_balance_ratio(&self, flow: Computed, current: Computed, prior: Computed) -> Computed {
        divide(flow, add(current, prior)).map(|ratio| ratio * self.multiplier)
    }
}

fn line_item(record: &FinancialPeriodRecord, code: &str) -> Computed {
    record
        .line_items
        .get(code)
        .ok_or_else(|| NullReason::MissingInput(code.to_string()))
}

fn sum(record: &FinancialPeriodRecord, codes: &[&str]) -> Computed {
    codes
        .iter()
        .try_fold(0.0, |acc, code| Ok(acc + line_item(record, code)?))
}

fn add(a: Computed, b: Computed) -> Computed {
    Ok(a? + b?)
}

fn subtract(a: Computed, b: Computed) -> Computed {
    Ok(a? - b?)
}

fn negate(a: Computed) -> Computed {
    a.map(|v| -v)
}

fn divide(numerator: Computed, denominator: Computed) -> Computed {
    let numerator = numerator?;
    let denominator = denominator?;
    if denominator == 0.0 {
        return Err(NullReason::ZeroDenominator);
    }
    Ok(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodLength;
    use crate::schema::{EntityId, LineItems};
    use crate::utils::last_day_of_month;

    fn record(year: i32, length: u8, items: &[(&str, f64)]) -> FinancialPeriodRecord {
        let month = if length == 5 { 12 } else { u32::from(length) * 3 };
        FinancialPeriodRecord::new(
            EntityId::parse("ACB").unwrap(),
            year,
            PeriodLength::new(length).unwrap(),
            last_day_of_month(year, month),
        )
        .with_line_items(items.iter().map(|(c, v)| (*c, *v)).collect::<LineItems>())
    }

    fn computed(records: Vec<FinancialPeriodRecord>) -> EntityTimeSeries {
        let mut series = EntityTimeSeries::new(EntityId::parse("ACB").unwrap(), records).unwrap();
        RatioEngine::compute(&mut series);
        series
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("ratio should be present");
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    const IEA: [&str; 8] = [
        "BS.3", "BS.5", "BS.6", "BS.9", "BS.13", "BS.16", "BS.19", "BS.20",
    ];

    fn iea_items(total: f64) -> Vec<(&'static str, f64)> {
        // Whole balance in BS.13 keeps the arithmetic obvious.
        IEA.iter()
            .map(|code| (*code, if *code == "BS.13" { total } else { 0.0 }))
            .collect()
    }

    #[test]
    fn test_ratio_code_round_trip() {
        for code in RatioCode::ALL {
            assert_eq!(RatioCode::parse(&code.code()), Some(code));
        }
        assert_eq!(RatioCode::Ca13.to_string(), "CA.13");
        assert_eq!(RatioCode::parse("CA.26"), None);
        assert_eq!(RatioCode::parse("CA.0"), None);
    }

    #[test]
    fn test_straight_ratios() {
        let series = computed(vec![record(
            2024,
            1,
            &[
                ("BS.13", 800.0),
                ("BS.56", 1000.0),
                ("Nt.121", 100.0),
                ("Nt.124", 50.0),
                ("Nt.125", 50.0),
                ("Nt.65", 820.0),
                ("Nt.67", 41.0),
                ("Nt.68", 4.0),
                ("Nt.69", 3.0),
                ("Nt.70", 9.0),
                ("IS.14", 200.0),
                ("IS.15", -70.0),
                ("BS.14", -20.0),
                ("BS.1", 1500.0),
                ("BS.65", 120.0),
                ("Nt.89", 300.0),
                ("BS.12", 820.0),
            ],
        )]);
        let r = &series.records()[0];

        approx(r.ratio(RatioCode::Ca1), 0.8);
        approx(r.ratio(RatioCode::Ca2), 0.2);
        approx(r.ratio(RatioCode::Ca3), 16.0 / 820.0);
        approx(r.ratio(RatioCode::Ca4), 16.0);
        approx(r.ratio(RatioCode::Ca5), 0.05);
        approx(r.ratio(RatioCode::Ca6), 0.35);
        approx(r.ratio(RatioCode::Ca7), 1.25);
        approx(r.ratio(RatioCode::Ca9), 0.025);
        approx(r.ratio(RatioCode::Ca10), 12.5);
        approx(r.ratio(RatioCode::Ca21), 300.0 / 820.0);
        // BS.16, Nt.97 and Nt.112 are absent
        assert_eq!(
            r.derived_ratios[&RatioCode::Ca8].reason(),
            Some(&NullReason::MissingInput("BS.16".to_string()))
        );
    }

    #[test]
    fn test_first_period_lagged_ratios_are_null() {
        let series = computed(vec![record(2024, 1, &iea_items(1000.0))]);
        let first = &series.records()[0];

        for code in RatioCode::ALL.into_iter().filter(|c| c.is_lagged()) {
            assert!(
                first.derived_ratios[&code].is_null(),
                "{} should be null on the first period",
                code
            );
        }
        assert_eq!(
            first.derived_ratios[&RatioCode::Ca16].reason(),
            Some(&NullReason::MissingInput("IS.22".to_string()))
        );
        approx(first.ratio(RatioCode::Ca11), 1000.0);
    }

    #[test]
    fn test_prior_period_is_the_series_lag() {
        let series = computed(vec![
            record(2024, 1, &[("BS.1", 900.0)]),
            record(2024, 2, &[("BS.1", 1000.0), ("IS.22", 20.0)]),
            record(2024, 3, &[("BS.1", 1100.0), ("IS.22", 22.0)]),
        ]);
        let engine = RatioEngine::new(series.kind());

        for (index, record) in series.records().iter().enumerate() {
            let expected = engine.derive_period(record, series.previous(index));
            assert_eq!(record.derived_ratios, expected, "period {}", record.period_key());
        }
        assert_eq!(PeriodKind::prior_index(0), None);
        assert_eq!(PeriodKind::prior_index(2), Some(2 - PeriodKind::LAG));
        approx(series.records()[2].ratio(RatioCode::Ca16), 22.0 / 2100.0 * 8.0);
    }

    #[test]
    fn test_quarterly_nim_uses_multiplier_eight() {
        let mut q2 = iea_items(1000.0);
        q2.push(("IS.3", 100.0));
        let series = computed(vec![record(2024, 1, &iea_items(900.0)), record(2024, 2, &q2)]);

        approx(series.records()[1].ratio(RatioCode::Ca13), 100.0 / 1900.0 * 8.0);
        assert_eq!(
            series.records()[0].derived_ratios[&RatioCode::Ca13].reason(),
            Some(&NullReason::MissingInput("IS.3".to_string()))
        );
    }

    #[test]
    fn test_yearly_nim_uses_multiplier_two() {
        let mut y2 = iea_items(1000.0);
        y2.push(("IS.3", 400.0));
        let series = computed(vec![record(2023, 5, &iea_items(900.0)), record(2024, 5, &y2)]);

        assert_eq!(series.kind(), PeriodKind::Yearly);
        approx(series.records()[1].ratio(RatioCode::Ca13), 400.0 / 1900.0 * 2.0);
    }

    #[test]
    fn test_zero_denominator_is_null() {
        let series = computed(vec![record(
            2024,
            1,
            &[("Nt.65", 0.0), ("Nt.67", 5.0), ("Nt.68", 1.0), ("Nt.69", 1.0), ("Nt.70", 1.0)],
        )]);
        let r = &series.records()[0];

        assert_eq!(
            r.derived_ratios[&RatioCode::Ca3].reason(),
            Some(&NullReason::ZeroDenominator)
        );
        assert_eq!(r.ratio(RatioCode::Ca3), None);
        assert_eq!(r.ratio(RatioCode::Ca5), None);
    }

    #[test]
    fn test_average_balance_with_zero_sum_is_null() {
        let series = computed(vec![
            record(2024, 1, &[("BS.1", 100.0)]),
            record(2024, 2, &[("BS.1", -100.0), ("IS.22", 5.0)]),
        ]);
        assert_eq!(
            series.records()[1].derived_ratios[&RatioCode::Ca16].reason(),
            Some(&NullReason::ZeroDenominator)
        );
    }

    #[test]
    fn test_formation_identity() {
        let npl = |a: f64, b: f64, c: f64| vec![("Nt.68", a), ("Nt.69", b), ("Nt.70", c)];
        let mut p1 = npl(10.0, 5.0, 5.0);
        p1.extend([("Nt.67", 30.0), ("BS.13", 1000.0), ("Nt.220", 0.0)]);
        let mut p2 = npl(12.0, 6.0, 7.0);
        p2.extend([("Nt.67", 28.0), ("BS.13", 1100.0), ("Nt.220", 3.0)]);

        let series = computed(vec![record(2024, 1, &p1), record(2024, 2, &p2)]);
        let (prev, cur) = (&series.records()[0], &series.records()[1]);

        let ca22 = cur.ratio(RatioCode::Ca22).unwrap();
        approx(Some(ca22), (25.0 - 3.0) - 20.0);
        approx(
            cur.ratio(RatioCode::Ca4),
            ca22 + prev.ratio(RatioCode::Ca4).unwrap() + 3.0,
        );
        approx(cur.ratio(RatioCode::Ca23), 2.0 / 1000.0);
        approx(cur.ratio(RatioCode::Ca24), (28.0 + 2.0) - 30.0);
        approx(cur.ratio(RatioCode::Ca25), 0.0);
    }

    #[test]
    fn test_missing_write_off_nulls_formation() {
        let npl = [("Nt.68", 1.0), ("Nt.69", 1.0), ("Nt.70", 1.0)];
        let series = computed(vec![record(2024, 1, &npl), record(2024, 2, &npl)]);
        assert_eq!(
            series.records()[1].derived_ratios[&RatioCode::Ca22].reason(),
            Some(&NullReason::MissingInput("Nt.220".to_string()))
        );
    }

    #[test]
    fn test_customer_loan_override() {
        let series = computed(vec![
            record(2024, 5, &[("BS.13", 90.0), ("BS.16", 10.0)]),
            record(2025, 5, &[("CA.14", 150.0), ("BS.16", 10.0), ("Nt.143", 25.0)]),
        ]);
        approx(series.records()[1].ratio(RatioCode::Ca14), 150.0);
        approx(series.records()[1].ratio(RatioCode::Ca15), 25.0 / 250.0 * 2.0);
    }

    #[test]
    fn test_serializes_as_nullable_number() {
        let value = RatioValue::Value(0.5);
        let null = RatioValue::Null(NullReason::ZeroDenominator);
        assert_eq!(serde_json::to_string(&value).unwrap(), "0.5");
        assert_eq!(serde_json::to_string(&null).unwrap(), "null");
    }
}
