use crate::error::{BankRatioError, Result};
use crate::period::{PeriodKey, PeriodKind, PeriodLength};
use crate::ratios::{NullReason, RatioCode, RatioValue};
use chrono::NaiveDate;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Sub-sector classification attached to an individual bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum BankType {
    #[serde(rename = "SOCB")]
    #[schemars(description = "State-owned commercial bank")]
    Socb,
    #[serde(rename = "Private_1")]
    Private1,
    #[serde(rename = "Private_2")]
    Private2,
    #[serde(rename = "Private_3")]
    Private3,
}

impl BankType {
    pub const ALL: [BankType; 4] = [
        BankType::Socb,
        BankType::Private1,
        BankType::Private2,
        BankType::Private3,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BankType::Socb => "SOCB",
            BankType::Private1 => "Private_1",
            BankType::Private2 => "Private_2",
            BankType::Private3 => "Private_3",
        }
    }

    /// Labels outside the four sub-sectors are unclassified.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label.trim())
    }
}

/// The five aggregate entities built by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum GroupLabel {
    /// Every individual bank, regardless of sub-sector.
    Sector,
    #[serde(rename = "SOCB")]
    Socb,
    #[serde(rename = "Private_1")]
    Private1,
    #[serde(rename = "Private_2")]
    Private2,
    #[serde(rename = "Private_3")]
    Private3,
}

impl GroupLabel {
    pub const ALL: [GroupLabel; 5] = [
        GroupLabel::Sector,
        GroupLabel::Socb,
        GroupLabel::Private1,
        GroupLabel::Private2,
        GroupLabel::Private3,
    ];

    pub fn label(self) -> &'static str {
        match self.bank_type() {
            None => "Sector",
            Some(bank_type) => bank_type.label(),
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.label() == label.trim())
    }

    /// The sub-sector a group is restricted to; `None` for the whole market.
    pub fn bank_type(self) -> Option<BankType> {
        match self {
            GroupLabel::Sector => None,
            GroupLabel::Socb => Some(BankType::Socb),
            GroupLabel::Private1 => Some(BankType::Private1),
            GroupLabel::Private2 => Some(BankType::Private2),
            GroupLabel::Private3 => Some(BankType::Private3),
        }
    }

    pub fn includes(self, sector_type: Option<BankType>) -> bool {
        match self.bank_type() {
            None => true,
            Some(required) => sector_type == Some(required),
        }
    }
}

/// Either an individual bank (3-character ticker) or an aggregate group.
///
/// Resolved once at ingestion; everything downstream matches on the variant
/// instead of inspecting the label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EntityId {
    Bank(String),
    Group(GroupLabel),
}

impl EntityId {
    pub fn parse(label: &str) -> Result<Self> {
        match GroupLabel::parse(label) {
            Some(group) => Ok(EntityId::Group(group)),
            None => Self::bank(label),
        }
    }

    pub fn bank(ticker: &str) -> Result<Self> {
        let ticker = ticker.trim();
        if ticker.len() != 3 || !ticker.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BankRatioError::InvalidEntityId(ticker.to_string()));
        }
        Ok(EntityId::Bank(ticker.to_string()))
    }

    pub fn label(&self) -> &str {
        match self {
            EntityId::Bank(ticker) => ticker,
            EntityId::Group(group) => group.label(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, EntityId::Group(_))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Output tables are ordered by label text, so banks and groups interleave.
impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.label().to_string()
    }
}

impl TryFrom<String> for EntityId {
    type Error = BankRatioError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl JsonSchema for EntityId {
    fn schema_name() -> String {
        "EntityId".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RecordOrigin {
    /// Loaded from the reported statements
    Reported,
    /// Built from forecast entries for a future year
    Forecast,
    /// Synthetic group row summed from member banks
    Aggregated,
}

impl RecordOrigin {
    pub fn label(self) -> &'static str {
        match self {
            RecordOrigin::Reported => "Reported",
            RecordOrigin::Forecast => "Forecast",
            RecordOrigin::Aggregated => "Aggregated",
        }
    }
}

/// Raw statement figures keyed by code (`BS.13`, `IS.3`, `Nt.67`, ...).
///
/// Only finite values are stored; an absent code is a null line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct LineItems(BTreeMap<String, f64>);

impl LineItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied()
    }

    /// Stores `value` under `code`; NaN and infinities are treated as null
    /// and remove any existing value.
    pub fn insert(&mut self, code: impl Into<String>, value: f64) {
        let code = code.into();
        if value.is_finite() {
            self.0.insert(code, value);
        } else {
            self.0.remove(&code);
        }
    }

    pub fn remove(&mut self, code: &str) -> Option<f64> {
        self.0.remove(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for LineItems {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut items = LineItems::new();
        for (code, value) in iter {
            items.insert(code, value);
        }
        items
    }
}

/// One row per (entity, year, period length).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinancialPeriodRecord {
    #[schemars(description = "3-character bank ticker, or one of Sector, SOCB, Private_1, Private_2, Private_3")]
    pub entity_id: EntityId,

    pub year: i32,

    #[schemars(description = "1-4 for quarterly records, 5 for the full-year record")]
    pub period_length: PeriodLength,

    pub end_date: NaiveDate,

    #[serde(default)]
    #[schemars(description = "Sub-sector of an individual bank; for sub-sector groups, the group's own type")]
    pub sector_type: Option<BankType>,

    pub origin: RecordOrigin,

    #[serde(default)]
    pub line_items: LineItems,

    #[serde(default, skip_deserializing)]
    #[schemars(description = "CA.1..CA.25, null where an input was missing, the prior period was absent, or a denominator was zero")]
    pub derived_ratios: BTreeMap<RatioCode, RatioValue>,
}

impl FinancialPeriodRecord {
    pub fn new(
        entity_id: EntityId,
        year: i32,
        period_length: PeriodLength,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            entity_id,
            year,
            period_length,
            end_date,
            sector_type: None,
            origin: RecordOrigin::Reported,
            line_items: LineItems::new(),
            derived_ratios: BTreeMap::new(),
        }
    }

    pub fn with_sector_type(mut self, sector_type: Option<BankType>) -> Self {
        self.sector_type = sector_type;
        self
    }

    pub fn with_origin(mut self, origin: RecordOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_line_items(mut self, line_items: LineItems) -> Self {
        self.line_items = line_items;
        self
    }

    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::new(self.year, self.period_length)
    }

    pub fn kind(&self) -> PeriodKind {
        self.period_length.kind()
    }

    pub fn ratio(&self, code: RatioCode) -> Option<f64> {
        self.derived_ratios.get(&code).and_then(RatioValue::value)
    }

    /// Ratios that did not compute, with the reason.
    pub fn null_ratios(&self) -> Vec<(RatioCode, &NullReason)> {
        self.derived_ratios
            .iter()
            .filter_map(|(code, value)| value.reason().map(|reason| (*code, reason)))
            .collect()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinancialPeriodRecord)
    }

    pub fn json_schema_string() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// All periods of one entity, sorted ascending by end date.
///
/// The sort and the period kind are fixed at construction, so the ratio
/// engine can address the prior period by index.
#[derive(Debug, Clone)]
pub struct EntityTimeSeries {
    entity_id: EntityId,
    kind: PeriodKind,
    records: Vec<FinancialPeriodRecord>,
}

impl EntityTimeSeries {
    pub fn new(entity_id: EntityId, mut records: Vec<FinancialPeriodRecord>) -> Result<Self> {
        if records.iter().any(|r| r.entity_id != entity_id) {
            return Err(BankRatioError::InvalidEntityId(format!(
                "series for {} contains rows of another entity",
                entity_id
            )));
        }

        let kind = PeriodKind::detect(
            entity_id.label(),
            records.iter().map(|r| r.period_length),
        )?
        .ok_or_else(|| BankRatioError::EmptyEntity(entity_id.to_string()))?;

        records.sort_by(|a, b| {
            a.end_date
                .cmp(&b.end_date)
                .then_with(|| a.period_key().cmp(&b.period_key()))
        });

        for pair in records.windows(2) {
            if pair[0].period_key() == pair[1].period_key() {
                return Err(BankRatioError::DuplicatePeriod {
                    entity: entity_id.to_string(),
                    period_key: pair[1].period_key().to_string(),
                });
            }
        }

        Ok(Self {
            entity_id,
            kind,
            records,
        })
    }

    /// Splits a mixed set of single-kind records into one series per entity.
    pub fn group_by_entity(records: Vec<FinancialPeriodRecord>) -> Result<Vec<Self>> {
        let mut by_entity: BTreeMap<EntityId, Vec<FinancialPeriodRecord>> = BTreeMap::new();
        for record in records {
            by_entity
                .entry(record.entity_id.clone())
                .or_default()
                .push(record);
        }

        by_entity
            .into_iter()
            .map(|(entity_id, rows)| Self::new(entity_id, rows))
            .collect()
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn records(&self) -> &[FinancialPeriodRecord] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [FinancialPeriodRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FinancialPeriodRecord> {
        self.records.get(index)
    }

    /// The record `PeriodKind::LAG` positions before `index`, if any.
    pub fn previous(&self, index: usize) -> Option<&FinancialPeriodRecord> {
        PeriodKind::prior_index(index).and_then(|i| self.records.get(i))
    }

    pub fn find(&self, period_key: PeriodKey) -> Option<&FinancialPeriodRecord> {
        self.records.iter().find(|r| r.period_key() == period_key)
    }

    pub fn into_records(self) -> Vec<FinancialPeriodRecord> {
        self.records
    }
}
