//! Sector and sub-sector aggregation.
//!
//! A group row is a new record whose line items are the NaN-skipping sum of
//! its member banks' line items for the same period. Group ratios are then
//! computed from these sums by the ratio engine like any bank's; they are
//! never averages of member ratios.

use crate::period::{PeriodKey, PeriodKind};
use crate::schema::{EntityId, FinancialPeriodRecord, GroupLabel, LineItems, RecordOrigin};
use crate::utils::is_statement_code;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Splits bank records into the quarterly and the yearly partition.
///
/// Group records are not inputs to aggregation and are dropped here.
pub fn partition_by_kind(
    records: Vec<FinancialPeriodRecord>,
) -> (Vec<FinancialPeriodRecord>, Vec<FinancialPeriodRecord>) {
    records
        .into_iter()
        .filter(|r| !r.entity_id.is_group())
        .partition(|r| r.kind() == PeriodKind::Quarterly)
}

pub struct EntityAggregator<'a> {
    members: Vec<&'a FinancialPeriodRecord>,
    columns: BTreeSet<&'a str>,
}

impl<'a> EntityAggregator<'a> {
    /// `records` is one partition (all quarterly or all yearly).
    pub fn new(records: &'a [FinancialPeriodRecord]) -> Self {
        let mut members: Vec<&FinancialPeriodRecord> =
            records.iter().filter(|r| !r.entity_id.is_group()).collect();
        members.sort_by(|a, b| {
            a.entity_id
                .cmp(&b.entity_id)
                .then_with(|| a.end_date.cmp(&b.end_date))
        });

        let columns = records
            .iter()
            .filter(|r| !r.entity_id.is_group())
            .flat_map(|r| r.line_items.codes())
            .filter(|code| is_statement_code(code))
            .collect();

        Self { members, columns }
    }

    /// One synthetic record per period key that has at least one member.
    pub fn aggregate(&self, group: GroupLabel) -> Vec<FinancialPeriodRecord> {
        let mut by_period: BTreeMap<PeriodKey, Vec<&FinancialPeriodRecord>> = BTreeMap::new();
        for record in &self.members {
            if group.includes(record.sector_type) {
                by_period.entry(record.period_key()).or_default().push(record);
            }
        }

        let rows: Vec<FinancialPeriodRecord> = by_period
            .into_values()
            .map(|members| self.sum_members(group, &members))
            .collect();

        debug!("Aggregated {} periods for group {}", rows.len(), group.label());
        rows
    }

    /// Every group that has members, in `GroupLabel::ALL` order.
    pub fn aggregate_all(&self) -> Vec<(GroupLabel, Vec<FinancialPeriodRecord>)> {
        GroupLabel::ALL
            .into_iter()
            .map(|group| (group, self.aggregate(group)))
            .filter(|(_, rows)| !rows.is_empty())
            .collect()
    }

    fn sum_members(
        &self,
        group: GroupLabel,
        members: &[&FinancialPeriodRecord],
    ) -> FinancialPeriodRecord {
        // Non-additive fields come from the first member in (entity, end date) order.
        let first = members[0];

        let line_items: LineItems = self
            .columns
            .iter()
            .map(|code| {
                let total: f64 = members
                    .iter()
                    .filter_map(|m| m.line_items.get(code))
                    .sum();
                (*code, total)
            })
            .collect();

        let origin = if members.iter().any(|m| m.origin == RecordOrigin::Forecast) {
            RecordOrigin::Forecast
        } else {
            RecordOrigin::Aggregated
        };

        FinancialPeriodRecord::new(
            EntityId::Group(group),
            first.year,
            first.period_length,
            first.end_date,
        )
        .with_sector_type(group.bank_type())
        .with_origin(origin)
        .with_line_items(line_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodLength;
    use crate::schema::BankType;
    use crate::utils::quarter_end;

    fn bank(
        ticker: &str,
        sector: Option<BankType>,
        quarter: u8,
        items: &[(&str, f64)],
    ) -> FinancialPeriodRecord {
        FinancialPeriodRecord::new(
            EntityId::bank(ticker).unwrap(),
            2024,
            PeriodLength::new(quarter).unwrap(),
            quarter_end(2024, quarter),
        )
        .with_sector_type(sector)
        .with_line_items(items.iter().map(|(c, v)| (*c, *v)).collect())
    }

    #[test]
    fn test_sums_members_with_missing_as_zero() {
        let records = vec![
            bank("ACB", Some(BankType::Private1), 1, &[("BS.13", 100.0), ("BS.56", 150.0)]),
            bank("TCB", Some(BankType::Private1), 1, &[("BS.13", 200.0)]),
        ];
        let rows = EntityAggregator::new(&records).aggregate(GroupLabel::Private1);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.entity_id, EntityId::Group(GroupLabel::Private1));
        assert_eq!(row.line_items.get("BS.13"), Some(300.0));
        assert_eq!(row.line_items.get("BS.56"), Some(150.0));
        assert_eq!(row.origin, RecordOrigin::Aggregated);
        assert_eq!(row.sector_type, Some(BankType::Private1));
    }

    #[test]
    fn test_column_with_no_member_values_sums_to_zero() {
        let records = vec![
            bank("VCB", Some(BankType::Socb), 1, &[("BS.13", 500.0)]),
            bank("ACB", Some(BankType::Private1), 1, &[("BS.13", 100.0), ("Nt.220", 4.0)]),
        ];
        let rows = EntityAggregator::new(&records).aggregate(GroupLabel::Socb);
        assert_eq!(rows[0].line_items.get("Nt.220"), Some(0.0));
    }

    #[test]
    fn test_membership_by_sector_type() {
        let records = vec![
            bank("VCB", Some(BankType::Socb), 1, &[("BS.13", 500.0)]),
            bank("ACB", Some(BankType::Private1), 1, &[("BS.13", 100.0)]),
            bank("XYZ", None, 1, &[("BS.13", 7.0)]),
        ];
        let aggregator = EntityAggregator::new(&records);

        let sector = aggregator.aggregate(GroupLabel::Sector);
        assert_eq!(sector[0].line_items.get("BS.13"), Some(607.0));
        assert_eq!(sector[0].sector_type, None);

        let socb = aggregator.aggregate(GroupLabel::Socb);
        assert_eq!(socb[0].line_items.get("BS.13"), Some(500.0));
    }

    #[test]
    fn test_group_without_members_produces_no_rows() {
        let records = vec![
            bank("VCB", Some(BankType::Socb), 1, &[("BS.13", 500.0)]),
            bank("VCB", Some(BankType::Socb), 2, &[("BS.13", 520.0)]),
            bank("ACB", Some(BankType::Private1), 2, &[("BS.13", 100.0)]),
        ];
        let aggregator = EntityAggregator::new(&records);

        let private1 = aggregator.aggregate(GroupLabel::Private1);
        let keys: Vec<String> = private1.iter().map(|r| r.period_key().to_string()).collect();
        assert_eq!(keys, vec!["2Q24"]);

        assert!(aggregator.aggregate(GroupLabel::Private3).is_empty());
        let groups: Vec<GroupLabel> = aggregator.aggregate_all().into_iter().map(|(g, _)| g).collect();
        assert_eq!(groups, vec![GroupLabel::Sector, GroupLabel::Socb, GroupLabel::Private1]);
    }

    #[test]
    fn test_ratio_overrides_are_not_summed() {
        let records = vec![bank(
            "ACB",
            Some(BankType::Private1),
            1,
            &[("BS.13", 100.0), ("CA.14", 120.0)],
        )];
        let rows = EntityAggregator::new(&records).aggregate(GroupLabel::Sector);
        assert!(!rows[0].line_items.contains("CA.14"));
    }

    #[test]
    fn test_partition_by_kind() {
        let mut yearly = bank("ACB", None, 1, &[]);
        yearly.period_length = PeriodLength::YEARLY;
        let records = vec![bank("ACB", None, 1, &[]), yearly, bank("ACB", None, 2, &[])];

        let (quarterly, yearly) = partition_by_kind(records);
        assert_eq!(quarterly.len(), 2);
        assert_eq!(yearly.len(), 1);
    }
}
