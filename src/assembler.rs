use crate::error::{BankRatioError, Result};
use crate::period::{PeriodKey, PeriodKind};
use crate::schema::{EntityId, EntityTimeSeries, FinancialPeriodRecord};
use log::info;
use serde::{Deserialize, Serialize};

/// The two published tables, each sorted by `(entity_id, end_date)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputTables {
    pub quarterly: Vec<FinancialPeriodRecord>,
    pub yearly: Vec<FinancialPeriodRecord>,
}

impl OutputTables {
    /// Concatenates computed bank and group series into the two tables.
    pub fn assemble(
        quarterly: Vec<EntityTimeSeries>,
        yearly: Vec<EntityTimeSeries>,
    ) -> Result<Self> {
        let tables = Self {
            quarterly: concat_series(quarterly, PeriodKind::Quarterly)?,
            yearly: concat_series(yearly, PeriodKind::Yearly)?,
        };

        info!(
            "Assembled {} quarterly and {} yearly rows",
            tables.quarterly.len(),
            tables.yearly.len()
        );
        Ok(tables)
    }

    pub fn table(&self, kind: PeriodKind) -> &[FinancialPeriodRecord] {
        match kind {
            PeriodKind::Quarterly => &self.quarterly,
            PeriodKind::Yearly => &self.yearly,
        }
    }

    /// The row for `(entity, period_key)`, from whichever table holds that period kind.
    pub fn find(&self, entity: &EntityId, period_key: PeriodKey) -> Option<&FinancialPeriodRecord> {
        let kind = if period_key.is_yearly() {
            PeriodKind::Yearly
        } else {
            PeriodKind::Quarterly
        };
        self.table(kind)
            .iter()
            .find(|r| &r.entity_id == entity && r.period_key() == period_key)
    }

    pub fn entity_rows<'a>(
        &'a self,
        entity: &'a EntityId,
        kind: PeriodKind,
    ) -> impl Iterator<Item = &'a FinancialPeriodRecord> + 'a {
        self.table(kind).iter().filter(move |r| &r.entity_id == entity)
    }

    /// Distinct entities of one table, in table order.
    pub fn entities(&self, kind: PeriodKind) -> Vec<&EntityId> {
        let mut entities: Vec<&EntityId> = self.table(kind).iter().map(|r| &r.entity_id).collect();
        entities.dedup();
        entities
    }

    pub fn is_empty(&self) -> bool {
        self.quarterly.is_empty() && self.yearly.is_empty()
    }
}

fn concat_series(
    series: Vec<EntityTimeSeries>,
    kind: PeriodKind,
) -> Result<Vec<FinancialPeriodRecord>> {
    let mut rows = Vec::new();
    for entity_series in series {
        if entity_series.is_empty() {
            return Err(BankRatioError::EmptyEntity(entity_series.entity_id().to_string()));
        }
        if entity_series.kind() != kind {
            return Err(BankRatioError::MixedPeriodKinds {
                entity: entity_series.entity_id().to_string(),
            });
        }
        rows.extend(entity_series.into_records());
    }

    rows.sort_by(|a, b| {
        a.entity_id
            .cmp(&b.entity_id)
            .then_with(|| a.end_date.cmp(&b.end_date))
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodLength;
    use crate::schema::GroupLabel;
    use crate::utils::{quarter_end, year_end};

    fn quarter(entity: EntityId, q: u8) -> FinancialPeriodRecord {
        FinancialPeriodRecord::new(entity, 2024, PeriodLength::new(q).unwrap(), quarter_end(2024, q))
    }

    fn series(entity: EntityId, quarters: &[u8]) -> EntityTimeSeries {
        let records = quarters.iter().map(|q| quarter(entity.clone(), *q)).collect();
        EntityTimeSeries::new(entity, records).unwrap()
    }

    #[test]
    fn test_rows_sorted_by_entity_then_date() {
        let vcb = EntityId::bank("VCB").unwrap();
        let acb = EntityId::bank("ACB").unwrap();
        let sector = EntityId::Group(GroupLabel::Sector);

        let tables = OutputTables::assemble(
            vec![
                series(vcb.clone(), &[2, 1]),
                series(sector.clone(), &[1, 2]),
                series(acb.clone(), &[1]),
            ],
            vec![],
        )
        .unwrap();

        let labels: Vec<String> = tables
            .quarterly
            .iter()
            .map(|r| format!("{} {}", r.entity_id, r.period_key()))
            .collect();
        assert_eq!(
            labels,
            vec!["ACB 1Q24", "Sector 1Q24", "Sector 2Q24", "VCB 1Q24", "VCB 2Q24"]
        );
        assert_eq!(tables.entities(PeriodKind::Quarterly), vec![&acb, &sector, &vcb]);
        assert_eq!(tables.entity_rows(&vcb, PeriodKind::Quarterly).count(), 2);
    }

    #[test]
    fn test_find_routes_by_period_kind() {
        let acb = EntityId::bank("ACB").unwrap();
        let yearly = FinancialPeriodRecord::new(acb.clone(), 2024, PeriodLength::YEARLY, year_end(2024));
        let tables = OutputTables::assemble(
            vec![series(acb.clone(), &[1])],
            vec![EntityTimeSeries::new(acb.clone(), vec![yearly]).unwrap()],
        )
        .unwrap();

        let q1 = PeriodKey::parse("1Q24").unwrap();
        let y = PeriodKey::parse("2024").unwrap();
        assert_eq!(tables.find(&acb, q1).map(|r| r.period_key()), Some(q1));
        assert_eq!(tables.find(&acb, y).map(|r| r.period_key()), Some(y));
        assert!(tables.find(&EntityId::Group(GroupLabel::Socb), q1).is_none());
    }

    #[test]
    fn test_series_in_wrong_table_is_rejected() {
        let acb = EntityId::bank("ACB").unwrap();
        assert!(matches!(
            OutputTables::assemble(vec![], vec![series(acb, &[1])]),
            Err(BankRatioError::MixedPeriodKinds { .. })
        ));
    }
}
