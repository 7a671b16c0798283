use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::AdvisoryConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    manager_key, Advisory, LedgerRecord, ManagerDetail, ManagerSummary, Origin,
};

/// Newest first; undated movements go last and keep their ledger order.
pub fn by_date_desc(a: &LedgerRecord, b: &LedgerRecord) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn issued_by_origin<'a, I>(records: I) -> BTreeMap<Origin, f64>
where
    I: IntoIterator<Item = &'a LedgerRecord>,
{
    let mut breakdown = BTreeMap::new();
    for record in records {
        *breakdown.entry(record.origin).or_insert(0.0) += record.issued;
    }
    breakdown
}

pub fn advisories(summary: &ManagerSummary, config: &AdvisoryConfig) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if summary.stock_on_hand > config.partial_return_stock {
        advisories.push(Advisory::PartialReturn);
    }
    if summary.days_inactive > config.stalled_days {
        advisories.push(Advisory::StalledMaterial);
    }
    advisories
}

pub fn manager_detail(
    manager: &str,
    filtered: &[&LedgerRecord],
    summaries: &[ManagerSummary],
    config: &AdvisoryConfig,
) -> LedgerResult<ManagerDetail> {
    let key = manager_key(manager);
    let summary = summaries
        .iter()
        .find(|s| s.manager == key)
        .cloned()
        .ok_or_else(|| LedgerError::UnknownManager(manager.to_string()))?;

    let mut movements: Vec<LedgerRecord> = filtered
        .iter()
        .filter(|r| r.manager() == key)
        .map(|r| (*r).clone())
        .collect();
    movements.sort_by(by_date_desc);

    let issued_by_origin = issued_by_origin(&movements);
    let advisories = advisories(&summary, config);

    Ok(ManagerDetail {
        summary,
        movements,
        issued_by_origin,
        advisories,
    })
}
