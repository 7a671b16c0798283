use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::clock;
use crate::config::MissingActivity;
use crate::models::{LedgerRecord, ManagerSummary, RiskTier};
use crate::risk::RiskRules;

#[derive(Default)]
struct Totals {
    issued: f64,
    returned: f64,
    last_activity: Option<NaiveDateTime>,
    movements: usize,
}

pub fn days_inactive(
    now: NaiveDateTime,
    last_activity: Option<NaiveDateTime>,
    missing: MissingActivity,
) -> i64 {
    match (last_activity, missing) {
        (Some(last), _) => clock::elapsed_days(now, last),
        (None, MissingActivity::Zero) => 0,
        (None, MissingActivity::Stale) => i64::MAX,
    }
}

pub fn summarize_managers<'a, I>(
    records: I,
    now: NaiveDateTime,
    missing: MissingActivity,
    rules: &RiskRules,
) -> Vec<ManagerSummary>
where
    I: IntoIterator<Item = &'a LedgerRecord>,
{
    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();

    for record in records {
        let entry = totals.entry(record.manager()).or_default();
        entry.issued += record.issued;
        entry.returned += record.returned;
        entry.movements += 1;
        if record.date > entry.last_activity {
            entry.last_activity = record.date;
        }
    }

    totals
        .into_iter()
        .map(|(manager, totals)| {
            let stock_on_hand = totals.issued - totals.returned;
            let days_inactive = days_inactive(now, totals.last_activity, missing);
            ManagerSummary {
                manager,
                total_issued: totals.issued,
                total_returned: totals.returned,
                stock_on_hand,
                last_activity: totals.last_activity,
                movement_count: totals.movements,
                days_inactive,
                risk: RiskTier::Low,
            }
        })
        .map(|mut summary| {
            summary.risk = rules.classify(&summary);
            summary
        })
        .collect()
}
