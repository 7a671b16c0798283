use tracing::{debug, info};

use crate::aggregate;
use crate::clock::Clock;
use crate::config::Config;
use crate::drilldown;
use crate::error::LedgerResult;
use crate::filter::{self, MaterialSelection};
use crate::models::{Analysis, Kpis, Ledger, LedgerRecord, ManagerDetail, ManagerSummary};
use crate::ranking;
use crate::risk::RiskRules;

pub fn kpis(summaries: &[ManagerSummary]) -> Kpis {
    summaries.iter().fold(
        Kpis {
            total_issued: 0.0,
            total_returned: 0.0,
            total_outstanding: 0.0,
        },
        |acc, s| Kpis {
            total_issued: acc.total_issued + s.total_issued,
            total_returned: acc.total_returned + s.total_returned,
            total_outstanding: acc.total_outstanding + s.stock_on_hand,
        },
    )
}

struct Filtered<'a> {
    selection: MaterialSelection,
    records: Vec<&'a LedgerRecord>,
    summaries: Vec<ManagerSummary>,
}

fn filtered_summaries<'a>(
    ledger: &'a Ledger,
    selection: &MaterialSelection,
    clock: &dyn Clock,
    config: &Config,
) -> LedgerResult<Filtered<'a>> {
    let pattern = &config.ledger.material_pattern;
    let selection = filter::known_selection(&ledger.records, pattern, selection)?;
    let filtered = filter::apply(&ledger.records, pattern, &selection)?;
    debug!(
        "{} of {} ledger records match the material selection",
        filtered.len(),
        ledger.records.len()
    );

    let rules = RiskRules::from_config(&config.risk);
    let summaries = aggregate::summarize_managers(
        filtered.iter().copied(),
        clock.now(),
        config.aggregation.missing_activity,
        &rules,
    );
    Ok(Filtered {
        selection,
        records: filtered,
        summaries,
    })
}

pub fn analyze(
    ledger: &Ledger,
    selection: &MaterialSelection,
    clock: &dyn Clock,
    config: &Config,
) -> LedgerResult<Analysis> {
    let evaluated_at = clock.now();
    let Filtered {
        selection,
        mut summaries,
        ..
    } = filtered_summaries(ledger, selection, clock, config)?;
    summaries.sort_by(ranking::by_stock_desc);

    let kpis = kpis(&summaries);
    let ranking = ranking::concentration(&summaries);

    info!(
        "Analyzed {} managers: {} outstanding",
        summaries.len(),
        kpis.total_outstanding
    );

    Ok(Analysis {
        evaluated_at,
        selected_items: selection.items().map(String::from).collect(),
        summaries,
        kpis,
        ranking,
    })
}

pub fn detail(
    ledger: &Ledger,
    selection: &MaterialSelection,
    manager: &str,
    clock: &dyn Clock,
    config: &Config,
) -> LedgerResult<ManagerDetail> {
    let filtered = filtered_summaries(ledger, selection, clock, config)?;
    drilldown::manager_detail(
        manager,
        &filtered.records,
        &filtered.summaries,
        &config.advisory,
    )
}

pub fn all_details(
    ledger: &Ledger,
    selection: &MaterialSelection,
    clock: &dyn Clock,
    config: &Config,
) -> LedgerResult<Vec<ManagerDetail>> {
    let filtered = filtered_summaries(ledger, selection, clock, config)?;
    filtered
        .summaries
        .iter()
        .map(|s| {
            drilldown::manager_detail(
                &s.manager,
                &filtered.records,
                &filtered.summaries,
                &config.advisory,
            )
        })
        .collect()
}

pub fn default_selection(ledger: &Ledger, config: &Config) -> LedgerResult<MaterialSelection> {
    MaterialSelection::new(filter::available_items(
        &ledger.records,
        &config.ledger.material_pattern,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::LedgerError;
    use crate::models::{Advisory, Origin, RiskTier};
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(m: u32, d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2026, m, d).and_then(|date| date.and_hms_opt(0, 0, 0))
    }

    fn record(
        sheet: &str,
        item: &str,
        issued: f64,
        returned: f64,
        date: Option<NaiveDateTime>,
    ) -> LedgerRecord {
        LedgerRecord {
            id: 1.0,
            item: item.to_string(),
            sheet_name: sheet.to_string(),
            origin: Origin::Normal,
            date,
            issued,
            returned,
            process: String::new(),
        }
    }

    fn ledger() -> Ledger {
        Ledger {
            records: vec![
                record("Gomez", "MANGUERA 1/2", 200.0, 30.0, day(3, 1)),
                record("Gomez", "CODO PVC", 500.0, 0.0, day(3, 2)),
                record("Ruiz", "Manguera 3/4", 90.0, 0.0, day(1, 10)),
                record("Diaz", "MANGUERA 1/2", 20.0, 20.0, day(3, 20)),
                record("Ortiz", "MANGUERA 1/2", 20.0, 0.0, day(3, 20)),
            ],
            skipped_sheets: Vec::new(),
        }
    }

    fn clock() -> FixedClock {
        FixedClock::on(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap())
    }

    #[test]
    fn analysis_covers_selected_hose_only() {
        let ledger = ledger();
        let config = Config::default();
        let selection = default_selection(&ledger, &config).unwrap();
        let analysis = analyze(&ledger, &selection, &clock(), &config).unwrap();

        let managers: Vec<&str> = analysis.summaries.iter().map(|s| s.manager.as_str()).collect();
        assert_eq!(managers, vec!["GOMEZ", "RUIZ", "ORTIZ", "DIAZ"]);

        let gomez = &analysis.summaries[0];
        assert_eq!(gomez.stock_on_hand, 170.0);
        assert_eq!(gomez.risk, RiskTier::High);
        assert_eq!(gomez.days_inactive, 30);

        let ruiz = &analysis.summaries[1];
        assert_eq!(ruiz.days_inactive, 80);
        assert_eq!(ruiz.risk, RiskTier::High);

        assert_eq!(analysis.kpis.total_issued, 330.0);
        assert_eq!(analysis.kpis.total_returned, 50.0);
        assert_eq!(analysis.kpis.total_outstanding, 280.0);

        let ranked: Vec<&str> = analysis.ranking.iter().map(|r| r.manager.as_str()).collect();
        assert_eq!(ranked, managers);
    }

    #[test]
    fn narrower_selection_changes_summaries() {
        let ledger = ledger();
        let selection = MaterialSelection::new(["Manguera 3/4"]).unwrap();
        let analysis = analyze(&ledger, &selection, &clock(), &Config::default()).unwrap();
        assert_eq!(analysis.summaries.len(), 1);
        assert_eq!(analysis.summaries[0].manager, "RUIZ");
        assert_eq!(analysis.selected_items, vec!["Manguera 3/4".to_string()]);
    }

    #[test]
    fn ledger_without_hose_cannot_default_a_selection() {
        let ledger = Ledger {
            records: vec![record("Gomez", "CODO PVC", 1.0, 0.0, None)],
            skipped_sheets: Vec::new(),
        };
        assert!(matches!(
            default_selection(&ledger, &Config::default()),
            Err(LedgerError::EmptyMaterialSelection)
        ));
    }

    #[test]
    fn selection_of_unknown_items_is_refused() {
        let ledger = ledger();
        let selection = MaterialSelection::new(["MANGUERA 9/9"]).unwrap();
        assert!(matches!(
            analyze(&ledger, &selection, &clock(), &Config::default()),
            Err(LedgerError::EmptyMaterialSelection)
        ));
    }

    #[test]
    fn analysis_records_only_known_items() {
        let ledger = ledger();
        let selection = MaterialSelection::new(["MANGUERA 9/9", "Manguera 3/4"]).unwrap();
        let analysis = analyze(&ledger, &selection, &clock(), &Config::default()).unwrap();
        assert_eq!(analysis.selected_items, vec!["Manguera 3/4".to_string()]);
    }

    #[test]
    fn padded_sheet_names_still_drill_down() {
        let ledger = Ledger {
            records: vec![record("Gomez ", "MANGUERA 1/2", 120.0, 0.0, day(3, 1))],
            skipped_sheets: Vec::new(),
        };
        let config = Config::default();
        let selection = default_selection(&ledger, &config).unwrap();

        let analysis = analyze(&ledger, &selection, &clock(), &config).unwrap();
        assert_eq!(analysis.summaries[0].manager, "GOMEZ");

        let details = all_details(&ledger, &selection, &clock(), &config).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].movements.len(), 1);

        let padded = detail(&ledger, &selection, "GOMEZ ", &clock(), &config).unwrap();
        assert_eq!(padded.summary.manager, "GOMEZ");
    }

    #[test]
    fn repeated_runs_are_identical() {
        let ledger = ledger();
        let config = Config::default();
        let selection = default_selection(&ledger, &config).unwrap();
        let first = analyze(&ledger, &selection, &clock(), &config).unwrap();
        let second = analyze(&ledger, &selection, &clock(), &config).unwrap();
        assert_eq!(first.summaries, second.summaries);
        assert_eq!(first.ranking, second.ranking);
    }

    #[test]
    fn detail_reports_advisories() {
        let ledger = ledger();
        let config = Config::default();
        let selection = default_selection(&ledger, &config).unwrap();
        let detail = detail(&ledger, &selection, "gomez", &clock(), &config).unwrap();

        assert_eq!(detail.movements.len(), 1);
        assert_eq!(detail.advisories, vec![Advisory::PartialReturn]);

        let ruiz = super::detail(&ledger, &selection, "Ruiz", &clock(), &config).unwrap();
        assert_eq!(ruiz.advisories, vec![Advisory::StalledMaterial]);
    }
}
