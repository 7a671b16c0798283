use std::fmt::Write;
use std::io;

use serde::Serialize;

use crate::models::{format_quantity, Analysis, ManagerDetail, ManagerSummary};

const INTERPRETATION: &[&str] = &[
    "Hose issued to a manager stays under that manager's responsibility until returned.",
    "The longer material goes without a return, the higher the risk of loss.",
    "Stock concentrated in a few managers points to control failures.",
    "The warehouse does not accept returns under 2 m, so offcuts left in transport carts are often never accounted for.",
];

const NO_MANAGERS: &str = "No managers hold the selected material.";

fn units(value: f64) -> String {
    format!("{} m", value.trunc() as i64)
}

fn inactivity(summary: &ManagerSummary) -> String {
    match summary.last_activity {
        None if summary.days_inactive == i64::MAX => "no activity".to_string(),
        _ => summary.days_inactive.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    manager: &'a str,
    stock_on_hand: f64,
    total_issued: f64,
    total_returned: f64,
    risk: String,
    days_inactive: i64,
    movement_count: usize,
}

pub fn write_summary_csv<W: io::Write>(summaries: &[ManagerSummary], writer: W) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for summary in summaries {
        csv_writer.serialize(SummaryRow {
            manager: &summary.manager,
            stock_on_hand: summary.stock_on_hand,
            total_issued: summary.total_issued,
            total_returned: summary.total_returned,
            risk: summary.risk.to_string(),
            days_inactive: summary.days_inactive,
            movement_count: summary.movement_count,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_summary(analysis: &Analysis) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Issued: {}  Returned: {}  Outstanding: {}",
        units(analysis.kpis.total_issued),
        units(analysis.kpis.total_returned),
        units(analysis.kpis.total_outstanding)
    );
    let _ = writeln!(output);

    if analysis.summaries.is_empty() {
        let _ = writeln!(output, "{}", NO_MANAGERS);
        return output;
    }

    let _ = writeln!(
        output,
        "{:<24} {:>10} {:>10} {:>10} {:<8} {:>12}",
        "MANAGER", "STOCK", "ISSUED", "RETURNED", "RISK", "DAYS IDLE"
    );
    for summary in &analysis.summaries {
        let _ = writeln!(
            output,
            "{:<24} {:>10} {:>10} {:>10} {:<8} {:>12}",
            summary.manager,
            format_quantity(summary.stock_on_hand),
            format_quantity(summary.total_issued),
            format_quantity(summary.total_returned),
            summary.risk,
            inactivity(summary)
        );
    }

    output
}

pub fn render_ranking(analysis: &Analysis) -> String {
    let mut output = String::new();

    if analysis.ranking.is_empty() {
        let _ = writeln!(output, "{}", NO_MANAGERS);
        return output;
    }

    for (position, entry) in analysis.ranking.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:>3}. {:<24} {:>10}",
            position + 1,
            entry.manager,
            format_quantity(entry.stock_on_hand)
        );
    }

    output
}

pub fn render_detail(detail: &ManagerDetail) -> String {
    let mut output = String::new();
    let summary = &detail.summary;

    let _ = writeln!(output, "Manager: {} ({})", summary.manager, summary.risk);
    let _ = writeln!(
        output,
        "Stock on hand: {}  Returned: {}  Days since last activity: {}",
        units(summary.stock_on_hand),
        units(summary.total_returned),
        inactivity(summary)
    );

    for advisory in &detail.advisories {
        let _ = writeln!(output, "! {}", advisory);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Issued by origin:");
    for (origin, issued) in &detail.issued_by_origin {
        let _ = writeln!(output, "  {:<8} {:>10}", origin, format_quantity(*issued));
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{:<19} {:<8} {:<24} {:>8} {:>8} {:>8}",
        "DATE", "ORIGIN", "PROCESS", "ISSUED", "RETURNED", "ID"
    );
    for record in &detail.movements {
        let date = record
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            output,
            "{:<19} {:<8} {:<24} {:>8} {:>8} {:>8}",
            date,
            record.origin,
            record.process,
            format_quantity(record.issued),
            format_quantity(record.returned),
            format_quantity(record.id)
        );
    }

    output
}

pub fn build_report(
    source: &str,
    analysis: &Analysis,
    details: &[ManagerDetail],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Hose Loss Report");
    let _ = writeln!(
        output,
        "Generated from {} (evaluated at {})",
        source, analysis.evaluated_at
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Materials: {}",
        analysis.selected_items.join(", ")
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Key Figures");
    let _ = writeln!(output, "- ✅ Material issued: {}", units(analysis.kpis.total_issued));
    let _ = writeln!(output, "- 🔄 Material returned: {}", units(analysis.kpis.total_returned));
    let _ = writeln!(
        output,
        "- 🚨 Pending return or legalization: {}",
        units(analysis.kpis.total_outstanding)
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Managers");

    if analysis.summaries.is_empty() {
        let _ = writeln!(output, "{}", NO_MANAGERS);
    } else {
        let _ = writeln!(
            output,
            "| Manager | Stock | Issued | Returned | Risk | Days inactive |"
        );
        let _ = writeln!(output, "|---|---:|---:|---:|---|---:|");
        for summary in &analysis.summaries {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} {} | {} |",
                summary.manager,
                format_quantity(summary.stock_on_hand),
                format_quantity(summary.total_issued),
                format_quantity(summary.total_returned),
                summary.risk.emoji(),
                summary.risk,
                inactivity(summary)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stock Concentration");

    if analysis.ranking.is_empty() {
        let _ = writeln!(output, "No outstanding stock.");
    } else {
        for entry in &analysis.ranking {
            let _ = writeln!(
                output,
                "- {}: {}",
                entry.manager,
                format_quantity(entry.stock_on_hand)
            );
        }
    }

    let flagged: Vec<&ManagerDetail> = details.iter().filter(|d| !d.advisories.is_empty()).collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Advisories");

    if flagged.is_empty() {
        let _ = writeln!(output, "No manager requires action.");
    } else {
        for detail in flagged {
            let advisories: Vec<String> = detail.advisories.iter().map(|a| a.to_string()).collect();
            let _ = writeln!(
                output,
                "- {}: {}",
                detail.summary.manager,
                advisories.join("; ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Interpretation");
    for note in INTERPRETATION {
        let _ = writeln!(output, "- {}", note);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Advisory, Kpis, RiskTier, StockConcentration};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn summary(manager: &str, stock: f64, risk: RiskTier) -> ManagerSummary {
        ManagerSummary {
            manager: manager.to_string(),
            total_issued: stock + 10.0,
            total_returned: 10.0,
            stock_on_hand: stock,
            last_activity: None,
            movement_count: 2,
            days_inactive: 0,
            risk,
        }
    }

    fn analysis() -> Analysis {
        let summaries = vec![
            summary("GOMEZ", 170.0, RiskTier::High),
            summary("RUIZ", 12.5, RiskTier::Low),
        ];
        Analysis {
            evaluated_at: NaiveDate::from_ymd_opt(2026, 3, 31)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            selected_items: vec!["MANGUERA 1/2".to_string()],
            kpis: Kpis {
                total_issued: 202.5,
                total_returned: 20.0,
                total_outstanding: 182.5,
            },
            ranking: summaries
                .iter()
                .map(|s| StockConcentration {
                    manager: s.manager.clone(),
                    stock_on_hand: s.stock_on_hand,
                })
                .collect(),
            summaries,
        }
    }

    #[test]
    fn report_lists_figures_managers_and_advisories() {
        let analysis = analysis();
        let detail = ManagerDetail {
            summary: analysis.summaries[0].clone(),
            movements: Vec::new(),
            issued_by_origin: BTreeMap::new(),
            advisories: vec![Advisory::PartialReturn],
        };

        let report = build_report("inventario.xlsx", &analysis, &[detail]);
        assert!(report.contains("# Hose Loss Report"));
        assert!(report.contains("Material issued: 202 m"));
        assert!(report.contains("| GOMEZ | 170 | 180 | 10 | 🔴 HIGH | 0 |"));
        assert!(report.contains("- RUIZ: 12.5"));
        assert!(report.contains("- GOMEZ: request partial return"));
    }

    #[test]
    fn summary_csv_keeps_table_order() {
        let analysis = analysis();
        let mut buffer = Vec::new();
        write_summary_csv(&analysis.summaries, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "manager,stock_on_hand,total_issued,total_returned,risk,days_inactive,movement_count"
        );
        assert!(lines[1].starts_with("GOMEZ,170.0,"));
        assert!(lines[2].starts_with("RUIZ,12.5,"));
    }

    #[test]
    fn empty_analysis_says_so() {
        let mut analysis = analysis();
        analysis.summaries.clear();
        analysis.ranking.clear();
        assert!(render_summary(&analysis).contains(NO_MANAGERS));
        assert!(render_ranking(&analysis).contains(NO_MANAGERS));
        assert!(build_report("inventario.xlsx", &analysis, &[]).contains(NO_MANAGERS));
    }
}
