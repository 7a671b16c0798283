use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    Normal,
    Tablet,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Normal => write!(f, "NORMAL"),
            Origin::Tablet => write!(f, "TABLET"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_quantity(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawSheet {
    pub name: String,
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRecord {
    pub id: f64,
    pub item: String,
    pub sheet_name: String,
    pub origin: Origin,
    pub date: Option<NaiveDateTime>,
    pub issued: f64,
    pub returned: f64,
    pub process: String,
}

impl LedgerRecord {
    pub fn manager(&self) -> String {
        manager_key(&self.sheet_name)
    }
}

pub fn manager_key(sheet_name: &str) -> String {
    sheet_name.trim().to_uppercase()
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub records: Vec<LedgerRecord>,
    pub skipped_sheets: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "LOW"),
            RiskTier::Medium => write!(f, "MEDIUM"),
            RiskTier::High => write!(f, "HIGH"),
        }
    }
}

impl RiskTier {
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskTier::Low => "🟢",
            RiskTier::Medium => "🟠",
            RiskTier::High => "🔴",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerSummary {
    pub manager: String,
    pub total_issued: f64,
    pub total_returned: f64,
    pub stock_on_hand: f64,
    pub last_activity: Option<NaiveDateTime>,
    pub movement_count: usize,
    pub days_inactive: i64,
    pub risk: RiskTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpis {
    pub total_issued: f64,
    pub total_returned: f64,
    pub total_outstanding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockConcentration {
    pub manager: String,
    pub stock_on_hand: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    PartialReturn,
    StalledMaterial,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::PartialReturn => write!(f, "request partial return"),
            Advisory::StalledMaterial => write!(f, "critical: stalled material"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerDetail {
    pub summary: ManagerSummary,
    pub movements: Vec<LedgerRecord>,
    pub issued_by_origin: BTreeMap<Origin, f64>,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub evaluated_at: NaiveDateTime,
    pub selected_items: Vec<String>,
    pub summaries: Vec<ManagerSummary>,
    pub kpis: Kpis,
    pub ranking: Vec<StockConcentration>,
}

pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
