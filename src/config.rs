use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = ".hose-ledger.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub columns: ColumnConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub advisory: AdvisoryConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Zero-based row holding the column names. Rows above it are decorative.
    #[serde(default = "default_header_row")]
    pub header_row: usize,

    #[serde(default = "default_material_pattern")]
    pub material_pattern: String,

    #[serde(default)]
    pub day_first: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            header_row: default_header_row(),
            material_pattern: default_material_pattern(),
            day_first: false,
        }
    }
}

fn default_header_row() -> usize {
    1
}

fn default_material_pattern() -> String {
    "MANGUERA".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_item_column")]
    pub item: String,
    #[serde(default = "default_issued_column")]
    pub issued: String,
    #[serde(default = "default_returned_column")]
    pub returned: String,
    #[serde(default = "default_date_column")]
    pub date: String,
    #[serde(default = "default_process_column")]
    pub process: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            item: default_item_column(),
            issued: default_issued_column(),
            returned: default_returned_column(),
            date: default_date_column(),
            process: default_process_column(),
        }
    }
}

fn default_id_column() -> String {
    "Id".to_string()
}

fn default_item_column() -> String {
    "Items".to_string()
}

fn default_issued_column() -> String {
    "Salida".to_string()
}

fn default_returned_column() -> String {
    "Entrada".to_string()
}

fn default_date_column() -> String {
    "Fecha".to_string()
}

fn default_process_column() -> String {
    "Proceso".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_high_stock")]
    pub high_stock: f64,
    #[serde(default = "default_high_inactive_days")]
    pub high_inactive_days: i64,
    #[serde(default = "default_medium_stock")]
    pub medium_stock: f64,
    #[serde(default = "default_medium_inactive_days")]
    pub medium_inactive_days: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_stock: default_high_stock(),
            high_inactive_days: default_high_inactive_days(),
            medium_stock: default_medium_stock(),
            medium_inactive_days: default_medium_inactive_days(),
        }
    }
}

fn default_high_stock() -> f64 {
    150.0
}

fn default_high_inactive_days() -> i64 {
    60
}

fn default_medium_stock() -> f64 {
    80.0
}

fn default_medium_inactive_days() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(default = "default_partial_return_stock")]
    pub partial_return_stock: f64,
    #[serde(default = "default_stalled_days")]
    pub stalled_days: i64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            partial_return_stock: default_partial_return_stock(),
            stalled_days: default_stalled_days(),
        }
    }
}

fn default_partial_return_stock() -> f64 {
    100.0
}

fn default_stalled_days() -> i64 {
    30
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingActivity {
    #[default]
    Zero,
    Stale,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub missing_activity: MissingActivity,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to render default config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ledger_conventions() {
        let config = Config::default();
        assert_eq!(config.ledger.header_row, 1);
        assert_eq!(config.ledger.material_pattern, "MANGUERA");
        assert_eq!(config.columns.issued, "Salida");
        assert_eq!(config.risk.high_stock, 150.0);
        assert_eq!(config.risk.medium_inactive_days, 30);
        assert_eq!(config.advisory.partial_return_stock, 100.0);
        assert_eq!(config.aggregation.missing_activity, MissingActivity::Zero);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let toml_content = r#"
[risk]
high_stock = 200.0

[aggregation]
missing_activity = "stale"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.risk.high_stock, 200.0);
        assert_eq!(config.risk.medium_stock, 80.0);
        assert_eq!(config.aggregation.missing_activity, MissingActivity::Stale);
        assert_eq!(config.columns.id, "Id");
    }

    #[test]
    fn default_toml_lists_every_section() {
        let toml_str = Config::default_toml().unwrap();
        assert!(toml_str.contains("[ledger]"));
        assert!(toml_str.contains("[columns]"));
        assert!(toml_str.contains("[risk]"));
        assert!(toml_str.contains("[advisory]"));
        assert!(toml_str.contains("[aggregation]"));
    }
}
