use crate::config::RiskConfig;
use crate::models::{ManagerSummary, RiskTier};

#[derive(Debug, Clone, PartialEq)]
pub struct RiskRule {
    pub tier: RiskTier,
    pub min_stock: f64,
    pub max_inactive_days: i64,
}

impl RiskRule {
    pub fn matches(&self, stock_on_hand: f64, days_inactive: i64) -> bool {
        stock_on_hand >= self.min_stock || days_inactive > self.max_inactive_days
    }
}

/// Ordered rules, first match wins; anything unmatched is `Low`.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRules {
    rules: Vec<RiskRule>,
}

impl RiskRules {
    pub fn from_config(config: &RiskConfig) -> Self {
        Self {
            rules: vec![
                RiskRule {
                    tier: RiskTier::High,
                    min_stock: config.high_stock,
                    max_inactive_days: config.high_inactive_days,
                },
                RiskRule {
                    tier: RiskTier::Medium,
                    min_stock: config.medium_stock,
                    max_inactive_days: config.medium_inactive_days,
                },
            ],
        }
    }

    pub fn tier(&self, stock_on_hand: f64, days_inactive: i64) -> RiskTier {
        self.rules
            .iter()
            .find(|rule| rule.matches(stock_on_hand, days_inactive))
            .map(|rule| rule.tier)
            .unwrap_or(RiskTier::Low)
    }

    pub fn classify(&self, summary: &ManagerSummary) -> RiskTier {
        self.tier(summary.stock_on_hand, summary.days_inactive)
    }
}

impl Default for RiskRules {
    fn default() -> Self {
        Self::from_config(&RiskConfig::default())
    }
}
