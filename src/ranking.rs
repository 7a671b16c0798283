use std::cmp::Ordering;

use crate::models::{ManagerSummary, StockConcentration};

/// Higher stock first; equal stock falls back to ascending manager name.
pub fn by_stock_desc(a: &ManagerSummary, b: &ManagerSummary) -> Ordering {
    b.stock_on_hand
        .total_cmp(&a.stock_on_hand)
        .then_with(|| a.manager.cmp(&b.manager))
}

pub fn concentration(summaries: &[ManagerSummary]) -> Vec<StockConcentration> {
    let mut ranked: Vec<&ManagerSummary> = summaries.iter().collect();
    ranked.sort_by(|a, b| by_stock_desc(a, b));
    ranked
        .into_iter()
        .map(|s| StockConcentration {
            manager: s.manager.clone(),
            stock_on_hand: s.stock_on_hand,
        })
        .collect()
}
