use std::collections::BTreeSet;

use tracing::warn;

use crate::error::{LedgerError, LedgerResult};
use crate::models::LedgerRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSelection {
    items: BTreeSet<String>,
}

impl MaterialSelection {
    pub fn new<I, S>(items: I) -> LedgerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: BTreeSet<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(LedgerError::EmptyMaterialSelection);
        }
        Ok(Self { items })
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

pub fn is_material(record: &LedgerRecord, pattern: &str) -> bool {
    record.item.to_uppercase().contains(&pattern.to_uppercase())
}

pub fn material_universe<'a>(records: &'a [LedgerRecord], pattern: &str) -> Vec<&'a LedgerRecord> {
    records.iter().filter(|r| is_material(r, pattern)).collect()
}

pub fn available_items(records: &[LedgerRecord], pattern: &str) -> Vec<String> {
    material_universe(records, pattern)
        .into_iter()
        .map(|r| r.item.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn known_selection(
    records: &[LedgerRecord],
    pattern: &str,
    selection: &MaterialSelection,
) -> LedgerResult<MaterialSelection> {
    let available = available_items(records, pattern);
    let known: Vec<&str> = selection
        .items()
        .filter(|item| {
            let found = available.binary_search_by(|a| a.as_str().cmp(*item)).is_ok();
            if !found {
                warn!("Selected item '{}' is not a known hose item; ignoring", item);
            }
            found
        })
        .collect();
    MaterialSelection::new(known)
}

pub fn apply<'a>(
    records: &'a [LedgerRecord],
    pattern: &str,
    selection: &MaterialSelection,
) -> LedgerResult<Vec<&'a LedgerRecord>> {
    let selection = known_selection(records, pattern, selection)?;
    Ok(material_universe(records, pattern)
        .into_iter()
        .filter(|r| selection.contains(&r.item))
        .collect())
}
