//! In-memory per-period output and its storage-key boundary

use std::collections::BTreeMap;

use crate::period::Period;
use crate::table::Table;

/// Name of the merged table at the storage boundary
pub const MERGED: &str = "merged";
/// Name of the label table at the storage boundary
pub const LABELS: &str = "labels";

/// Everything one pipeline run produces for one period
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSignals {
    pub period: Period,
    /// One table per live indicator, keyed by indicator name
    pub tables: BTreeMap<String, Table>,
    /// Raw OHLCV left-joined with every live table
    pub merged: Table,
    /// Forward-looking label columns; empty when labels are disabled
    pub labels: Table,
}

impl PeriodSignals {
    pub fn table(&self, name: &str) -> Option<&Table> {
        match name {
            MERGED => Some(&self.merged),
            LABELS => Some(&self.labels),
            _ => self.tables.get(name),
        }
    }

    /// `(storage key, table)` for every table, merged and labels last
    pub fn keyed_tables(&self) -> Vec<(String, &Table)> {
        let mut out: Vec<(String, &Table)> = self
            .tables
            .iter()
            .map(|(name, t)| (self.period.storage_key(name), t))
            .collect();
        out.push((self.period.storage_key(MERGED), &self.merged));
        if !self.labels.columns().is_empty() {
            out.push((self.period.storage_key(LABELS), &self.labels));
        }
        out
    }
}

/// Output of several periods
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalStore {
    periods: BTreeMap<Period, PeriodSignals>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a period's output, returning whatever it replaced
    pub fn insert(&mut self, signals: PeriodSignals) -> Option<PeriodSignals> {
        self.periods.insert(signals.period, signals)
    }

    pub fn get(&self, period: Period) -> Option<&PeriodSignals> {
        self.periods.get(&period)
    }

    /// Table `name` of `period`; `merged` and `labels` are addressable too
    pub fn table(&self, period: Period, name: &str) -> Option<&Table> {
        self.get(period)?.table(name)
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.periods.keys().copied()
    }

    /// Every `signals/{code}/{name}` key held, sorted by period then name
    pub fn storage_keys(&self) -> Vec<String> {
        self.periods
            .values()
            .flat_map(|p| p.keyed_tables().into_iter().map(|(key, _)| key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::Bar;
    use chrono::NaiveDate;

    fn signals(period: Period) -> PeriodSignals {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let merged = Table::from_bars(MERGED, &[Bar::new(day, "X", 1.0, 1.0, 1.0, 1.0, 1)]).unwrap();
        let rsi = merged
            .keys_only("rsi")
            .unwrap()
            .with_column(Column::float("rsi_14", vec![Some(55.0)]))
            .unwrap();
        PeriodSignals {
            period,
            tables: BTreeMap::from([("rsi".to_string(), rsi)]),
            labels: merged.keys_only(LABELS).unwrap(),
            merged,
        }
    }

    #[test]
    fn test_storage_keys_per_period() {
        let mut store = SignalStore::new();
        store.insert(signals(Period::Weekly));
        store.insert(signals(Period::Daily));
        assert_eq!(
            store.storage_keys(),
            vec!["signals/D/rsi", "signals/D/merged", "signals/W/rsi", "signals/W/merged"]
        );
    }

    #[test]
    fn test_table_lookup() {
        let mut store = SignalStore::new();
        assert!(store.insert(signals(Period::Daily)).is_none());
        assert!(store.insert(signals(Period::Daily)).is_some());
        assert!(store.table(Period::Daily, "rsi").is_some());
        assert!(store.table(Period::Daily, MERGED).is_some());
        assert!(store.table(Period::Monthly, "rsi").is_none());
        assert!(store.table(Period::Daily, "macd").is_none());
    }
}
