//! Symbol to reference-index mapping used by the relative-strength indicator

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub const DEFAULT_INDEX: &str = "SPY";

/// GICS sector to its sector ETF
pub const SECTOR_ETFS: [(&str, &str); 11] = [
    ("Communication Services", "XLC"),
    ("Consumer Discretionary", "XLY"),
    ("Consumer Staples", "XLP"),
    ("Energy", "XLE"),
    ("Financials", "XLF"),
    ("Health Care", "XLV"),
    ("Industrials", "XLI"),
    ("Materials", "XLB"),
    ("Real Estate", "XLRE"),
    ("Information Technology", "XLK"),
    ("Utilities", "XLU"),
];

/// Sector ETF for a sector name, case-insensitive. "Technology" is accepted
/// for "Information Technology".
pub fn sector_etf(sector: &str) -> Option<&'static str> {
    let sector = sector.trim();
    if sector.eq_ignore_ascii_case("technology") {
        return Some("XLK");
    }
    SECTOR_ETFS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(sector))
        .map(|(_, etf)| *etf)
}

/// Which index each symbol is measured against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceMap {
    pub default_index: String,
    pub overrides: BTreeMap<String, String>,
}

impl Default for ReferenceMap {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX)
    }
}

impl ReferenceMap {
    pub fn new(default_index: impl Into<String>) -> Self {
        Self {
            default_index: default_index.into(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, symbol: impl Into<String>, index: impl Into<String>) -> Self {
        self.overrides.insert(symbol.into(), index.into());
        self
    }

    /// Map every symbol to its sector ETF; unknown sectors fall back to the default index
    pub fn from_sectors<'a>(symbol_sectors: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut map = Self::default();
        for (symbol, sector) in symbol_sectors {
            if let Some(etf) = sector_etf(sector) {
                map.overrides.insert(symbol.to_string(), etf.to_string());
            }
        }
        map
    }

    /// Whether `symbol` is used as a reference by anything in this map
    pub fn is_index(&self, symbol: &str) -> bool {
        symbol == self.default_index || self.overrides.values().any(|v| v == symbol)
    }

    /// Index for `symbol`, `None` if the symbol is itself an index
    pub fn index_for(&self, symbol: &str) -> Option<&str> {
        if self.is_index(symbol) {
            return None;
        }
        Some(
            self.overrides
                .get(symbol)
                .map(String::as_str)
                .unwrap_or(&self.default_index),
        )
    }

    /// All distinct reference symbols
    pub fn indices(&self) -> BTreeSet<&str> {
        std::iter::once(self.default_index.as_str())
            .chain(self.overrides.values().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_override() {
        let map = ReferenceMap::default().with_override("XOM", "XLE");
        assert_eq!(map.index_for("AAPL"), Some("SPY"));
        assert_eq!(map.index_for("XOM"), Some("XLE"));
        assert_eq!(map.index_for("SPY"), None);
        assert_eq!(map.index_for("XLE"), None);
    }

    #[test]
    fn test_from_sectors() {
        let map = ReferenceMap::from_sectors([("JPM", "Financials"), ("MSFT", "technology"), ("ZZZ", "Unknown")]);
        assert_eq!(map.index_for("JPM"), Some("XLF"));
        assert_eq!(map.index_for("MSFT"), Some("XLK"));
        assert_eq!(map.index_for("ZZZ"), Some("SPY"));
        assert_eq!(map.indices().into_iter().collect::<Vec<_>>(), vec!["SPY", "XLF", "XLK"]);
    }
}
