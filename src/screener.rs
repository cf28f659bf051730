//! Composable row filters over the merged signal table.
//!
//! A [`Screener`] is an AND of [`Predicate`]s. Each predicate is a pure row
//! filter, so the order they are listed in never changes the result. A
//! predicate whose columns are absent makes the whole screen
//! [`ScreenOutcome::Inapplicable`], which is distinct from matching no rows.

use std::fmt;

use crate::indicators::heikin_ashi::{HA_STREAK, HA_TREND};
use crate::indicators::MaPair;
use crate::table::Table;
use crate::{Result, SignalError};

/// Default bounds for streak predicates
pub const DEFAULT_MIN_STREAK: i64 = 1;
pub const DEFAULT_MAX_STREAK: i64 = 2;
/// Default stochastic RSI %K threshold
pub const DEFAULT_K_THRESHOLD: f64 = 60.0;

// ============================================================
// PREDICATES
// ============================================================

/// Trend sign plus an inclusive streak range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakRange {
    pub trend: i64,
    pub min: i64,
    pub max: i64,
}

impl StreakRange {
    pub fn new(trend: i64, min: i64, max: i64) -> Self {
        Self { trend, min, max }
    }

    fn accepts(&self, trend: Option<i64>, streak: Option<i64>) -> bool {
        match (trend, streak) {
            (Some(t), Some(s)) => t == self.trend && (self.min..=self.max).contains(&s),
            _ => false,
        }
    }
}

/// One named, parameterized filter
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    HaStreak(StreakRange),
    SupertrendStreak(StreakRange),
    MacdStreak(StreakRange),
    MaStreak { pair: MaPair, range: StreakRange },
    /// Crossover equals `trend`; %K >= threshold, or %K <= 100 - threshold for a down trend
    StochRsi { trend: i64, k_threshold: f64 },
}

impl Predicate {
    pub fn ha_streak(trend: i64, min: i64, max: i64) -> Self {
        Predicate::HaStreak(StreakRange::new(trend, min, max))
    }

    pub fn supertrend_streak(trend: i64, min: i64, max: i64) -> Self {
        Predicate::SupertrendStreak(StreakRange::new(trend, min, max))
    }

    pub fn macd_streak(trend: i64, min: i64, max: i64) -> Self {
        Predicate::MacdStreak(StreakRange::new(trend, min, max))
    }

    pub fn ma_streak(pair: MaPair, trend: i64, min: i64, max: i64) -> Self {
        Predicate::MaStreak {
            pair,
            range: StreakRange::new(trend, min, max),
        }
    }

    pub fn stoch_rsi(trend: i64, k_threshold: f64) -> Self {
        Predicate::StochRsi { trend, k_threshold }
    }

    /// Resolve `ha`, `st`, `macd`, `srsi` or `ma:sma_5_20` with default parameters
    pub fn from_name(name: &str, trend: i64) -> Result<Self> {
        let (min, max) = (DEFAULT_MIN_STREAK, DEFAULT_MAX_STREAK);
        match name.trim() {
            "ha" => Ok(Self::ha_streak(trend, min, max)),
            "st" => Ok(Self::supertrend_streak(trend, min, max)),
            "macd" => Ok(Self::macd_streak(trend, min, max)),
            "srsi" => Ok(Self::stoch_rsi(trend, DEFAULT_K_THRESHOLD)),
            other => match other.strip_prefix("ma:") {
                Some(pair) => Ok(Self::ma_streak(pair.parse()?, trend, min, max)),
                None => Err(SignalError::UnknownName {
                    kind: "screener",
                    name: name.to_string(),
                }),
            },
        }
    }

    /// Short name, as accepted by [`Predicate::from_name`]
    pub fn name(&self) -> String {
        match self {
            Predicate::HaStreak(_) => "ha".into(),
            Predicate::SupertrendStreak(_) => "st".into(),
            Predicate::MacdStreak(_) => "macd".into(),
            Predicate::MaStreak { pair, .. } => format!("ma:{pair}"),
            Predicate::StochRsi { .. } => "srsi".into(),
        }
    }

    /// Columns the predicate reads
    pub fn required_columns(&self) -> Vec<String> {
        let pair = |a: &str, b: &str| vec![a.to_string(), b.to_string()];
        match self {
            Predicate::HaStreak(_) => pair(HA_TREND, HA_STREAK),
            Predicate::SupertrendStreak(_) => pair("supertrend", "supertrend_streak"),
            Predicate::MacdStreak(_) => pair("macdtrend", "macdstreak"),
            Predicate::MaStreak { pair: ma, .. } => vec![ma.trend_column(), ma.streak_column()],
            Predicate::StochRsi { .. } => vec![
                "stochastic_rsi_crossover".to_string(),
                "stochastic_rsi_K".to_string(),
                "stochastic_rsi_D".to_string(),
            ],
        }
    }

    /// Row mask over `table`; `None` when a required column is missing
    fn mask(&self, table: &Table) -> Result<Option<Vec<bool>>> {
        let columns = self.required_columns();
        if columns.iter().any(|c| !table.has_column(c)) {
            return Ok(None);
        }
        let trend = table.ints(&columns[0])?;
        let mask = match self {
            Predicate::HaStreak(range)
            | Predicate::SupertrendStreak(range)
            | Predicate::MacdStreak(range)
            | Predicate::MaStreak { range, .. } => {
                let streak = table.ints(&columns[1])?;
                trend.into_iter().zip(streak).map(|(t, s)| range.accepts(t, s)).collect()
            }
            Predicate::StochRsi { trend: wanted, k_threshold } => {
                let k = table.floats(&columns[1])?;
                trend
                    .into_iter()
                    .zip(k)
                    .map(|pair| match pair {
                        (Some(cross), Some(k)) if cross == *wanted => {
                            if *wanted < 0 {
                                k <= 100.0 - k_threshold
                            } else {
                                k >= *k_threshold
                            }
                        }
                        _ => false,
                    })
                    .collect()
            }
        };
        Ok(Some(mask))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::HaStreak(r) | Predicate::SupertrendStreak(r) | Predicate::MacdStreak(r) => {
                write!(f, "{}(trend={}, streak={}..={})", self.name(), r.trend, r.min, r.max)
            }
            Predicate::MaStreak { range: r, .. } => {
                write!(f, "{}(trend={}, streak={}..={})", self.name(), r.trend, r.min, r.max)
            }
            Predicate::StochRsi { trend, k_threshold } => {
                write!(f, "srsi(trend={trend}, k={k_threshold})")
            }
        }
    }
}

// ============================================================
// OUTCOME
// ============================================================

/// Result of a screen: the matching rows, or the reason it could not run
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOutcome {
    Matched(Table),
    /// A predicate's columns are absent; not a failure and not "no matches"
    Inapplicable { predicate: String, missing: Vec<String> },
}

impl ScreenOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ScreenOutcome::Matched(_))
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            ScreenOutcome::Matched(t) => Some(t),
            ScreenOutcome::Inapplicable { .. } => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            ScreenOutcome::Matched(t) => Some(t),
            ScreenOutcome::Inapplicable { .. } => None,
        }
    }

    /// Distinct sorted symbols of the matched rows; empty when inapplicable
    pub fn symbols(&self) -> Result<Vec<String>> {
        match self.table() {
            Some(table) => table.distinct_symbols(),
            None => Ok(Vec::new()),
        }
    }
}

// ============================================================
// SCREENER
// ============================================================

/// AND of predicates, optionally restricted to each symbol's latest rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screener {
    predicates: Vec<Predicate>,
    lookback: Option<usize>,
}

impl Screener {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
            lookback: None,
        }
    }

    /// Screener from short names, all sharing one trend sign
    pub fn from_names<S: AsRef<str>>(names: &[S], trend: i64) -> Result<Self> {
        let predicates = names
            .iter()
            .map(|n| Predicate::from_name(n.as_ref(), trend))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(predicates))
    }

    /// Only screen the last `periods` rows of every symbol
    pub fn with_lookback(mut self, periods: usize) -> Self {
        self.lookback = Some(periods);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn apply(&self, merged: &Table) -> Result<ScreenOutcome> {
        let windowed;
        let table = match self.lookback {
            Some(n) => {
                windowed = merged.tail_per_symbol(n)?;
                &windowed
            }
            None => merged,
        };

        let mut keep = vec![true; table.len()];
        for predicate in &self.predicates {
            let Some(mask) = predicate.mask(table)? else {
                let columns = predicate.required_columns();
                let required: Vec<&str> = columns.iter().map(String::as_str).collect();
                return Ok(ScreenOutcome::Inapplicable {
                    predicate: predicate.to_string(),
                    missing: table.missing_columns(&required),
                });
            };
            keep.iter_mut().zip(mask).for_each(|(k, m)| *k &= m);
        }
        Ok(ScreenOutcome::Matched(table.filter_mask(&keep)?))
    }
}
