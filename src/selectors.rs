//! Per-symbol views over stored signals for chart consumers: indicator
//! traces, moving-average lines, pattern marks and candle data.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::indicators::heikin_ashi::{HA_CLOSE, HA_HIGH, HA_LOW, HA_OPEN, HA_TREND};
use crate::patterns::{BEARISH, BULLISH};
use crate::period::Period;
use crate::store::{SignalStore, MERGED};
use crate::table::{Table, CLOSE, HIGH, LOW, OPEN, VOLUME};
use crate::{Result, SignalError};

/// Name of the selected trace column
pub const VALUE: &str = "value";

fn table_for<'a>(store: &'a SignalStore, period: Period, name: &str) -> Result<&'a Table> {
    store.table(period, name).ok_or_else(|| SignalError::UnknownName {
        kind: "table",
        name: period.storage_key(name),
    })
}

// ============================================================
// INDICATOR TRACES
// ============================================================

/// Trend trace of one indicator, exposed as a `value` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorSelection {
    HeikinAshi,
    Supertrend,
    Macd,
    StochRsi,
}

impl IndicatorSelection {
    pub const ALL: [IndicatorSelection; 4] = [
        IndicatorSelection::HeikinAshi,
        IndicatorSelection::Supertrend,
        IndicatorSelection::Macd,
        IndicatorSelection::StochRsi,
    ];

    pub fn code(self) -> &'static str {
        match self {
            IndicatorSelection::HeikinAshi => "ha",
            IndicatorSelection::Supertrend => "st",
            IndicatorSelection::Macd => "macd",
            IndicatorSelection::StochRsi => "srsi",
        }
    }

    /// Display title for the trace
    pub fn title(self) -> &'static str {
        match self {
            IndicatorSelection::HeikinAshi => "Heikin Ashi",
            IndicatorSelection::Supertrend => "Supertrend",
            IndicatorSelection::Macd => "MACD",
            IndicatorSelection::StochRsi => "Stochastic RSI",
        }
    }

    fn source(self) -> (&'static str, &'static str, &'static [&'static str]) {
        match self {
            IndicatorSelection::HeikinAshi => ("heikin_ashi", HA_TREND, &[]),
            IndicatorSelection::Supertrend => ("supertrend", "supertrend", &[]),
            IndicatorSelection::Macd => ("macd", "macdtrend", &[]),
            IndicatorSelection::StochRsi => (
                "stochastic_rsi",
                "stochastic_rsi_crossover",
                &["stochastic_rsi_K", "stochastic_rsi_D"],
            ),
        }
    }

    /// Date-ascending rows of `symbol` with the trend column renamed to `value`
    pub fn select(self, store: &SignalStore, period: Period, symbol: &str) -> Result<Table> {
        let (name, trend, extra) = self.source();
        let mut columns = extra.to_vec();
        columns.push(trend);
        let table = table_for(store, period, name)?
            .rows_for_symbol(symbol)?
            .select(self.code(), &columns)?;
        table.renamed_columns(&[(trend, VALUE)])?.sorted()
    }
}

impl fmt::Display for IndicatorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for IndicatorSelection {
    type Err = SignalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        IndicatorSelection::ALL
            .into_iter()
            .find(|sel| sel.code() == s.trim())
            .ok_or_else(|| SignalError::UnknownName {
                kind: "indicator selection",
                name: s.to_string(),
            })
    }
}

// ============================================================
// LINES
// ============================================================

/// Moving-average lines (`sma_20`, `ema_50`, ...) of `symbol`, joined on Date
pub fn select_lines(store: &SignalStore, period: Period, symbol: &str, lines: &[&str]) -> Result<Table> {
    if let Some(bad) = lines.iter().find(|l| !(l.starts_with("sma_") || l.starts_with("ema_"))) {
        return Err(SignalError::UnknownName {
            kind: "line",
            name: bad.to_string(),
        });
    }
    let pick = |prefix: &str| -> Result<Table> {
        let wanted: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with(prefix)).collect();
        table_for(store, period, prefix.trim_end_matches('_'))?
            .rows_for_symbol(symbol)?
            .select("lines", &wanted)
    };
    pick("sma_")?.inner_join(&pick("ema_")?)?.sorted()
}

// ============================================================
// PATTERN MARKS
// ============================================================

/// Dates carrying bullish / bearish patterns, with `;`-joined pattern names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMarks {
    pub up: Vec<(NaiveDate, String)>,
    pub down: Vec<(NaiveDate, String)>,
}

impl PatternMarks {
    pub fn select(store: &SignalStore, period: Period, symbol: &str) -> Result<Self> {
        let table = table_for(store, period, "pattern_recognition")?
            .rows_for_symbol(symbol)?
            .sorted()?;
        let columns = table
            .columns()
            .into_iter()
            .map(|c| Ok((c.name().to_string(), c.as_i64()?)))
            .collect::<Result<Vec<_>>>()?;
        let mut marks = PatternMarks::default();
        for (row, date) in table.dates()?.into_iter().enumerate() {
            let named = |value: i64| -> Vec<&str> {
                columns
                    .iter()
                    .filter(|(_, values)| values[row] == Some(value))
                    .map(|(name, _)| name.as_str())
                    .collect()
            };
            let up = named(i64::from(BULLISH));
            if !up.is_empty() {
                marks.up.push((date, up.join(";")));
            }
            let down = named(i64::from(BEARISH));
            if !down.is_empty() {
                marks.down.push((date, down.join(";")));
            }
        }
        Ok(marks)
    }
}

// ============================================================
// CANDLES
// ============================================================

/// Which candles a chart draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandleStyle {
    Ohlc,
    HeikinAshi,
}

impl FromStr for CandleStyle {
    type Err = SignalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "ohlc" => Ok(CandleStyle::Ohlc),
            "ha" => Ok(CandleStyle::HeikinAshi),
            _ => Err(SignalError::UnknownName {
                kind: "candle style",
                name: s.to_string(),
            }),
        }
    }
}

/// Open/High/Low/Close/Volume of `symbol`, ascending by Date. Heikin-Ashi
/// candles are renamed to the OHLC names and joined with the raw Volume.
pub fn candle_data(store: &SignalStore, period: Period, symbol: &str, style: CandleStyle) -> Result<Table> {
    let raw = table_for(store, period, MERGED)?.rows_for_symbol(symbol)?;
    let candles = match style {
        CandleStyle::Ohlc => raw.select("candles", &[OPEN, HIGH, LOW, CLOSE, VOLUME])?,
        CandleStyle::HeikinAshi => {
            let ha = table_for(store, period, "heikin_ashi")?
                .rows_for_symbol(symbol)?
                .select("candles", &[HA_OPEN, HA_HIGH, HA_LOW, HA_CLOSE])?
                .renamed_columns(&[(HA_OPEN, OPEN), (HA_HIGH, HIGH), (HA_LOW, LOW), (HA_CLOSE, CLOSE)])?;
            ha.inner_join(&raw.select("volume", &[VOLUME])?)?
        }
    };
    candles.sorted()
}
