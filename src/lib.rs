//! # YATAS - Yet Another Technical-Analysis Screener
//!
//! Per-symbol OHLCV signal engine: indicator library, candlestick recognizers,
//! Heikin-Ashi and Supertrend state machines, a parallel per-period pipeline and
//! a composable screener over the merged signal table.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use yatas::prelude::*;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let bars: Vec<Bar> = (0..60)
//!     .map(|i| {
//!         let base = 100.0 + i as f64;
//!         Bar::new(start + chrono::Days::new(i), "AAPL", base, base + 2.0, base - 1.0, base + 1.0, 1_000)
//!     })
//!     .collect();
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let output = pipeline.run(Period::Daily, &bars).unwrap();
//!
//! let screener = Screener::new(vec![Predicate::ha_streak(1, 1, 60)]);
//! let outcome = screener.apply(&output.signals.merged).unwrap();
//! assert!(outcome.is_applied());
//! ```

pub mod config;
pub mod indicators;
pub mod logging;
pub mod patterns;
pub mod period;
pub mod pipeline;
pub mod reference;
pub mod screener;
pub mod selectors;
pub mod series;
pub mod store;
pub mod streak;
pub mod table;

pub mod prelude {
    pub use crate::{
        // Configuration
        config::{IndicatorParams, PipelineConfig, PipelineConfigBuilder},
        // Indicators
        indicators::{Catalog, IndicatorKind, IndicatorSpec, MaKind, MaPair},
        // Patterns
        patterns::CandlePattern,
        period::{resample, Period},
        // Pipeline
        pipeline::{Pipeline, PipelineOutput, SymbolFailure},
        reference::ReferenceMap,
        // Screener
        screener::{Predicate, ScreenOutcome, Screener},
        selectors::{CandleStyle, IndicatorSelection, PatternMarks},
        series::SymbolSeries,
        store::{PeriodSignals, SignalStore},
        streak::streak,
        table::{Column, Table},
        // Types
        Bar,
        Multiplier,
        OHLCVExt,
        Result,
        SignalError,
        Window,
        OHLCV,
    };
}

use chrono::NaiveDate;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors raised by the signal engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error(
        "{context}: required columns [{}] missing; table only includes [{}]",
        .missing.join(", "),
        .present.join(", ")
    )]
    Schema {
        context: String,
        missing: Vec<String>,
        present: Vec<String>,
    },

    #[error("{indicator}: {reason}")]
    Computation { indicator: String, reason: String },

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown {kind}: {name}")]
    UnknownName { kind: &'static str, name: String },

    #[error("Batch failed: {failures} symbol failures exceed threshold {threshold}")]
    BatchFailed { failures: usize, threshold: usize },

    #[error("Required table {table} is empty")]
    EmptyTable { table: String },

    #[error("Frame error: {0}")]
    Frame(String),
}

impl From<polars::prelude::PolarsError> for SignalError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        SignalError::Frame(err.to_string())
    }
}

impl SignalError {
    pub(crate) fn computation(indicator: impl Into<String>, reason: impl Into<String>) -> Self {
        SignalError::Computation {
            indicator: indicator.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Rolling window length (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Window(usize);

impl Window {
    /// Create a new Window, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(SignalError::InvalidValue("Window must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Window {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Window {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Window::new(value).map_err(serde::de::Error::custom)
    }
}

/// Positive finite scale factor (band multipliers, standard deviations)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Multiplier(f64);

impl Multiplier {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(SignalError::InvalidValue(
                "Multiplier cannot be NaN or infinite",
            ));
        }
        if value <= 0.0 {
            return Err(SignalError::OutOfRange {
                field: "Multiplier",
                value,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Multiplier {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Multiplier {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Multiplier::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

/// Extension trait with computed candle properties
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    /// Candle color: +1 white (close >= open), -1 black
    #[inline]
    fn color(&self) -> i32 {
        if self.close() >= self.open() {
            1
        } else {
            -1
        }
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Typical midpoint of the bar's range
    #[inline]
    fn hl2(&self) -> f64 {
        (self.high() + self.low()) / 2.0
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// BAR
// ============================================================

/// One OHLCV observation for one symbol
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    pub fn new(
        date: NaiveDate,
        symbol: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Validate price consistency
    pub fn validate(&self) -> Result<()> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(SignalError::InvalidSeries {
                symbol: self.symbol.clone(),
                reason: format!("non-finite price on {}", self.date),
            });
        }
        if self.high < self.low {
            return Err(SignalError::InvalidSeries {
                symbol: self.symbol.clone(),
                reason: format!("high < low on {}", self.date),
            });
        }
        Ok(())
    }
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume as f64
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_window_validation() {
        assert!(Window::new(1).is_ok());
        assert!(Window::new(200).is_ok());
        assert!(Window::new(0).is_err());
    }

    #[test]
    fn test_multiplier_validation() {
        assert!(Multiplier::new(2.0).is_ok());
        assert!(Multiplier::new(0.0).is_err());
        assert!(Multiplier::new(-1.0).is_err());
        assert!(Multiplier::new(f64::NAN).is_err());
        assert!(Multiplier::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_window_deserialize_rejects_zero() {
        let ok: Window = serde_json::from_str("14").unwrap();
        assert_eq!(ok.get(), 14);
        assert!(serde_json::from_str::<Window>("0").is_err());
    }

    #[test]
    fn test_ohlcv_ext() {
        let bar = Bar::new(day(2), "TEST", 100.0, 110.0, 90.0, 105.0, 10);
        assert_eq!(bar.body(), 5.0);
        assert_eq!(bar.range(), 20.0);
        assert_eq!(bar.upper_shadow(), 5.0);
        assert_eq!(bar.lower_shadow(), 10.0);
        assert_eq!(bar.color(), 1);
        assert_eq!(bar.hl2(), 100.0);
        assert!(bar.is_bullish());
    }

    #[test]
    fn test_doji_color_is_white() {
        let bar = Bar::new(day(2), "TEST", 100.0, 101.0, 99.0, 100.0, 10);
        assert_eq!(bar.color(), 1);
        assert!(!bar.is_bullish());
        assert!(!bar.is_bearish());
    }

    #[test]
    fn test_bar_validation() {
        assert!(Bar::new(day(2), "X", 1.0, 2.0, 0.5, 1.5, 0).validate().is_ok());
        assert!(Bar::new(day(2), "X", 1.0, 0.5, 2.0, 1.5, 0).validate().is_err());
        assert!(Bar::new(day(2), "X", f64::NAN, 2.0, 0.5, 1.5, 0).validate().is_err());
    }

    #[test]
    fn test_schema_error_names_columns() {
        let err = SignalError::Schema {
            context: "macd".into(),
            missing: vec!["Close".into()],
            present: vec!["Date".into(), "symbol".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("macd"));
        assert!(msg.contains("Close"));
        assert!(msg.contains("Date, symbol"));
    }
}
