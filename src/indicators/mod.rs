//! Indicator library and the catalog the pipeline fans out over
//!
//! Every indicator maps one [`SymbolSeries`] to a table holding exactly
//! `Date`, `symbol` and its own columns. The catalog is plain data: a list of
//! `(table name, kind)` pairs built from [`IndicatorParams`], so the menu of
//! windows and pairs lives in configuration rather than code.
//!
//! # Families
//!
//! - **Trend**: SMA/EMA menus with ratio pairs, MACD, Supertrend, Heikin-Ashi
//! - **Oscillators**: Bollinger bands, RSI, stochastic RSI, Mansfield RSI
//! - **Volatility / volume**: NATR, volume EMA/SMA, OBV
//! - **Features**: periods since extremum, slope, change ratios
//! - **Labels**: future max / future end (forward-looking, never screened)

pub mod change;
pub mod extrema;
pub mod heikin_ashi;
pub mod labels;
pub mod mansfield;
pub mod moving_average;
pub mod oscillators;
pub mod rolling;
pub mod slope;
pub mod supertrend;
pub mod volume;

pub use moving_average::{MaKind, MaPair};

use crate::config::IndicatorParams;
use crate::patterns::pattern_recognition;
use crate::series::SymbolSeries;
use crate::table::{Table, CLOSE, HIGH};
use crate::{Multiplier, Result, Window};

/// What an indicator computes, with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorKind {
    HeikinAshi,
    BollingerBands { window: Window, k: Multiplier },
    Rsi { window: Window },
    StochasticRsi { window: Window, fastk: Window, fastd: Window },
    Macd { fast: Window, slow: Window, signal: Window },
    Natr { window: Window },
    VolumeEma { window: Window },
    VolumeSma { window: Window },
    Obv,
    MovingAverages { kind: MaKind, windows: Vec<Window>, pairs: Vec<(Window, Window)> },
    Supertrend { window: Window, multiplier: Multiplier },
    PatternRecognition,
    PeriodsSinceBottom { window: Window },
    PeriodsSinceTop { window: Window },
    Slope { window: Window },
    ChangeRatio { lookbacks: Vec<Window> },
    MansfieldRsi { window: Window },
    FutureMax { column: String, n: Window },
    FutureEnd { column: String, n: Window },
}

impl IndicatorKind {
    /// Forward-looking outputs; kept out of the merged table
    pub fn is_label(&self) -> bool {
        matches!(self, IndicatorKind::FutureMax { .. } | IndicatorKind::FutureEnd { .. })
    }

    /// Run on one symbol; `name` becomes the output table name and error context
    pub fn compute(&self, series: &SymbolSeries, name: &str) -> Result<Table> {
        use IndicatorKind::*;
        match self {
            HeikinAshi => {
                let candles = heikin_ashi::heikin_ashi(series, name)?;
                heikin_ashi::heikin_ashi_signals(&candles, name)
            }
            BollingerBands { window, k } => oscillators::bollinger_bands(series, name, *window, *k),
            Rsi { window } => oscillators::rsi(series, name, *window),
            StochasticRsi { window, fastk, fastd } => {
                oscillators::stochastic_rsi(series, name, *window, *fastk, *fastd)
            }
            Macd { fast, slow, signal } => oscillators::macd(series, name, *fast, *slow, *signal),
            Natr { window } => volume::natr(series, name, *window),
            VolumeEma { window } => volume::volume_ema(series, name, *window),
            VolumeSma { window } => volume::volume_sma(series, name, *window),
            Obv => volume::obv(series, name),
            MovingAverages { kind, windows, pairs } => {
                moving_average::moving_averages(series, name, *kind, windows, pairs)
            }
            Supertrend { window, multiplier } => supertrend::supertrend(series, name, *window, *multiplier),
            PatternRecognition => pattern_recognition(series, name),
            PeriodsSinceBottom { window } => extrema::periods_since_bottom(series, name, *window),
            PeriodsSinceTop { window } => extrema::periods_since_top(series, name, *window),
            Slope { window } => slope::slope(series, name, *window),
            ChangeRatio { lookbacks } => change::change_ratio(series, name, lookbacks),
            MansfieldRsi { window } => mansfield::mansfield_rsi(series, name, *window),
            FutureMax { column, n } => labels::future_max(series, name, column, *n),
            FutureEnd { column, n } => labels::future_end(series, name, column, *n),
        }
    }
}

/// A named catalog entry; the name is the output table name
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub name: String,
    pub kind: IndicatorKind,
}

impl IndicatorSpec {
    pub fn new(name: impl Into<String>, kind: IndicatorKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered, name-unique list of indicators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    specs: Vec<IndicatorSpec>,
}

impl Catalog {
    /// Build the catalog from parameters; label specs only when `include_labels`
    pub fn from_params(params: &IndicatorParams, include_labels: bool) -> Self {
        use IndicatorKind::*;
        let p = params;
        let mut catalog = Catalog::default();

        catalog.push(IndicatorSpec::new("heikin_ashi", HeikinAshi));
        catalog.push(IndicatorSpec::new(
            "bollinger_bands",
            BollingerBands { window: p.bollinger_window, k: p.bollinger_k },
        ));
        catalog.push(IndicatorSpec::new("rsi", Rsi { window: p.rsi_window }));
        catalog.push(IndicatorSpec::new(
            "stochastic_rsi",
            StochasticRsi { window: p.stoch_rsi_window, fastk: p.stoch_rsi_fastk, fastd: p.stoch_rsi_fastd },
        ));
        catalog.push(IndicatorSpec::new(
            "macd",
            Macd { fast: p.macd_fast, slow: p.macd_slow, signal: p.macd_signal },
        ));
        catalog.push(IndicatorSpec::new(format!("natr_{}", p.natr_window.get()), Natr { window: p.natr_window }));
        catalog.push(IndicatorSpec::new(
            format!("volume_ema_{}", p.volume_window.get()),
            VolumeEma { window: p.volume_window },
        ));
        catalog.push(IndicatorSpec::new(
            format!("volume_sma_{}", p.volume_window.get()),
            VolumeSma { window: p.volume_window },
        ));
        catalog.push(IndicatorSpec::new("obv", Obv));
        for kind in [MaKind::Sma, MaKind::Ema] {
            catalog.push(IndicatorSpec::new(
                kind.prefix(),
                MovingAverages { kind, windows: p.ma_windows.clone(), pairs: p.ma_pairs.clone() },
            ));
        }
        catalog.push(IndicatorSpec::new(
            "supertrend",
            Supertrend { window: p.supertrend_window, multiplier: p.supertrend_multiplier },
        ));
        catalog.push(IndicatorSpec::new("pattern_recognition", PatternRecognition));
        for &window in &p.extremum_windows {
            catalog.push(IndicatorSpec::new(
                format!("periods_since_bottom_{}", window.get()),
                PeriodsSinceBottom { window },
            ));
            catalog.push(IndicatorSpec::new(
                format!("periods_since_top_{}", window.get()),
                PeriodsSinceTop { window },
            ));
        }
        for &window in &p.slope_windows {
            catalog.push(IndicatorSpec::new(format!("find_slope_{}", window.get()), Slope { window }));
        }
        catalog.push(IndicatorSpec::new("change_ratio", ChangeRatio { lookbacks: p.change_lookbacks.clone() }));
        catalog.push(IndicatorSpec::new("mansfield_rsi", MansfieldRsi { window: p.mansfield_window }));

        if include_labels {
            for &n in &p.label_windows {
                for column in [CLOSE, HIGH] {
                    catalog.push(IndicatorSpec::new(
                        format!("{}_{}_max", column.to_ascii_lowercase(), n.get()),
                        FutureMax { column: column.to_string(), n },
                    ));
                }
                catalog.push(IndicatorSpec::new(
                    format!("close_{}_end", n.get()),
                    FutureEnd { column: CLOSE.to_string(), n },
                ));
            }
        }
        catalog
    }

    /// Append a spec; a name already in the catalog is ignored
    pub fn push(&mut self, spec: IndicatorSpec) {
        if self.get(&spec.name).is_none() {
            self.specs.push(spec);
        }
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[IndicatorSpec] {
        &self.specs
    }

    /// Specs feeding the merged table
    pub fn live(&self) -> impl Iterator<Item = &IndicatorSpec> {
        self.specs.iter().filter(|s| !s.kind.is_label())
    }

    pub fn labels(&self) -> impl Iterator<Item = &IndicatorSpec> {
        self.specs.iter().filter(|s| s.kind.is_label())
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;
    use chrono::NaiveDate;

    #[test]
    fn test_default_catalog_names() {
        let catalog = Catalog::from_params(&IndicatorParams::default(), true);
        let live: Vec<&str> = catalog.live().map(|s| s.name.as_str()).collect();
        assert_eq!(live.len(), 24);
        for name in [
            "heikin_ashi",
            "natr_14",
            "volume_ema_14",
            "sma",
            "ema",
            "pattern_recognition",
            "periods_since_bottom_40",
            "periods_since_top_10",
            "find_slope_20",
            "mansfield_rsi",
        ] {
            assert!(live.contains(&name), "missing {name}");
        }
        let labels: Vec<&str> = catalog.labels().map(|s| s.name.as_str()).collect();
        assert_eq!(labels.len(), 9);
        assert!(labels.contains(&"high_20_max"));
        assert!(labels.contains(&"close_5_end"));
    }

    #[test]
    fn test_labels_can_be_excluded() {
        let catalog = Catalog::from_params(&IndicatorParams::default(), false);
        assert_eq!(catalog.labels().count(), 0);
        assert_eq!(catalog.len(), 24);
    }

    #[test]
    fn test_duplicate_windows_collapse() {
        let params = IndicatorParams {
            slope_windows: vec![Window::new(10).unwrap(), Window::new(10).unwrap()],
            ..IndicatorParams::default()
        };
        let catalog = Catalog::from_params(&params, false);
        assert_eq!(catalog.names().iter().filter(|n| n.starts_with("find_slope")).count(), 1);
    }

    #[test]
    fn test_every_live_indicator_keeps_keys_only_plus_own_columns() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let base = 50.0 + (i as f64 * 0.4).sin() * 5.0;
                Bar::new(start + chrono::Days::new(i), "X", base, base + 1.0, base - 1.0, base + 0.3, 100 + i as i64)
            })
            .collect();
        let series = SymbolSeries::from_bars(&bars).unwrap();
        let catalog = Catalog::from_params(&IndicatorParams::default(), true);
        for spec in catalog.specs() {
            let table = spec.kind.compute(&series, &spec.name).unwrap();
            assert_eq!(table.name(), spec.name);
            assert_eq!(table.len(), 30);
            assert!(!table.has_column("Open") && !table.has_column("Volume"));
            assert!(!table.columns().is_empty(), "{} has no columns", spec.name);
        }
    }
}
