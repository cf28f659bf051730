//! Pipeline configuration, loadable from TOML
//!
//! ```toml
//! workers = 4
//! max_failures = 10
//! required_tables = ["heikin_ashi"]
//!
//! [indicators]
//! rsi_window = 14
//! ma_pairs = [[5, 20], [20, 50]]
//!
//! [references]
//! default_index = "SPY"
//! overrides = { XOM = "XLE" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceMap;
use crate::{Multiplier, Result, SignalError, Window};

// ============================================================
// INDICATOR PARAMETERS
// ============================================================

/// Windows and multipliers for every indicator family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorParams {
    pub bollinger_window: Window,
    pub bollinger_k: Multiplier,
    pub rsi_window: Window,
    pub stoch_rsi_window: Window,
    pub stoch_rsi_fastk: Window,
    pub stoch_rsi_fastd: Window,
    pub macd_fast: Window,
    pub macd_slow: Window,
    pub macd_signal: Window,
    pub natr_window: Window,
    pub volume_window: Window,
    pub supertrend_window: Window,
    pub supertrend_multiplier: Multiplier,
    pub ma_windows: Vec<Window>,
    pub ma_pairs: Vec<(Window, Window)>,
    pub extremum_windows: Vec<Window>,
    pub slope_windows: Vec<Window>,
    pub change_lookbacks: Vec<Window>,
    pub mansfield_window: Window,
    pub label_windows: Vec<Window>,
}

const fn w(n: usize) -> Window {
    Window::new_const(n)
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bollinger_window: w(5),
            bollinger_k: Multiplier::new_const(2.0),
            rsi_window: w(14),
            stoch_rsi_window: w(14),
            stoch_rsi_fastk: w(5),
            stoch_rsi_fastd: w(3),
            macd_fast: w(12),
            macd_slow: w(26),
            macd_signal: w(9),
            natr_window: w(14),
            volume_window: w(14),
            supertrend_window: w(10),
            supertrend_multiplier: Multiplier::new_const(2.0),
            ma_windows: [5, 10, 15, 20, 30, 45, 50, 100, 200].map(w).to_vec(),
            ma_pairs: [(5, 10), (5, 20), (10, 20), (10, 50), (20, 50), (50, 100), (50, 200), (100, 200)]
                .map(|(a, b)| (w(a), w(b)))
                .to_vec(),
            extremum_windows: [10, 20, 40].map(w).to_vec(),
            slope_windows: [10, 20, 40].map(w).to_vec(),
            change_lookbacks: [1, 5, 10, 20].map(w).to_vec(),
            mansfield_window: w(52),
            label_windows: [5, 10, 20].map(w).to_vec(),
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<()> {
        if self.macd_fast >= self.macd_slow {
            return Err(SignalError::InvalidConfig(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                self.macd_fast.get(),
                self.macd_slow.get()
            )));
        }
        if let Some((a, b)) = self.ma_pairs.iter().find(|(a, b)| a >= b) {
            return Err(SignalError::InvalidConfig(format!(
                "moving-average pair {}/{} needs fast < slow",
                a.get(),
                b.get()
            )));
        }
        Ok(())
    }
}

// ============================================================
// PIPELINE CONFIG
// ============================================================

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Worker threads; `None` uses one per CPU
    pub workers: Option<usize>,
    /// Isolated (symbol, indicator) failures tolerated before the run fails; `None` is unlimited
    pub max_failures: Option<usize>,
    /// Tables that must come out non-empty
    pub required_tables: Vec<String>,
    /// Compute forward-looking label tables
    pub include_labels: bool,
    pub indicators: IndicatorParams,
    pub references: ReferenceMap,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            max_failures: None,
            required_tables: vec!["heikin_ashi".to_string()],
            include_labels: true,
            indicators: IndicatorParams::default(),
            references: ReferenceMap::default(),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SignalError::InvalidConfig(format!("parse pipeline TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SignalError::InvalidConfig(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SignalError::InvalidConfig(format!("serialize pipeline config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(SignalError::InvalidConfig("workers must be at least 1".into()));
        }
        self.indicators.validate()
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`PipelineConfig`]
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self
    }

    pub fn max_failures(mut self, max: usize) -> Self {
        self.config.max_failures = Some(max);
        self
    }

    /// Replace the required-table list
    pub fn required_tables<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.config.required_tables = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_labels(mut self, enable: bool) -> Self {
        self.config.include_labels = enable;
        self
    }

    pub fn indicators(mut self, params: IndicatorParams) -> Self {
        self.config.indicators = params;
        self
    }

    pub fn references(mut self, references: ReferenceMap) -> Self {
        self.config.references = references;
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
