//! Per-period orchestrator: partition by symbol, fan out the catalog on a
//! worker pool, stack each indicator's tables and fold them into the merged
//! table.
//!
//! A failing (symbol, indicator) cell is isolated and reported as a
//! [`SymbolFailure`]; its rows stay in the merged table with null columns.
//! The run only fails when the failure count passes `max_failures` or a
//! required table comes out empty.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::indicators::mansfield::INDEX_CLOSE;
use crate::indicators::{Catalog, IndicatorSpec};
use crate::period::{resample, Period};
use crate::series::SymbolSeries;
use crate::store::{PeriodSignals, SignalStore, LABELS, MERGED};
use crate::table::{Column, Table};
use crate::{Bar, Result, SignalError};

/// Indicator name reported when a symbol's bars cannot form a series
pub const SERIES_STAGE: &str = "series";

// ============================================================
// OUTPUT TYPES
// ============================================================

/// One isolated (symbol, indicator) failure
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFailure {
    pub period: Period,
    pub symbol: String,
    pub indicator: String,
    pub error: SignalError,
}

impl fmt::Display for SymbolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} / {}: {}", self.period, self.symbol, self.indicator, self.error)
    }
}

/// Result of one period run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub signals: PeriodSignals,
    pub failures: Vec<SymbolFailure>,
}

// ============================================================
// PIPELINE
// ============================================================

/// Runs a [`Catalog`] over every symbol of a period
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    catalog: Catalog,
}

impl Pipeline {
    /// Pipeline with the catalog described by `config.indicators`
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let catalog = Catalog::from_params(&config.indicators, config.include_labels);
        Self::with_catalog(config, catalog)
    }

    /// Pipeline over a caller-built catalog
    pub fn with_catalog(config: PipelineConfig, catalog: Catalog) -> Result<Self> {
        config.validate()?;
        if let Some(unknown) = config
            .required_tables
            .iter()
            .find(|t| t.as_str() != MERGED && catalog.get(t).is_none())
        {
            return Err(SignalError::UnknownName {
                kind: "required table",
                name: unknown.clone(),
            });
        }
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Compute every table for `period` from bars already at that granularity
    pub fn run(&self, period: Period, bars: &[Bar]) -> Result<PipelineOutput> {
        let started = Instant::now();
        let (series, mut failures) = self.partition(period, bars);
        let specs = self.catalog.specs();
        info!(
            period = %period,
            symbols = series.len() + failures.len(),
            indicators = specs.len(),
            bars = bars.len(),
            "pipeline run started"
        );

        let cells = self.fan_out(&series, specs)?;

        let mut per_indicator: Vec<Vec<Table>> = vec![Vec::new(); specs.len()];
        for (series, results) in series.iter().zip(cells) {
            for (slot, (spec, result)) in specs.iter().zip(results).enumerate() {
                match result {
                    Ok(table) => per_indicator[slot].push(table),
                    Err(error) => {
                        let failure = SymbolFailure {
                            period,
                            symbol: series.symbol().to_string(),
                            indicator: spec.name.clone(),
                            error,
                        };
                        warn!(%failure, "indicator failed; cell left null");
                        failures.push(failure);
                    }
                }
            }
        }

        if let Some(threshold) = self.config.max_failures {
            if failures.len() > threshold {
                return Err(SignalError::BatchFailed {
                    failures: failures.len(),
                    threshold,
                });
            }
        }

        let mut tables = BTreeMap::new();
        for (spec, parts) in specs.iter().zip(per_indicator) {
            tables.insert(spec.name.clone(), Table::concat(spec.name.clone(), parts)?);
        }

        let base = Table::from_bars(MERGED, bars)?.sorted()?;
        let merged = fold_join(base.clone(), self.catalog.live(), &tables)?;
        let labels = fold_join(base.keys_only(LABELS)?, self.catalog.labels(), &tables)?;
        let tables: BTreeMap<String, Table> = tables
            .into_iter()
            .filter(|(name, _)| self.catalog.get(name).is_some_and(|s| !s.kind.is_label()))
            .collect();

        let signals = PeriodSignals {
            period,
            tables,
            merged,
            labels,
        };
        for name in &self.config.required_tables {
            let empty = signals.table(name).map_or(true, Table::is_empty);
            if empty {
                return Err(SignalError::EmptyTable { table: name.clone() });
            }
        }

        info!(
            period = %period,
            rows = signals.merged.len(),
            columns = signals.merged.columns().len(),
            failures = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline run finished"
        );
        Ok(PipelineOutput { signals, failures })
    }

    /// Resample daily bars to each period, run them, and collect the results
    pub fn run_periods(&self, daily: &[Bar], periods: &[Period]) -> Result<(SignalStore, Vec<SymbolFailure>)> {
        let mut store = SignalStore::new();
        let mut failures = Vec::new();
        for &period in periods {
            let bars = match period {
                Period::Daily => daily.to_vec(),
                _ => resample(daily, period),
            };
            let output = self.run(period, &bars)?;
            failures.extend(output.failures);
            store.insert(output.signals);
        }
        Ok((store, failures))
    }

    /// One series per symbol, with the reference index close attached.
    /// Symbols whose bars are invalid come back as failures.
    fn partition(&self, period: Period, bars: &[Bar]) -> (Vec<SymbolSeries>, Vec<SymbolFailure>) {
        let mut by_symbol: BTreeMap<&str, Vec<Bar>> = BTreeMap::new();
        for bar in bars {
            by_symbol.entry(bar.symbol.as_str()).or_default().push(bar.clone());
        }

        let references = &self.config.references;
        let index_closes: HashMap<&str, HashMap<NaiveDate, f64>> = references
            .indices()
            .into_iter()
            .filter_map(|index| {
                let rows = by_symbol.get(index)?;
                Some((index, rows.iter().map(|b| (b.date, b.close)).collect()))
            })
            .collect();

        let mut series = Vec::with_capacity(by_symbol.len());
        let mut failures = Vec::new();
        for (symbol, rows) in &by_symbol {
            let attached = SymbolSeries::from_bars(rows).and_then(|s| {
                let Some(closes) = references.index_for(symbol).and_then(|i| index_closes.get(i)) else {
                    return Ok(s);
                };
                let joined = s.dates().iter().map(|d| closes.get(d).copied()).collect();
                s.with_column(Column::float(INDEX_CLOSE, joined))
            });
            match attached {
                Ok(s) => series.push(s),
                Err(error) => {
                    let failure = SymbolFailure {
                        period,
                        symbol: symbol.to_string(),
                        indicator: SERIES_STAGE.to_string(),
                        error,
                    };
                    warn!(%failure, "symbol skipped");
                    failures.push(failure);
                }
            }
        }
        (series, failures)
    }

    /// Every spec on every series; the outer vec follows `series`, the inner `specs`
    fn fan_out(&self, series: &[SymbolSeries], specs: &[IndicatorSpec]) -> Result<Vec<Vec<Result<Table>>>> {
        let compute = || -> Vec<Vec<Result<Table>>> {
            series
                .par_iter()
                .map(|s| specs.iter().map(|spec| spec.kind.compute(s, &spec.name)).collect())
                .collect()
        };
        match self.config.workers {
            Some(n) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n.max(1))
                    .build()
                    .map_err(|e| SignalError::computation("pipeline", format!("build worker pool: {e}")))?;
                Ok(pool.install(compute))
            }
            None => Ok(compute()),
        }
    }
}

/// Left-join each spec's table onto `acc` in catalog order
fn fold_join<'a>(
    acc: Table,
    specs: impl Iterator<Item = &'a IndicatorSpec>,
    tables: &BTreeMap<String, Table>,
) -> Result<Table> {
    specs
        .filter_map(|spec| tables.get(&spec.name))
        .try_fold(acc, |acc, table| {
            let (joined, skipped) = acc.left_join(table)?;
            if !skipped.is_empty() {
                debug!(table = table.name(), columns = ?skipped, "merge kept existing columns");
            }
            Ok(joined)
        })
}
