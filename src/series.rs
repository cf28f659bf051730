//! Per-symbol, date-ordered frame: the unit of computation for every indicator

use chrono::NaiveDate;

use crate::table::{Column, Table};
use crate::{Bar, Result, SignalError};

/// Rows of a single symbol, strictly increasing by Date
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    symbol: String,
    dates: Vec<NaiveDate>,
    frame: Table,
}

impl SymbolSeries {
    /// Wrap a single-symbol table, sorting by Date and rejecting duplicate dates
    pub fn new(frame: Table) -> Result<Self> {
        let symbols = frame.symbols()?;
        let Some(symbol) = symbols.first().cloned() else {
            return Err(SignalError::InvalidSeries {
                symbol: frame.name().to_string(),
                reason: "series is empty".into(),
            });
        };
        if symbols.iter().any(|s| *s != symbol) {
            return Err(SignalError::InvalidSeries {
                symbol,
                reason: "series mixes several symbols".into(),
            });
        }

        let mut dates = frame.dates()?;
        let frame = if dates.windows(2).all(|w| w[0] < w[1]) {
            frame
        } else {
            let sorted = frame.sorted()?;
            dates = sorted.dates()?;
            sorted
        };

        if let Some(w) = dates.windows(2).find(|w| w[0] == w[1]) {
            return Err(SignalError::InvalidSeries {
                symbol,
                reason: format!("duplicate date {}", w[0]),
            });
        }

        Ok(Self { symbol, dates, frame })
    }

    /// Series from bars of one symbol
    pub fn from_bars(bars: &[Bar]) -> Result<Self> {
        for bar in bars {
            bar.validate()?;
        }
        Self::new(Table::from_bars("ohlcv", bars)?)
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[inline]
    pub fn frame(&self) -> &Table {
        &self.frame
    }

    pub fn require(&self, context: &str, required: &[&str]) -> Result<()> {
        self.frame.require(context, required)
    }

    /// Column values pulled out of the frame for a per-bar scan
    pub fn floats(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.frame.floats(name)
    }

    /// Attach an extra column (e.g. the pre-joined reference index close)
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.frame.push_column(column)?;
        Ok(self)
    }

    /// Start an output table for indicator `name`: key columns only
    pub fn derive(&self, name: &str) -> Result<Table> {
        self.frame.keys_only(name)
    }
}
