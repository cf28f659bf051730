//! Mansfield relative strength against a reference index.
//!
//! The orchestrator attaches the index close as [`INDEX_CLOSE`] before fan-out.
//! A series without that column (the index itself, or an unmapped symbol) is
//! treated as having no defined ratio.

use crate::indicators::rolling::{ratio, sma};
use crate::series::SymbolSeries;
use crate::table::{Column, Table, CLOSE};
use crate::{Result, Window};

/// Pre-joined close of the reference index
pub const INDEX_CLOSE: &str = "index_close";

pub const MANSFIELD_RSI: &str = "mansfield_rsi";

/// Neutral reading: in line with its own average
pub const NEUTRAL: f64 = 50.0;

/// `50 * rs / SMA(rs)` with `rs = close / index_close`
pub fn mansfield_values(close: &[Option<f64>], index_close: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let rs: Vec<Option<f64>> = close.iter().zip(index_close).map(|(c, i)| ratio(*c, *i)).collect();
    if rs.iter().all(Option::is_none) {
        return vec![Some(NEUTRAL); close.len()];
    }
    let avg = sma(&rs, window);
    rs.iter()
        .zip(&avg)
        .map(|(r, a)| ratio(*r, *a).map(|x| NEUTRAL * x))
        .collect()
}

pub fn mansfield_rsi(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;
    let values = if series.frame().has_column(INDEX_CLOSE) {
        mansfield_values(&close, &series.floats(INDEX_CLOSE)?, window.get())
    } else {
        vec![Some(NEUTRAL); close.len()]
    };

    let mut out = series.derive(name)?;
    out.push_column(Column::float(MANSFIELD_RSI, values))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_index_is_neutral() {
        let close = vec![Some(1.0); 5];
        assert_eq!(mansfield_values(&close, &[None; 5], 3), vec![Some(50.0); 5]);
    }

    #[test]
    fn test_constant_ratio_is_neutral_after_warmup() {
        let close: Vec<_> = (1..=6).map(|i| Some(2.0 * i as f64)).collect();
        let index: Vec<_> = (1..=6).map(|i| Some(i as f64)).collect();
        let out = mansfield_values(&close, &index, 3);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 50.0).abs() < 1e-12);
        assert!((out[5].unwrap() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_outperformance_above_neutral() {
        let close = vec![Some(10.0), Some(10.0), Some(10.0), Some(20.0)];
        let index = vec![Some(10.0); 4];
        let out = mansfield_values(&close, &index, 2);
        assert!(out[3].unwrap() > 50.0);
    }
}
