//! Bars elapsed since the trailing window's low / high

use crate::indicators::rolling::rolling;
use crate::series::SymbolSeries;
use crate::table::{Column, Table, HIGH, LOW};
use crate::{Result, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Bottom,
    Top,
}

/// Offset back from the newest bar to the first occurrence of the extremum
fn periods_since(values: &[Option<f64>], window: usize, which: Extremum) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        let mut best = 0;
        for (i, x) in w.iter().enumerate() {
            let better = match which {
                Extremum::Bottom => *x < w[best],
                Extremum::Top => *x > w[best],
            };
            if better {
                best = i;
            }
        }
        Some((w.len() - 1 - best) as f64)
    })
}

/// `periods_since_bottom_{W}` over Low
pub fn periods_since_bottom(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[LOW])?;
    let low = series.floats(LOW)?;
    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("periods_since_bottom_{}", window.get()),
        periods_since(&low, window.get(), Extremum::Bottom),
    ))?;
    Ok(out)
}

/// `periods_since_top_{W}` over High
pub fn periods_since_top(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[HIGH])?;
    let high = series.floats(HIGH)?;
    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("periods_since_top_{}", window.get()),
        periods_since(&high, window.get(), Extremum::Top),
    ))?;
    Ok(out)
}
