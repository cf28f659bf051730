//! Close-to-close change ratios over a menu of lookbacks

use crate::indicators::rolling::ratio;
use crate::series::SymbolSeries;
use crate::table::{Column, Table, CLOSE};
use crate::{Result, Window};

/// `value[t] / value[t - n]`
pub fn change_ratio_values(values: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| ratio(values[t], t.checked_sub(lookback).and_then(|p| values[p])))
        .collect()
}

/// One `close_change_{n}` column per lookback
pub fn change_ratio(series: &SymbolSeries, name: &str, lookbacks: &[Window]) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;
    let mut out = series.derive(name)?;
    for n in lookbacks {
        out.push_column(Column::float(
            format!("close_change_{}", n.get()),
            change_ratio_values(&close, n.get()),
        ))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback() {
        let v = vec![Some(10.0), Some(20.0), Some(15.0), Some(0.0), Some(5.0)];
        let out = change_ratio_values(&v, 2);
        assert_eq!(out, vec![None, None, Some(1.5), Some(0.0), None]);
    }
}
