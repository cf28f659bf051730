//! Forward-looking labels for backtesting. These read future bars and are kept
//! out of the merged table that predicates run against.

use crate::series::SymbolSeries;
use crate::table::{Column, Table};
use crate::{Result, Window};

/// `max(values[t ..= t+n-1])`; null for the last `n - 1` rows or if any value is null
pub fn future_max_values(values: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            let window = values.get(t..t.checked_add(n)?)?;
            window.iter().copied().try_fold(f64::NEG_INFINITY, |acc, v| v.map(|v| acc.max(v)))
        })
        .collect()
}

/// `values[t + n]`; null for the last `n` rows
pub fn future_end_values(values: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| values.get(t + n).copied().flatten())
        .collect()
}

/// `{column}_{n}_max`
pub fn future_max(series: &SymbolSeries, name: &str, column: &str, n: Window) -> Result<Table> {
    series.require(name, &[column])?;
    let values = series.floats(column)?;
    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("{column}_{}_max", n.get()),
        future_max_values(&values, n.get()),
    ))?;
    Ok(out)
}

/// `{column}_{n}_end`
pub fn future_end(series: &SymbolSeries, name: &str, column: &str, n: Window) -> Result<Table> {
    series.require(name, &[column])?;
    let values = series.floats(column)?;
    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("{column}_{}_end", n.get()),
        future_end_values(&values, n.get()),
    ))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().map(|x| Some(*x)).collect()
    }

    #[test]
    fn test_future_max_boundaries() {
        let out = future_max_values(&col(&[1.0, 5.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out, vec![Some(5.0), Some(5.0), Some(4.0), None, None]);
    }

    #[test]
    fn test_future_max_window_one_is_identity() {
        let v = col(&[3.0, 1.0, 2.0]);
        assert_eq!(future_max_values(&v, 1), v);
    }

    #[test]
    fn test_future_end_boundaries() {
        let out = future_end_values(&col(&[1.0, 2.0, 3.0, 4.0]), 2);
        assert_eq!(out, vec![Some(3.0), Some(4.0), None, None]);
    }
}
