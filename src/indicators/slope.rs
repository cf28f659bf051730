//! Least-squares slope of Close over a trailing window, as a bounded angle

use crate::indicators::rolling::rolling;
use crate::series::SymbolSeries;
use crate::table::{Column, Table, CLOSE};
use crate::{Result, Window};

/// Regression slope of `w` against x = 0..n, mapped through atan to degrees / 90
fn angle(w: &[f64]) -> Option<f64> {
    let n = w.len() as f64;
    if w.len() < 2 {
        return Some(0.0);
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = w.iter().sum::<f64>() / n;
    let (mut cov, mut var) = (0.0, 0.0);
    for (i, y) in w.iter().enumerate() {
        let dx = i as f64 - mean_x;
        cov += dx * (y - mean_y);
        var += dx * dx;
    }
    let slope = cov / var;
    slope.is_finite().then(|| slope.atan().to_degrees() / 90.0)
}

pub fn slope_values(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, angle)
}

/// `slope_{W}` in [-1, 1]
pub fn slope(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;
    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("slope_{}", window.get()),
        slope_values(&close, window.get()),
    ))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_slope_is_half() {
        let v: Vec<Option<f64>> = (0..5).map(|i| Some(i as f64)).collect();
        let out = slope_values(&v, 3);
        assert_eq!(out[1], None);
        // atan(1) = 45 degrees
        assert!((out[4].unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bounded() {
        let v: Vec<Option<f64>> = (0..10).map(|i| Some(-1000.0 * i as f64)).collect();
        let out = slope_values(&v, 4);
        assert!(out[9].unwrap() > -1.0 && out[9].unwrap() < -0.99);
        let flat = slope_values(&[Some(3.0); 4], 4);
        assert_eq!(flat[3], Some(0.0));
    }
}
