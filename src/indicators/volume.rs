//! NATR and volume-derived measures

use crate::indicators::rolling::{ema, sma, true_range, wilder, zip_with};
use crate::series::SymbolSeries;
use crate::table::{Column, Table, CLOSE, HIGH, LOW, VOLUME};
use crate::{Result, Window};

/// Normalized average true range: Wilder ATR / Close * 100.
/// True range starts at the second bar, so the first value lands on row `window`.
pub fn natr(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[HIGH, LOW, CLOSE])?;
    let (high, low, close) = (series.floats(HIGH)?, series.floats(LOW)?, series.floats(CLOSE)?);

    let mut tr = true_range(&high, &low, &close);
    if let Some(first) = tr.first_mut() {
        *first = None;
    }
    let atr = wilder(&tr, window.get());
    let natr = zip_with(&atr, &close, |a, c| if c != 0.0 { 100.0 * a / c } else { f64::NAN })
        .into_iter()
        .map(|v| v.filter(|v| v.is_finite()))
        .collect();

    let mut out = series.derive(name)?;
    out.push_column(Column::float(format!("natr_{}", window.get()), natr))?;
    Ok(out)
}

/// EMA of Volume
pub fn volume_ema(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[VOLUME])?;
    let volume = series.floats(VOLUME)?;

    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("vol_ema_{}", window.get()),
        ema(&volume, window.get()),
    ))?;
    Ok(out)
}

/// SMA of Volume
pub fn volume_sma(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[VOLUME])?;
    let volume = series.floats(VOLUME)?;

    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("vol_sma_{}", window.get()),
        sma(&volume, window.get()),
    ))?;
    Ok(out)
}

/// On-balance volume seeded with the first bar's volume
pub fn obv(series: &SymbolSeries, name: &str) -> Result<Table> {
    series.require(name, &[CLOSE, VOLUME])?;
    let (close, volume) = (series.floats(CLOSE)?, series.floats(VOLUME)?);

    let mut values = Vec::with_capacity(close.len());
    let mut running: Option<f64> = None;
    for i in 0..close.len() {
        running = match (running, i.checked_sub(1).and_then(|p| close[p]), close[i], volume[i]) {
            (None, _, Some(_), Some(v)) => Some(v),
            (Some(acc), Some(prev), Some(cur), Some(v)) if cur > prev => Some(acc + v),
            (Some(acc), Some(prev), Some(cur), Some(v)) if cur < prev => Some(acc - v),
            (Some(acc), _, Some(_), Some(_)) => Some(acc),
            _ => None,
        };
        values.push(running);
    }

    let mut out = series.derive(name)?;
    out.push_column(Column::float("obv", values))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;
    use chrono::NaiveDate;

    fn series(rows: &[(f64, i64)]) -> SymbolSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, (c, v))| Bar::new(start + chrono::Days::new(i as u64), "T", *c, c + 1.0, c - 1.0, *c, *v))
            .collect();
        SymbolSeries::from_bars(&bars).unwrap()
    }

    #[test]
    fn test_obv() {
        let s = series(&[(10.0, 100), (11.0, 50), (10.5, 30), (10.5, 70)]);
        let t = obv(&s, "obv").unwrap();
        let col = t.column("obv").unwrap();
        let got: Vec<_> = (0..4).map(|r| col.get_f64(r)).collect();
        assert_eq!(got, vec![Some(100.0), Some(150.0), Some(120.0), Some(120.0)]);
    }

    #[test]
    fn test_natr_cold_start_and_value() {
        let rows: Vec<(f64, i64)> = (0..20).map(|_| (100.0, 1)).collect();
        let t = natr(&series(&rows), "natr_14", Window::new_const(14)).unwrap();
        let col = t.column("natr_14").unwrap();
        assert!(col.is_null(13));
        // constant range 2 on price 100
        assert!((col.get_f64(14).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_volume_averages() {
        let rows: Vec<(f64, i64)> = (0..5).map(|i| (10.0, 10 * (i + 1))).collect();
        let s = series(&rows);
        let sma = volume_sma(&s, "volume_sma_3", Window::new_const(3)).unwrap();
        assert_eq!(sma.column("vol_sma_3").unwrap().get_f64(2), Some(20.0));
        let ema = volume_ema(&s, "volume_ema_3", Window::new_const(3)).unwrap();
        assert_eq!(ema.column("vol_ema_3").unwrap().get_f64(3), Some(30.0));
    }
}
