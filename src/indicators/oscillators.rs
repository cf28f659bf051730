//! Bollinger bands, RSI, stochastic RSI and MACD

use crate::indicators::rolling::{ema, rolling_max, rolling_min, rolling_std, sma, wilder, zip_with};
use crate::series::SymbolSeries;
use crate::streak::{direction_vs_prior, streak};
use crate::table::{Column, Table, CLOSE};
use crate::{Multiplier, Result, Window};

// ============================================================
// BOLLINGER BANDS
// ============================================================

/// Rolling mean +/- k population standard deviations of Close
pub fn bollinger_bands(series: &SymbolSeries, name: &str, window: Window, k: Multiplier) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;

    let middle = sma(&close, window.get());
    let std = rolling_std(&close, window.get());
    let k = k.get();

    let mut out = series.derive(name)?;
    out.push_column(Column::float("upperband_bb", zip_with(&middle, &std, |m, s| m + k * s)))?;
    out.push_column(Column::float("lowerband_bb", zip_with(&middle, &std, |m, s| m - k * s)))?;
    out.push_column(Column::float("middleband_bb", middle))?;
    Ok(out)
}

// ============================================================
// RSI
// ============================================================

/// Wilder RSI; first value at row `window`
pub fn rsi_values(close: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(close.len());
    let mut losses = Vec::with_capacity(close.len());
    for i in 0..close.len() {
        let change = match (i.checked_sub(1).and_then(|p| close[p]), close[i]) {
            (Some(prev), Some(cur)) => Some(cur - prev),
            _ => None,
        };
        gains.push(change.map(|c| c.max(0.0)));
        losses.push(change.map(|c| (-c).max(0.0)));
    }

    let avg_gain = wilder(&gains, window);
    let avg_loss = wilder(&losses, window);
    zip_with(&avg_gain, &avg_loss, |g, l| {
        let total = g + l;
        if total > 0.0 {
            100.0 * g / total
        } else {
            0.0
        }
    })
}

pub fn rsi(series: &SymbolSeries, name: &str, window: Window) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;

    let mut out = series.derive(name)?;
    out.push_column(Column::float(
        format!("rsi_{}", window.get()),
        rsi_values(&close, window.get()),
    ))?;
    Ok(out)
}

// ============================================================
// STOCHASTIC RSI
// ============================================================

/// Stochastic oscillator of RSI: %K over `fastk`, %D = SMA(%K, `fastd`), and a
/// crossover column (+1 when %K >= %D else -1). %K is exposed only where %D exists.
pub fn stochastic_rsi(
    series: &SymbolSeries,
    name: &str,
    window: Window,
    fastk: Window,
    fastd: Window,
) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;

    let rsi = rsi_values(&close, window.get());
    let lo = rolling_min(&rsi, fastk.get());
    let hi = rolling_max(&rsi, fastk.get());
    let raw_k: Vec<Option<f64>> = rsi
        .iter()
        .zip(lo.iter().zip(&hi))
        .map(|(last, (lo, hi))| match (last, lo, hi) {
            (Some(last), Some(lo), Some(hi)) => Some(if hi > lo { 100.0 * (last - lo) / (hi - lo) } else { 0.0 }),
            _ => None,
        })
        .collect();
    let d = sma(&raw_k, fastd.get());
    let k: Vec<Option<f64>> = raw_k.iter().zip(&d).map(|(k, d)| d.and(*k)).collect();
    let crossover: Vec<Option<i64>> = k
        .iter()
        .zip(&d)
        .map(|(k, d)| match (k, d) {
            (Some(k), Some(d)) => Some(if k >= d { 1 } else { -1 }),
            _ => None,
        })
        .collect();

    let mut out = series.derive(name)?;
    out.push_column(Column::float("stochastic_rsi_K", k))?;
    out.push_column(Column::float("stochastic_rsi_D", d))?;
    out.push_column(Column::int("stochastic_rsi_crossover", crossover))?;
    Ok(out)
}

// ============================================================
// MACD
// ============================================================

/// MACD line, signal, histogram, trend vs prior bar and its streak.
/// All three lines start together once the signal EMA is seeded.
pub fn macd(series: &SymbolSeries, name: &str, fast: Window, slow: Window, signal: Window) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;

    let line = zip_with(&ema(&close, fast.get()), &ema(&close, slow.get()), |f, s| f - s);
    let sig = ema(&line, signal.get());
    let line: Vec<Option<f64>> = line.iter().zip(&sig).map(|(m, s)| s.and(*m)).collect();
    let hist = zip_with(&line, &sig, |m, s| m - s);
    let trend = direction_vs_prior(&line);
    let trend_streak = streak(&trend);

    let mut out = series.derive(name)?;
    out.push_column(Column::float("macd", line))?;
    out.push_column(Column::float("macdsignal", sig))?;
    out.push_column(Column::float("macdhist", hist))?;
    out.push_column(Column::int("macdtrend", trend))?;
    out.push_column(Column::int("macdstreak", trend_streak))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> SymbolSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::new(start + chrono::Days::new(i as u64), "T", *c, c + 1.0, c - 1.0, *c, 100))
            .collect();
        SymbolSeries::from_bars(&bars).unwrap()
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn test_bollinger_symmetry() {
        let t = bollinger_bands(&series(&zigzag(30)), "bollinger_bands", Window::new_const(5), Multiplier::new_const(2.0)).unwrap();
        let (u, m, l) = (
            t.column("upperband_bb").unwrap(),
            t.column("middleband_bb").unwrap(),
            t.column("lowerband_bb").unwrap(),
        );
        assert!(u.is_null(3));
        for r in 4..30 {
            let (u, m, l) = (u.get_f64(r).unwrap(), m.get_f64(r).unwrap(), l.get_f64(r).unwrap());
            assert!(u >= m && m >= l);
            assert!(((u - m) - (m - l)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rsi_extremes() {
        let up: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let rsi = rsi_values(&up.iter().map(|x| Some(*x)).collect::<Vec<_>>(), 14);
        assert_eq!(rsi[13], None);
        assert_eq!(rsi[14], Some(100.0));

        let down: Vec<Option<f64>> = (0..20).map(|i| Some(50.0 - i as f64)).collect();
        assert_eq!(rsi_values(&down, 14)[19], Some(0.0));
    }

    #[test]
    fn test_rsi_column_name() {
        let t = rsi(&series(&zigzag(20)), "rsi", Window::new_const(14)).unwrap();
        assert_eq!(t.column_names(), vec!["Date", "symbol", "rsi_14"]);
    }

    #[test]
    fn test_stochastic_rsi_alignment_and_bounds() {
        let t = stochastic_rsi(
            &series(&zigzag(60)),
            "stochastic_rsi",
            Window::new_const(14),
            Window::new_const(5),
            Window::new_const(3),
        )
        .unwrap();
        let k = t.column("stochastic_rsi_K").unwrap();
        let d = t.column("stochastic_rsi_D").unwrap();
        let x = t.column("stochastic_rsi_crossover").unwrap();
        // lookback 14 + 4 + 2
        assert!(k.is_null(19) && d.is_null(19) && x.is_null(19));
        for r in 20..60 {
            let (kv, dv) = (k.get_f64(r).unwrap(), d.get_f64(r).unwrap());
            assert!((0.0..=100.0).contains(&kv));
            assert_eq!(x.get_i64(r), Some(if kv >= dv { 1 } else { -1 }));
        }
    }

    #[test]
    fn test_macd_trend_and_streak() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let t = macd(&series(&closes), "macd", Window::new_const(12), Window::new_const(26), Window::new_const(9)).unwrap();
        let line = t.column("macd").unwrap();
        assert!(line.is_null(32));
        assert!(line.get_f64(33).is_some());
        let trend = t.column("macdtrend").unwrap();
        let streak = t.column("macdstreak").unwrap();
        assert!(trend.is_null(33));
        assert_eq!(streak.get_i64(34), Some(1));
        let hist = t.column("macdhist").unwrap();
        let sig = t.column("macdsignal").unwrap();
        let r = 40;
        assert!((hist.get_f64(r).unwrap() - (line.get_f64(r).unwrap() - sig.get_f64(r).unwrap())).abs() < 1e-12);
    }
}
