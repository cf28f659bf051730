//! Heikin-Ashi candles and the trend signals derived from them.
//!
//! The candles are a linear recurrence on the previous HA open/close and are
//! computed as a fold over the bars of one symbol.

use crate::series::SymbolSeries;
use crate::streak::streak;
use crate::table::{Column, Table, CLOSE, HIGH, LOW, OPEN};
use crate::Result;

pub const HA_OPEN: &str = "HA_Open";
pub const HA_HIGH: &str = "HA_High";
pub const HA_LOW: &str = "HA_Low";
pub const HA_CLOSE: &str = "HA_Close";
pub const HA_SIGNAL: &str = "HA_Signal";
pub const HA_TREND: &str = "HA_Trend";
pub const HA_STREAK: &str = "HA_Streak";

/// One smoothed candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Fold raw OHLC into HA candles. A bar with a null field yields `None` and
/// restarts the recurrence from the next complete bar.
pub fn ha_candles(
    open: &[Option<f64>],
    high: &[Option<f64>],
    low: &[Option<f64>],
    close: &[Option<f64>],
) -> Vec<Option<HaCandle>> {
    (0..open.len())
        .scan(None::<HaCandle>, |prev, t| {
            let candle = match (open[t], high[t], low[t], close[t]) {
                (Some(o), Some(h), Some(l), Some(c)) => {
                    let ha_close = (o + h + l + c) / 4.0;
                    let ha_open = match prev {
                        Some(p) => (p.open + p.close) / 2.0,
                        None => o,
                    };
                    Some(HaCandle {
                        open: ha_open,
                        high: ha_open.max(ha_close).max(l).max(h),
                        low: ha_open.min(ha_close).min(l).min(h),
                        close: ha_close,
                    })
                }
                _ => None,
            };
            *prev = candle;
            Some(candle)
        })
        .collect()
}

/// `HA_Open`, `HA_High`, `HA_Low`, `HA_Close`
pub fn heikin_ashi(series: &SymbolSeries, name: &str) -> Result<Table> {
    series.require(name, &[OPEN, HIGH, LOW, CLOSE])?;
    let candles = ha_candles(
        &series.floats(OPEN)?,
        &series.floats(HIGH)?,
        &series.floats(LOW)?,
        &series.floats(CLOSE)?,
    );

    let field = |f: fn(&HaCandle) -> f64| -> Vec<Option<f64>> { candles.iter().map(|c| c.as_ref().map(f)).collect() };
    let mut out = series.derive(name)?;
    out.push_column(Column::float(HA_OPEN, field(|c| c.open)))?;
    out.push_column(Column::float(HA_HIGH, field(|c| c.high)))?;
    out.push_column(Column::float(HA_LOW, field(|c| c.low)))?;
    out.push_column(Column::float(HA_CLOSE, field(|c| c.close)))?;
    Ok(out)
}

/// Trend sign of each candle: +1 when close >= open
pub fn ha_trend(ha_open: &[Option<f64>], ha_close: &[Option<f64>]) -> Vec<Option<i64>> {
    ha_open
        .iter()
        .zip(ha_close)
        .map(|(o, c)| match (o, c) {
            (Some(o), Some(c)) => Some(if c >= o { 1 } else { -1 }),
            _ => None,
        })
        .collect()
}

/// +1 where the candles turn increasing (close > open), -1 where they stop,
/// 0 otherwise. The bar before the first one counts as not increasing.
pub fn ha_signal(ha_open: &[Option<f64>], ha_close: &[Option<f64>]) -> Vec<Option<i64>> {
    let mut prev_increasing = false;
    ha_open
        .iter()
        .zip(ha_close)
        .map(|(o, c)| {
            let increasing = match (o, c) {
                (Some(o), Some(c)) => c > o,
                _ => return None,
            };
            let signal = match (prev_increasing, increasing) {
                (false, true) => 1,
                (true, false) => -1,
                _ => 0,
            };
            prev_increasing = increasing;
            Some(signal)
        })
        .collect()
}

/// HA candles plus `HA_Signal`, `HA_Trend` and `HA_Streak`, computed from an HA table
pub fn heikin_ashi_signals(ha: &Table, name: &str) -> Result<Table> {
    ha.require(name, &[HA_OPEN, HA_HIGH, HA_LOW, HA_CLOSE])?;
    let (open, close) = (ha.floats(HA_OPEN)?, ha.floats(HA_CLOSE)?);

    let trend = ha_trend(&open, &close);
    let mut out = ha.select(name, &[HA_OPEN, HA_HIGH, HA_LOW, HA_CLOSE])?;
    out.push_column(Column::int(HA_SIGNAL, ha_signal(&open, &close)))?;
    out.push_column(Column::int(HA_STREAK, streak(&trend)))?;
    out.push_column(Column::int(HA_TREND, trend))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().map(|x| Some(*x)).collect()
    }

    #[test]
    fn test_reference_recurrence() {
        let candles = ha_candles(
            &col(&[10.0, 11.0, 9.0, 12.0, 13.0]),
            &col(&[12.0, 12.0, 10.0, 13.0, 14.0]),
            &col(&[9.0, 10.0, 8.0, 11.0, 12.0]),
            &col(&[11.0, 9.0, 10.0, 13.0, 12.0]),
        );
        let first = candles[0].unwrap();
        assert_eq!(first.close, 10.5);
        assert_eq!(first.open, 10.0);
        assert_eq!(first.high, 12.0);
        assert_eq!(first.low, 9.0);
        assert_eq!(candles[1].unwrap().open, 10.25);
        // (11 + 12 + 10 + 9) / 4
        assert_eq!(candles[1].unwrap().close, 10.5);
    }

    #[test]
    fn test_null_bar_restarts_recurrence() {
        let o = vec![Some(10.0), None, Some(20.0)];
        let candles = ha_candles(&o, &o, &o, &o);
        assert!(candles[1].is_none());
        assert_eq!(candles[2].unwrap().open, 20.0);
    }

    #[test]
    fn test_trend_ties_are_up() {
        assert_eq!(ha_trend(&col(&[1.0, 2.0, 2.0]), &col(&[1.0, 1.0, 3.0])), vec![Some(1), Some(-1), Some(1)]);
    }

    #[test]
    fn test_signal_transitions() {
        let open = col(&[1.0, 1.0, 1.0, 1.0, 1.0]);
        let close = col(&[2.0, 2.0, 0.5, 1.0, 3.0]);
        // flat close == open is not increasing
        assert_eq!(ha_signal(&open, &close), vec![Some(1), Some(0), Some(-1), Some(0), Some(1)]);
    }
}
