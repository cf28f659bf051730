//! Supertrend: ATR-banded two-state trend follower.
//!
//! The scan carries `(state, upper, lower)` of the previous bar, where the bands
//! are the *exposed* ones: the inactive side is already null. Crossing tests
//! therefore only ever see the active band of the previous bar.

use crate::indicators::rolling::{ewm_adjusted, true_range};
use crate::series::SymbolSeries;
use crate::streak::streak;
use crate::table::{Column, Table, CLOSE, HIGH, LOW};
use crate::{Multiplier, Result, Window};

pub const UP: i64 = 1;
pub const DOWN: i64 = -1;

/// One bar of Supertrend output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendPoint {
    pub state: i64,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

/// Run the state machine over raw OHLC columns.
///
/// Both bands are null while the ATR warms up (bars before `window - 1`);
/// from bar `window - 1` on, exactly one band is set: `lower` in an uptrend,
/// `upper` in a downtrend.
pub fn supertrend_points(
    high: &[Option<f64>],
    low: &[Option<f64>],
    close: &[Option<f64>],
    window: usize,
    multiplier: f64,
) -> Vec<SupertrendPoint> {
    let tr = true_range(high, low, close);
    let atr = ewm_adjusted(&tr, 1.0 / window as f64, window);

    let mut points: Vec<SupertrendPoint> = Vec::with_capacity(close.len());
    for t in 0..close.len() {
        let hl2 = match (high[t], low[t]) {
            (Some(h), Some(l)) => Some((h + l) / 2.0),
            _ => None,
        };
        let basic_upper = hl2.zip(atr[t]).map(|(m, a)| m + multiplier * a);
        let basic_lower = hl2.zip(atr[t]).map(|(m, a)| m - multiplier * a);

        let point = match points.last() {
            None => SupertrendPoint {
                state: UP,
                upper: basic_upper,
                lower: basic_lower,
            },
            Some(prev) => {
                let crossed_up = matches!((close[t], prev.upper), (Some(c), Some(u)) if c > u);
                let crossed_down = matches!((close[t], prev.lower), (Some(c), Some(l)) if c < l);
                if crossed_up {
                    SupertrendPoint { state: UP, upper: basic_upper, lower: basic_lower }
                } else if crossed_down {
                    SupertrendPoint { state: DOWN, upper: basic_upper, lower: basic_lower }
                } else {
                    let mut p = SupertrendPoint { state: prev.state, upper: basic_upper, lower: basic_lower };
                    // ratchet the active band
                    if p.state == UP {
                        if let (Some(cur), Some(last)) = (p.lower, prev.lower) {
                            p.lower = Some(cur.max(last));
                        }
                    } else if let (Some(cur), Some(last)) = (p.upper, prev.upper) {
                        p.upper = Some(cur.min(last));
                    }
                    p
                }
            }
        };

        let exposed = if point.state == UP {
            SupertrendPoint { upper: None, ..point }
        } else {
            SupertrendPoint { lower: None, ..point }
        };
        points.push(exposed);
    }
    points
}

/// `supertrend`, `supertrend_streak`, `lowerband_st`, `upperband_st`
pub fn supertrend(series: &SymbolSeries, name: &str, window: Window, multiplier: Multiplier) -> Result<Table> {
    series.require(name, &[HIGH, LOW, CLOSE])?;
    let (high, low, close) = (series.floats(HIGH)?, series.floats(LOW)?, series.floats(CLOSE)?);

    let points = supertrend_points(&high, &low, &close, window.get(), multiplier.get());
    let states: Vec<Option<i64>> = points.iter().map(|p| Some(p.state)).collect();

    let mut out = series.derive(name)?;
    out.push_column(Column::int("supertrend_streak", streak(&states)))?;
    out.push_column(Column::int("supertrend", states))?;
    out.push_column(Column::float("lowerband_st", points.iter().map(|p| p.lower).collect()))?;
    out.push_column(Column::float("upperband_st", points.iter().map(|p| p.upper).collect()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().map(|x| Some(*x)).collect()
    }

    #[test]
    fn test_initial_state_up_with_lower_band() {
        let points = supertrend_points(&col(&[11.0]), &col(&[9.0]), &col(&[10.0]), 1, 2.0);
        assert_eq!(points[0].state, UP);
        assert_eq!(points[0].upper, None);
        // hl2 10, atr 2 -> 10 - 4
        assert_eq!(points[0].lower, Some(6.0));
    }

    #[test]
    fn test_warmup_has_no_bands() {
        let h = col(&[11.0, 12.0, 13.0]);
        let l = col(&[9.0, 10.0, 11.0]);
        let c = col(&[10.0, 11.0, 12.0]);
        let points = supertrend_points(&h, &l, &c, 3, 2.0);
        assert!(points[..2].iter().all(|p| p.upper.is_none() && p.lower.is_none()));
        assert!(points[2].lower.is_some());
    }

    #[test]
    fn test_flip_down_then_ratchet_upper() {
        // steady, then a crash below the lower band, then drift lower
        let closes = [10.0, 10.0, 10.0, 10.0, 4.0, 3.8, 3.9, 3.7];
        let h: Vec<_> = closes.iter().map(|c| Some(c + 0.5)).collect();
        let l: Vec<_> = closes.iter().map(|c| Some(c - 0.5)).collect();
        let points = supertrend_points(&h, &l, &col(&closes), 2, 2.0);

        assert!(points[..4].iter().all(|p| p.state == UP));
        assert_eq!(points[4].state, DOWN);
        assert!(points[4].lower.is_none() && points[4].upper.is_some());
        for w in points[5..].windows(2) {
            if w[1].state == DOWN && w[0].state == DOWN {
                assert!(w[1].upper.unwrap() <= w[0].upper.unwrap());
            }
        }
    }
}
