//! Four- and five-candle recognizers
//!
//! TA-Lib patterns: CDLBREAKAWAY, CDLCONCEALBABYSWALL, CDLLADDERBOTTOM,
//! CDLMATHOLD, CDLRISEFALL3METHODS

use super::helpers::{gap_down, gap_up, Candles};
use super::{signal, BEARISH, BULLISH, NONE};
use crate::OHLCVExt;

/// Mat hold: reaction candles may dip into the first body by this fraction
const MAT_HOLD_PENETRATION: f64 = 0.5;

pub fn breakaway(c: &Candles, i: usize) -> i32 {
    let color = c.color(i - 4);
    let shape = c.long_body(i - 4)
        && c.color(i - 3) == color
        && c.color(i - 1) == color
        && c.color(i) == -color;
    if !shape {
        return NONE;
    }
    let (first, second, third, fourth, fifth) = (&c[i - 4], &c[i - 3], &c[i - 2], &c[i - 1], &c[i]);
    if color < 0
        && gap_down(first, second)
        && third.high < second.high
        && third.low < second.low
        && fourth.high < third.high
        && fourth.low < third.low
        && fifth.close > second.open
        && fifth.close < first.close
    {
        BULLISH
    } else if color > 0
        && gap_up(first, second)
        && third.high > second.high
        && third.low > second.low
        && fourth.high > third.high
        && fourth.low > third.low
        && fifth.close < second.open
        && fifth.close > first.close
    {
        BEARISH
    } else {
        NONE
    }
}

pub fn concealing_baby_swallow(c: &Candles, i: usize) -> i32 {
    let (second, third, fourth) = (&c[i - 2], &c[i - 1], &c[i]);
    let black_marubozu = |k: usize| c.upper_very_short(k) && c.lower_very_short(k);
    let hit = (i - 3..=i).all(|k| c.color(k) < 0)
        && black_marubozu(i - 3)
        && black_marubozu(i - 2)
        && !c.upper_very_short(i - 1)
        && gap_down(second, third)
        && third.high > second.close
        && fourth.high > third.high
        && fourth.low < third.low;
    signal(hit, BULLISH)
}

pub fn ladder_bottom(c: &Candles, i: usize) -> i32 {
    let hit = (i - 4..=i - 2).all(|k| c.color(k) < 0)
        && c[i - 4].open > c[i - 3].open
        && c[i - 3].open > c[i - 2].open
        && c[i - 4].close > c[i - 3].close
        && c[i - 3].close > c[i - 2].close
        && c.color(i - 1) < 0
        && !c.upper_very_short(i - 1)
        && c.color(i) > 0
        && c[i].open > c[i - 1].open
        && c[i].close > c[i - 1].high;
    signal(hit, BULLISH)
}

pub fn mat_hold(c: &Candles, i: usize) -> i32 {
    let first = &c[i - 4];
    let floor = first.close - first.body() * MAT_HOLD_PENETRATION;
    let holds = |k: usize| c[k].body_bottom() < first.close && c[k].body_bottom() > floor;
    let reaction_high = c[i - 3].high.max(c[i - 2].high).max(c[i - 1].high);
    let hit = c.long_body(i - 4)
        && (i - 3..i).all(|k| c.short_body(k))
        && c.color(i - 4) > 0
        && c.color(i - 3) < 0
        && c.color(i) > 0
        && gap_up(first, &c[i - 3])
        && holds(i - 2)
        && holds(i - 1)
        && c[i - 2].body_top() < c[i - 3].open
        && c[i - 1].body_top() < c[i - 2].body_top()
        && c[i].open > c[i - 1].close
        && c[i].close > reaction_high;
    signal(hit, BULLISH)
}

/// Rising (white first) or falling (black first) three methods
pub fn rise_fall_three_methods(c: &Candles, i: usize) -> i32 {
    let color = c.color(i - 4);
    let dir = color as f64;
    let first = &c[i - 4];
    let within_first = |k: usize| c[k].body_bottom() < first.high && c[k].body_top() > first.low;
    let hit = c.long_body(i - 4)
        && (i - 3..i).all(|k| c.short_body(k) && c.color(k) == -color && within_first(k))
        && c.long_body(i)
        && c.color(i) == color
        && c[i - 2].close * dir < c[i - 3].close * dir
        && c[i - 1].close * dir < c[i - 2].close * dir
        && c[i].open * dir > c[i - 1].close * dir
        && c[i].close * dir > first.close * dir;
    signal(hit, color * BULLISH)
}
