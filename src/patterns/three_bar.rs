//! Three-candle recognizers (three black crows and three-line strike read a fourth)
//!
//! TA-Lib patterns: CDL2CROWS, CDL3BLACKCROWS, CDL3INSIDE, CDL3OUTSIDE,
//! CDL3LINESTRIKE, CDL3STARSINSOUTH, CDL3WHITESOLDIERS, CDLABANDONEDBABY,
//! CDLADVANCEBLOCK, CDLSTALLEDPATTERN, CDLMORNINGSTAR, CDLEVENINGSTAR,
//! CDLMORNINGDOJISTAR, CDLEVENINGDOJISTAR, CDLIDENTICAL3CROWS, CDLSTICKSANDWICH,
//! CDLTASUKIGAP, CDLTRISTAR, CDLUNIQUE3RIVER, CDLUPSIDEGAP2CROWS,
//! CDLXSIDEGAP3METHODS, CDLGAPSIDESIDEWHITE

use super::helpers::{gap_down, gap_up, Candles};
use super::{signal, BEARISH, BULLISH, NONE};
use crate::OHLCVExt;

/// Star penetration into the first body
const STAR_PENETRATION: f64 = 0.3;

pub fn two_crows(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let hit = c.color(i - 2) > 0
        && c.long_body(i - 2)
        && c.color(i - 1) < 0
        && gap_up(a, b)
        && c.color(i) < 0
        && d.open < b.open
        && d.open > b.close
        && d.close > a.open
        && d.close < a.close;
    signal(hit, BEARISH)
}

pub fn three_black_crows(c: &Candles, i: usize) -> i32 {
    let hit = c.color(i - 3) > 0
        && (i - 2..=i).all(|k| c.color(k) < 0 && c.lower_very_short(k))
        && c[i - 1].open < c[i - 2].open
        && c[i - 1].open > c[i - 2].close
        && c[i].open < c[i - 1].open
        && c[i].open > c[i - 1].close
        && c[i - 3].high > c[i - 2].close
        && c[i - 2].close > c[i - 1].close
        && c[i - 1].close > c[i].close;
    signal(hit, BEARISH)
}

pub fn three_inside(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let contained = b.body_top() < a.body_top() && b.body_bottom() > a.body_bottom();
    let hit = c.long_body(i - 2)
        && c.short_body(i - 1)
        && contained
        && ((c.color(i - 2) > 0 && c.color(i) < 0 && d.close < a.open)
            || (c.color(i - 2) < 0 && c.color(i) > 0 && d.close > a.open));
    signal(hit, -c.color(i - 2) * BULLISH)
}

pub fn three_outside(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    if c.color(i - 1) > 0 && c.color(i - 2) < 0 && b.close > a.open && b.open < a.close && d.close > b.close {
        BULLISH
    } else if c.color(i - 1) < 0 && c.color(i - 2) > 0 && b.open > a.close && b.close < a.open && d.close < b.close {
        BEARISH
    } else {
        NONE
    }
}

/// Three same-colored candles, each opening within (or near) the previous body,
/// then a fourth that opens beyond and closes back past the first open
pub fn three_line_strike(c: &Candles, i: usize) -> i32 {
    let color = c.color(i - 1);
    if c.color(i - 3) != color || c.color(i - 2) != color || c.color(i) != -color {
        return NONE;
    }
    let opens_within = |k: usize| {
        let near = c.near(k - 1);
        let prev = &c[k - 1];
        c[k].open >= prev.body_bottom() - near && c[k].open <= prev.body_top() + near
    };
    if !(opens_within(i - 2) && opens_within(i - 1)) {
        return NONE;
    }
    let (first, third, fourth) = (&c[i - 3], &c[i - 1], &c[i]);
    let hit = if color > 0 {
        third.close > c[i - 2].close
            && c[i - 2].close > first.close
            && fourth.open > third.close
            && fourth.close < first.open
    } else {
        third.close < c[i - 2].close
            && c[i - 2].close < first.close
            && fourth.open < third.close
            && fourth.close > first.open
    };
    signal(hit, color * BULLISH)
}

pub fn three_stars_in_south(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let hit = (i - 2..=i).all(|k| c.color(k) < 0)
        && c.long_body(i - 2)
        && c.lower_long(i - 2)
        && b.body() < a.body()
        && b.open > a.close
        && b.open <= a.high
        && b.low < a.close
        && b.low >= a.low
        && !c.lower_very_short(i - 1)
        && c.short_body(i)
        && c.upper_very_short(i)
        && c.lower_very_short(i)
        && d.low > b.low
        && d.high < b.high;
    signal(hit, BULLISH)
}

pub fn three_white_soldiers(c: &Candles, i: usize) -> i32 {
    let hit = (i - 2..=i).all(|k| c.color(k) > 0 && c.upper_very_short(k))
        && c[i].close > c[i - 1].close
        && c[i - 1].close > c[i - 2].close
        && c[i - 1].open > c[i - 2].open
        && c[i - 1].open <= c[i - 2].close + c.near(i - 2)
        && c[i].open > c[i - 1].open
        && c[i].open <= c[i - 1].close + c.near(i - 1)
        && c[i - 1].body() > c[i - 2].body() - c.far(i - 2)
        && c[i].body() > c[i - 1].body() - c.far(i - 1)
        && !c.short_body(i);
    signal(hit, BULLISH)
}

pub fn abandoned_baby(c: &Candles, i: usize) -> i32 {
    if !(c.long_body(i - 2) && c.doji(i - 1) && !c.short_body(i)) {
        return NONE;
    }
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let pen = a.body() * STAR_PENETRATION;
    if c.color(i - 2) > 0 && c.color(i) < 0 && d.close < a.close - pen && b.low > a.high && d.high < b.low {
        BEARISH
    } else if c.color(i - 2) < 0 && c.color(i) > 0 && d.close > a.close + pen && b.high < a.low && d.low > b.high {
        BULLISH
    } else {
        NONE
    }
}

/// Three white candles with rising closes, each opening within the prior body
fn rising_three_white(c: &Candles, i: usize) -> bool {
    (i - 2..=i).all(|k| c.color(k) > 0)
        && c[i].close > c[i - 1].close
        && c[i - 1].close > c[i - 2].close
        && c[i - 1].open > c[i - 2].open
        && c[i - 1].open <= c[i - 2].close + c.near(i - 2)
        && c[i].open > c[i - 1].open
        && c[i].open <= c[i - 1].close + c.near(i - 1)
}

pub fn advance_block(c: &Candles, i: usize) -> i32 {
    if !(rising_three_white(c, i) && c.long_body(i - 2) && c.upper_short(i - 2)) {
        return NONE;
    }
    let (b1, b2, b3) = (c[i - 2].body(), c[i - 1].body(), c[i].body());
    let weakening = (b2 < b1 - c.far(i - 2) && b3 < b2 + c.near(i - 1))
        || b3 < b2 - c.far(i - 1)
        || (b3 < b2 && b2 < b1 && (!c.upper_short(i) || !c.upper_short(i - 1)))
        || (b3 < b2 && c.upper_long(i));
    signal(weakening, BEARISH)
}

pub fn stalled_pattern(c: &Candles, i: usize) -> i32 {
    let hit = rising_three_white(c, i)
        && c.long_body(i - 2)
        && c.long_body(i - 1)
        && c.upper_very_short(i - 1)
        && c.short_body(i)
        && c[i].open >= c[i - 1].close - c[i].body() - c.near(i - 1);
    signal(hit, BEARISH)
}

// ============================================================
// STARS
// ============================================================

fn star(c: &Candles, i: usize, middle_is_doji: bool) -> i32 {
    let middle_ok = if middle_is_doji { c.doji(i - 1) } else { c.short_body(i - 1) };
    if !(c.long_body(i - 2) && middle_ok && !c.short_body(i)) {
        return NONE;
    }
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let pen = a.body() * STAR_PENETRATION;
    if c.color(i - 2) < 0 && gap_down(a, b) && c.color(i) > 0 && d.close > a.close + pen {
        BULLISH
    } else if c.color(i - 2) > 0 && gap_up(a, b) && c.color(i) < 0 && d.close < a.close - pen {
        BEARISH
    } else {
        NONE
    }
}

pub fn morning_star(c: &Candles, i: usize) -> i32 {
    star(c, i, false).max(NONE)
}

pub fn evening_star(c: &Candles, i: usize) -> i32 {
    star(c, i, false).min(NONE)
}

pub fn morning_doji_star(c: &Candles, i: usize) -> i32 {
    star(c, i, true).max(NONE)
}

pub fn evening_doji_star(c: &Candles, i: usize) -> i32 {
    star(c, i, true).min(NONE)
}

// ============================================================
// CONTINUATIONS AND REVERSALS
// ============================================================

pub fn identical_three_crows(c: &Candles, i: usize) -> i32 {
    let opens_at_close = |k: usize| (c[k].open - c[k - 1].close).abs() <= c.equal(k - 1);
    let hit = (i - 2..=i).all(|k| c.color(k) < 0 && c.lower_very_short(k))
        && c[i - 2].close > c[i - 1].close
        && c[i - 1].close > c[i].close
        && opens_at_close(i - 1)
        && opens_at_close(i);
    signal(hit, BEARISH)
}

pub fn stick_sandwich(c: &Candles, i: usize) -> i32 {
    let hit = c.color(i - 2) < 0
        && c.color(i - 1) > 0
        && c.color(i) < 0
        && c[i - 1].low > c[i - 2].close
        && (c[i].close - c[i - 2].close).abs() <= c.equal(i - 2);
    signal(hit, BULLISH)
}

pub fn tasuki_gap(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let similar = (b.body() - d.body()).abs() < c.near(i - 1);
    if gap_up(a, b)
        && c.color(i - 1) > 0
        && c.color(i) < 0
        && d.open < b.close
        && d.open > b.open
        && d.close < b.open
        && d.close > a.body_top()
        && similar
    {
        BULLISH
    } else if gap_down(a, b)
        && c.color(i - 1) < 0
        && c.color(i) > 0
        && d.open < b.open
        && d.open > b.close
        && d.close > b.open
        && d.close < a.body_bottom()
        && similar
    {
        BEARISH
    } else {
        NONE
    }
}

/// Three doji, all judged against the range average before the first
pub fn tristar(c: &Candles, i: usize) -> i32 {
    let avg_range = c.avg_range(i - 2);
    let is_doji = |k: usize| super::helpers::is_doji(c[k].body(), avg_range, c[k].range());
    if !(is_doji(i - 2) && is_doji(i - 1) && is_doji(i)) {
        return NONE;
    }
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    if gap_up(a, b) && d.body_top() < b.body_top() {
        BEARISH
    } else if gap_down(a, b) && d.body_bottom() > b.body_bottom() {
        BULLISH
    } else {
        NONE
    }
}

pub fn unique_three_river(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let hit = c.long_body(i - 2)
        && c.color(i - 2) < 0
        && c.color(i - 1) < 0
        && b.close > a.close
        && b.open <= a.open
        && b.low < a.low
        && c.short_body(i)
        && c.color(i) > 0
        && d.open > b.low;
    signal(hit, BULLISH)
}

pub fn upside_gap_two_crows(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let hit = c.color(i - 2) > 0
        && c.long_body(i - 2)
        && c.color(i - 1) < 0
        && c.short_body(i - 1)
        && gap_up(a, b)
        && c.color(i) < 0
        && d.open > b.open
        && d.close < b.close
        && d.close > a.close;
    signal(hit, BEARISH)
}

/// Gap in the trend direction, then an opposite candle closing the gap
pub fn xside_gap_three_methods(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let color = c.color(i - 2);
    let gapped = if color > 0 { gap_up(a, b) } else { gap_down(a, b) };
    let hit = c.color(i - 1) == color
        && c.color(i) == -color
        && d.open < b.body_top()
        && d.open > b.body_bottom()
        && d.close < a.body_top()
        && d.close > a.body_bottom()
        && gapped;
    signal(hit, color * BULLISH)
}

/// Two similar white candles side by side after a gap
pub fn gap_side_side_white(c: &Candles, i: usize) -> i32 {
    let (a, b, d) = (&c[i - 2], &c[i - 1], &c[i]);
    let side_by_side = c.color(i - 1) > 0
        && c.color(i) > 0
        && (d.body() - b.body()).abs() < c.near(i - 1)
        && (d.open - b.open).abs() < c.equal(i - 1);
    if !side_by_side {
        return NONE;
    }
    if gap_up(a, b) && gap_up(a, d) {
        BULLISH
    } else if gap_down(a, b) && gap_down(a, d) {
        BEARISH
    } else {
        NONE
    }
}
