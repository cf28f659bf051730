//! Two-candle recognizers, plus the hikkake setups
//!
//! TA-Lib patterns: CDLENGULFING, CDLHARAMI, CDLHARAMICROSS, CDLPIERCING,
//! CDLDARKCLOUDCOVER, CDLDOJISTAR, CDLCOUNTERATTACK, CDLHOMINGPIGEON, CDLINNECK,
//! CDLONNECK, CDLTHRUSTING, CDLKICKING, CDLKICKINGBYLENGTH, CDLMATCHINGLOW,
//! CDLSEPARATINGLINES, CDLHIKKAKE, CDLHIKKAKEMOD

use super::helpers::{gap_down, gap_up, Candles};
use super::{signal, BEARISH, BULLISH, NONE};
use crate::OHLCVExt;

/// Penetration into the first body for piercing / dark cloud cover
const PENETRATION: f64 = 0.5;

pub fn engulfing(c: &Candles, i: usize) -> i32 {
    let (p, b) = (&c[i - 1], &c[i]);
    if c.color(i) > 0 && c.color(i - 1) < 0 {
        let engulfs = (b.close >= p.open && b.open < p.close) || (b.close > p.open && b.open <= p.close);
        return signal(engulfs, BULLISH);
    }
    if c.color(i) < 0 && c.color(i - 1) > 0 {
        let engulfs = (b.open >= p.close && b.close < p.open) || (b.open > p.close && b.close <= p.open);
        return signal(engulfs, BEARISH);
    }
    NONE
}

fn inside_body(c: &Candles, i: usize) -> bool {
    let (p, b) = (&c[i - 1], &c[i]);
    b.body_top() <= p.body_top() && b.body_bottom() >= p.body_bottom()
}

pub fn harami(c: &Candles, i: usize) -> i32 {
    let hit = c.long_body(i - 1) && c.short_body(i) && inside_body(c, i);
    signal(hit, -c.color(i - 1) * BULLISH)
}

pub fn harami_cross(c: &Candles, i: usize) -> i32 {
    let hit = c.long_body(i - 1) && c.doji(i) && inside_body(c, i);
    signal(hit, -c.color(i - 1) * BULLISH)
}

pub fn piercing(c: &Candles, i: usize) -> i32 {
    let (p, b) = (&c[i - 1], &c[i]);
    let hit = c.color(i - 1) < 0
        && c.long_body(i - 1)
        && c.color(i) > 0
        && c.long_body(i)
        && b.open < p.low
        && b.close < p.open
        && b.close > p.close + p.body() * PENETRATION;
    signal(hit, BULLISH)
}

pub fn dark_cloud_cover(c: &Candles, i: usize) -> i32 {
    let (p, b) = (&c[i - 1], &c[i]);
    let hit = c.color(i - 1) > 0
        && c.long_body(i - 1)
        && c.color(i) < 0
        && b.open > p.high
        && b.close > p.open
        && b.close < p.close - p.body() * PENETRATION;
    signal(hit, BEARISH)
}

pub fn doji_star(c: &Candles, i: usize) -> i32 {
    if !(c.long_body(i - 1) && c.doji(i)) {
        return NONE;
    }
    let (p, b) = (&c[i - 1], &c[i]);
    if c.color(i - 1) > 0 && gap_up(p, b) {
        BEARISH
    } else if c.color(i - 1) < 0 && gap_down(p, b) {
        BULLISH
    } else {
        NONE
    }
}

pub fn counterattack(c: &Candles, i: usize) -> i32 {
    let hit = c.color(i) == -c.color(i - 1)
        && c.long_body(i - 1)
        && c.long_body(i)
        && (c[i].close - c[i - 1].close).abs() <= c.equal(i - 1);
    signal(hit, c.color(i) * BULLISH)
}

pub fn homing_pigeon(c: &Candles, i: usize) -> i32 {
    let (p, b) = (&c[i - 1], &c[i]);
    let hit = c.color(i - 1) < 0
        && c.color(i) < 0
        && c.long_body(i - 1)
        && c.short_body(i)
        && b.open < p.open
        && b.close > p.close;
    signal(hit, BULLISH)
}

/// Long black candle followed by a white candle opening below its low
fn black_then_white_below(c: &Candles, i: usize) -> bool {
    c.color(i - 1) < 0 && c.long_body(i - 1) && c.color(i) > 0 && c[i].open < c[i - 1].low
}

pub fn in_neck(c: &Candles, i: usize) -> i32 {
    let (p, b) = (&c[i - 1], &c[i]);
    let hit = black_then_white_below(c, i) && b.close <= p.close + c.equal(i - 1) && b.close >= p.close;
    signal(hit, BEARISH)
}

pub fn on_neck(c: &Candles, i: usize) -> i32 {
    let (p, b) = (&c[i - 1], &c[i]);
    let eq = c.equal(i - 1);
    let hit = black_then_white_below(c, i) && b.close <= p.low + eq && b.close >= p.low - eq;
    signal(hit, BEARISH)
}

pub fn thrusting(c: &Candles, i: usize) -> i32 {
    let (p, b) = (&c[i - 1], &c[i]);
    let hit = black_then_white_below(c, i)
        && b.close > p.close + c.equal(i - 1)
        && b.close <= p.close + p.body() * 0.5;
    signal(hit, BEARISH)
}

/// Opposite-colored marubozu pair with a full high/low gap between them
fn kicking_pair(c: &Candles, i: usize) -> bool {
    let (p, b) = (&c[i - 1], &c[i]);
    if c.color(i) == c.color(i - 1) || !c.marubozu(i - 1) || !c.marubozu(i) {
        return false;
    }
    if c.color(i - 1) < 0 {
        b.low > p.high
    } else {
        b.high < p.low
    }
}

pub fn kicking(c: &Candles, i: usize) -> i32 {
    signal(kicking_pair(c, i), c.color(i) * BULLISH)
}

/// Direction follows the longer of the two marubozu
pub fn kicking_by_length(c: &Candles, i: usize) -> i32 {
    let longer = if c[i].body() > c[i - 1].body() { i } else { i - 1 };
    signal(kicking_pair(c, i), c.color(longer) * BULLISH)
}

pub fn matching_low(c: &Candles, i: usize) -> i32 {
    let hit = c.color(i - 1) < 0 && c.color(i) < 0 && (c[i].close - c[i - 1].close).abs() <= c.equal(i - 1);
    signal(hit, BULLISH)
}

pub fn separating_lines(c: &Candles, i: usize) -> i32 {
    let opening_side = if c.color(i) > 0 { c.lower_very_short(i) } else { c.upper_very_short(i) };
    let hit = c.color(i) == -c.color(i - 1)
        && (c[i].open - c[i - 1].open).abs() <= c.equal(i - 1)
        && c.long_body(i)
        && opening_side;
    signal(hit, c.color(i) * BULLISH)
}

// ============================================================
// HIKKAKE
// ============================================================
// A setup is an inside bar followed by a breakout bar. The setup bar reports
// the setup direction; a close beyond the inside bar within the next three
// bars reports the confirmation.

const CONFIRMATION_BARS: usize = 3;

/// Direction of a plain hikkake setup ending at `i` (inside bar at `i - 1`)
fn hikkake_setup(c: &Candles, i: usize) -> i32 {
    if i < 2 {
        return NONE;
    }
    let (mother, inside, b) = (&c[i - 2], &c[i - 1], &c[i]);
    if !(inside.high < mother.high && inside.low > mother.low) {
        return NONE;
    }
    if b.high < inside.high && b.low < inside.low {
        BULLISH
    } else if b.high > inside.high && b.low > inside.low {
        BEARISH
    } else {
        NONE
    }
}

/// Modified hikkake: two nested inside bars, the first closing near its extreme
fn hikkake_mod_setup(c: &Candles, i: usize) -> i32 {
    if i < 3 {
        return NONE;
    }
    let (first, second, third, b) = (&c[i - 3], &c[i - 2], &c[i - 1], &c[i]);
    let nested = second.high < first.high
        && second.low > first.low
        && third.high < second.high
        && third.low > second.low;
    if !nested {
        return NONE;
    }
    let near = c.near(i - 2);
    if b.high < third.high && b.low < third.low && second.close <= second.low + near {
        BULLISH
    } else if b.high > third.high && b.low > third.low && second.close >= second.high - near {
        BEARISH
    } else {
        NONE
    }
}

/// Setup at `i`, or the first close through the inside bar of the latest setup in the prior three bars
fn hikkake_with_confirmation(c: &Candles, i: usize, setup: fn(&Candles, usize) -> i32) -> i32 {
    let direction = setup(c, i);
    if direction != NONE {
        return direction;
    }
    let latest = (1..=CONFIRMATION_BARS)
        .filter_map(|k| i.checked_sub(k))
        .map(|j| (j, setup(c, j)))
        .find(|(_, d)| *d != NONE);
    let Some((j, direction)) = latest else {
        return NONE;
    };

    let inside = &c[j - 1];
    let confirms = |m: usize| {
        if direction > 0 {
            c[m].close > inside.high
        } else {
            c[m].close < inside.low
        }
    };
    if confirms(i) && !(j + 1..i).any(confirms) {
        direction
    } else {
        NONE
    }
}

pub fn hikkake(c: &Candles, i: usize) -> i32 {
    hikkake_with_confirmation(c, i, hikkake_setup)
}

pub fn hikkake_mod(c: &Candles, i: usize) -> i32 {
    hikkake_with_confirmation(c, i, hikkake_mod_setup)
}
