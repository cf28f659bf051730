//! Single-candle recognizers (the hammer family looks one bar back for its trend test)
//!
//! TA-Lib patterns: CDLDOJI, CDLDRAGONFLYDOJI, CDLGRAVESTONEDOJI, CDLLONGLEGGEDDOJI,
//! CDLRICKSHAWMAN, CDLTAKURI, CDLHAMMER, CDLHANGINGMAN, CDLINVERTEDHAMMER,
//! CDLSHOOTINGSTAR, CDLMARUBOZU, CDLCLOSINGMARUBOZU, CDLLONGLINE, CDLSHORTLINE,
//! CDLSPINNINGTOP, CDLHIGHWAVE, CDLBELTHOLD

use super::helpers::Candles;
use super::{signal, BEARISH, BULLISH, NONE};
use crate::OHLCVExt;

// ============================================================
// DOJI FAMILY
// ============================================================

pub fn doji(c: &Candles, i: usize) -> i32 {
    signal(c.doji(i), BULLISH)
}

pub fn dragonfly_doji(c: &Candles, i: usize) -> i32 {
    signal(c.doji(i) && c.upper_very_short(i) && !c.lower_very_short(i), BULLISH)
}

pub fn gravestone_doji(c: &Candles, i: usize) -> i32 {
    signal(c.doji(i) && c.lower_very_short(i) && !c.upper_very_short(i), BULLISH)
}

pub fn long_legged_doji(c: &Candles, i: usize) -> i32 {
    signal(c.doji(i) && (c.lower_long(i) || c.upper_long(i)), BULLISH)
}

/// Long-legged doji with the body near the middle of the range
pub fn rickshaw_man(c: &Candles, i: usize) -> i32 {
    let b = &c[i];
    let mid = b.low + b.range() / 2.0;
    let near = c.near(i);
    let centered = b.body_bottom() <= mid + near && b.body_top() >= mid - near;
    signal(c.doji(i) && c.lower_long(i) && c.upper_long(i) && centered, BULLISH)
}

pub fn takuri(c: &Candles, i: usize) -> i32 {
    signal(c.doji(i) && c.upper_very_short(i) && c.lower_very_long(i), BULLISH)
}

// ============================================================
// HAMMER FAMILY
// ============================================================

fn hammer_shape(c: &Candles, i: usize) -> bool {
    c.short_body(i) && c.lower_long(i) && c.upper_very_short(i)
}

fn inverted_shape(c: &Candles, i: usize) -> bool {
    c.short_body(i) && c.upper_long(i) && c.lower_very_short(i)
}

/// Hammer whose body sits at or below the prior low
pub fn hammer(c: &Candles, i: usize) -> i32 {
    signal(hammer_shape(c, i) && c[i].body_bottom() <= c[i - 1].low + c.near(i - 1), BULLISH)
}

/// Hammer shape at or above the prior high
pub fn hanging_man(c: &Candles, i: usize) -> i32 {
    signal(hammer_shape(c, i) && c[i].body_bottom() >= c[i - 1].high - c.near(i - 1), BEARISH)
}

pub fn inverted_hammer(c: &Candles, i: usize) -> i32 {
    signal(inverted_shape(c, i) && c[i].body_top() < c[i - 1].body_bottom(), BULLISH)
}

pub fn shooting_star(c: &Candles, i: usize) -> i32 {
    signal(inverted_shape(c, i) && c[i].body_bottom() > c[i - 1].body_top(), BEARISH)
}

// ============================================================
// BODY SHAPES (signed by candle color)
// ============================================================

fn colored(c: &Candles, i: usize, hit: bool) -> i32 {
    if hit {
        c.color(i) * BULLISH
    } else {
        NONE
    }
}

pub fn marubozu(c: &Candles, i: usize) -> i32 {
    colored(c, i, c.marubozu(i))
}

/// Long body with no shadow on the closing side
pub fn closing_marubozu(c: &Candles, i: usize) -> i32 {
    let closing_side = if c.color(i) > 0 { c.upper_very_short(i) } else { c.lower_very_short(i) };
    colored(c, i, c.long_body(i) && closing_side)
}

pub fn long_line(c: &Candles, i: usize) -> i32 {
    colored(c, i, c.long_body(i) && c.upper_short(i) && c.lower_short(i))
}

pub fn short_line(c: &Candles, i: usize) -> i32 {
    colored(c, i, c.short_body(i) && c.upper_short(i) && c.lower_short(i))
}

pub fn spinning_top(c: &Candles, i: usize) -> i32 {
    colored(c, i, c.short_body(i) && c.upper_long(i) && c.lower_long(i))
}

pub fn high_wave(c: &Candles, i: usize) -> i32 {
    colored(c, i, c.short_body(i) && c.upper_very_long(i) && c.lower_very_long(i))
}

/// Long body with no shadow on the opening side
pub fn belt_hold(c: &Candles, i: usize) -> i32 {
    let opening_side = if c.color(i) > 0 { c.lower_very_short(i) } else { c.upper_very_short(i) };
    colored(c, i, c.long_body(i) && opening_side)
}
