//! Candle settings shared by the recognizers
//!
//! TA-Lib compatible thresholds. Body and shadow sizes are judged against the
//! average of the bars *before* the evaluated candle; the first bar of a series
//! is judged against itself.

use std::ops::Index;

use crate::{OHLCVExt, OHLCV};

// ============================================================
// TA-Lib THRESHOLDS
// ============================================================

/// Trailing bars averaged for body, doji, and shadow settings
pub const AVG_PERIOD: usize = 10;
/// Trailing bars averaged for near / far / equal
pub const DISTANCE_PERIOD: usize = 5;

/// Body is doji-like: body <= avg_range * DOJI_FACTOR
pub const DOJI_FACTOR: f64 = 0.1;
/// Shadow very long: shadow > body * SHADOW_VERYLONG_FACTOR
pub const SHADOW_VERYLONG_FACTOR: f64 = 2.0;
/// Shadow very short: shadow < avg_range * SHADOW_VERYSHORT_FACTOR
pub const SHADOW_VERYSHORT_FACTOR: f64 = 0.1;
pub const EQUAL_FACTOR: f64 = 0.05;
pub const NEAR_FACTOR: f64 = 0.2;
pub const FAR_FACTOR: f64 = 0.6;

// Ratio fallbacks when the trailing average is zero (flat history)
pub const DOJI_RATIO: f64 = 0.1;
pub const BODY_SHORT_RATIO: f64 = 0.3;
pub const BODY_LONG_RATIO: f64 = 0.7;
pub const SHADOW_SHORT_RATIO: f64 = 0.1;

// ============================================================
// COMPARISONS
// ============================================================

/// Zero body is always a doji
#[inline]
pub fn is_doji(body: f64, avg_range: f64, range: f64) -> bool {
    if body <= 0.0 {
        return true;
    }
    if avg_range > 0.0 {
        body <= avg_range * DOJI_FACTOR
    } else {
        range > 0.0 && body / range <= DOJI_RATIO
    }
}

#[inline]
pub fn is_body_short(body: f64, avg_body: f64, range: f64) -> bool {
    if avg_body > 0.0 {
        body < avg_body
    } else {
        range > 0.0 && body / range <= BODY_SHORT_RATIO
    }
}

#[inline]
pub fn is_body_long(body: f64, avg_body: f64, range: f64) -> bool {
    if avg_body > 0.0 {
        body > avg_body
    } else {
        range > 0.0 && body / range >= BODY_LONG_RATIO
    }
}

/// Compared with the candle's own body, so any shadow is long on a zero body
#[inline]
pub fn is_shadow_long(shadow: f64, body: f64) -> bool {
    shadow > body
}

#[inline]
pub fn is_shadow_verylong(shadow: f64, body: f64) -> bool {
    shadow > body * SHADOW_VERYLONG_FACTOR
}

/// `avg_shadow` is the trailing mean of (upper + lower) / 2
#[inline]
pub fn is_shadow_short(shadow: f64, avg_shadow: f64, range: f64) -> bool {
    if avg_shadow > 0.0 {
        shadow < avg_shadow
    } else {
        range > 0.0 && shadow / range <= SHADOW_SHORT_RATIO
    }
}

#[inline]
pub fn is_shadow_very_short(shadow: f64, avg_range: f64, range: f64) -> bool {
    if avg_range > 0.0 {
        shadow < avg_range * SHADOW_VERYSHORT_FACTOR
    } else {
        range > 0.0 && shadow / range <= SHADOW_SHORT_RATIO
    }
}

// ============================================================
// CANDLES
// ============================================================

/// One complete OHLC candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        0.0
    }
}

/// Real-body gap up from `a` to `b`
#[inline]
pub fn gap_up(a: &Candle, b: &Candle) -> bool {
    b.body_bottom() > a.body_top()
}

/// Real-body gap down from `a` to `b`
#[inline]
pub fn gap_down(a: &Candle, b: &Candle) -> bool {
    b.body_top() < a.body_bottom()
}

/// A symbol's candles with prefix sums for the trailing averages
#[derive(Debug, Clone)]
pub struct Candles {
    bars: Vec<Candle>,
    body: Vec<f64>,
    range: Vec<f64>,
    shadows: Vec<f64>,
}

fn prefix_sums(bars: &[Candle], f: impl Fn(&Candle) -> f64) -> Vec<f64> {
    let mut sums = Vec::with_capacity(bars.len() + 1);
    sums.push(0.0);
    let mut acc = 0.0;
    for bar in bars {
        acc += f(bar);
        sums.push(acc);
    }
    sums
}

impl Candles {
    pub fn new(bars: Vec<Candle>) -> Self {
        Self {
            body: prefix_sums(&bars, |b| b.body()),
            range: prefix_sums(&bars, |b| b.range()),
            shadows: prefix_sums(&bars, |b| b.upper_shadow() + b.lower_shadow()),
            bars,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Mean of `bars[at-period..at]`, or bar `at` itself when nothing precedes it
    fn trailing(prefix: &[f64], at: usize, period: usize) -> f64 {
        let start = at.saturating_sub(period);
        if start == at {
            return prefix[at + 1] - prefix[at];
        }
        (prefix[at] - prefix[start]) / (at - start) as f64
    }

    #[inline]
    pub fn avg_body(&self, at: usize) -> f64 {
        Self::trailing(&self.body, at, AVG_PERIOD)
    }

    #[inline]
    pub fn avg_range(&self, at: usize) -> f64 {
        Self::trailing(&self.range, at, AVG_PERIOD)
    }

    #[inline]
    pub fn avg_shadow(&self, at: usize) -> f64 {
        Self::trailing(&self.shadows, at, AVG_PERIOD) / 2.0
    }

    #[inline]
    pub fn near(&self, at: usize) -> f64 {
        Self::trailing(&self.range, at, DISTANCE_PERIOD) * NEAR_FACTOR
    }

    #[inline]
    pub fn far(&self, at: usize) -> f64 {
        Self::trailing(&self.range, at, DISTANCE_PERIOD) * FAR_FACTOR
    }

    #[inline]
    pub fn equal(&self, at: usize) -> f64 {
        Self::trailing(&self.range, at, DISTANCE_PERIOD) * EQUAL_FACTOR
    }

    // ---- per-candle settings ----

    #[inline]
    pub fn color(&self, i: usize) -> i32 {
        self.bars[i].color()
    }

    pub fn doji(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_doji(b.body(), self.avg_range(i), b.range())
    }

    pub fn long_body(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_body_long(b.body(), self.avg_body(i), b.range())
    }

    pub fn short_body(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_body_short(b.body(), self.avg_body(i), b.range())
    }

    pub fn upper_long(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_long(b.upper_shadow(), b.body())
    }

    pub fn lower_long(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_long(b.lower_shadow(), b.body())
    }

    pub fn upper_very_long(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_verylong(b.upper_shadow(), b.body())
    }

    pub fn lower_very_long(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_verylong(b.lower_shadow(), b.body())
    }

    pub fn upper_short(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_short(b.upper_shadow(), self.avg_shadow(i), b.range())
    }

    pub fn lower_short(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_short(b.lower_shadow(), self.avg_shadow(i), b.range())
    }

    pub fn upper_very_short(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_very_short(b.upper_shadow(), self.avg_range(i), b.range())
    }

    pub fn lower_very_short(&self, i: usize) -> bool {
        let b = &self.bars[i];
        is_shadow_very_short(b.lower_shadow(), self.avg_range(i), b.range())
    }

    /// Long body with both shadows very short
    pub fn marubozu(&self, i: usize) -> bool {
        self.long_body(i) && self.upper_very_short(i) && self.lower_very_short(i)
    }
}

impl Index<usize> for Candles {
    type Output = Candle;

    fn index(&self, i: usize) -> &Candle {
        &self.bars[i]
    }
}
