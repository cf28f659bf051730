//! Candlestick pattern recognizers
//!
//! Sixty-one TA-Lib compatible recognizers, each mapping a candle position to a
//! signed strength: +100 bullish, -100 bearish, 0 no pattern. The pattern table
//! below drives the enum, its column names and its dispatch; adding a pattern is
//! one line plus its recognizer function.
//!
//! # Pattern Categories
//!
//! - **Single-bar (17)**: Doji variants, Hammer family, Marubozu, etc.
//! - **Two-bar (17)**: Engulfing, Harami, Piercing, Kicking, Hikkake, etc.
//! - **Three-bar (22)**: Morning/Evening Star, Three Soldiers/Crows, Tasuki gap, etc.
//! - **Multi-bar (5)**: Breakaway, Ladder Bottom, Mat Hold, Rise/Fall Three Methods, etc.

use std::fmt;
use std::str::FromStr;

pub mod helpers;
pub mod multi_bar;
pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

use crate::series::SymbolSeries;
use crate::table::{Column, Table, CLOSE, HIGH, LOW, OPEN};
use crate::{Result, SignalError};
use helpers::{Candle, Candles};

pub const BULLISH: i32 = 100;
pub const BEARISH: i32 = -100;
pub const NONE: i32 = 0;

#[inline]
pub(crate) fn signal(hit: bool, value: i32) -> i32 {
    if hit {
        value
    } else {
        NONE
    }
}

/// Recognizer for the candle at index `i`; callers guarantee `i + 1 >= bars`
pub type Recognizer = fn(&Candles, usize) -> i32;

/// Generate [`CandlePattern`] from `Variant => "COLUMN", bars, recognizer` rows.
macro_rules! candle_patterns {
  ($($variant:ident => $column:literal, $bars:literal, $recognizer:path;)*) => {
    /// One named candlestick pattern
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum CandlePattern {
      $($variant),*
    }

    impl CandlePattern {
      pub const ALL: &'static [CandlePattern] = &[$(CandlePattern::$variant),*];

      /// Output column name, e.g. `CDLENGULFING`
      pub fn column(self) -> &'static str {
        match self {
          $(CandlePattern::$variant => $column),*
        }
      }

      /// Candles the pattern spans
      pub fn bars(self) -> usize {
        match self {
          $(CandlePattern::$variant => $bars),*
        }
      }

      pub fn recognizer(self) -> Recognizer {
        match self {
          $(CandlePattern::$variant => $recognizer),*
        }
      }
    }
  };
}

candle_patterns! {
    TwoCrows => "CDL2CROWS", 3, three_bar::two_crows;
    ThreeBlackCrows => "CDL3BLACKCROWS", 4, three_bar::three_black_crows;
    ThreeInside => "CDL3INSIDE", 3, three_bar::three_inside;
    ThreeLineStrike => "CDL3LINESTRIKE", 4, three_bar::three_line_strike;
    ThreeOutside => "CDL3OUTSIDE", 3, three_bar::three_outside;
    ThreeStarsInSouth => "CDL3STARSINSOUTH", 3, three_bar::three_stars_in_south;
    ThreeWhiteSoldiers => "CDL3WHITESOLDIERS", 3, three_bar::three_white_soldiers;
    AbandonedBaby => "CDLABANDONEDBABY", 3, three_bar::abandoned_baby;
    AdvanceBlock => "CDLADVANCEBLOCK", 3, three_bar::advance_block;
    BeltHold => "CDLBELTHOLD", 1, single_bar::belt_hold;
    Breakaway => "CDLBREAKAWAY", 5, multi_bar::breakaway;
    ClosingMarubozu => "CDLCLOSINGMARUBOZU", 1, single_bar::closing_marubozu;
    ConcealingBabySwallow => "CDLCONCEALBABYSWALL", 4, multi_bar::concealing_baby_swallow;
    Counterattack => "CDLCOUNTERATTACK", 2, two_bar::counterattack;
    DarkCloudCover => "CDLDARKCLOUDCOVER", 2, two_bar::dark_cloud_cover;
    Doji => "CDLDOJI", 1, single_bar::doji;
    DojiStar => "CDLDOJISTAR", 2, two_bar::doji_star;
    DragonflyDoji => "CDLDRAGONFLYDOJI", 1, single_bar::dragonfly_doji;
    Engulfing => "CDLENGULFING", 2, two_bar::engulfing;
    EveningDojiStar => "CDLEVENINGDOJISTAR", 3, three_bar::evening_doji_star;
    EveningStar => "CDLEVENINGSTAR", 3, three_bar::evening_star;
    GapSideSideWhite => "CDLGAPSIDESIDEWHITE", 3, three_bar::gap_side_side_white;
    GravestoneDoji => "CDLGRAVESTONEDOJI", 1, single_bar::gravestone_doji;
    Hammer => "CDLHAMMER", 2, single_bar::hammer;
    HangingMan => "CDLHANGINGMAN", 2, single_bar::hanging_man;
    Harami => "CDLHARAMI", 2, two_bar::harami;
    HaramiCross => "CDLHARAMICROSS", 2, two_bar::harami_cross;
    HighWave => "CDLHIGHWAVE", 1, single_bar::high_wave;
    Hikkake => "CDLHIKKAKE", 3, two_bar::hikkake;
    HikkakeMod => "CDLHIKKAKEMOD", 4, two_bar::hikkake_mod;
    HomingPigeon => "CDLHOMINGPIGEON", 2, two_bar::homing_pigeon;
    IdenticalThreeCrows => "CDLIDENTICAL3CROWS", 3, three_bar::identical_three_crows;
    InNeck => "CDLINNECK", 2, two_bar::in_neck;
    InvertedHammer => "CDLINVERTEDHAMMER", 2, single_bar::inverted_hammer;
    Kicking => "CDLKICKING", 2, two_bar::kicking;
    KickingByLength => "CDLKICKINGBYLENGTH", 2, two_bar::kicking_by_length;
    LadderBottom => "CDLLADDERBOTTOM", 5, multi_bar::ladder_bottom;
    LongLeggedDoji => "CDLLONGLEGGEDDOJI", 1, single_bar::long_legged_doji;
    LongLine => "CDLLONGLINE", 1, single_bar::long_line;
    Marubozu => "CDLMARUBOZU", 1, single_bar::marubozu;
    MatchingLow => "CDLMATCHINGLOW", 2, two_bar::matching_low;
    MatHold => "CDLMATHOLD", 5, multi_bar::mat_hold;
    MorningDojiStar => "CDLMORNINGDOJISTAR", 3, three_bar::morning_doji_star;
    MorningStar => "CDLMORNINGSTAR", 3, three_bar::morning_star;
    OnNeck => "CDLONNECK", 2, two_bar::on_neck;
    Piercing => "CDLPIERCING", 2, two_bar::piercing;
    RickshawMan => "CDLRICKSHAWMAN", 1, single_bar::rickshaw_man;
    RiseFallThreeMethods => "CDLRISEFALL3METHODS", 5, multi_bar::rise_fall_three_methods;
    SeparatingLines => "CDLSEPARATINGLINES", 2, two_bar::separating_lines;
    ShootingStar => "CDLSHOOTINGSTAR", 2, single_bar::shooting_star;
    ShortLine => "CDLSHORTLINE", 1, single_bar::short_line;
    SpinningTop => "CDLSPINNINGTOP", 1, single_bar::spinning_top;
    StalledPattern => "CDLSTALLEDPATTERN", 3, three_bar::stalled_pattern;
    StickSandwich => "CDLSTICKSANDWICH", 3, three_bar::stick_sandwich;
    Takuri => "CDLTAKURI", 1, single_bar::takuri;
    TasukiGap => "CDLTASUKIGAP", 3, three_bar::tasuki_gap;
    Thrusting => "CDLTHRUSTING", 2, two_bar::thrusting;
    Tristar => "CDLTRISTAR", 3, three_bar::tristar;
    UniqueThreeRiver => "CDLUNIQUE3RIVER", 3, three_bar::unique_three_river;
    UpsideGapTwoCrows => "CDLUPSIDEGAP2CROWS", 3, three_bar::upside_gap_two_crows;
    XSideGapThreeMethods => "CDLXSIDEGAP3METHODS", 3, three_bar::xside_gap_three_methods;
}

impl CandlePattern {
    /// Strength at every candle; positions the pattern cannot span yet are 0
    pub fn scan(self, candles: &Candles) -> Vec<i32> {
        let (bars, recognize) = (self.bars(), self.recognizer());
        (0..candles.len())
            .map(|i| if i + 1 >= bars { recognize(candles, i) } else { NONE })
            .collect()
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for CandlePattern {
    type Err = SignalError;

    /// Accepts the column name, with or without the `CDL` prefix, any case
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let key = upper.strip_prefix("CDL").unwrap_or(&upper);
        CandlePattern::ALL
            .iter()
            .copied()
            .find(|p| &p.column()[3..] == key)
            .ok_or_else(|| SignalError::UnknownName {
                kind: "candle pattern",
                name: s.to_string(),
            })
    }
}

/// Build candles from a series; every OHLC value must be present
pub fn candles_of(series: &SymbolSeries, name: &str) -> Result<Candles> {
    series.require(name, &[OPEN, HIGH, LOW, CLOSE])?;
    let (o, h, l, c) = (
        series.floats(OPEN)?,
        series.floats(HIGH)?,
        series.floats(LOW)?,
        series.floats(CLOSE)?,
    );
    let bars = (0..series.len())
        .map(|i| match (o[i], h[i], l[i], c[i]) {
            (Some(open), Some(high), Some(low), Some(close)) => Ok(Candle { open, high, low, close }),
            _ => Err(SignalError::computation(
                name,
                format!("{}: incomplete OHLC on {}", series.symbol(), series.dates()[i]),
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Candles::new(bars))
}

/// One `CDL*` column per pattern
pub fn pattern_recognition(series: &SymbolSeries, name: &str) -> Result<Table> {
    let candles = candles_of(series, name)?;
    let mut out = series.derive(name)?;
    for pattern in CandlePattern::ALL {
        let values = pattern.scan(&candles).into_iter().map(|v| Some(i64::from(v))).collect();
        out.push_column(Column::int(pattern.column(), values))?;
    }
    Ok(out)
}
