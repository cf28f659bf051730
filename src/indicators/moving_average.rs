//! SMA / EMA menus with crossover ratio pairs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::indicators::rolling::{ema, ratio, sma};
use crate::series::SymbolSeries;
use crate::streak::{side_of, threshold_streak};
use crate::table::{Column, Table, CLOSE};
use crate::{Result, SignalError, Window};

/// Moving-average family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    Sma,
    Ema,
}

impl MaKind {
    #[inline]
    pub fn prefix(self) -> &'static str {
        match self {
            MaKind::Sma => "sma",
            MaKind::Ema => "ema",
        }
    }

    /// Column holding the average over `window`, e.g. `sma_20`
    pub fn column(self, window: usize) -> String {
        format!("{}_{}", self.prefix(), window)
    }

    fn smooth(self, values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        match self {
            MaKind::Sma => sma(values, window),
            MaKind::Ema => ema(values, window),
        }
    }
}

/// A (fast, slow) window pair; string column keys only exist at the table boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaPair {
    pub kind: MaKind,
    pub fast: Window,
    pub slow: Window,
}

impl MaPair {
    pub fn new(kind: MaKind, fast: usize, slow: usize) -> Result<Self> {
        let (fast, slow) = (Window::new(fast)?, Window::new(slow)?);
        if fast >= slow {
            return Err(SignalError::InvalidConfig(format!(
                "{} pair needs fast < slow, got {}/{}",
                kind.prefix(),
                fast.get(),
                slow.get()
            )));
        }
        Ok(Self { kind, fast, slow })
    }

    fn stem(&self) -> String {
        format!("{}_{}_{}", self.kind.prefix(), self.fast.get(), self.slow.get())
    }

    /// `fast / slow` ratio column
    pub fn ratio_column(&self) -> String {
        format!("{}_ratio", self.stem())
    }

    /// +1 while the ratio is above 1.0, else -1
    pub fn trend_column(&self) -> String {
        format!("{}_trend", self.stem())
    }

    /// Streak of the ratio staying on one side of 1.0
    pub fn streak_column(&self) -> String {
        format!("{}_streak", self.stem())
    }
}

impl fmt::Display for MaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem())
    }
}

impl FromStr for MaPair {
    type Err = SignalError;

    /// Parses `sma_5_20` / `ema_10_50`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let unknown = || SignalError::UnknownName {
            kind: "moving-average pair",
            name: s.to_string(),
        };
        let mut parts = s.split('_');
        let kind = match parts.next() {
            Some("sma") => MaKind::Sma,
            Some("ema") => MaKind::Ema,
            _ => return Err(unknown()),
        };
        let fast = parts.next().and_then(|p| p.parse().ok()).ok_or_else(unknown)?;
        let slow = parts.next().and_then(|p| p.parse().ok()).ok_or_else(unknown)?;
        if parts.next().is_some() {
            return Err(unknown());
        }
        MaPair::new(kind, fast, slow)
    }
}

/// Moving averages of Close for every window, plus ratio / trend / streak per pair
pub fn moving_averages(
    series: &SymbolSeries,
    name: &str,
    kind: MaKind,
    windows: &[Window],
    pairs: &[(Window, Window)],
) -> Result<Table> {
    series.require(name, &[CLOSE])?;
    let close = series.floats(CLOSE)?;

    let mut out = series.derive(name)?;
    let mut averages: HashMap<usize, Vec<Option<f64>>> = HashMap::new();
    for w in windows {
        let w = w.get();
        if averages.contains_key(&w) {
            continue;
        }
        let avg = kind.smooth(&close, w);
        out.push_column(Column::float(kind.column(w), avg.clone()))?;
        averages.insert(w, avg);
    }

    for (fast, slow) in pairs {
        let pair = MaPair::new(kind, fast.get(), slow.get())?;
        let fast_avg = averages
            .entry(fast.get())
            .or_insert_with(|| kind.smooth(&close, fast.get()))
            .clone();
        let slow_avg = averages
            .entry(slow.get())
            .or_insert_with(|| kind.smooth(&close, slow.get()));
        let ratios: Vec<Option<f64>> = fast_avg
            .iter()
            .zip(slow_avg.iter())
            .map(|(a, b)| ratio(*a, *b))
            .collect();

        out.push_column(Column::int(pair.trend_column(), side_of(&ratios, 1.0)))?;
        out.push_column(Column::int(pair.streak_column(), threshold_streak(&ratios, 1.0)))?;
        out.push_column(Column::float(pair.ratio_column(), ratios))?;
    }
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
            .map(|(i, c)| Bar::new(start + chrono::Days::new(i as u64), "T", *c, *c, *c, *c, 1))
            .collect();
        SymbolSeries::from_bars(&bars).unwrap()
    }

    fn w(n: usize) -> Window {
        Window::new(n).unwrap()
    }

    #[test]
    fn test_pair_names_and_parse() {
        let pair: MaPair = "sma_5_20".parse().unwrap();
        assert_eq!(pair, MaPair::new(MaKind::Sma, 5, 20).unwrap());
        assert_eq!(pair.ratio_column(), "sma_5_20_ratio");
        assert_eq!(pair.streak_column(), "sma_5_20_streak");
        assert!("sma_20_5".parse::<MaPair>().is_err());
        assert!("wma_5_20".parse::<MaPair>().is_err());
        assert!("sma_5".parse::<MaPair>().is_err());
    }

    #[test]
    fn test_sma_20_cold_start() {
        let short = series(&[1.0; 10]);
        let t = moving_averages(&short, "sma", MaKind::Sma, &[w(20)], &[]).unwrap();
        assert!((0..10).all(|r| t.column("sma_20").unwrap().is_null(r)));

        let long = series(&[1.0; 25]);
        let t = moving_averages(&long, "sma", MaKind::Sma, &[w(20)], &[]).unwrap();
        let col = t.column("sma_20").unwrap();
        assert!((0..19).all(|r| col.is_null(r)));
        assert!((19..25).all(|r| col.get_f64(r) == Some(1.0)));
    }

    #[test]
    fn test_ratio_streak_tracks_crossover() {
        // rising then falling prices: fast crosses above then below slow
        let closes: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).chain((0..10).map(|i| 19.0 - 2.0 * i as f64)).collect();
        let t = moving_averages(&series(&closes), "sma", MaKind::Sma, &[w(2), w(4)], &[(w(2), w(4))]).unwrap();
        let trend = t.column("sma_2_4_trend").unwrap();
        let streak = t.column("sma_2_4_streak").unwrap();
        assert_eq!(trend.get_i64(3), Some(1));
        assert_eq!(streak.get_i64(3), Some(1));
        assert_eq!(streak.get_i64(5), Some(3));
        assert_eq!(trend.get_i64(19), Some(-1));
        assert!(streak.is_null(2));
    }

    #[test]
    fn test_output_has_only_own_columns() {
        let t = moving_averages(&series(&[1.0; 5]), "ema", MaKind::Ema, &[w(2)], &[]).unwrap();
        assert_eq!(t.column_names(), vec!["Date", "symbol", "ema_2"]);
    }
}
