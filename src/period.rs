//! Bar granularity and daily-to-period resampling

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::{Bar, SignalError};

/// Granularity of bars; every computation is scoped to one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Period {
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "W")]
    Weekly,
    #[serde(rename = "M")]
    Monthly,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Daily, Period::Weekly, Period::Monthly];

    /// Storage code: "D", "W" or "M"
    #[inline]
    pub fn code(self) -> &'static str {
        match self {
            Period::Daily => "D",
            Period::Weekly => "W",
            Period::Monthly => "M",
        }
    }

    /// Key of a named table at the storage boundary: `signals/{code}/{name}`
    pub fn storage_key(self, name: &str) -> String {
        format!("signals/{}/{}", self.code(), name)
    }

    /// Bucket a date falls into for this period
    fn bucket(self, date: NaiveDate) -> (i32, u32) {
        match self {
            Period::Daily => (date.year(), date.ordinal()),
            Period::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            Period::Monthly => (date.year(), date.month()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Period {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" | "DAILY" | "1D" => Ok(Period::Daily),
            "W" | "WEEKLY" | "1WK" => Ok(Period::Weekly),
            "M" | "MONTHLY" | "1MO" => Ok(Period::Monthly),
            _ => Err(SignalError::UnknownName {
                kind: "period",
                name: s.to_string(),
            }),
        }
    }
}

/// Aggregate daily bars into `period` bars, per symbol.
///
/// Open is the first open, close the last close, high/low the extremes and
/// volume the sum. The bucket is dated by its last trading day. Output is
/// sorted by (symbol, Date).
pub fn resample(bars: &[Bar], period: Period) -> Vec<Bar> {
    let mut by_symbol: BTreeMap<&str, Vec<&Bar>> = BTreeMap::new();
    for bar in bars {
        by_symbol.entry(bar.symbol.as_str()).or_default().push(bar);
    }

    let mut out = Vec::new();
    for (_, mut rows) in by_symbol {
        rows.sort_by_key(|b| b.date);
        let mut current: Option<((i32, u32), Bar)> = None;
        for bar in rows {
            let key = period.bucket(bar.date);
            if let Some((_, agg)) = current.as_mut().filter(|(k, _)| *k == key) {
                agg.date = bar.date;
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
                continue;
            }
            if let Some((_, done)) = current.take() {
                out.push(done);
            }
            current = Some((key, bar.clone()));
        }
        if let Some((_, done)) = current {
            out.push(done);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_codes_round_trip() {
        for p in Period::ALL {
            assert_eq!(p.code().parse::<Period>().unwrap(), p);
        }
        assert!("Q".parse::<Period>().is_err());
        assert_eq!(Period::Weekly.storage_key("macd"), "signals/W/macd");
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Period::Monthly).unwrap(), "\"M\"");
        let p: Period = serde_json::from_str("\"D\"").unwrap();
        assert_eq!(p, Period::Daily);
    }

    #[test]
    fn test_weekly_resample() {
        // Mon 2024-01-08 .. Fri 2024-01-12, then Mon 2024-01-15
        let bars = vec![
            Bar::new(d(2024, 1, 8), "X", 10.0, 12.0, 9.0, 11.0, 100),
            Bar::new(d(2024, 1, 10), "X", 11.0, 15.0, 10.0, 14.0, 200),
            Bar::new(d(2024, 1, 12), "X", 14.0, 14.5, 8.0, 9.0, 300),
            Bar::new(d(2024, 1, 15), "X", 9.0, 10.0, 8.5, 9.5, 50),
        ];
        let weekly = resample(&bars, Period::Weekly);
        assert_eq!(weekly.len(), 2);
        let w = &weekly[0];
        assert_eq!(w.date, d(2024, 1, 12));
        assert_eq!((w.open, w.high, w.low, w.close, w.volume), (10.0, 15.0, 8.0, 9.0, 600));
        assert_eq!(weekly[1].date, d(2024, 1, 15));
    }

    #[test]
    fn test_monthly_resample_per_symbol() {
        let bars = vec![
            Bar::new(d(2024, 1, 30), "B", 1.0, 2.0, 0.5, 1.5, 1),
            Bar::new(d(2024, 1, 2), "A", 1.0, 2.0, 0.5, 1.5, 1),
            Bar::new(d(2024, 2, 1), "A", 1.5, 3.0, 1.0, 2.5, 1),
            Bar::new(d(2024, 1, 31), "A", 1.5, 2.2, 1.2, 2.0, 1),
        ];
        let monthly = resample(&bars, Period::Monthly);
        let a: Vec<_> = monthly.iter().filter(|b| b.symbol == "A").collect();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].date, d(2024, 1, 31));
        assert_eq!(a[0].close, 2.0);
        assert_eq!(monthly.iter().filter(|b| b.symbol == "B").count(), 1);
    }

    #[test]
    fn test_daily_is_identity() {
        let bars = vec![
            Bar::new(d(2024, 1, 2), "A", 1.0, 2.0, 0.5, 1.5, 1),
            Bar::new(d(2024, 1, 3), "A", 1.5, 3.0, 1.0, 2.5, 1),
        ];
        assert_eq!(resample(&bars, Period::Daily), bars);
    }
}
