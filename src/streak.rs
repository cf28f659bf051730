//! Run-length counters over categorical state columns.
//!
//! A streak restarts at 1 whenever the state differs from the previous row and
//! increments otherwise. A null state emits a null streak and breaks the run,
//! so the next non-null row always starts again at 1.

/// Run length of each row's state
pub fn streak<T: PartialEq>(states: &[Option<T>]) -> Vec<Option<i64>> {
    states
        .iter()
        .scan(None::<(&T, i64)>, |run, state| {
            let out = match (state.as_ref(), run.take()) {
                (None, _) => None,
                (Some(s), Some((prev, n))) if *prev == *s => {
                    *run = Some((s, n + 1));
                    Some(n + 1)
                }
                (Some(s), _) => {
                    *run = Some((s, 1));
                    Some(1)
                }
            };
            Some(out)
        })
        .collect()
}

/// Streak of the boolean condition `value > threshold`
pub fn threshold_streak(values: &[Option<f64>], threshold: f64) -> Vec<Option<i64>> {
    let states: Vec<Option<bool>> = values.iter().map(|v| v.map(|v| v > threshold)).collect();
    streak(&states)
}

/// +1 above `threshold`, -1 at or below, null on null input
pub fn side_of(values: &[Option<f64>], threshold: f64) -> Vec<Option<i64>> {
    values
        .iter()
        .map(|v| v.map(|v| if v > threshold { 1 } else { -1 }))
        .collect()
}

/// +1 / -1 / 0 versus the previous row; null when either side is null
pub fn direction_vs_prior(values: &[Option<f64>]) -> Vec<Option<i64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for v in values {
        out.push(match (*v, prev) {
            (Some(cur), Some(p)) if cur > p => Some(1),
            (Some(cur), Some(p)) if cur < p => Some(-1),
            (Some(_), Some(_)) => Some(0),
            _ => None,
        });
        prev = *v;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resets_on_change() {
        let s = streak(&[Some(1), Some(1), Some(1), Some(-1), Some(-1), Some(1)]);
        assert_eq!(s, vec![Some(1), Some(2), Some(3), Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn test_null_breaks_streak() {
        let s = streak(&[Some(true), Some(true), None, Some(true), Some(true)]);
        assert_eq!(s, vec![Some(1), Some(2), None, Some(1), Some(2)]);
    }

    #[test]
    fn test_leading_nulls() {
        let s = streak::<i64>(&[None, None, Some(0), Some(0)]);
        assert_eq!(s, vec![None, None, Some(1), Some(2)]);
    }

    #[test]
    fn test_empty() {
        assert!(streak::<i64>(&[]).is_empty());
    }

    #[test]
    fn test_threshold_streak_crossing_one() {
        let ratios = [Some(0.9), Some(1.1), Some(1.2), Some(1.0), Some(0.8)];
        assert_eq!(
            threshold_streak(&ratios, 1.0),
            vec![Some(1), Some(1), Some(2), Some(1), Some(2)]
        );
        assert_eq!(side_of(&ratios, 1.0), vec![Some(-1), Some(1), Some(1), Some(-1), Some(-1)]);
    }

    #[test]
    fn test_direction_vs_prior() {
        let v = [None, Some(1.0), Some(2.0), Some(2.0), Some(1.5)];
        assert_eq!(direction_vs_prior(&v), vec![None, None, Some(1), Some(0), Some(-1)]);
    }
}
