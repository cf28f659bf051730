//! Window primitives shared by the indicator library.
//!
//! All functions work on nullable series and follow the same cold-start rule: a
//! trailing window of `n` yields null until `n` consecutive defined values exist.

/// Apply `f` to every full trailing window of defined values
pub fn rolling<F>(values: &[Option<f64>], window: usize, mut f: F) -> Vec<Option<f64>>
where
    F: FnMut(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let mut buf = Vec::with_capacity(window);
    for end in (window - 1)..values.len() {
        buf.clear();
        buf.extend(values[end + 1 - window..=end].iter().map_while(|v| *v));
        if buf.len() == window {
            out[end] = f(&buf);
        }
    }
    out
}

/// Simple moving average
pub fn sma(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| Some(w.iter().sum::<f64>() / w.len() as f64))
}

/// Population standard deviation over the window
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Some(var.max(0.0).sqrt())
    })
}

pub fn rolling_max(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::max))
}

pub fn rolling_min(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().reduce(f64::min))
}

/// Recursive smoother seeded with the SMA of the first `window` defined values.
/// A null input resets the seed.
fn seeded<F>(values: &[Option<f64>], window: usize, step: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    let (mut sum, mut count) = (0.0, 0usize);

    for v in values {
        let y = match (*v, prev) {
            (None, _) => {
                prev = None;
                sum = 0.0;
                count = 0;
                None
            }
            (Some(x), Some(p)) => Some(step(p, x)),
            (Some(x), None) => {
                sum += x;
                count += 1;
                (count == window).then(|| sum / window as f64)
            }
        };
        if y.is_some() {
            prev = y;
        }
        out.push(y);
    }
    out
}

/// Exponential moving average, alpha = 2 / (window + 1), SMA seeded
pub fn ema(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let alpha = 2.0 / (window as f64 + 1.0);
    seeded(values, window, |prev, x| prev + alpha * (x - prev))
}

/// Wilder smoothing, alpha = 1 / window, SMA seeded
pub fn wilder(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let n = window as f64;
    seeded(values, window, |prev, x| (prev * (n - 1.0) + x) / n)
}

/// Bias-adjusted exponential mean with `alpha`, defined once `min_periods`
/// observations have been seen
pub fn ewm_adjusted(values: &[Option<f64>], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let decay = 1.0 - alpha;
    let (mut num, mut den, mut seen) = (0.0, 0.0, 0usize);
    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            num = x + decay * num;
            den = 1.0 + decay * den;
            seen += 1;
            (seen >= min_periods && den > 0.0).then(|| num / den)
        })
        .collect()
}

/// `a / b`, null when either side is null or `b` is zero
#[inline]
pub fn ratio(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) if b != 0.0 => Some(a / b),
        _ => None,
    }
}

/// Element-wise binary operation over two nullable series
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}

/// True range; the first bar falls back to high - low
pub fn true_range(high: &[Option<f64>], low: &[Option<f64>], close: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..high.len())
        .map(|i| {
            let (h, l) = (high[i]?, low[i]?);
            let hl = h - l;
            match i.checked_sub(1).and_then(|p| close[p]) {
                Some(pc) => Some(hl.max((h - pc).abs()).max((pc - l).abs())),
                None => Some(hl),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    fn some(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().map(|x| Some(*x)).collect()
    }

    fn assert_approx(actual: Option<f64>, expected: f64) {
        let a = actual.expect("expected a value");
        assert!((a - expected).abs() < EPS, "expected {expected}, got {a}");
    }

    #[test]
    fn test_sma_cold_start() {
        let out = sma(&some(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_approx(out[2], 2.0);
        assert_approx(out[4], 4.0);
    }

    #[test]
    fn test_sma_window_longer_than_series() {
        assert!(sma(&some(&[1.0, 2.0]), 3).iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_null_inside_window() {
        let v = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let out = sma(&v, 2);
        assert_eq!(out[1], None);
        assert_eq!(out[2], None);
        assert_approx(out[3], 3.5);
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let out = ema(&some(&[2.0, 4.0, 6.0, 8.0]), 3);
        assert_eq!(out[1], None);
        assert_approx(out[2], 4.0);
        // alpha = 0.5: 4 + 0.5 * (8 - 4)
        assert_approx(out[3], 6.0);
    }

    #[test]
    fn test_wilder() {
        let out = wilder(&some(&[1.0, 3.0, 5.0]), 2);
        assert_approx(out[1], 2.0);
        assert_approx(out[2], 3.5);
    }

    #[test]
    fn test_rolling_std_population() {
        let out = rolling_std(&some(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 8);
        assert_approx(out[7], 2.0);
    }

    #[test]
    fn test_ewm_adjusted_min_periods() {
        let out = ewm_adjusted(&some(&[1.0, 1.0, 1.0]), 0.5, 2);
        assert_eq!(out[0], None);
        assert_approx(out[1], 1.0);
        // weights 1, 0.5 over values 4, 1
        let out = ewm_adjusted(&some(&[1.0, 4.0]), 0.5, 1);
        assert_approx(out[1], (4.0 + 0.5) / 1.5);
    }

    #[test]
    fn test_true_range() {
        let h = some(&[10.0, 12.0]);
        let l = some(&[8.0, 11.0]);
        let c = some(&[9.0, 11.5]);
        let tr = true_range(&h, &l, &c);
        assert_approx(tr[0], 2.0);
        assert_approx(tr[1], 3.0);
    }
}
