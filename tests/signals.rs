//! End-to-end tests: bars in, merged table out, screened.

use chrono::NaiveDate;
use yatas::indicators::heikin_ashi::{HA_CLOSE, HA_OPEN, HA_STREAK, HA_TREND};
use yatas::prelude::*;

fn day(i: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Days::new(i)
}

/// Deterministic wavy bars for several symbols
fn universe(symbols: &[&str], n: u64) -> Vec<Bar> {
    symbols
        .iter()
        .enumerate()
        .flat_map(|(k, sym)| {
            (0..n).map(move |i| {
                let x = i as f64;
                let base = 40.0 + 5.0 * k as f64 + (x * 0.35).sin() * 3.0 + x * 0.05;
                let close = base + (x * 1.7).cos();
                Bar::new(day(i), *sym, base, base.max(close) + 0.8, base.min(close) - 0.8, close, 10_000 + i as i64)
            })
        })
        .collect()
}

fn run(bars: &[Bar]) -> PipelineOutput {
    let pipeline = Pipeline::new(PipelineConfig::builder().workers(2).build().unwrap()).unwrap();
    pipeline.run(Period::Daily, bars).unwrap()
}

#[test]
fn merged_row_count_matches_input() {
    let bars = universe(&["AAA", "BBB", "CCC"], 50);
    let out = run(&bars);
    assert_eq!(out.signals.merged.len(), 150);
    assert_eq!(out.signals.merged.distinct_symbols().unwrap(), vec!["AAA", "BBB", "CCC"]);
    for table in out.signals.tables.values() {
        assert_eq!(table.len(), 150, "{} lost rows", table.name());
    }
}

#[test]
fn sma_cold_start_in_merged_table() {
    let short = run(&universe(&["AAA"], 10));
    let col = short.signals.merged.column("sma_20").unwrap();
    assert!((0..10).all(|r| col.is_null(r)));

    let long = run(&universe(&["AAA"], 25));
    let col = long.signals.merged.column("sma_20").unwrap();
    assert!((0..19).all(|r| col.is_null(r)));
    assert!((19..25).all(|r| col.get_f64(r).is_some()));
}

#[test]
fn heikin_ashi_reference_values() {
    let ohlc = [
        (10.0, 12.0, 9.0, 11.0),
        (11.0, 12.0, 10.0, 9.0),
        (9.0, 10.0, 8.0, 10.0),
        (12.0, 13.0, 11.0, 13.0),
        (13.0, 14.0, 12.0, 12.0),
    ];
    let bars: Vec<Bar> = ohlc
        .iter()
        .enumerate()
        .map(|(i, (o, h, l, c))| Bar::new(day(i as u64), "HA", *o, *h, *l, *c, 1))
        .collect();
    let out = run(&bars);
    let ha = out.signals.tables.get("heikin_ashi").unwrap();
    let open = ha.column(HA_OPEN).unwrap();
    let close = ha.column(HA_CLOSE).unwrap();
    assert_eq!(close.get_f64(0), Some(10.5));
    assert_eq!(open.get_f64(0), Some(10.0));
    assert_eq!(open.get_f64(1), Some(10.25));
}

#[test]
fn ha_streak_round_trip() {
    // three rising HA candles, then a sharp reversal
    let ohlc = [
        (10.0, 12.0, 9.5, 11.5),
        (11.5, 13.0, 11.0, 12.5),
        (12.5, 14.0, 12.0, 13.5),
        (13.0, 13.2, 9.0, 9.5),
    ];
    let bars: Vec<Bar> = ohlc
        .iter()
        .enumerate()
        .map(|(i, (o, h, l, c))| Bar::new(day(i as u64), "TEST", *o, *h, *l, *c, 100))
        .collect();
    let out = run(&bars);
    let merged = &out.signals.merged;

    let trend: Vec<Option<i64>> = (0..4).map(|r| merged.column(HA_TREND).unwrap().get_i64(r)).collect();
    let streak: Vec<Option<i64>> = (0..4).map(|r| merged.column(HA_STREAK).unwrap().get_i64(r)).collect();
    assert_eq!(trend, vec![Some(1), Some(1), Some(1), Some(-1)]);
    assert_eq!(streak, vec![Some(1), Some(2), Some(3), Some(1)]);

    let outcome = Screener::new(vec![Predicate::ha_streak(1, 2, 3)]).apply(merged).unwrap();
    let rows = outcome.table().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.dates().unwrap(), vec![day(1), day(2)]);
    assert_eq!(outcome.symbols().unwrap(), vec!["TEST"]);
}

#[test]
fn mansfield_defaults_to_neutral_without_index() {
    let out = run(&universe(&["AAA", "BBB"], 30));
    let col = out.signals.merged.column("mansfield_rsi").unwrap();
    assert!((0..60).all(|r| col.get_f64(r) == Some(50.0)));
}

#[test]
fn mansfield_uses_sector_index_when_present() {
    let bars = universe(&["XOM", "XLE"], 30);
    let references = ReferenceMap::from_sectors([("XOM", "Energy")]);
    let indicators = IndicatorParams {
        mansfield_window: Window::new(10).unwrap(),
        ..IndicatorParams::default()
    };
    let config = PipelineConfig::builder()
        .references(references)
        .indicators(indicators)
        .build()
        .unwrap();
    let out = Pipeline::new(config).unwrap().run(Period::Daily, &bars).unwrap();

    let table = out.signals.tables.get("mansfield_rsi").unwrap();
    let xom = table.rows_for_symbol("XOM").unwrap();
    let col = xom.column("mansfield_rsi").unwrap();
    assert!(col.is_null(0));
    assert!(col.get_f64(29).is_some_and(|v| v != 50.0));

    let xle = table.rows_for_symbol("XLE").unwrap();
    let col = xle.column("mansfield_rsi").unwrap();
    assert!((0..30).all(|r| col.get_f64(r) == Some(50.0)));
}

#[test]
fn screener_order_does_not_matter() {
    let out = run(&universe(&["AAA", "BBB", "CCC", "DDD"], 80));
    let merged = &out.signals.merged;
    let a = Predicate::ha_streak(1, 1, 5);
    let b = Predicate::supertrend_streak(1, 1, 30);
    let c = Predicate::from_name("ma:sma_5_10", 1).unwrap();

    let forward = Screener::new(vec![a.clone(), b.clone(), c.clone()]).apply(merged).unwrap();
    let backward = Screener::new(vec![c, b, a]).apply(merged).unwrap();
    assert!(forward.is_applied());
    assert_eq!(forward, backward);
}

#[test]
fn screener_reports_inapplicable_on_reduced_table() {
    let out = run(&universe(&["AAA"], 30));
    let ha_only = out.signals.tables.get("heikin_ashi").unwrap();
    let outcome = Screener::from_names(&["ha", "srsi"], 1).unwrap().apply(ha_only).unwrap();
    assert!(matches!(outcome, ScreenOutcome::Inapplicable { .. }));
    assert!(outcome.symbols().unwrap().is_empty());
}

#[test]
fn config_from_toml_drives_catalog() {
    let config = PipelineConfig::from_toml(
        r#"
        include_labels = false
        [indicators]
        ma_windows = [3, 6]
        ma_pairs = [[3, 6]]
        slope_windows = [5]
        "#,
    )
    .unwrap();
    let pipeline = Pipeline::new(config).unwrap();
    assert!(pipeline.catalog().get("find_slope_5").is_some());
    assert!(pipeline.catalog().get("find_slope_10").is_none());

    let out = pipeline.run(Period::Daily, &universe(&["AAA"], 20)).unwrap();
    assert!(out.signals.merged.has_column("sma_3_6_streak"));
    assert!(out.signals.merged.has_column("slope_5"));
    assert!(out.signals.labels.columns().is_empty());
}
