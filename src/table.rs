//! Signal tables keyed by (Date, symbol), backed by a polars `DataFrame`
//!
//! Every indicator emits a [`Table`] holding only the key columns plus its own
//! signal columns. The pipeline folds those tables into the merged table with
//! [`Table::left_join`], which never drops or duplicates a base row.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use polars::prelude::Column as FrameColumn;
use polars::prelude::*;

use crate::{Bar, Result, SignalError};

pub const DATE: &str = "Date";
pub const SYMBOL: &str = "symbol";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

/// Scratch column that pins left-side row order through a join
const ROW_INDEX: &str = "__row_index";
/// `num_days_from_ce` of 1970-01-01; polars stores dates as days since then
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[inline]
fn is_key(name: &str) -> bool {
    name == DATE || name == SYMBOL
}

fn date_column(dates: &[NaiveDate]) -> Result<FrameColumn> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();
    Ok(FrameColumn::new(DATE.into(), days).cast(&DataType::Date)?)
}

fn symbol_column<S: AsRef<str>>(symbols: &[S]) -> FrameColumn {
    let names: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
    FrameColumn::from(Series::new(SYMBOL.into(), names))
}

// ============================================================
// COLUMNS
// ============================================================

/// A named nullable signal column: `Float64` or `Int64`
#[derive(Debug, Clone)]
pub struct Column(Series);

impl Column {
    pub fn float(name: impl Into<PlSmallStr>, values: Vec<Option<f64>>) -> Self {
        Self(Series::new(name.into(), values))
    }

    pub fn int(name: impl Into<PlSmallStr>, values: Vec<Option<i64>>) -> Self {
        Self(Series::new(name.into(), values))
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.0.name().as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at `row` widened to f64
    pub fn get_f64(&self, row: usize) -> Option<f64> {
        if row >= self.len() {
            return None;
        }
        match self.0.dtype() {
            DataType::Int64 => self.0.i64().ok()?.get(row).map(|v| v as f64),
            _ => self.0.f64().ok()?.get(row),
        }
    }

    /// Integer value at `row`; float columns only yield whole numbers
    pub fn get_i64(&self, row: usize) -> Option<i64> {
        if row >= self.len() {
            return None;
        }
        match self.0.dtype() {
            DataType::Int64 => self.0.i64().ok()?.get(row),
            _ => self
                .0
                .f64()
                .ok()?
                .get(row)
                .filter(|v| v.fract() == 0.0)
                .map(|v| v as i64),
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.get_f64(row).is_none()
    }

    /// Whole column widened to f64
    pub fn as_f64(&self) -> Result<Vec<Option<f64>>> {
        let cast = self.0.cast(&DataType::Float64)?;
        Ok(cast.f64()?.into_iter().collect())
    }

    /// Whole column as integers; fractional floats become null
    pub fn as_i64(&self) -> Result<Vec<Option<i64>>> {
        match self.0.dtype() {
            DataType::Int64 => Ok(self.0.i64()?.into_iter().collect()),
            _ => Ok(self
                .as_f64()?
                .into_iter()
                .map(|v| v.filter(|v| v.fract() == 0.0).map(|v| v as i64))
                .collect()),
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.0.equals_missing(&other.0)
    }
}

// ============================================================
// TABLE
// ============================================================

/// Named frame with schema `{Date, symbol, <columns...>}`
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.frame.equals_missing(&other.frame)
    }
}

impl Table {
    /// Create a key-only table
    pub fn new<S: AsRef<str>>(name: impl Into<String>, dates: &[NaiveDate], symbols: &[S]) -> Result<Self> {
        let name = name.into();
        if dates.len() != symbols.len() {
            return Err(SignalError::computation(
                name,
                format!("{} dates but {} symbols", dates.len(), symbols.len()),
            ));
        }
        let frame = DataFrame::new(vec![date_column(dates)?, symbol_column(symbols)])?;
        Ok(Self { name, frame })
    }

    /// Key-only table with no rows
    pub fn empty(name: impl Into<String>) -> Result<Self> {
        let no_symbols: [&str; 0] = [];
        Self::new(name, &[], &no_symbols)
    }

    /// Raw OHLCV table; row order follows `bars`
    pub fn from_bars(name: impl Into<String>, bars: &[Bar]) -> Result<Self> {
        let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
        let symbols: Vec<&str> = bars.iter().map(|b| b.symbol.as_str()).collect();
        let field = |f: fn(&Bar) -> f64| -> Vec<f64> { bars.iter().map(f).collect() };

        let frame = DataFrame::new(vec![
            date_column(&dates)?,
            symbol_column(&symbols),
            FrameColumn::new(OPEN.into(), field(|b| b.open)),
            FrameColumn::new(HIGH.into(), field(|b| b.high)),
            FrameColumn::new(LOW.into(), field(|b| b.low)),
            FrameColumn::new(CLOSE.into(), field(|b| b.close)),
            FrameColumn::new(VOLUME.into(), bars.iter().map(|b| b.volume).collect::<Vec<i64>>()),
        ])?;
        Ok(Self {
            name: name.into(),
            frame,
        })
    }

    /// Same rows carrying only the key columns
    pub fn keys_only(&self, name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            frame: self.frame.select([DATE, SYMBOL])?,
        })
    }

    fn with_frame(&self, frame: DataFrame) -> Self {
        Self {
            name: self.name.clone(),
            frame,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Date key of every row
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let days = self.frame.column(DATE)?.cast(&DataType::Int32)?;
        days.i32()?
            .into_iter()
            .map(|d| {
                d.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE))
                    .ok_or_else(|| SignalError::computation(self.name.clone(), "null or out-of-range Date key"))
            })
            .collect()
    }

    /// Symbol key of every row
    pub fn symbols(&self) -> Result<Vec<String>> {
        self.frame
            .column(SYMBOL)?
            .str()?
            .into_iter()
            .map(|s| {
                s.map(str::to_string)
                    .ok_or_else(|| SignalError::computation(self.name.clone(), "null symbol key"))
            })
            .collect()
    }

    /// Signal columns, key columns excluded
    pub fn columns(&self) -> Vec<Column> {
        self.frame
            .get_columns()
            .iter()
            .filter(|c| !is_key(c.name().as_str()))
            .map(|c| Column(c.as_materialized_series().clone()))
            .collect()
    }

    /// Column names including the key columns
    pub fn column_names(&self) -> Vec<&str> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect()
    }

    /// Signal column `name`; key columns are not returned
    pub fn column(&self, name: &str) -> Option<Column> {
        if is_key(name) {
            return None;
        }
        let column = self.frame.column(name).ok()?;
        Some(Column(column.as_materialized_series().clone()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Required columns that are absent
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Fail fast with a [`SignalError::Schema`] naming `context` and the missing columns
    pub fn require(&self, context: &str, required: &[&str]) -> Result<()> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            return Ok(());
        }
        Err(SignalError::Schema {
            context: context.to_string(),
            missing,
            present: self.column_names().into_iter().map(String::from).collect(),
        })
    }

    fn column_or_schema(&self, name: &str) -> Result<Column> {
        self.column(name).ok_or_else(|| SignalError::Schema {
            context: self.name.clone(),
            missing: vec![name.to_string()],
            present: self.column_names().into_iter().map(String::from).collect(),
        })
    }

    /// Column values widened to f64
    pub fn floats(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.column_or_schema(name)?.as_f64()
    }

    /// Column values as integers
    pub fn ints(&self, name: &str) -> Result<Vec<Option<i64>>> {
        self.column_or_schema(name)?.as_i64()
    }

    /// Append a column; length must match and the name must be new
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.len() {
            return Err(SignalError::computation(
                self.name.clone(),
                format!(
                    "column {} has {} rows, table has {}",
                    column.name(),
                    column.len(),
                    self.len()
                ),
            ));
        }
        if self.has_column(column.name()) {
            return Err(SignalError::computation(
                self.name.clone(),
                format!("duplicate column {}", column.name()),
            ));
        }
        self.frame.with_column(column.0)?;
        Ok(())
    }

    /// Builder-style [`Table::push_column`]
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.push_column(column)?;
        Ok(self)
    }

    /// Keep only the listed columns (keys always kept), in the listed order
    pub fn select(&self, name: impl Into<String>, columns: &[&str]) -> Result<Table> {
        let name = name.into();
        self.require(&name, columns)?;
        let mut names = vec![DATE, SYMBOL];
        names.extend(columns.iter().copied().filter(|c| !is_key(c)));
        Ok(Self {
            name,
            frame: self.frame.select(names)?,
        })
    }

    /// Rows whose mask entry is set, order preserved
    pub fn filter_mask(&self, mask: &[bool]) -> Result<Table> {
        let mask = BooleanChunked::from_slice("keep".into(), mask);
        Ok(self.with_frame(self.frame.filter(&mask)?))
    }

    /// Rows for which `keep(row)` holds, order preserved
    pub fn filter_rows(&self, keep: impl FnMut(usize) -> bool) -> Result<Table> {
        let mask: Vec<bool> = (0..self.len()).map(keep).collect();
        self.filter_mask(&mask)
    }

    pub fn rows_for_symbol(&self, symbol: &str) -> Result<Table> {
        let symbols = self.symbols()?;
        self.filter_rows(|r| symbols[r] == symbol)
    }

    /// Sort rows by (symbol, Date)
    pub fn sorted(&self) -> Result<Table> {
        let frame = self
            .frame
            .clone()
            .lazy()
            .sort(
                [SYMBOL, DATE],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;
        Ok(self.with_frame(frame))
    }

    /// Last `n` rows (by Date) of every symbol, sorted by (symbol, Date)
    pub fn tail_per_symbol(&self, n: usize) -> Result<Table> {
        let sorted = self.sorted()?;
        let symbols = sorted.symbols()?;
        let mut mask = vec![false; symbols.len()];
        let mut end = symbols.len();
        while end > 0 {
            let start = symbols[..end]
                .iter()
                .rposition(|s| *s != symbols[end - 1])
                .map_or(0, |p| p + 1);
            mask[end.saturating_sub(n).max(start)..end].fill(true);
            end = start;
        }
        sorted.filter_mask(&mask)
    }

    /// Distinct symbols, sorted
    pub fn distinct_symbols(&self) -> Result<Vec<String>> {
        let distinct: BTreeSet<String> = self.symbols()?.into_iter().collect();
        Ok(distinct.into_iter().collect())
    }

    /// Stack tables sharing one schema
    pub fn concat(name: impl Into<String>, tables: impl IntoIterator<Item = Table>) -> Result<Table> {
        let name = name.into();
        let mut iter = tables.into_iter();
        let Some(first) = iter.next() else {
            return Table::empty(name);
        };
        let mut frame = first.frame;
        for table in iter {
            frame.vstack_mut(&table.frame).map_err(|e| {
                SignalError::computation(name.clone(), format!("schema mismatch while stacking {}: {e}", table.name))
            })?;
        }
        Ok(Self { name, frame })
    }

    /// First row of every (Date, symbol) key
    fn unique_keys(&self) -> Result<DataFrame> {
        Ok(self
            .frame
            .clone()
            .lazy()
            .unique_stable(Some(vec![DATE.into(), SYMBOL.into()]), UniqueKeepStrategy::First)
            .collect()?)
    }

    /// Join the new columns of `right` onto `self`, keeping `self`'s row order.
    /// Returns the joined frame and the names of `right` columns skipped as collisions.
    fn join_on_keys(&self, right: &Table, how: JoinType) -> Result<(DataFrame, Vec<String>)> {
        let (fresh, skipped): (Vec<String>, Vec<String>) = right
            .columns()
            .into_iter()
            .map(|c| c.name().to_string())
            .partition(|n| !self.has_column(n));

        let mut keep: Vec<&str> = vec![DATE, SYMBOL];
        keep.extend(fresh.iter().map(String::as_str));
        let right = right.unique_keys()?.select(keep)?;

        let keys = [col(DATE), col(SYMBOL)];
        let joined = self
            .frame
            .clone()
            .lazy()
            .with_row_index(ROW_INDEX, None)
            .join(right.lazy(), keys.clone(), keys, JoinArgs::new(how))
            .sort([ROW_INDEX], SortMultipleOptions::default())
            .collect()?
            .drop(ROW_INDEX)?;
        Ok((joined, skipped))
    }

    /// Left join `right` onto `self` on (Date, symbol).
    ///
    /// Row count and order of `self` are preserved; duplicate keys in `right`
    /// resolve to their first row. Columns of `right` whose name already exists
    /// in `self` are skipped and returned in the second element.
    pub fn left_join(&self, right: &Table) -> Result<(Table, Vec<String>)> {
        let (frame, skipped) = self.join_on_keys(right, JoinType::Left)?;
        Ok((self.with_frame(frame), skipped))
    }

    /// Inner join on (Date, symbol); row order of `self` is kept
    pub fn inner_join(&self, right: &Table) -> Result<Table> {
        let (frame, _) = self.join_on_keys(right, JoinType::Inner)?;
        Ok(self.with_frame(frame))
    }

    /// Same table with columns renamed through `mapping`; unknown names are ignored
    pub fn renamed_columns(&self, mapping: &[(&str, &str)]) -> Result<Table> {
        let mut frame = self.frame.clone();
        for (from, to) in mapping {
            if !is_key(from) && frame.column(from).is_ok() {
                frame.rename(from, (*to).into())?;
            }
        }
        Ok(self.with_frame(frame))
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn bars() -> Vec<Bar> {
        vec![
            Bar::new(day(1), "AAA", 1.0, 2.0, 0.5, 1.5, 10),
            Bar::new(day(2), "AAA", 1.5, 2.5, 1.0, 2.0, 11),
            Bar::new(day(1), "BBB", 5.0, 6.0, 4.5, 5.5, 20),
            Bar::new(day(2), "BBB", 5.5, 6.5, 5.0, 6.0, 21),
        ]
    }

    #[test]
    fn test_from_bars_schema() {
        let t = Table::from_bars("ohlcv", &bars()).unwrap();
        assert_eq!(t.len(), 4);
        assert_eq!(
            t.column_names(),
            vec!["Date", "symbol", "Open", "High", "Low", "Close", "Volume"]
        );
        assert_eq!(t.frame().column(DATE).unwrap().dtype(), &DataType::Date);
        assert_eq!(t.column(VOLUME).unwrap().get_i64(2), Some(20));
        assert_eq!(t.dates().unwrap(), vec![day(1), day(2), day(1), day(2)]);
        assert_eq!(t.symbols().unwrap()[2], "BBB");
        assert!(t.column(DATE).is_none());
    }

    #[test]
    fn test_require_reports_missing() {
        let t = Table::from_bars("ohlcv", &bars()).unwrap();
        assert!(t.require("sma", &["Close"]).is_ok());
        match t.require("ha", &["HA_Open", "Close"]) {
            Err(SignalError::Schema { context, missing, present }) => {
                assert_eq!(context, "ha");
                assert_eq!(missing, vec!["HA_Open".to_string()]);
                assert!(present.contains(&"Close".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_push_column_checks_length_and_name() {
        let mut t = Table::from_bars("ohlcv", &bars()).unwrap();
        assert!(t.push_column(Column::float("x", vec![Some(1.0)])).is_err());
        assert!(t.push_column(Column::float(CLOSE, vec![None; 4])).is_err());
        t.push_column(Column::int("n", vec![Some(1), None, Some(3), None])).unwrap();
        assert_eq!(t.ints("n").unwrap(), vec![Some(1), None, Some(3), None]);
        assert_eq!(t.floats("n").unwrap()[2], Some(3.0));
    }

    #[test]
    fn test_left_join_keeps_base_rows() {
        let base = Table::from_bars("ohlcv", &bars()).unwrap();
        let derived = base
            .rows_for_symbol("AAA")
            .unwrap()
            .keys_only("x")
            .unwrap()
            .with_column(Column::float("x", vec![Some(1.0), Some(2.0)]))
            .unwrap();

        let (merged, skipped) = base.left_join(&derived).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(merged.len(), base.len());
        assert_eq!(merged.dates().unwrap(), base.dates().unwrap());
        let x = merged.column("x").unwrap();
        assert_eq!(x.get_f64(0), Some(1.0));
        assert_eq!(x.get_f64(1), Some(2.0));
        assert!(x.is_null(2));
        assert!(x.is_null(3));
    }

    #[test]
    fn test_left_join_keeps_unsorted_base_order() {
        let mut rows = bars();
        rows.reverse();
        let base = Table::from_bars("ohlcv", &rows).unwrap();
        let closes = base.select("c", &[CLOSE]).unwrap().renamed_columns(&[(CLOSE, "c")]).unwrap();
        let (merged, _) = base.left_join(&closes.sorted().unwrap()).unwrap();
        assert_eq!(merged.floats("c").unwrap(), merged.floats(CLOSE).unwrap());
        assert_eq!(merged.symbols().unwrap(), base.symbols().unwrap());
    }

    #[test]
    fn test_left_join_skips_colliding_columns() {
        let base = Table::from_bars("ohlcv", &bars()).unwrap();
        let other = base.select("vol", &[VOLUME]).unwrap();
        let (merged, skipped) = base.left_join(&other).unwrap();
        assert_eq!(skipped, vec![VOLUME.to_string()]);
        assert_eq!(merged.columns().len(), base.columns().len());
    }

    #[test]
    fn test_left_join_ignores_duplicate_right_keys() {
        let base = Table::from_bars("ohlcv", &bars()).unwrap();
        let dup = Table::concat("dup", vec![base.select("a", &[CLOSE]).unwrap(), base.select("b", &[CLOSE]).unwrap()])
            .unwrap()
            .renamed_columns(&[(CLOSE, "close_copy")])
            .unwrap();
        let (merged, _) = base.left_join(&dup).unwrap();
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_left_join_with_empty_right_adds_null_columns() {
        let base = Table::from_bars("ohlcv", &bars()).unwrap();
        let empty = Table::empty("rsi")
            .unwrap()
            .with_column(Column::float("rsi_14", Vec::new()))
            .unwrap();
        let (merged, _) = base.left_join(&empty).unwrap();
        let rsi = merged.column("rsi_14").unwrap();
        assert!((0..4).all(|r| rsi.is_null(r)));
    }

    #[test]
    fn test_concat_rejects_schema_mismatch() {
        let base = Table::from_bars("ohlcv", &bars()).unwrap();
        let a = base.select("a", &[CLOSE]).unwrap();
        let b = base.select("b", &[OPEN]).unwrap();
        assert!(Table::concat("ab", vec![a, b]).is_err());
        assert!(Table::concat("none", Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_tail_per_symbol() {
        let base = Table::from_bars("ohlcv", &bars()).unwrap();
        let tail = base.tail_per_symbol(1).unwrap();
        assert_eq!(tail.len(), 2);
        assert!(tail.dates().unwrap().iter().all(|d| *d == day(2)));
        assert_eq!(tail.distinct_symbols().unwrap(), vec!["AAA", "BBB"]);
        assert_eq!(base.tail_per_symbol(5).unwrap().len(), 4);
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let base = Table::from_bars("ohlcv", &bars()).unwrap();
        let only_aaa = base
            .rows_for_symbol("AAA")
            .unwrap()
            .select("c", &[CLOSE])
            .unwrap()
            .renamed_columns(&[(CLOSE, "c")])
            .unwrap();
        let joined = base.inner_join(&only_aaa).unwrap();
        assert_eq!(joined.len(), 2);
        assert!(joined.has_column("c"));
    }
}
