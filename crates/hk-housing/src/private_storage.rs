//! Private storage statistics (completions, stock and vacancy) published by
//! the Rating and Valuation Department.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::fetch::{CsvFetcher, CsvTable, Encoding, FetchError, FetchOptions};

pub const PRIVATE_STORAGE_URL: &str = "http://www.rvd.gov.hk/datagovhk/Private_Storage.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Year,
    /// Whole number of units.
    Count,
    /// Ratio such as 0.032 for 3.2%.
    Fraction,
    Remark,
}

/// A source column, addressed by position rather than by header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub position: usize,
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    const fn new(position: usize, name: &'static str, kind: ColumnKind) -> Self {
        Self {
            position,
            name,
            kind,
        }
    }

    fn raw<'a>(&self, row: &'a [String]) -> &'a str {
        row.get(self.position).map(String::as_str).unwrap_or("")
    }

    /// Read this column's cell from `row` and coerce it by `kind`.
    /// Missing cells read as empty.
    pub fn coerce(&self, row: &[String]) -> Cell {
        let raw = self.raw(row);
        match self.kind {
            ColumnKind::Year | ColumnKind::Count => Cell::Integer(parse_integer(raw)),
            ColumnKind::Fraction => Cell::Fraction(parse_fraction(raw)),
            ColumnKind::Remark => Cell::Text(raw.to_string()),
        }
    }
}

/// A cell after coercion. Numeric cells that fail to parse are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Integer(Option<i64>),
    Fraction(Option<f64>),
    Text(String),
}

impl Cell {
    fn integer(self) -> Option<i64> {
        match self {
            Cell::Integer(v) => v,
            _ => None,
        }
    }

    fn fraction(self) -> Option<f64> {
        match self {
            Cell::Fraction(v) => v,
            _ => None,
        }
    }

    fn text(self) -> String {
        match self {
            Cell::Text(s) => s,
            _ => String::new(),
        }
    }
}

const YEAR: Column = Column::new(0, "year", ColumnKind::Year);
const COMPLETIONS: Column = Column::new(1, "completions", ColumnKind::Count);
const COMPLETIONS_REMARKS: Column = Column::new(2, "completions_remarks", ColumnKind::Remark);
const STOCK: Column = Column::new(3, "stock_at_year_end", ColumnKind::Count);
const STOCK_REMARKS: Column = Column::new(4, "stock_at_year_end_remarks", ColumnKind::Remark);
const VACANCY: Column = Column::new(5, "vacancy_at_year_end", ColumnKind::Count);
const VACANCY_REMARKS: Column = Column::new(6, "vacancy_at_year_end_remarks", ColumnKind::Remark);
const VACANCY_PCT: Column = Column::new(7, "vacancy_as_percent_of_stock", ColumnKind::Fraction);
const VACANCY_PCT_REMARKS: Column = Column::new(
    8,
    "vacancy_as_percent_of_stock_remarks",
    ColumnKind::Remark,
);

/// Source layout, in positional order.
pub const COLUMNS: [Column; 9] = [
    YEAR,
    COMPLETIONS,
    COMPLETIONS_REMARKS,
    STOCK,
    STOCK_REMARKS,
    VACANCY,
    VACANCY_REMARKS,
    VACANCY_PCT,
    VACANCY_PCT_REMARKS,
];

/// One calendar year of private housing stock statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub year: i32,
    pub completions: Option<i64>,
    pub completions_remarks: String,
    pub stock_at_year_end: Option<i64>,
    pub stock_at_year_end_remarks: String,
    pub vacancy_at_year_end: Option<i64>,
    pub vacancy_at_year_end_remarks: String,
    pub vacancy_as_percent_of_stock: Option<f64>,
    pub vacancy_as_percent_of_stock_remarks: String,
}

impl Record {
    /// Coerce one raw row. Returns `None` when the year does not parse.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let [
            year,
            completions,
            completions_remarks,
            stock,
            stock_remarks,
            vacancy,
            vacancy_remarks,
            pct,
            pct_remarks,
        ] = COLUMNS.map(|col| col.coerce(row));

        Some(Self {
            year: year.integer().and_then(|y| i32::try_from(y).ok())?,
            completions: completions.integer(),
            completions_remarks: completions_remarks.text(),
            stock_at_year_end: stock.integer(),
            stock_at_year_end_remarks: stock_remarks.text(),
            vacancy_at_year_end: vacancy.integer(),
            vacancy_at_year_end_remarks: vacancy_remarks.text(),
            vacancy_as_percent_of_stock: pct.fraction(),
            vacancy_as_percent_of_stock_remarks: pct_remarks.text(),
        })
    }
}

/// Parse a whole number, accepting integral floats such as `1985.0`.
fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_fraction(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Coerce every row of `table`, dropping rows without a usable year.
/// Source order is kept.
pub fn records_from_table(table: &CsvTable) -> Vec<Record> {
    if !table.headers.is_empty() && table.headers.len() != COLUMNS.len() {
        tracing::warn!(
            expected = COLUMNS.len(),
            found = table.headers.len(),
            headers = ?table.headers,
            "private storage header width changed upstream"
        );
    }

    let records: Vec<Record> = table
        .rows
        .iter()
        .filter_map(|row| Record::from_row(row))
        .collect();

    let dropped = table.rows.len() - records.len();
    if dropped > 0 {
        tracing::debug!(dropped, "skipped rows with unparseable year");
    }
    records
}

/// Keep only records for `year`, or everything when `year` is `None`.
pub fn filter_by_year(records: Vec<Record>, year: Option<i32>) -> Vec<Record> {
    match year {
        Some(y) => records.into_iter().filter(|r| r.year == y).collect(),
        None => records,
    }
}

/// How the upstream file is encoded: UTF-8 with BOM, comma separated,
/// one title line above the header.
pub fn source_options() -> FetchOptions {
    FetchOptions {
        encoding: Encoding::Utf8Sig,
        delimiter: b',',
        has_title_row: true,
    }
}

/// Query surface for private storage statistics.
#[async_trait]
pub trait PrivateStorageApi: Send + Sync {
    async fn get_private_storage(&self, year: Option<i32>) -> Result<Vec<Record>, FetchError>;
}

/// Fetches the dataset fresh on every query.
pub struct PrivateStorage {
    fetcher: Arc<dyn CsvFetcher>,
    url: String,
}

impl PrivateStorage {
    pub fn new(fetcher: Arc<dyn CsvFetcher>) -> Self {
        Self {
            fetcher,
            url: PRIVATE_STORAGE_URL.to_string(),
        }
    }
}

#[async_trait]
impl PrivateStorageApi for PrivateStorage {
    async fn get_private_storage(&self, year: Option<i32>) -> Result<Vec<Record>, FetchError> {
        let table = self.fetcher.fetch_csv(&self.url, &source_options()).await?;
        let records = filter_by_year(records_from_table(&table), year);
        tracing::info!(?year, count = records.len(), "private storage query");
        Ok(records)
    }
}
