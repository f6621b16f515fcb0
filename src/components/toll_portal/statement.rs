use crate::error::{statement_error, Error, TollResult};
use crate::utils::time::{canonical_date, Period};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use tracing::debug;

pub const DATE_COLUMN: &str = "Transaction Date/Time";
pub const DESCRIPTION_COLUMN: &str = "Description";
pub const AMOUNT_COLUMN: &str = "Amount";

/// Statement date-time layouts, tried in order
const DATE_TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// One toll charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TollRecord {
    pub date: NaiveDate,
    pub location: String,
    pub amount: Decimal,
}

impl TollRecord {
    /// `YYYY-MM-DD` key used to join against work days
    pub fn date_key(&self) -> String {
        canonical_date(self.date)
    }
}

/// How boilerplate is removed from the description and amount cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRules {
    /// Characters dropped from descriptions without a leading label
    pub location_prefix: usize,
    /// Characters dropped from amounts, e.g. a currency symbol and padding
    pub amount_prefix: usize,
    /// Label delimiter. The location follows its first occurrence when that
    /// starts within the first `location_prefix` characters; a delimiter
    /// further in belongs to the location itself.
    pub location_delimiter: String,
}

impl Default for PrefixRules {
    fn default() -> Self {
        Self {
            location_prefix: 8,
            amount_prefix: 3,
            location_delimiter: " - ".to_string(),
        }
    }
}

impl PrefixRules {
    /// Location text of a description cell
    pub fn location(&self, description: &str) -> String {
        let delimiter = self.location_delimiter.as_str();
        let rest = if delimiter.is_empty() {
            None
        } else {
            description
                .find(delimiter)
                .filter(|&idx| description[..idx].chars().count() <= self.location_prefix)
                .map(|idx| &description[idx + delimiter.len()..])
        };
        rest.unwrap_or_else(|| skip_chars(description, self.location_prefix))
            .trim()
            .to_string()
    }

    /// Numeric value of an amount cell
    pub fn amount(&self, text: &str) -> TollResult<Decimal> {
        let number = skip_chars(text, self.amount_prefix).trim().replace(',', "");
        Decimal::from_str(&number)
            .map_err(|e| statement_error(&format!("Invalid amount '{}': {}", text, e)))
    }
}

/// Drop the first `count` characters
fn skip_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// Header and body cells of an HTML table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of a named column
    pub fn column(&self, name: &str) -> TollResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }
}

fn selector(css: &'static str) -> TollResult<Selector> {
    Selector::parse(css)
        .map_err(|e| statement_error(&format!("Invalid selector '{}': {}", css, e)))
}

/// Text of a cell, one line per source line, keeping spacing within a line
fn cell_text(cell: ElementRef) -> String {
    let text = cell.text().collect::<String>().replace('\u{a0}', " ");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the first table in the markup.
///
/// Headers come from the first row made only of `<th>` cells, or from the
/// first row when the table has none. Rows above the header row (captions,
/// account banners) and repeated header rows are dropped.
pub fn parse_table(html: &str) -> TollResult<RawTable> {
    let document = Html::parse_fragment(html);
    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| statement_error("No table found in statement markup"))?;

    let mut all_rows: Vec<(bool, Vec<String>)> = Vec::new();

    for tr in table.select(&row_selector) {
        let cells: Vec<ElementRef> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .collect();
        if cells.is_empty() {
            continue;
        }

        let is_header_row = cells.iter().all(|cell| cell.value().name() == "th");
        all_rows.push((is_header_row, cells.into_iter().map(cell_text).collect()));
    }

    let header_idx = all_rows
        .iter()
        .position(|(is_header_row, _)| *is_header_row)
        .unwrap_or(0);

    let mut rows = all_rows.into_iter().skip(header_idx);
    let headers = rows.next().map(|(_, texts)| texts).unwrap_or_default();
    let rows = rows
        .filter(|(is_header_row, _)| !is_header_row)
        .map(|(_, texts)| texts)
        .collect();

    Ok(RawTable { headers, rows })
}

/// Timestamp of a statement date-time cell; a bare date reads as midnight
pub fn parse_transaction_time(text: &str) -> TollResult<NaiveDateTime> {
    let text = text.trim();

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    Err(statement_error(&format!("Unrecognised transaction date '{}'", text)))
}

/// Turn statement markup into the month's charges, oldest first.
///
/// Rows with an empty date or amount cell (subtotals, padding rows) are
/// skipped. Rows outside `period` and rows with a non-positive amount are
/// dropped.
pub fn normalize_statement(
    html: &str,
    period: Period,
    rules: &PrefixRules,
) -> TollResult<Vec<TollRecord>> {
    let table = parse_table(html)?;
    let date_idx = table.column(DATE_COLUMN)?;
    let description_idx = table.column(DESCRIPTION_COLUMN)?;
    let amount_idx = table.column(AMOUNT_COLUMN)?;

    let mut records = Vec::new();

    for row in &table.rows {
        let cell = move |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let (date_text, amount_text) = (cell(date_idx), cell(amount_idx));
        if date_text.is_empty() || amount_text.is_empty() {
            debug!(?row, "Skipping statement row without date or amount");
            continue;
        }

        let time = parse_transaction_time(date_text)?;
        let date = time.date();
        if !period.contains(date) {
            continue;
        }

        let amount = rules.amount(amount_text)?;
        if amount <= Decimal::ZERO {
            continue;
        }

        let record = TollRecord {
            date,
            location: rules.location(cell(description_idx)),
            amount,
        };
        records.push((time, record));
    }

    // Full timestamp, so same-day charges come out in driving order
    records.sort_by_key(|(time, _)| *time);
    Ok(records.into_iter().map(|(_, record)| record).collect())
}
