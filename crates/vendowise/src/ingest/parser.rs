use super::mapping::{column_for_header, Column};
use super::IngestError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::collections::HashMap;
use std::io::Read;

/// CSV body with headers resolved to canonical columns.
pub(crate) struct Table {
    columns: HashMap<Column, usize>,
    rows: Vec<StringRecord>,
}

impl Table {
    pub(crate) fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |record| Row {
            columns: &self.columns,
            record,
        })
    }
}

pub(crate) fn read_table<R: Read>(reader: R, required: &[Column]) -> Result<Table, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut columns = HashMap::new();
    for (index, header) in csv_reader.headers()?.iter().enumerate() {
        if let Some(column) = column_for_header(header) {
            // First matching header wins when an export repeats a column.
            columns.entry(column).or_insert(index);
        }
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|column| !columns.contains_key(column))
        .map(|column| column.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record);
    }

    Ok(Table { columns, rows })
}

/// One data row. `line` is the 1-based line in the source file.
pub(crate) struct Row<'a> {
    columns: &'a HashMap<Column, usize>,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub(crate) fn line(&self) -> u64 {
        self.record
            .position()
            .map(|position| position.line())
            .unwrap_or_default()
    }

    pub(crate) fn text(&self, column: Column) -> Option<&'a str> {
        let index = *self.columns.get(&column)?;
        self.record.get(index).filter(|value| !value.is_empty())
    }

    pub(crate) fn required_text(&self, column: Column) -> Result<String, IngestError> {
        self.text(column)
            .map(str::to_string)
            .ok_or_else(|| self.missing(column))
    }

    pub(crate) fn number(&self, column: Column) -> Result<Option<f64>, IngestError> {
        self.text(column)
            .map(|value| parse_number(value).ok_or_else(|| self.invalid(column, value)))
            .transpose()
    }

    pub(crate) fn required_number(&self, column: Column) -> Result<f64, IngestError> {
        self.number(column)?.ok_or_else(|| self.missing(column))
    }

    /// Like [`Row::number`], but a negative count is an invalid cell.
    pub(crate) fn quantity(&self, column: Column) -> Result<Option<f64>, IngestError> {
        match (self.number(column)?, self.text(column)) {
            (Some(value), Some(raw)) if value < 0.0 => Err(self.invalid(column, raw)),
            (value, _) => Ok(value),
        }
    }

    pub(crate) fn required_quantity(&self, column: Column) -> Result<f64, IngestError> {
        self.quantity(column)?.ok_or_else(|| self.missing(column))
    }

    pub(crate) fn date(&self, column: Column) -> Result<Option<NaiveDate>, IngestError> {
        self.text(column)
            .map(|value| parse_date(value).ok_or_else(|| self.invalid(column, value)))
            .transpose()
    }

    pub(crate) fn required_date(&self, column: Column) -> Result<NaiveDate, IngestError> {
        self.date(column)?.ok_or_else(|| self.missing(column))
    }

    fn invalid(&self, column: Column, value: &str) -> IngestError {
        IngestError::InvalidCell {
            row: self.line(),
            column: column.name(),
            value: value.to_string(),
        }
    }

    fn missing(&self, column: Column) -> IngestError {
        IngestError::MissingValue {
            row: self.line(),
            column: column.name(),
        }
    }
}

fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}
