use crate::database::column::ColumnType;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::TIMESTAMP_FORMAT;
use crate::spreadsheet::cell::TIME_FORMAT;
use crate::spreadsheet::criteria::Criteria;
use log::warn;
use std::fmt::Display;

/// A cell value rendered as a SQL literal.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    /// Text, dates and times; quoted on output
    Text(String),
}

impl SqlValue {
    /// Converts a cell of a column to its literal. Blank cells, null literals
    /// and (optionally) error cells are `NULL`.
    pub(crate) fn from_cell(cell: Option<&Cell>, column: ColumnType, criteria: &Criteria) -> SqlValue {
        let Some(cell) = cell else {
            return SqlValue::Null;
        };
        if is_missing(cell, criteria) {
            return SqlValue::Null;
        }
        match cell.kind {
            CellType::Boolean => SqlValue::Boolean(cell.to_boolean()),
            CellType::Number => match (column, cell.to_integer(), cell.to_real()) {
                (ColumnType::Real, _, Some(real)) => SqlValue::Real(real),
                (_, Some(integer), _) => SqlValue::Integer(integer),
                (_, None, Some(real)) => SqlValue::Real(real),
                _ => SqlValue::Text(cell.value.to_owned()),
            },
            kind if kind.is_time_of_day() => match cell.to_time() {
                Ok(time) => SqlValue::Text(time.format(TIME_FORMAT).to_string()),
                Err(message) => raw_text(cell, &message),
            },
            kind if kind.is_serial_date() || kind == CellType::IsoDateTime => match cell.to_timestamp() {
                Ok(datetime) => SqlValue::Text(datetime.format(TIMESTAMP_FORMAT).to_string()),
                Err(message) => raw_text(cell, &message),
            },
            _ => SqlValue::Text(cell.value.to_owned()),
        }
    }
}

fn raw_text(cell: &Cell, message: &str) -> SqlValue {
    warn!("Cell {} kept as text: {}", cell.reference(), message);
    SqlValue::Text(cell.value.to_owned())
}

/// Whether a present cell still counts as a missing value.
pub(crate) fn is_missing(cell: &Cell, criteria: &Criteria) -> bool {
    match cell.kind {
        CellType::Empty => true,
        CellType::String => criteria.is_null(&cell.value),
        CellType::Error => criteria.error_as_null || criteria.is_null(&cell.value),
        _ => false,
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(integer) => write!(f, "{integer}"),
            // Debug keeps the fractional part of whole numbers ("1.0")
            SqlValue::Real(real) => write!(f, "{real:?}"),
            SqlValue::Boolean(true) => write!(f, "TRUE"),
            SqlValue::Boolean(false) => write!(f, "FALSE"),
            SqlValue::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
        }
    }
}
