use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;

/// SQL column types emitted in `CREATE TABLE` statements.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ColumnType {
    /// Whole numbers
    Integer,
    /// Any number, whole or fractional
    Real,
    /// Dates and date-times
    Timestamp,
    /// Everything else
    Text,
}

/// Represents a column of a table with its header title, identifier and type.
#[derive(Clone, Debug)]
pub(crate) struct Column {
    /// Header text as found in the sheet
    pub(crate) title: String,
    /// Normalized SQL identifier
    pub(crate) name: String,
    pub(crate) kind: ColumnType,
}

impl ColumnType {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Text => "TEXT",
        }
    }

    /// Candidate type of a single present value.
    pub(crate) fn from(cell: &Cell) -> Self {
        match cell.kind {
            CellType::Number if cell.to_integer().is_some() => ColumnType::Integer,
            CellType::Number if cell.to_real().is_some() => ColumnType::Real,
            kind if kind.is_serial_date() && cell.to_timestamp().is_ok() => ColumnType::Timestamp,
            CellType::IsoDateTime if cell.to_timestamp().is_ok() => ColumnType::Timestamp,
            _ => ColumnType::Text,
        }
    }

    /// Detects the most specific type every candidate satisfies.
    /// Missing values are `None`. A column without candidates is TEXT;
    /// a whole-number column with gaps is REAL.
    pub(crate) fn detect(types: Vec<Option<ColumnType>>) -> ColumnType {
        let has_missing = types.iter().any(Option::is_none);
        let types: Vec<ColumnType> = types.into_iter().flatten().collect();
        if types.is_empty() {
            ColumnType::Text
        } else if types.iter().all(|kind| kind.is_int()) && has_missing {
            ColumnType::Real
        } else if types.iter().all(|kind| kind.is_int()) {
            ColumnType::Integer
        } else if types.iter().all(|kind| kind.is_float()) {
            ColumnType::Real
        } else if types.iter().all(|kind| kind.is_datetime()) {
            ColumnType::Timestamp
        } else {
            ColumnType::Text
        }
    }

    #[inline]
    pub(crate) fn is_int(&self) -> bool {
        matches!(self, ColumnType::Integer)
    }

    /// Integers are reals too.
    #[inline]
    pub(crate) fn is_float(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }

    #[inline]
    pub(crate) fn is_datetime(&self) -> bool {
        matches!(self, ColumnType::Timestamp)
    }
}
