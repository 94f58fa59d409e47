use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::identifier::Identifiers;
use crate::database::identifier::PRIMARY_KEY;
use crate::database::value::is_missing;
use crate::database::value::SqlValue;
use crate::error::SheetScriptError;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;

/// Represents a table derived from one sheet: header row as columns, the rest as rows.
#[derive(Clone, Debug)]
pub(crate) struct Table {
    /// Normalized table identifier
    pub(crate) name: String,
    /// Column definitions in sheet order
    pub(crate) columns: Vec<Column>,
    /// Identifier of the primary key column, if a column normalizes to `id`
    pub(crate) primary_key: Option<String>,
    /// Data rows, one value per column
    pub(crate) rows: Vec<Vec<SqlValue>>,
}

impl Table {
    /// Builds the table of a non-empty sheet. The first row holding a cell is the header row.
    pub(crate) fn from_sheet(sheet: &Sheet, name: String, criteria: &Criteria) -> Result<Table, SheetScriptError> {
        let mut records = sheet.records().into_iter().map(|(_, record)| record);
        let header = records.next().unwrap_or_default();
        let records: Vec<_> = records.collect();

        let mut identifiers = Identifiers::new(&format!("sheet '{}'", sheet.name));
        let mut columns = Vec::<Column>::with_capacity(header.len());
        for (index, cell) in header.iter().enumerate() {
            // null literals are data markers only; a header keeps its text
            let title = match cell {
                Some(cell) if cell.kind != CellType::Empty && !cell.value.is_empty() => cell.to_string(),
                _ => format!("Unnamed: {index}"),
            };
            let column_name = identifiers.register(&title)?;
            let sample = records.len().min(criteria.analyze_rows.unwrap_or(usize::MAX));
            let types = records[..sample]
                .iter()
                .map(|record| {
                    record[index]
                        .filter(|cell| !is_missing(cell, criteria))
                        .map(ColumnType::from)
                })
                .collect();
            let kind = ColumnType::detect(types);
            columns.push(Column {
                title,
                name: column_name,
                kind,
            });
        }

        let primary_key = columns
            .iter()
            .find(|column| column.name == PRIMARY_KEY)
            .map(|column| column.name.to_owned());
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .zip(record.iter())
                    .map(|(column, cell)| SqlValue::from_cell(*cell, column.kind, criteria))
                    .collect::<Vec<SqlValue>>()
            })
            .collect();

        Ok(Table {
            name,
            columns,
            primary_key,
            rows,
        })
    }
}
