use crate::spreadsheet::cell::Cell;
use std::collections::BTreeMap;

/// One row of a sheet, starting at column A; `None` marks a blank cell.
pub(crate) type Record<'a> = Vec<Option<&'a Cell>>;

/// Represents a sheet read from a workbook.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name as shown on the workbook tab
    pub(crate) name: String,
    /// Non-empty cells in reading order
    pub(crate) cells: Vec<Cell>,
    /// Rightmost column holding a cell (0-based)
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            col_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, col: usize) {
        self.col_upper_bound = Some(self.col_upper_bound.map_or(col, |bound| bound.max(col)));
    }

    /// Number of columns from column A to the rightmost cell.
    pub(crate) fn width(&self) -> usize {
        self.col_upper_bound.map_or(0, |upper| upper + 1)
    }

    /// Rows that hold at least one cell, ordered by row index.
    /// Entirely blank rows are dropped; leading blank columns are kept.
    pub(crate) fn records(&self) -> Vec<(usize, Record<'_>)> {
        let width = self.width();
        let mut rows = BTreeMap::<usize, Record<'_>>::new();
        for cell in &self.cells {
            let record = rows.entry(cell.row).or_insert_with(|| vec![None; width]);
            record[cell.col] = Some(cell);
        }
        rows.into_iter().collect()
    }
}
