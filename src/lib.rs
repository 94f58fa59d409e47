//! # Sheet Script
//!
//! Turns a spreadsheet workbook into a SQL script for human review.
//!
//! Every sheet becomes a table: the first non-empty row names the columns,
//! every following row becomes an `INSERT OR REPLACE` statement with `?`
//! placeholders and a `-- Values:` comment carrying the literal values.
//! Column types (INTEGER, REAL, TIMESTAMP, TEXT) are inferred from the cells.
//!
//! ## Features
//!
//! - **Formats**: Excel 2007+ (`.xlsx`, `.xlsm`, `.xlam`) and OpenDocument (`.ods`)
//! - **Sheet selection**: glob patterns on sheet names
//! - **Type inference**: optionally limited to a leading sample of rows
//! - **Missing values**: configurable null literals, error cells as NULL
//! - **Fail fast**: names that normalize to the same identifier are rejected
//!
//! The script is only written, never executed. The target database is checked
//! for existence and opened read-only.
mod database;
mod error;
mod helpers;
mod script;
mod spreadsheet;

pub use crate::database::SchemaError;
pub use crate::error::SheetScriptError;
pub use crate::spreadsheet::criteria::Criteria;
pub use crate::spreadsheet::criteria::DEFAULT_NULLS;

use crate::database::connection::TargetDatabase;
use crate::database::identifier::Identifiers;
use crate::database::table::Table;
use crate::error::ResultMessage;
use crate::script::writer::write_script;
use crate::script::ScriptGenerator;
use crate::spreadsheet::open_spreadsheet;
use chrono::Local;
use chrono::NaiveDateTime;
use log::debug;
use log::info;
use log::warn;
use std::path::Path;
use std::path::PathBuf;

/// Workbook used when none is given.
pub const DEFAULT_WORKBOOK: &str = "basedatafile.xlsx";

/// Database file name under `<workbook_dir>/db/`.
pub const DEFAULT_DATABASE: &str = "rsvp-base.db";

/// Script file name under `<workbook_dir>/db/`.
pub const DEFAULT_OUTPUT: &str = "migration_from_excel.sql";

/// Paths and options of one generation run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Source workbook
    pub workbook: PathBuf,
    /// Target database; defaults to `<workbook_dir>/db/rsvp-base.db`
    pub database: Option<PathBuf>,
    /// Script destination; defaults to `<workbook_dir>/db/migration_from_excel.sql`
    pub output: Option<PathBuf>,
    /// Sheet selection, inference sample size and missing-value rules
    pub criteria: Criteria,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            database: None,
            output: None,
            criteria: Criteria::default(),
        }
    }
}

impl Config {
    /// `db/` next to the workbook; relative workbooks resolve against the working directory.
    fn data_dir(&self) -> PathBuf {
        self.workbook.parent().unwrap_or(Path::new("")).join("db")
    }

    /// Database checked before generation.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| self.data_dir().join(DEFAULT_DATABASE))
    }

    /// File the script is written to.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| self.data_dir().join(DEFAULT_OUTPUT))
    }
}

/// Generates the script stamped with the current local time and returns its path.
pub fn generate(config: &Config) -> Result<PathBuf, SheetScriptError> {
    generate_at(config, Local::now().naive_local())
}

/// Generates the script with a fixed generation timestamp and returns its path.
///
/// Fails with [`SheetScriptError::WorkbookNotFound`] or
/// [`SheetScriptError::DatabaseNotFound`] before anything is read or written.
pub fn generate_at(config: &Config, generated_at: NaiveDateTime) -> Result<PathBuf, SheetScriptError> {
    let database_path = config.database_path();
    let output_path = config.output_path();
    if !config.workbook.is_file() {
        return Err(SheetScriptError::WorkbookNotFound(config.workbook.to_owned()));
    }
    if !database_path.is_file() {
        return Err(SheetScriptError::DatabaseNotFound(database_path));
    }

    let database = TargetDatabase::open(&database_path)?;
    let script = render_script(&config.workbook, &config.criteria, generated_at)?;
    database.close()?;

    write_script(&output_path, &script).with_prefix(&output_path.to_string_lossy())?;
    info!("SQL script written to {}", output_path.display());
    Ok(output_path)
}

/// Reads the workbook and renders the full script text.
fn render_script(workbook: &Path, criteria: &Criteria, generated_at: NaiveDateTime) -> Result<String, SheetScriptError> {
    let mut spreadsheet = open_spreadsheet(workbook)?;
    let sheets = spreadsheet.read_sheets(criteria)?;
    info!("Found {} sheets in {}", sheets.len(), spreadsheet.name());

    let source = workbook
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| spreadsheet.name());
    let mut generator = ScriptGenerator::new(&source, generated_at);
    let mut tables = Identifiers::new(&format!("workbook '{source}'"));
    for sheet in &sheets {
        let table_name = tables.register(&sheet.name)?;
        if sheet.is_empty() {
            warn!("Skipping sheet '{}': no header row", sheet.name);
            generator.push_skipped(&table_name, "sheet has no header row");
            continue;
        }
        let table = Table::from_sheet(sheet, table_name, criteria)?;
        debug!(
            "Table {}: {} rows, columns [{}]",
            table.name,
            table.rows.len(),
            table
                .columns
                .iter()
                .map(|column| format!("{} ({}) {}", column.name, column.title, column.kind.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        generator.push_table(&table);
    }
    Ok(generator.finish())
}
