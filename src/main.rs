//! Sheet Script CLI
//!
//! Generates `<workbook_dir>/db/migration_from_excel.sql` from a workbook for review
//! before it is applied with `sqlite3`.

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use sheet_script::Config;
use sheet_script::Criteria;
use sheet_script::SheetScriptError;
use sheet_script::DEFAULT_WORKBOOK;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet-script")]
#[command(about = "Generate a reviewable SQL script from a spreadsheet workbook")]
#[command(version)]
struct Cli {
    /// Source workbook (.xlsx, .xlsm, .xlam, .ods)
    #[arg(default_value = DEFAULT_WORKBOOK)]
    workbook: PathBuf,

    /// Target database file [default: <workbook_dir>/db/rsvp-base.db]
    #[arg(long)]
    database: Option<PathBuf>,

    /// Script destination [default: <workbook_dir>/db/migration_from_excel.sql]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only convert sheets whose name matches this glob pattern (repeatable)
    #[arg(long = "sheet", value_name = "PATTERN")]
    sheets: Vec<String>,

    /// Infer column types from the first N data rows only
    #[arg(long, value_name = "N")]
    analyze_rows: Option<usize>,

    /// Cell text read as NULL (repeatable, replaces the default list)
    #[arg(long = "null", value_name = "LITERAL")]
    nulls: Vec<String>,

    /// Write error cells such as #DIV/0! as NULL
    #[arg(long)]
    error_as_null: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn config(self) -> Result<Config> {
        let mut criteria = Criteria {
            analyze_rows: self.analyze_rows,
            error_as_null: self.error_as_null,
            ..Criteria::default()
        };
        if !self.sheets.is_empty() {
            let patterns = self
                .sheets
                .iter()
                .map(|pattern| glob::Pattern::new(pattern).with_context(|| format!("Invalid sheet pattern '{pattern}'")))
                .collect::<Result<Vec<_>>>()?;
            criteria.sheet_name_patterns = Some(patterns);
        }
        if !self.nulls.is_empty() {
            criteria.nulls = self.nulls.into_iter().collect();
        }
        Ok(Config {
            workbook: self.workbook,
            database: self.database,
            output: self.output,
            criteria,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = cli.config()?;
    match sheet_script::generate(&config) {
        Ok(output) => {
            let database = config.database_path();
            println!("SQL script generated: {}", output.display());
            println!("Please review the generated SQL script at: {}", output.display());
            println!("After reviewing, you can apply it to the database using:");
            println!("sqlite3 \"{}\" < \"{}\"", database.display(), output.display());
            Ok(())
        }
        Err(error @ (SheetScriptError::WorkbookNotFound(_) | SheetScriptError::DatabaseNotFound(_))) => {
            println!("Error: {error}");
            Ok(())
        }
        Err(error) => Err(error).context("SQL script generation failed"),
    }
}
