//! Rendering of the SQL script: header, then one block per sheet.
use crate::database::table::Table;
use crate::spreadsheet::cell::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;

pub(crate) mod ddl;
pub(crate) mod dml;
pub(crate) mod writer;

/// Accumulates the script text in sheet order.
pub(crate) struct ScriptGenerator {
    script: String,
}

impl ScriptGenerator {
    /// Starts a script with the generation timestamp and source file name.
    pub(crate) fn new(source: &str, generated_at: NaiveDateTime) -> Self {
        let script = format!(
            "-- SQL Script generated on {}\n-- Source: {}\n\n",
            generated_at.format(TIMESTAMP_FORMAT),
            source
        );
        Self { script }
    }

    /// Appends the DDL of a table, followed by one INSERT with its values comment per row.
    pub(crate) fn push_table(&mut self, table: &Table) {
        self.script.push_str(&format!("-- Table: {}\n", table.name));
        self.script.push_str(&ddl::create_table(table));
        if !table.rows.is_empty() {
            self.script.push_str(&format!("-- Data for {}\n", table.name));
            let insert = dml::insert_statement(table);
            for row in &table.rows {
                self.script.push_str(&insert);
                self.script.push('\n');
                self.script.push_str(&dml::values_comment(row));
                self.script.push('\n');
            }
        }
        self.script.push('\n');
    }

    /// Appends a placeholder block for a sheet that yields no table.
    pub(crate) fn push_skipped(&mut self, table_name: &str, reason: &str) {
        self.script.push_str(&format!("-- Table: {table_name} (skipped: {reason})\n\n"));
    }

    pub(crate) fn finish(self) -> String {
        self.script
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::Column;
    use crate::database::column::ColumnType;
    use crate::database::value::SqlValue;
    use chrono::NaiveDate;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(7, 8, 9).unwrap()
    }

    #[test]
    fn header_only() {
        let script = ScriptGenerator::new("book.xlsx", generated_at()).finish();
        assert_eq!(script, "-- SQL Script generated on 2024-05-06 07:08:09\n-- Source: book.xlsx\n\n");
    }

    #[test]
    fn table_blocks() {
        let table = Table {
            name: "people".to_owned(),
            columns: vec![Column {
                title: "Id".to_owned(),
                name: "id".to_owned(),
                kind: ColumnType::Integer,
            }],
            primary_key: Some("id".to_owned()),
            rows: vec![vec![SqlValue::Integer(1)], vec![SqlValue::Null]],
        };
        let empty = Table {
            name: "notes".to_owned(),
            rows: Vec::new(),
            primary_key: None,
            ..table.clone()
        };

        let mut generator = ScriptGenerator::new("book.xlsx", generated_at());
        generator.push_table(&table);
        generator.push_table(&empty);
        generator.push_skipped("blank", "sheet has no header row");
        let script = generator.finish();

        let expected = "\
-- SQL Script generated on 2024-05-06 07:08:09
-- Source: book.xlsx

-- Table: people
CREATE TABLE IF NOT EXISTS \"people\" (
    \"id\" INTEGER,
    PRIMARY KEY (\"id\")
);
-- Data for people
INSERT OR REPLACE INTO \"people\" (\"id\") VALUES (?);
-- Values: (1)
INSERT OR REPLACE INTO \"people\" (\"id\") VALUES (?);
-- Values: (NULL)

-- Table: notes
CREATE TABLE IF NOT EXISTS \"notes\" (
    \"id\" INTEGER
);

-- Table: blank (skipped: sheet has no header row)

";
        assert_eq!(script, expected);
    }
}
