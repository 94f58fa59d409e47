use crate::database::identifier::quote;
use crate::database::table::Table;
use crate::database::value::SqlValue;

/// Parameterized `INSERT OR REPLACE` shared by every row of a table.
pub(crate) fn insert_statement(table: &Table) -> String {
    let columns: Vec<String> = table.columns.iter().map(|column| quote(&column.name)).collect();
    let placeholders = vec!["?"; table.columns.len()];
    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({});",
        quote(&table.name),
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Review comment carrying the literal values of one row.
/// Line breaks inside text are escaped so the comment stays on one line.
pub(crate) fn values_comment(row: &[SqlValue]) -> String {
    let values: Vec<String> = row.iter().map(SqlValue::to_string).collect();
    let values = values.join(", ").replace('\r', "\\r").replace('\n', "\\n");
    format!("-- Values: ({values})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::Column;
    use crate::database::column::ColumnType;

    #[test]
    fn insert_with_placeholders() {
        let columns = ["id", "name", "birth_date"]
            .iter()
            .map(|name| Column {
                title: name.to_string(),
                name: name.to_string(),
                kind: ColumnType::Text,
            })
            .collect();
        let table = Table {
            name: "people".to_owned(),
            columns,
            primary_key: None,
            rows: Vec::new(),
        };
        assert_eq!(
            insert_statement(&table),
            "INSERT OR REPLACE INTO \"people\" (\"id\", \"name\", \"birth_date\") VALUES (?, ?, ?);"
        );
    }

    #[test]
    fn values_on_one_line() {
        let row = vec![
            SqlValue::Integer(2),
            SqlValue::Null,
            SqlValue::Text("line one\nline two".to_owned()),
            SqlValue::Boolean(false),
        ];
        assert_eq!(values_comment(&row), "-- Values: (2, NULL, 'line one\\nline two', FALSE)");
    }
}
