use crate::database::identifier::quote;
use crate::database::table::Table;

/// `CREATE TABLE IF NOT EXISTS` statement of a table, terminated by a newline.
pub(crate) fn create_table(table: &Table) -> String {
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .map(|column| format!("    {} {}", quote(&column.name), column.kind.as_str()))
        .collect();
    if let Some(primary_key) = &table.primary_key {
        definitions.push(format!("    PRIMARY KEY ({})", quote(primary_key)));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
        quote(&table.name),
        definitions.join(",\n")
    )
}
