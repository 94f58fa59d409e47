use crate::database::SchemaError;
use std::collections::HashMap;

/// Column name that becomes the primary key.
pub(crate) const PRIMARY_KEY: &str = "id";

/// Derives a SQL identifier from a sheet or column name.
pub(crate) fn normalize(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Double-quotes an identifier, doubling embedded quotes.
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Identifiers handed out within one namespace (the tables of a workbook,
/// or the columns of a table), keyed by identifier with the source name.
pub(crate) struct Identifiers {
    scope: String,
    names: HashMap<String, String>,
}

impl Identifiers {
    pub(crate) fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_owned(),
            names: HashMap::new(),
        }
    }

    /// Normalizes `name` and reserves the identifier, failing if another name already holds it.
    pub(crate) fn register(&mut self, name: &str) -> Result<String, SchemaError> {
        let identifier = normalize(name);
        if let Some(first) = self.names.get(&identifier) {
            return Err(SchemaError::NamingConflict {
                scope: self.scope.to_owned(),
                first: first.to_owned(),
                second: name.to_owned(),
                identifier,
            });
        }
        self.names.insert(identifier.to_owned(), name.to_owned());
        Ok(identifier)
    }
}
