//! Relational view of the workbook: tables, typed columns and SQL values.
use thiserror::Error;

pub(crate) mod column;
pub(crate) mod connection;
pub(crate) mod identifier;
pub(crate) mod table;
pub(crate) mod value;

#[derive(Error, Debug)]
pub enum SchemaError {
    /// Two source names normalize to the same SQL identifier.
    #[error("Naming conflict in {scope}: '{first}' and '{second}' both normalize to \"{identifier}\"")]
    NamingConflict {
        scope: String,
        first: String,
        second: String,
        identifier: String,
    },
}
