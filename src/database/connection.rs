use crate::error::SheetScriptError;
use log::debug;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use std::path::Path;

/// Handle on the target database. The script is only ever generated as text,
/// so the connection is opened read-only and nothing is executed on it.
pub(crate) struct TargetDatabase {
    connection: Connection,
}

impl TargetDatabase {
    pub(crate) fn open(path: &Path) -> Result<Self, SheetScriptError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(path, flags)?;
        debug!("Opened database {} read-only", path.display());
        Ok(Self { connection })
    }

    pub(crate) fn close(self) -> Result<(), SheetScriptError> {
        self.connection.close().map_err(|(_, error)| error)?;
        Ok(())
    }
}
