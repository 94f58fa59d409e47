use crate::error::SheetScriptError;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Writes the whole script to `path`, creating missing parent directories.
pub(crate) fn write_script(path: &Path, script: &str) -> Result<(), SheetScriptError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(script.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("out.sql");
        write_script(&path, "-- empty\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "-- empty\n");

        write_script(&path, "-- replaced\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "-- replaced\n");
    }
}
