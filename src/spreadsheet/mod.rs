//! # Workbook Readers
//!
//! Readers for Office Open XML (.xlsx, .xlsm, .xlam) and OpenDocument (.ods)
//! workbooks. Each reader turns the sheets it accepts into in-memory [`Sheet`]
//! values holding typed cells.
use crate::error::SheetScriptError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

pub(crate) mod cell;
pub(crate) mod criteria;
mod excel;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

/// Type alias for buffered file reader
pub(crate) type FileReader = BufReader<File>;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    #[error("No sheets found in '{0}'")]
    SpreadsheetEmptyError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    /// file, sheet, cell reference, message
    #[error("Invalid cell value in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),

    #[error("Unsupported workbook format '{0}'")]
    UnsupportedFormat(String),
}

/// Common interface of the workbook readers.
pub(crate) trait Spreadsheet {
    /// File name of the workbook
    fn name(&self) -> String;

    /// Reads every sheet accepted by `criteria`, in tab order.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, SheetScriptError>;
}

/// Opens a workbook with the reader matching its file extension.
pub(crate) fn open_spreadsheet(path: &Path) -> Result<Box<dyn Spreadsheet>, SheetScriptError> {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlam" => Ok(Box::new(XlsxSpreadsheet::open(path)?)),
        "ods" => Ok(Box::new(OdsSpreadsheet::open(path)?)),
        _ => Err(SpreadsheetError::UnsupportedFormat(path.to_string_lossy().to_string()))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const ODS_MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
    const EMPTY_CONTENT: &str = r#"<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"/>"#;

    fn write_zip(path: &Path, parts: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in parts {
            let options = if *name == "mimetype" {
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)
            } else {
                SimpleFileOptions::default()
            };
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn write_ods(path: &Path, content: &str) {
        write_zip(path, &[("mimetype", ODS_MIME_TYPE), ("content.xml", content)]);
    }

    #[test]
    fn unsupported_extension() {
        let error = open_spreadsheet(Path::new("legacy.xls")).err().unwrap();
        assert_eq!(error.to_string(), "Unsupported workbook format 'legacy.xls'");
        assert!(open_spreadsheet(Path::new("no_extension")).is_err());
    }

    #[test]
    fn xlsx_sheets_and_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let date_format = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd");
        let people = workbook.add_worksheet().set_name("People").unwrap();
        people.write_string(0, 0, "Id").unwrap();
        people.write_string(0, 1, "Born").unwrap();
        people.write_number(1, 0, 1).unwrap();
        people.write_number_with_format(1, 1, 32874, &date_format).unwrap();
        people.write_boolean(2, 0, true).unwrap();
        workbook.add_worksheet().set_name("Archive").unwrap().write_string(0, 0, "x").unwrap();
        workbook.save(&path).unwrap();

        let mut spreadsheet = open_spreadsheet(&path).unwrap();
        let criteria = Criteria {
            sheet_name_patterns: Some(vec![glob::Pattern::new("Peo*").unwrap()]),
            ..Criteria::default()
        };
        let sheets = spreadsheet.read_sheets(&criteria).unwrap();
        assert_eq!(sheets.len(), 1);
        let sheet = &sheets[0];
        assert_eq!(sheet.name, "People");
        let cells: Vec<(String, cell::CellType, String)> = sheet
            .cells
            .iter()
            .map(|cell| (cell.reference(), cell.kind, cell.to_string()))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("A1".to_owned(), cell::CellType::String, "Id".to_owned()),
                ("B1".to_owned(), cell::CellType::String, "Born".to_owned()),
                ("A2".to_owned(), cell::CellType::Number, "1".to_owned()),
                ("B2".to_owned(), cell::CellType::Date(cell::DateSystem::V1900), "1990-01-01 00:00:00".to_owned()),
                ("A3".to_owned(), cell::CellType::Boolean, "true".to_owned()),
            ]
        );
    }

    #[test]
    fn ods_repeated_cells_and_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.ods");
        write_ods(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:calcext="urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0">
<office:body><office:spreadsheet>
<table:table table:name="Notes">
<table:table-row>
<table:table-cell office:value-type="string"><text:p>Name</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>Score</text:p></table:table-cell>
</table:table-row>
<table:table-row table:number-rows-repeated="2">
<table:table-cell office:value-type="string"><office:annotation><text:p>hidden</text:p></office:annotation><text:p>a<text:s text:c="2"/>b</text:p><text:p>c</text:p></table:table-cell>
<table:table-cell office:value-type="float" office:value="2.5"><text:p>2.5</text:p></table:table-cell>
</table:table-row>
<table:table-row>
<table:table-cell table:number-columns-repeated="2"/>
<table:table-cell office:value-type="string" calcext:value-type="error"><text:p>#DIV/0!</text:p></table:table-cell>
</table:table-row>
</table:table>
</office:spreadsheet></office:body>
</office:document-content>"#,
        );

        let mut spreadsheet = open_spreadsheet(&path).unwrap();
        let sheets = spreadsheet.read_sheets(&Criteria::default()).unwrap();
        assert_eq!(sheets.len(), 1);
        let cells: Vec<(String, cell::CellType, String)> = sheets[0]
            .cells
            .iter()
            .map(|cell| (cell.reference(), cell.kind, cell.value.to_owned()))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("A1".to_owned(), cell::CellType::String, "Name".to_owned()),
                ("B1".to_owned(), cell::CellType::String, "Score".to_owned()),
                ("A2".to_owned(), cell::CellType::String, "a  b\nc".to_owned()),
                ("A3".to_owned(), cell::CellType::String, "a  b\nc".to_owned()),
                ("B2".to_owned(), cell::CellType::Number, "2.5".to_owned()),
                ("B3".to_owned(), cell::CellType::Number, "2.5".to_owned()),
                ("C4".to_owned(), cell::CellType::Error, "#DIV/0!".to_owned()),
            ]
        );
    }

    #[test]
    fn ods_with_wrong_mime_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.ods");
        write_zip(
            &path,
            &[("mimetype", "application/vnd.oasis.opendocument.text"), ("content.xml", EMPTY_CONTENT)],
        );
        let error = open_spreadsheet(&path).err().unwrap();
        assert_eq!(error.to_string(), "Invalid ODS MIME type");
    }

    #[test]
    fn encrypted_ods_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.ods");
        write_zip(
            &path,
            &[
                ("mimetype", ODS_MIME_TYPE),
                (
                    "META-INF/manifest.xml",
                    r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
<manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
<manifest:file-entry manifest:full-path="content.xml"><manifest:encryption-data/></manifest:file-entry>
</manifest:manifest>"#,
                ),
                ("content.xml", EMPTY_CONTENT),
            ],
        );
        let error = open_spreadsheet(&path).err().unwrap();
        assert!(error.to_string().ends_with("is password protected"), "{error}");
    }

    #[test]
    fn ods_manifest_without_encryption_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.ods");
        write_zip(
            &path,
            &[
                ("mimetype", ODS_MIME_TYPE),
                (
                    "META-INF/manifest.xml",
                    r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
<manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>"#,
                ),
                ("content.xml", EMPTY_CONTENT),
            ],
        );
        let mut spreadsheet = open_spreadsheet(&path).unwrap();
        assert!(spreadsheet.read_sheets(&Criteria::default()).unwrap().is_empty());
    }

    #[test]
    fn xlsx_inline_iso_date_error_cells_and_1904_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.xlsx");
        write_zip(
            &path,
            &[
                (
                    "xl/_rels/workbook.xml.rels",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
                ),
                (
                    "xl/workbook.xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<workbookPr date1904="1"/>
<sheets><sheet name="Mixed" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
                ),
                (
                    "xl/styles.xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs>
</styleSheet>"#,
                ),
                (
                    "xl/worksheets/sheet1.xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1">
<c r="A1" t="inlineStr"><is><t>Name</t></is></c>
<c r="B1" t="d"><v>2021-05-04T10:20:30</v></c>
<c r="C1" t="e"><v>#DIV/0!</v></c>
<c r="D1" s="1"><v>0</v></c>
</row>
</sheetData>
</worksheet>"#,
                ),
            ],
        );

        let mut spreadsheet = open_spreadsheet(&path).unwrap();
        let sheets = spreadsheet.read_sheets(&Criteria::default()).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Mixed");
        let cells: Vec<(String, cell::CellType, String)> = sheets[0]
            .cells
            .iter()
            .map(|cell| (cell.reference(), cell.kind, cell.to_string()))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("A1".to_owned(), cell::CellType::String, "Name".to_owned()),
                ("B1".to_owned(), cell::CellType::IsoDateTime, "2021-05-04 10:20:30".to_owned()),
                ("C1".to_owned(), cell::CellType::Error, "#DIV/0!".to_owned()),
                ("D1".to_owned(), cell::CellType::Date(cell::DateSystem::V1904), "1904-01-01 00:00:00".to_owned()),
            ]
        );
    }
}
