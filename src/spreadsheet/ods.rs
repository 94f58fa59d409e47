use crate::error::SheetScriptError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::FileReader;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Cell hidden under a merged range
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// Comment attached to a cell, not part of its value
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
/// Run of spaces, `text:c` long
const SPACES: QName = QName(b"text:s");
const LINE_BREAK: QName = QName(b"text:line-break");
const TAB: QName = QName(b"text:tab");

#[derive(Error, Debug)]
pub enum OdsError {
    #[error("Invalid ODS MIME type")]
    MimeTypeError,
}

/// OpenDocument spreadsheet (.ods).
pub(crate) struct OdsSpreadsheet {
    /// File name of the workbook
    pub(crate) name: String,
    /// Open package; `content.xml` is read when sheets are requested
    zip: ZipArchive<FileReader>,
}

impl OdsSpreadsheet {
    /// Opens the package, checking the MIME type and rejecting encrypted documents.
    pub(crate) fn open(path: &Path) -> Result<Self, SheetScriptError> {
        let name = path.to_string_lossy().to_string();
        let file = File::open(path)?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(name.to_owned()))?;
        }
        Ok(OdsSpreadsheet { name, zip })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    /// Streams `content.xml` once. Repeated rows and columns are expanded for
    /// cells holding a value; the typed `office:*-value` attribute wins over the
    /// displayed paragraph text except for strings.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, SheetScriptError> {
        let mut sheets = Vec::<Sheet>::new();
        let mut reader = self
            .zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::MissingPart("content.xml".to_owned()))?;

        // Current sheet, `None` while outside a table or inside a rejected one
        let mut sheet = None::<Sheet>;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut text_context = false;
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TABLE => {
                let table_name = event.get_attribute_value("table:name")?.unwrap_or_default();
                sheet = criteria.accept(&table_name).then(|| Sheet::new(&self.name, &table_name));
                row = 0;
            }
            Event::End(event) if event.name() == TABLE => {
                sheets.extend(sheet.take());
            }
            Event::Start(event) if sheet.is_some() && event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if sheet.is_some() && event.name() == TABLE_ROW => {
                row += row_count;
            }
            Event::Start(event) if sheet.is_some() && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
                value.clear();
                col_count = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.get_attribute_value("office:value-type")?;
                let (cell_kind, attribute) = match value_type.as_deref() {
                    Some("boolean") => (CellType::Boolean, Some("office:boolean-value")),
                    Some("date") => (CellType::IsoDateTime, Some("office:date-value")),
                    Some("time") => (CellType::IsoDuration, Some("office:time-value")),
                    Some("string") => {
                        let is_error = event
                            .get_attribute_value("calcext:value-type")?
                            .map(|calc_type| calc_type == "error")
                            .unwrap_or(false);
                        (if is_error { CellType::Error } else { CellType::String }, None)
                    }
                    Some(_) => (CellType::Number, Some("office:value")),
                    None => (CellType::Empty, None),
                };
                kind = cell_kind;
                text_context = matches!(kind, CellType::String | CellType::Error);
                if let Some(attribute) = attribute {
                    if let Some(data) = event.get_attribute_value(attribute)? {
                        if kind == CellType::Boolean {
                            value.push(if data == "true" || data == "1" { '1' } else { '0' });
                        } else {
                            value.push_str(&data);
                        }
                    }
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if let Some(sheet) = sheet.as_mut() {
                    if kind != CellType::Empty && !value.is_empty() {
                        for row_offset in 0..row_count {
                            for col_offset in 0..col_count {
                                sheet.push(Cell {
                                    row: row + row_offset,
                                    col: col + col_offset,
                                    kind,
                                    value: value.to_owned(),
                                });
                            }
                        }
                    }
                }
                col += col_count;
                kind = CellType::Empty;
                text_context = false;
                comment_context = false;
            }
            Event::Start(event) if text_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if text_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if text_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if text_context && !comment_context && event.name() == SPACES => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                value.extend(std::iter::repeat(' ').take(count));
            }
            Event::Start(event) if text_context && !comment_context && event.name() == LINE_BREAK => value.push('\n'),
            Event::Start(event) if text_context && !comment_context && event.name() == TAB => value.push('\t'),
            Event::Text(event) if text_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if text_context && !comment_context => value.push_bytes_ref(&event)?,
        });

        Ok(sheets)
    }
}

/// Rejects archives whose `mimetype` entry names another document type.
fn check_mime(zip: &mut ZipArchive<FileReader>) -> Result<(), SheetScriptError> {
    if let Some(mut file) = zip.file("mimetype")? {
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// An encrypted document lists `manifest:encryption-data` under a file entry.
fn is_password_protected(zip: &mut ZipArchive<FileReader>) -> Result<bool, SheetScriptError> {
    let Some(mut reader) = zip.xml_reader("META-INF/manifest.xml")? else {
        return Ok(false);
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}
