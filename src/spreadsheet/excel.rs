//! Office Open XML package helpers used by the xlsx reader.
use crate::error::SheetScriptError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::DateSystem;
use crate::spreadsheet::FileReader;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use zip::ZipArchive;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Reads worksheet relationships: relationship id to archive path.
pub(super) fn load_relationships(
    zip: &mut ZipArchive<FileReader>,
    path: &str,
) -> Result<HashMap<String, String>, SheetScriptError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::MissingPart(path.to_owned()))?;
    let mut relationships = HashMap::<String, String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let is_worksheet = event
                .get_attribute_value("Type")?
                .map(|kind| kind.ends_with("/worksheet"))
                .unwrap_or(true);
            let id = event.get_attribute_value("Id")?;
            let target = event.get_attribute_value("Target")?;
            if let (true, Some(id), Some(target)) = (is_worksheet, id, target) {
                relationships.insert(id.to_string(), to_zip_path(&target));
            }
        }
    });
    Ok(relationships)
}

/// Resolves each cell style (`cellXfs` entry) to the cell type its number format implies.
/// Custom formats win over built-in ids; anything unknown is a plain number.
pub(super) fn resolve_number_formats(
    format_ids: &[String],
    custom_formats: &HashMap<String, CellType>,
    system: DateSystem,
) -> Vec<CellType> {
    format_ids
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, system))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to an archive path under `xl/`.
pub(crate) fn to_zip_path(target: &str) -> String {
    if let Some(path) = target.strip_prefix('/') {
        path.to_owned()
    } else if target.starts_with("xl/") {
        target.to_owned()
    } else {
        format!("xl/{target}")
    }
}
