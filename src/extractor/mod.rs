//! Spreadsheet metadata extraction
//!
//! Parses raw workbook bytes with `calamine` and reduces each sheet to its
//! field names, a field -> type tag map, and a row count (header excluded).
//! A file that fails to parse gets an error entry; the rest of the batch is
//! unaffected.
//!
//! Type tags form a closed set: `integer`, `float`, `string`, `boolean`,
//! `datetime`, `unknown`. A column mixing integers and floats reads as
//! `float`; any other mix reads as `string`; an empty column is `unknown`.

use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::{debug, warn};

use crate::models::{FileCandidate, FileMetadata, SheetMetadata};

/// Extract metadata for every candidate in the batch. One unparseable file
/// never aborts extraction for its siblings.
pub fn extract_batch(candidates: &[FileCandidate]) -> Vec<FileMetadata> {
    candidates
        .iter()
        .map(|candidate| match extract_file(candidate) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(filename = %candidate.filename, error = %err, "Failed to parse spreadsheet");
                FileMetadata::failed(&candidate.filename, err.to_string())
            }
        })
        .collect()
}

fn extract_file(candidate: &FileCandidate) -> anyhow::Result<FileMetadata> {
    let cursor = Cursor::new(candidate.data.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let sheet = sheet_metadata(&name, &range);
        debug!(
            filename = %candidate.filename,
            sheet = %name,
            fields = sheet.fields.len(),
            rows = sheet.row_count,
            "Extracted sheet"
        );
        sheets.push(sheet);
    }

    Ok(FileMetadata::parsed(&candidate.filename, sheets))
}

/// Reduce one sheet to its metadata. The first row is the header; a blank
/// header cell gets a positional placeholder name.
pub fn sheet_metadata(name: &str, range: &Range<Data>) -> SheetMetadata {
    let fields: Vec<String> = range
        .rows()
        .next()
        .map(|header| {
            header
                .iter()
                .enumerate()
                .map(|(idx, cell)| header_label(idx, cell))
                .collect()
        })
        .unwrap_or_default();

    let mut types = BTreeMap::new();
    for (col, field) in fields.iter().enumerate() {
        types.insert(field.clone(), infer_column_type(range, col).to_string());
    }

    SheetMetadata {
        name: name.to_string(),
        fields,
        types,
        row_count: range.height().saturating_sub(1),
    }
}

fn header_label(idx: usize, cell: &Data) -> String {
    match cell {
        Data::Empty => format!("column_{}", idx + 1),
        other => other.to_string(),
    }
}

/// Fold the observed cell representations of a column into one tag.
fn infer_column_type(range: &Range<Data>, col: usize) -> &'static str {
    let mut tag: Option<&'static str> = None;

    for row in range.rows().skip(1) {
        let observed = match row.get(col) {
            Some(Data::Int(_)) => "integer",
            Some(Data::Float(_)) => "float",
            Some(Data::Bool(_)) => "boolean",
            Some(Data::DateTime(_)) | Some(Data::DateTimeIso(_)) => "datetime",
            Some(Data::String(_)) | Some(Data::DurationIso(_)) => "string",
            Some(Data::Empty) | Some(Data::Error(_)) | None => continue,
        };

        tag = Some(match tag {
            None => observed,
            Some(current) if current == observed => current,
            Some("integer") if observed == "float" => "float",
            Some("float") if observed == "integer" => "float",
            Some(_) => "string",
        });

        if tag == Some("string") {
            break;
        }
    }

    tag.unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn candidate(filename: &str, data: &[u8]) -> FileCandidate {
        FileCandidate {
            filename: filename.to_string(),
            size: data.len() as u64,
            content_type: None,
            data: Bytes::copy_from_slice(data),
        }
    }

    fn range_from(rows: &[Vec<Data>]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height.saturating_sub(1), width.saturating_sub(1)));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    #[test]
    fn header_fields_and_row_count_exclude_the_header_row() {
        let range = range_from(&[
            vec![Data::String("Cost".into()), Data::String("Qty".into())],
            vec![Data::Float(10.5), Data::Int(3)],
            vec![Data::Float(11.0), Data::Int(4)],
        ]);

        let sheet = sheet_metadata("Sheet1", &range);

        assert_eq!(sheet.fields, vec!["Cost", "Qty"]);
        assert_eq!(sheet.row_count, 2);
        assert_eq!(sheet.types["Cost"], "float");
        assert_eq!(sheet.types["Qty"], "integer");
    }

    #[test]
    fn mixed_int_and_float_column_reads_as_float() {
        let range = range_from(&[
            vec![Data::String("Amount".into())],
            vec![Data::Int(1)],
            vec![Data::Float(2.5)],
        ]);

        let sheet = sheet_metadata("S", &range);
        assert_eq!(sheet.types["Amount"], "float");
    }

    #[test]
    fn heterogeneous_column_reads_as_string() {
        let range = range_from(&[
            vec![Data::String("Code".into())],
            vec![Data::Int(42)],
            vec![Data::String("A-17".into())],
        ]);

        let sheet = sheet_metadata("S", &range);
        assert_eq!(sheet.types["Code"], "string");
    }

    #[test]
    fn empty_column_reads_as_unknown_and_blank_header_gets_placeholder() {
        let range = range_from(&[
            vec![Data::String("Region".into()), Data::Empty],
            vec![Data::String("EMEA".into()), Data::Empty],
        ]);

        let sheet = sheet_metadata("S", &range);
        assert_eq!(sheet.fields, vec!["Region", "column_2"]);
        assert_eq!(sheet.types["column_2"], "unknown");
    }

    #[test]
    fn boolean_and_datetime_tags_are_recognized() {
        let range = range_from(&[
            vec![Data::String("Active".into()), Data::String("When".into())],
            vec![Data::Bool(true), Data::DateTimeIso("2024-01-01T00:00:00".into())],
        ]);

        let sheet = sheet_metadata("S", &range);
        assert_eq!(sheet.types["Active"], "boolean");
        assert_eq!(sheet.types["When"], "datetime");
    }

    #[test]
    fn extraction_is_deterministic_for_the_same_range() {
        let range = range_from(&[
            vec![Data::String("A".into()), Data::String("B".into())],
            vec![Data::Int(1), Data::String("x".into())],
        ]);

        assert_eq!(sheet_metadata("S", &range), sheet_metadata("S", &range));
    }

    #[test]
    fn bad_bytes_produce_an_error_entry_without_aborting_siblings() {
        let batch = vec![
            candidate("garbage.xlsx", b"this is not a workbook"),
            candidate("also_garbage.xls", &[0u8; 16]),
        ];

        let metadata = extract_batch(&batch);

        assert_eq!(metadata.len(), 2);
        for entry in &metadata {
            assert!(entry.sheets.is_none());
            assert!(entry.error.is_some());
        }
        assert_eq!(metadata[0].filename, "garbage.xlsx");
        assert_eq!(metadata[1].filename, "also_garbage.xls");
    }
}
