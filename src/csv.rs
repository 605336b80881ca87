//! CSV interchange for schedule records.
//!
//! The format matches the original web app exactly: header
//! `mataKuliah,hari,jam,ruang`, every exported field double-quote wrapped
//! with internal quotes doubled. On import, header names are matched
//! case-insensitively (with `mata kuliah`/`matakuliah` accepted for the
//! first column), column order is irrelevant, extra columns are ignored,
//! and rows shorter than the highest required column index are skipped.

use thiserror::Error;

use crate::models::{RecordDraft, ScheduleRecord};

/// Column headers in export order (source vocabulary).
pub const HEADER: [&str; 4] = ["mataKuliah", "hari", "jam", "ruang"];

/// The two-row example file offered by the original app.
pub const SAMPLE: &str = "mataKuliah,hari,jam,ruang\n\
    Pengantar Pemrograman,Senin,08:00 - 10:00,R101\n\
    Basis Data,Selasa,10:00 - 12:00,R102\n";

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV is empty or malformed")]
    Empty,

    #[error("CSV header must contain the columns: mataKuliah, hari, jam, ruang")]
    MissingColumns,
}

/// Wrap a field in double quotes, doubling any internal quotes.
fn escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render records as CSV, one row per record in the given (possibly
/// filtered) order. No trailing newline, matching the original export.
pub fn export(records: &[&ScheduleRecord]) -> String {
    let mut out = HEADER.join(",");
    for record in records {
        out.push('\n');
        let row = [
            escape(&record.course_name),
            escape(&record.day),
            escape(&record.time),
            escape(&record.room),
        ];
        out.push_str(&row.join(","));
    }
    out
}

/// Split one line into fields. Quote-aware: a doubled quote inside a quoted
/// field is a literal quote, commas inside quotes do not split.
fn parse_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            if in_quotes && chars.get(i + 1) == Some(&'"') {
                current.push('"');
                i += 1;
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == ',' && !in_quotes {
            values.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        i += 1;
    }
    values.push(current);
    values
}

/// Split CSV text into rows of fields. Blank lines are dropped.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

/// Positions of the four required columns within the header row.
struct ColumnMap {
    course: usize,
    day: usize,
    time: usize,
    room: usize,
}

impl ColumnMap {
    fn max_index(&self) -> usize {
        self.course.max(self.day).max(self.time).max(self.room)
    }
}

fn resolve_columns(header: &[String]) -> Result<ColumnMap, CsvError> {
    let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    let course = names
        .iter()
        .position(|h| h == "matakuliah" || h == "mata kuliah");
    let find = |name: &str| names.iter().position(|h| h == name);

    match (course, find("hari"), find("jam"), find("ruang")) {
        (Some(course), Some(day), Some(time), Some(room)) => Ok(ColumnMap {
            course,
            day,
            time,
            room,
        }),
        _ => Err(CsvError::MissingColumns),
    }
}

/// Extract record drafts from CSV text.
///
/// The header is resolved by name before any data row is touched, so a file
/// missing a required column is rejected wholesale. A valid header with no
/// surviving data rows yields an empty draft list (the caller reports the
/// "no valid rows" outcome).
pub fn extract_drafts(text: &str) -> Result<Vec<RecordDraft>, CsvError> {
    let rows = parse(text);
    let Some((header, data)) = rows.split_first() else {
        return Err(CsvError::Empty);
    };
    let columns = resolve_columns(header)?;
    let max_index = columns.max_index();

    let mut drafts = Vec::new();
    for row in data {
        if row.len() <= max_index {
            continue;
        }
        drafts.push(RecordDraft::new(
            row[columns.course].trim(),
            row[columns.day].trim(),
            row[columns.time].trim(),
            row[columns.room].trim(),
        ));
    }
    Ok(drafts)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(course: &str, day: &str, time: &str, room: &str) -> ScheduleRecord {
        ScheduleRecord {
            id: 1,
            course_name: course.to_string(),
            day: day.to_string(),
            time: time.to_string(),
            room: room.to_string(),
        }
    }

    #[test]
    fn test_export_wraps_fields_and_doubles_quotes() {
        let r = record("Algo \"B\"", "Monday", "08:00 - 10:00", "R101");
        let csv = export(&[&r]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("mataKuliah,hari,jam,ruang"));
        assert_eq!(
            lines.next(),
            Some(r#""Algo ""B""","Monday","08:00 - 10:00","R101""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_parse_handles_quoted_commas_and_blank_lines() {
        let rows = parse("a,\"b,c\",d\n\n  \n\"say \"\"hi\"\"\",x\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["a", "b,c", "d"]);
        assert_eq!(rows[1], vec!["say \"hi\"", "x"]);
    }

    #[test]
    fn test_extract_resolves_columns_by_header_lookup() {
        // Shuffled column order, synonym header, extra column ignored.
        let text = "hari,ruang,notes,jam,Mata Kuliah\n\
                    Senin,R101,ignored,08:00,Algoritma\n";
        let drafts = extract_drafts(text).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].course_name, "Algoritma");
        assert_eq!(drafts[0].day, "Senin");
        assert_eq!(drafts[0].time, "08:00");
        assert_eq!(drafts[0].room, "R101");
    }

    #[test]
    fn test_extract_accepts_compact_synonym() {
        let text = "MATAKULIAH,HARI,JAM,RUANG\nAlgo,Senin,08:00,R1\n";
        let drafts = extract_drafts(text).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].course_name, "Algo");
    }

    #[test]
    fn test_missing_column_rejected_before_rows() {
        let text = "mataKuliah,hari,jam\nAlgo,Senin,08:00\n";
        assert!(matches!(
            extract_drafts(text),
            Err(CsvError::MissingColumns)
        ));
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let text = "mataKuliah,hari,jam,ruang\n\
                    Algo,Senin,08:00,R1\n\
                    TooShort,Senin\n";
        let drafts = extract_drafts(text).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].course_name, "Algo");
    }

    #[test]
    fn test_header_only_yields_no_drafts() {
        let drafts = extract_drafts("mataKuliah,hari,jam,ruang\n").unwrap();
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_empty_text_is_an_error() {
        assert!(matches!(extract_drafts("  \n \n"), Err(CsvError::Empty)));
    }

    #[test]
    fn test_export_import_round_trips_modulo_id() {
        let records = vec![
            record("Algoritma, Lanjut", "Senin", "08:00 - 10:00", "R101"),
            record("Basis \"Data\"", "Selasa", "10:00 - 12:00", "R102"),
        ];
        let refs: Vec<&ScheduleRecord> = records.iter().collect();
        let csv = export(&refs);

        let drafts = extract_drafts(&csv).unwrap();
        assert_eq!(drafts.len(), records.len());
        for (draft, original) in drafts.iter().zip(&records) {
            assert_eq!(draft.course_name, original.course_name);
            assert_eq!(draft.day, original.day);
            assert_eq!(draft.time, original.time);
            assert_eq!(draft.room, original.room);
        }
    }

    #[test]
    fn test_sample_file_imports_cleanly() {
        let drafts = extract_drafts(SAMPLE).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].course_name, "Pengantar Pemrograman");
        assert_eq!(drafts[1].room, "R102");
    }
}
