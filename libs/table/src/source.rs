//! Workbook sources.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

use crate::{Table, TableError};

/// File extension of a sheet inside a workbook directory.
const SHEET_EXTENSION: &str = "csv";

/// A read-only source of tables, one per sheet.
pub trait TabularSource {
    /// Read a sheet. `None` selects the only sheet of the source.
    fn read_sheet(&self, sheet: Option<&str>) -> Result<Table, TableError>;
}

/// A CSV file, or a directory of `<sheet>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    path: PathBuf,
}

impl CsvWorkbook {
    /// Point at a workbook. Nothing is read until a sheet is requested.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sheet names, sorted.
    pub fn sheets(&self) -> Result<Vec<String>, TableError> {
        if !self.path.is_dir() {
            return Ok(sheet_name(&self.path).into_iter().collect());
        }

        let entries = fs::read_dir(&self.path).map_err(|source| TableError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut sheets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TableError::Io {
                path: self.path.clone(),
                source,
            })?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SHEET_EXTENSION));
            if path.is_file() && is_csv {
                sheets.extend(sheet_name(&path));
            }
        }
        sheets.sort();
        Ok(sheets)
    }

    fn sheet_path(&self, sheet: Option<&str>) -> Result<PathBuf, TableError> {
        let sheets = self.sheets()?;

        if !self.path.is_dir() {
            return match sheet {
                Some(name) if !sheets.iter().any(|s| s == name) => Err(TableError::SheetNotFound {
                    sheet: name.to_string(),
                    path: self.path.clone(),
                }),
                _ => Ok(self.path.clone()),
            };
        }

        let name = match (sheet, sheets.as_slice()) {
            (Some(name), _) => name.to_string(),
            (None, [only]) => only.clone(),
            (None, _) => {
                return Err(TableError::SheetRequired {
                    path: self.path.clone(),
                    available: sheets.clone(),
                })
            }
        };

        if !sheets.contains(&name) {
            return Err(TableError::SheetNotFound {
                sheet: name,
                path: self.path.clone(),
            });
        }
        Ok(self.path.join(format!("{name}.{SHEET_EXTENSION}")))
    }
}

impl TabularSource for CsvWorkbook {
    fn read_sheet(&self, sheet: Option<&str>) -> Result<Table, TableError> {
        let path = self.sheet_path(sheet)?;
        debug!(path = %path.display(), "reading sheet");

        let file = fs::File::open(&path).map_err(|source| TableError::Io {
            path: path.clone(),
            source,
        })?;
        parse_csv(file, &path)
    }
}

/// Parse CSV content with a header row into a [`Table`].
///
/// Fully blank rows at the end of the sheet (typical of spreadsheet exports)
/// are dropped. Blank rows between data rows are kept, so row numbers in
/// later errors match the sheet. `origin` is only used in error messages.
pub fn parse_csv<R: Read>(reader: R, origin: &Path) -> Result<Table, TableError> {
    let csv_err = |source| TableError::Csv {
        path: origin.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(TableError::NoHeader);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    while rows.last().is_some_and(|row| is_blank(row)) {
        rows.pop();
    }

    let table = Table::from_records(headers, rows)?;
    debug!(rows = table.len(), columns = table.headers().len(), "parsed sheet");
    Ok(table)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn sheet_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_csv_drops_trailing_blank_rows() {
        let data = "Cu Values,Glycine Values\n10,20\n5,5\n,\n , \n";
        let table = parse_csv(data.as_bytes(), Path::new("inline")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers(), ["Cu Values", "Glycine Values"]);
    }

    #[test]
    fn test_parse_csv_keeps_inner_blank_rows() {
        let data = "a,b\n1,2\n,\n3,4\n";
        let table = parse_csv(data.as_bytes(), Path::new("inline")).unwrap();
        assert_eq!(table.len(), 3);
        let last = table.records().last().unwrap();
        assert_eq!((last.index(), last.get("a")), (2, Some("3")));
    }

    #[test]
    fn test_parse_csv_strips_bom() {
        let data = "\u{feff}Cu Values,Glycine Values\n1,2\n";
        let table = parse_csv(data.as_bytes(), Path::new("inline")).unwrap();
        assert!(table.has_column("Cu Values"));
    }

    #[test]
    fn test_parse_csv_ragged_row() {
        let data = "a,b\n1,2\n3\n";
        let err = parse_csv(data.as_bytes(), Path::new("inline")).unwrap_err();
        assert!(matches!(err, TableError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn test_parse_csv_ragged_row_counts_blank_rows() {
        let data = "a,b\n1,2\n,\n3\n";
        let err = parse_csv(data.as_bytes(), Path::new("inline")).unwrap_err();
        assert!(matches!(err, TableError::RaggedRow { row: 2, .. }));
        assert!(err.to_string().starts_with("data row 3:"));
    }

    #[test]
    fn test_parse_csv_empty_input() {
        let err = parse_csv("".as_bytes(), Path::new("inline")).unwrap_err();
        assert!(matches!(err, TableError::NoHeader));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("LabData"))]
    fn test_single_file_workbook(#[case] sheet: Option<&str>) {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "LabData.csv", "a,b\n1,2\n");
        let table = CsvWorkbook::open(path).read_sheet(sheet).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_single_file_wrong_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "LabData.csv", "a,b\n1,2\n");
        let err = CsvWorkbook::open(path)
            .read_sheet(Some("OT-2 Input"))
            .unwrap_err();
        assert!(err.is_sheet_error());
    }

    #[test]
    fn test_directory_workbook_selects_sheet() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "OT-2 Input.csv", "a,b\n1,2\n3,4\n");
        write(dir.path(), "Notes.csv", "x\nhello\n");
        write(dir.path(), "README.txt", "not a sheet");

        let workbook = CsvWorkbook::open(dir.path());
        assert_eq!(workbook.sheets().unwrap(), vec!["Notes", "OT-2 Input"]);

        let table = workbook.read_sheet(Some("OT-2 Input")).unwrap();
        assert_eq!(table.len(), 2);

        let err = workbook.read_sheet(None).unwrap_err();
        assert!(matches!(err, TableError::SheetRequired { .. }));

        let err = workbook.read_sheet(Some("Missing")).unwrap_err();
        assert!(matches!(err, TableError::SheetNotFound { .. }));
    }

    #[test]
    fn test_directory_workbook_single_sheet_default() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "only.csv", "a\n1\n");
        let table = CsvWorkbook::open(dir.path()).read_sheet(None).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = CsvWorkbook::open("/nonexistent/labdata.csv")
            .read_sheet(None)
            .unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }
}
