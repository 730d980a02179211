//! In-memory table with named columns.

use std::collections::HashSet;

use serde::Serialize;

use crate::TableError;

/// Ordered rows of string cells addressed by header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from a header row and data rows.
    ///
    /// Header names are trimmed. Duplicate headers and rows whose width
    /// differs from the header are rejected.
    pub fn from_records<H, R, C>(headers: H, rows: R) -> Result<Self, TableError>
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .collect();
        if headers.is_empty() {
            return Err(TableError::NoHeader);
        }

        let mut seen = HashSet::with_capacity(headers.len());
        for header in &headers {
            if !header.is_empty() && !seen.insert(header.as_str()) {
                return Err(TableError::DuplicateColumn(header.clone()));
            }
        }

        let mut out = Vec::new();
        for (row, cells) in rows.into_iter().enumerate() {
            let cells: Vec<String> = cells.into_iter().map(Into::into).collect();
            if cells.len() != headers.len() {
                return Err(TableError::RaggedRow {
                    row,
                    expected: headers.len(),
                    actual: cells.len(),
                });
            }
            out.push(cells);
        }

        Ok(Self { headers, rows: out })
    }

    /// Header names in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Returns true if the named column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Check that every named column is present.
    ///
    /// Fails on the first missing column, in argument order.
    pub fn require_columns(&self, names: &[&str]) -> Result<(), TableError> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(TableError::MissingColumn {
                column: (*missing).to_string(),
                available: self.headers.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Iterate rows in input order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().enumerate().map(|(index, cells)| Record {
            index,
            headers: &self.headers,
            cells,
        })
    }
}

/// A borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    index: usize,
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> Record<'a> {
    /// Zero-based position of the row among the data rows.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw cell for a named column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let cells = self.cells;
        self.headers
            .iter()
            .position(|h| h == column)
            .map(|i| cells[i].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_records(
            [" Cu Values", "Glycine Values "],
            vec![vec!["10", "20"], vec!["5", "5"]],
        )
        .unwrap()
    }

    #[test]
    fn test_headers_are_trimmed() {
        let table = sample();
        assert_eq!(table.headers(), ["Cu Values", "Glycine Values"]);
        assert!(table.has_column("Cu Values"));
    }

    #[test]
    fn test_records_preserve_order() {
        let table = sample();
        let cu: Vec<_> = table
            .records()
            .map(|r| (r.index(), r.get("Cu Values").unwrap()))
            .collect();
        assert_eq!(cu, vec![(0, "10"), (1, "5")]);
    }

    #[test]
    fn test_get_unknown_column() {
        let table = sample();
        let record = table.records().next().unwrap();
        assert_eq!(record.get("Water"), None);
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let table = sample();
        let err = table
            .require_columns(&["Cu Values", "Water", "Acid"])
            .unwrap_err();
        assert!(err.is_missing_column());
        match err {
            TableError::MissingColumn { column, available } => {
                assert_eq!(column, "Water");
                assert_eq!(available.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = Table::from_records(["a", "b"], vec![vec!["1", "2"], vec!["3"]]).unwrap_err();
        assert!(matches!(
            err,
            TableError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(err.to_string(), "data row 2: has 1 cells, header has 2");
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let err = Table::from_records(["a", "a "], Vec::<Vec<String>>::new()).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn test_empty_header_rejected() {
        let err = Table::from_records(Vec::<String>::new(), Vec::<Vec<String>>::new()).unwrap_err();
        assert!(matches!(err, TableError::NoHeader));
    }
}
