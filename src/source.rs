use std::path::PathBuf;

use crate::error::Result;

/// Handle to an append-ordered tabular backing store.
///
/// Implementations must return rows in stable append order (oldest first);
/// the loader and the duplicate detector both lean on that ordering. A fetch
/// is all-or-nothing: partial or streaming reads are not supported.
pub trait RowSource {
    fn fetch_all_rows(&self) -> Result<Vec<Vec<String>>>;
}

/// Rows already in memory, as handed over by the sheet client.
#[derive(Debug, Clone, Default)]
pub struct StaticRows(pub Vec<Vec<String>>);

impl RowSource for StaticRows {
    fn fetch_all_rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.0.clone())
    }
}

/// A local CSV export of the sheet, re-read in full on every fetch.
#[derive(Debug, Clone)]
pub struct CsvSnapshot {
    path: PathBuf,
}

impl CsvSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for CsvSnapshot {
    fn fetch_all_rows(&self) -> Result<Vec<Vec<String>>> {
        let file = std::fs::File::open(&self.path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(std::io::BufReader::new(file));
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_rows_preserve_order() {
        let source = StaticRows(vec![
            vec!["a".to_string()],
            vec!["b".to_string()],
            vec!["c".to_string()],
        ]);
        let rows = source.fetch_all_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "a");
        assert_eq!(rows[2][0], "c");
    }

    #[test]
    fn test_csv_snapshot_reads_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        let content = "\
Date,Store/Merchant,Amount
2024-01-05,Jollibee,250.00,extra
2024-01-06,Shell
";
        std::fs::write(&path, content).unwrap();
        let rows = CsvSnapshot::new(&path).fetch_all_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].len(), 4);
        assert_eq!(rows[2].len(), 2);
        assert_eq!(rows[1][2], "250.00");
    }

    #[test]
    fn test_csv_snapshot_missing_file_is_io_error() {
        let err = CsvSnapshot::new("/definitely/not/here.csv")
            .fetch_all_rows()
            .unwrap_err();
        assert!(matches!(err, crate::error::ResiboError::Io(_)));
    }
}
