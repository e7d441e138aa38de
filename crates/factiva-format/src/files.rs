//! Snapshot files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use factiva_types::Table;
use tracing::debug;

use crate::avro::read_avro;
use crate::{DecodeError, ResultDecoder, ResultFormat};

impl ResultDecoder {
    /// Reads one Avro snapshot file with the snapshot rules applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Table, DecodeError> {
        let raw = fs::read(path.as_ref())?;
        self.decode(&raw, ResultFormat::Avro)
    }

    /// Reads every `.avro` file in `dir` and concatenates the tables.
    ///
    /// Files are read in name order. Columns missing from some files hold nulls.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any matching file cannot be read.
    pub fn read_folder(&self, dir: impl AsRef<Path>) -> Result<Table, DecodeError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_avro_extension(path))
            .collect();
        paths.sort();

        let tables = paths
            .iter()
            .map(|path| {
                debug!(path = %path.display(), "Reading snapshot file");
                self.read_file(path)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table::concat(&tables))
    }
}

/// Reads any Avro file into a table with no snapshot rules applied.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn read_raw_avro(path: impl AsRef<Path>) -> Result<Table, DecodeError> {
    read_avro(&fs::read(path.as_ref())?)
}

fn has_avro_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("avro"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avro::fixtures;
    use factiva_types::Cell;

    #[test]
    fn test_read_folder_concatenates_avro_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("part-000.avro"),
            fixtures::articles(&[("A1", Some("s1"), Some("b1"))]),
        )
        .unwrap();
        fs::write(
            dir.path().join("part-001.AVRO"),
            fixtures::articles(&[("A2", Some("s2"), Some("b2")), ("A3", None, Some("b3"))]),
        )
        .unwrap();
        fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let table = ResultDecoder::new()
            .with_merge_body(true)
            .read_folder(dir.path())
            .unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.get(0, "an"), Some(&Cell::from("A1")));
        assert_eq!(table.get(2, "body"), Some(&Cell::from("\n\nb3")));
        assert!(!table.has_column("snippet"));
    }

    #[test]
    fn test_read_raw_avro() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.avro");
        fs::write(&path, fixtures::articles(&[("A1", None, None)])).unwrap();

        let table = read_raw_avro(&path).unwrap();
        assert!(table.has_column("art"));
        assert_eq!(table.get(0, "publication_datetime"), Some(&Cell::Int(1_704_067_200_123)));
    }

    #[test]
    fn test_missing_file() {
        let err = ResultDecoder::new().read_file("/nonexistent/file.avro").unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }
}
