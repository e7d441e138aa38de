//! Output formatting for the factiva CLI.

use anyhow::{Context, Result};
use clap::ValueEnum;
use factiva_lib::{OutputFormat, Table, write_table};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output format for result tables.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Tsv,
    Json,
    Ndjson,
    Parquet,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Tsv => Self::Tsv,
            Format::Json => Self::Json,
            Format::Ndjson => Self::Ndjson,
            Format::Parquet => Self::Parquet,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", OutputFormat::from(*self).extension())
    }
}

/// Write a table to `output`, or to stdout when no path is given.
pub(crate) fn write_output(table: &Table, output: Option<&Path>, format: Format) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_table(format.into(), table, &mut writer)?;
            writer.flush()?;
            eprintln!("Wrote {} rows to {}", table.num_rows(), path.display());
        }
        None => {
            let mut writer = BufWriter::new(std::io::stdout());
            write_table(format.into(), table, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use factiva_lib::Cell;

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::from_records(vec![vec![("an", Cell::from("A1")), ("count", Cell::Int(3))]]);

        write_output(&table, Some(&path), Format::Csv).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("an,count"));
        assert!(written.contains("A1,3"));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(Format::Ndjson.to_string(), "ndjson");
    }
}
