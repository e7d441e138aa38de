//! Read Avro snapshot files.

use crate::display::{Format, write_output};
use anyhow::{Context, Result};
use factiva_lib::{ResultDecoder, read_raw_avro};
use std::path::{Path, PathBuf};

/// Snapshot rules applied while reading.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ReadOptions {
    pub(crate) stats_only: bool,
    pub(crate) merge_body: bool,
    pub(crate) all_fields: bool,
    pub(crate) raw: bool,
}

/// Read a file or folder of Avro snapshot files into one table.
pub(crate) fn load(path: &Path, options: &ReadOptions) -> Result<factiva_lib::Table> {
    let table = if path.is_dir() {
        if options.raw {
            anyhow::bail!("--raw reads a single file, {} is a folder", path.display());
        }
        decoder(options).read_folder(path)
    } else if options.raw {
        read_raw_avro(path)
    } else {
        decoder(options).read_file(path)
    };
    table.with_context(|| format!("Failed to read {}", path.display()))
}

const fn decoder(options: &ReadOptions) -> ResultDecoder {
    ResultDecoder::new()
        .with_stats_only(options.stats_only)
        .with_merge_body(options.merge_body)
        .with_all_fields(options.all_fields)
}

/// Read Avro files and write them as a table.
pub(crate) fn read_avro(
    path: &Path,
    options: &ReadOptions,
    output: Option<PathBuf>,
    format: Format,
) -> Result<()> {
    let table = load(path, options)?;
    eprintln!(
        "Read {} rows, {} columns from {}",
        table.num_rows(),
        table.num_columns(),
        path.display()
    );
    write_output(&table, output.as_deref(), format)
}
