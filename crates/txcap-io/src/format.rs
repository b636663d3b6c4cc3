use std::{
    collections::HashSet,
    fs::{self, File},
    path::Path,
};

#[cfg(feature = "ipc")]
use polars::prelude::{IpcReader, IpcWriter};
#[cfg(feature = "parquet")]
use polars::prelude::{ParquetReader, ParquetWriter};
use polars::prelude::{CsvReader, CsvWriter, DataFrame, PolarsError, SerReader, SerWriter, Series};
use tracing::info;
use txcap_core::{TxcapError, TxcapResult};

/// Rows sampled when inferring CSV column types.
const CSV_INFER_ROWS: usize = 10_000;

/// Tabular formats understood by the loader and writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
    Ipc,
}

impl TableFormat {
    pub const ALL: &'static [TableFormat] =
        &[TableFormat::Csv, TableFormat::Parquet, TableFormat::Ipc];

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            TableFormat::Csv => &["csv"],
            TableFormat::Parquet => &["parquet"],
            TableFormat::Ipc => &["arrow", "ipc", "feather"],
        }
    }

    /// Format of an input path. Extension-less files are read as CSV.
    pub fn for_input(path: &Path) -> TxcapResult<Self> {
        let ext = lowercase_extension(path);
        if ext.is_empty() {
            return Ok(TableFormat::Csv);
        }
        Self::from_extension(&ext).ok_or_else(|| {
            TxcapError::UnsupportedFormat(format!(
                "'{}' (use .csv, .parquet or .arrow/.ipc/.feather)",
                path.display()
            ))
        })
    }

    /// Format of an output path; anything that is not Parquet or Arrow IPC is CSV.
    pub fn for_output(path: &Path) -> Self {
        Self::from_extension(&lowercase_extension(path)).unwrap_or(TableFormat::Csv)
    }

    fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&ext))
    }
}

pub(crate) fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

pub(crate) fn table_error(what: impl std::fmt::Display, err: PolarsError) -> TxcapError {
    TxcapError::Parse(format!("{what}: {err}"))
}

/// Read a table and lower-case its column names.
pub fn read_table(path: &Path) -> TxcapResult<DataFrame> {
    let format = TableFormat::for_input(path)?;
    let file = File::open(path)?;
    let df = match format {
        TableFormat::Csv => CsvReader::new(file)
            .has_header(true)
            .infer_schema(Some(CSV_INFER_ROWS))
            .finish()
            .map_err(|err| table_error(format!("reading CSV '{}'", path.display()), err))?,
        #[cfg(feature = "parquet")]
        TableFormat::Parquet => ParquetReader::new(file)
            .finish()
            .map_err(|err| table_error(format!("reading Parquet '{}'", path.display()), err))?,
        #[cfg(not(feature = "parquet"))]
        TableFormat::Parquet => {
            return Err(TxcapError::CapabilityUnavailable(
                "parquet support is disabled; rebuild with the 'parquet' feature".into(),
            ))
        }
        #[cfg(feature = "ipc")]
        TableFormat::Ipc => IpcReader::new(file)
            .finish()
            .map_err(|err| table_error(format!("reading Arrow IPC '{}'", path.display()), err))?,
        #[cfg(not(feature = "ipc"))]
        TableFormat::Ipc => {
            return Err(TxcapError::CapabilityUnavailable(
                "Arrow IPC support is disabled; rebuild with the 'ipc' feature".into(),
            ))
        }
    };
    lowercase_columns(df, path)
}

/// Lower-case every column name. When two headers collapse to the same name
/// the first one is kept.
fn lowercase_columns(df: DataFrame, path: &Path) -> TxcapResult<DataFrame> {
    let mut seen = HashSet::new();
    let mut dropped = Vec::new();
    let mut columns: Vec<Series> = Vec::with_capacity(df.width());
    for series in df.get_columns() {
        let lower = series.name().to_lowercase();
        if !seen.insert(lower.clone()) {
            dropped.push(series.name().to_string());
            continue;
        }
        let mut renamed = series.clone();
        renamed.rename(&lower);
        columns.push(renamed);
    }
    if !dropped.is_empty() {
        info!(
            table = %path.display(),
            columns = ?dropped,
            "dropping duplicate columns after lower-casing headers"
        );
    }
    DataFrame::new(columns).map_err(|err| table_error(path.display(), err))
}

/// Write a table, choosing the format from the path extension.
pub fn write_table(df: &mut DataFrame, path: &Path) -> TxcapResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    match TableFormat::for_output(path) {
        TableFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .map_err(|err| table_error(format!("writing CSV '{}'", path.display()), err))?;
        }
        #[cfg(feature = "parquet")]
        TableFormat::Parquet => {
            ParquetWriter::new(&mut file)
                .finish(df)
                .map_err(|err| table_error(format!("writing Parquet '{}'", path.display()), err))?;
        }
        #[cfg(not(feature = "parquet"))]
        TableFormat::Parquet => {
            return Err(TxcapError::CapabilityUnavailable(
                "parquet support is disabled; rebuild with the 'parquet' feature".into(),
            ))
        }
        #[cfg(feature = "ipc")]
        TableFormat::Ipc => {
            IpcWriter::new(&mut file)
                .finish(df)
                .map_err(|err| {
                    table_error(format!("writing Arrow IPC '{}'", path.display()), err)
                })?;
        }
        #[cfg(not(feature = "ipc"))]
        TableFormat::Ipc => {
            return Err(TxcapError::CapabilityUnavailable(
                "Arrow IPC support is disabled; rebuild with the 'ipc' feature".into(),
            ))
        }
    }
    Ok(())
}
