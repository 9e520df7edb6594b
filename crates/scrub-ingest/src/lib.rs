#![deny(unsafe_code)]

//! CSV ingestion.
//!
//! Reads an uploaded CSV (from disk or in-memory bytes) into a `DataFrame`,
//! classifies each column's broad kind from the inferred dtype, and builds
//! the initial [`IdentityMap`] with positional column ids.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::{CsvReadOptions, CsvReader, DataFrame, DataType, SerReader};
use tracing::info;

use scrub_model::{ColumnKind, IdentityMap, Result, ScrubError};

fn read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
}

/// Read a CSV file from disk.
pub fn read_csv_path(path: &Path) -> Result<DataFrame> {
    let df = read_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "csv loaded"
    );
    Ok(df)
}

/// Read a CSV from uploaded bytes.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let df = CsvReader::new(Cursor::new(bytes))
        .with_options(read_options())
        .finish()?;
    info!(rows = df.height(), columns = df.width(), "csv loaded");
    Ok(df)
}

/// Classify a polars dtype into the pipeline's broad column kinds.
pub fn classify_kind(dtype: &DataType) -> ColumnKind {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => ColumnKind::Numeric,
        DataType::Date | DataType::Datetime(_, _) | DataType::Time | DataType::Duration(_) => {
            ColumnKind::Datetime
        }
        _ => ColumnKind::Categorical,
    }
}

/// Build the initial identity map for a freshly uploaded dataset.
///
/// Each column gets its positional index as its id. An empty dataset (no
/// rows or no columns) is rejected here, before a session exists for it.
pub fn initial_identity(df: &DataFrame) -> Result<IdentityMap> {
    if df.width() == 0 || df.height() == 0 {
        return Err(ScrubError::EmptyDataset);
    }
    let map = IdentityMap::from_schema(df.get_columns().iter().map(|column| {
        (
            column.name().to_string(),
            classify_kind(column.dtype()),
        )
    }));
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrub_model::ColumnId;

    const SAMPLE: &str = "age,city,signup\n34,London,2021-03-01\n28,Paris,2021-04-15\n41,London,2021-05-20\n";

    #[test]
    fn bytes_and_path_readers_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let from_path = read_csv_path(&path).unwrap();
        let from_bytes = read_csv_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(from_path.shape(), (3, 3));
        assert_eq!(from_path.shape(), from_bytes.shape());
    }

    #[test]
    fn kinds_follow_inferred_dtypes() {
        let df = read_csv_bytes(SAMPLE.as_bytes()).unwrap();
        let map = initial_identity(&df).unwrap();

        assert_eq!(map.resolve(ColumnId::new(0)).unwrap().kind, ColumnKind::Numeric);
        assert_eq!(
            map.resolve(ColumnId::new(1)).unwrap().kind,
            ColumnKind::Categorical
        );
        assert_eq!(
            map.resolve(ColumnId::new(2)).unwrap().kind,
            ColumnKind::Datetime
        );
    }

    #[test]
    fn initial_ids_are_positional_and_bijective() {
        let df = read_csv_bytes(SAMPLE.as_bytes()).unwrap();
        let map = initial_identity(&df).unwrap();

        assert_eq!(map.resolve(ColumnId::new(1)).unwrap().name, "city");
        let names = df.get_column_names_owned();
        assert!(map.is_bijective_with(names.iter().map(|n| n.as_str())));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let df = read_csv_bytes(b"a,b\n").unwrap();
        assert!(matches!(
            initial_identity(&df),
            Err(ScrubError::EmptyDataset)
        ));
    }
}
