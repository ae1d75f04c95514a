//! Excel importer implementation - .xls / .xlsx → records

use crate::error::{SheetError, SheetResult};
use crate::excel::header::HeaderIndex;
use crate::excel::mapper::map_records;
use crate::excel::reader::{GridReader, DEFAULT_HEADER_BAND};
use crate::fetch::fetch_remote;
use crate::schema::{schema_of, FieldAccess, SheetRecord};
use crate::types::{Grid, Schema};
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Row window of an import. Row numbers are 1-based against the grid,
/// i.e. after the header band has been dropped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Rows in front of the grid; only used to report source row numbers
    pub ignore_start_rows: usize,
    pub header_row: usize,
    pub data_start_row: usize,
    /// Trailing grid rows left out (totals, footnotes)
    pub ignore_end_rows: usize,
    /// Leading rows of each sheet the grid reader drops
    pub header_band: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            ignore_start_rows: DEFAULT_HEADER_BAND,
            header_row: 1,
            data_start_row: 2,
            ignore_end_rows: 0,
            header_band: DEFAULT_HEADER_BAND,
        }
    }
}

impl ImportOptions {
    /// Options for a sheet written by [`crate::excel::SheetExporter`]:
    /// no band, header on row 1, data from row 2
    pub fn for_exported_sheet() -> Self {
        Self {
            ignore_start_rows: 0,
            header_band: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SheetResult<()> {
        if self.header_row == 0 {
            return Err(SheetError::InvalidOptions(
                "header_row must be at least 1".to_string(),
            ));
        }
        if self.data_start_row == 0 {
            return Err(SheetError::InvalidOptions(
                "data_start_row must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Excel importer for typed records
pub struct SheetImporter {
    options: ImportOptions,
}

impl Default for SheetImporter {
    fn default() -> Self {
        Self::new(ImportOptions::default())
    }
}

impl SheetImporter {
    /// Create a new Excel importer
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Import bytes of a workbook named `file_name` into records of `T`
    pub fn import<T: SheetRecord>(&self, file_name: &str, bytes: &[u8]) -> SheetResult<Vec<T>> {
        let schema = schema_of::<T>();
        self.import_with_schema(file_name, bytes, &schema, T::default)
    }

    /// Import against an explicit schema, building records with `factory`
    pub fn import_with_schema<R, F>(
        &self,
        file_name: &str,
        bytes: &[u8],
        schema: &Schema,
        factory: F,
    ) -> SheetResult<Vec<R>>
    where
        R: FieldAccess,
        F: FnMut() -> R,
    {
        self.options.validate()?;
        let grid = self.read_grid(file_name, bytes)?;
        self.map_grid(&grid, schema, factory)
    }

    /// Decode only, without mapping
    pub fn read_grid(&self, file_name: &str, bytes: &[u8]) -> SheetResult<Grid> {
        GridReader::new()
            .with_header_band(self.options.header_band)
            .read_named(file_name, bytes)
    }

    /// Resolve headers and map an already decoded grid
    pub fn map_grid<R, F>(&self, grid: &Grid, schema: &Schema, factory: F) -> SheetResult<Vec<R>>
    where
        R: FieldAccess,
        F: FnMut() -> R,
    {
        self.options.validate()?;
        let headers = HeaderIndex::resolve(grid, self.options.header_row)?;
        let records = map_records(grid, &headers, schema, &self.options, factory)?;

        info!(
            "Imported {} records ({} grid rows, {} of {} fields matched a header)",
            records.len(),
            grid.len(),
            schema
                .fields()
                .iter()
                .filter(|field| headers.contains(&field.name))
                .count(),
            schema.len()
        );
        Ok(records)
    }

    /// Drain a byte stream, then import it
    pub fn import_reader<T: SheetRecord, S: Read>(
        &self,
        file_name: &str,
        mut stream: S,
    ) -> SheetResult<Vec<T>> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        drop(stream);
        self.import(file_name, &bytes)
    }

    /// Import a workbook from disk; the container follows the path's extension
    pub fn import_path<T: SheetRecord>(&self, path: &Path) -> SheetResult<Vec<T>> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| SheetError::UnsupportedFileType(path.display().to_string()))?;
        let bytes = fs::read(path)?;
        self.import(file_name, &bytes)
    }

    /// Fetch a remote workbook and import it. `file_name` picks the container.
    pub async fn import_url<T: SheetRecord>(
        &self,
        file_name: &str,
        file_url: &str,
    ) -> SheetResult<Vec<T>> {
        let bytes = fetch_remote(file_url).await?;
        self.import(file_name, &bytes)
    }
}
