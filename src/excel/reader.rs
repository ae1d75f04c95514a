//! Workbook decoding - .xls / .xlsx bytes → [`Grid`]

use crate::error::{SheetError, SheetResult};
use crate::types::{Cell, Grid, Row};
use calamine::{Data, Reader, Sheets, Xls, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Cursor;
use tracing::debug;

/// Leading rows of every sheet skipped before rows are collected
pub const DEFAULT_HEADER_BAND: usize = 2;

/// Physical container, chosen by file-name extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Legacy binary workbook (.xls)
    Xls,
    /// Office Open XML workbook (.xlsx)
    Xlsx,
}

impl FileKind {
    /// Case-insensitive match on the last extension of `file_name`
    pub fn from_file_name(file_name: &str) -> SheetResult<Self> {
        let extension = file_name
            .rfind('.')
            .map(|idx| file_name[idx..].to_ascii_lowercase());

        match extension.as_deref() {
            Some(".xls") => Ok(FileKind::Xls),
            Some(".xlsx") => Ok(FileKind::Xlsx),
            _ => Err(SheetError::UnsupportedFileType(file_name.to_string())),
        }
    }
}

/// Decodes workbooks into a single grid, sheet after sheet
#[derive(Debug, Clone)]
pub struct GridReader {
    header_band: usize,
}

impl Default for GridReader {
    fn default() -> Self {
        Self::new()
    }
}

impl GridReader {
    pub fn new() -> Self {
        Self {
            header_band: DEFAULT_HEADER_BAND,
        }
    }

    pub fn with_header_band(mut self, rows: usize) -> Self {
        self.header_band = rows;
        self
    }

    pub fn header_band(&self) -> usize {
        self.header_band
    }

    /// Decode bytes whose container is implied by `file_name`
    pub fn read_named(&self, file_name: &str, bytes: &[u8]) -> SheetResult<Grid> {
        let kind = FileKind::from_file_name(file_name)?;
        self.read(kind, bytes)
    }

    pub fn read(&self, kind: FileKind, bytes: &[u8]) -> SheetResult<Grid> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Sheets<Cursor<&[u8]>> = match kind {
            FileKind::Xls => Sheets::Xls(
                Xls::new(cursor)
                    .map_err(|e| SheetError::Encoding(format!("Failed to open .xls workbook: {}", e)))?,
            ),
            FileKind::Xlsx => Sheets::Xlsx(
                Xlsx::new(cursor)
                    .map_err(|e| SheetError::Encoding(format!("Failed to open .xlsx workbook: {}", e)))?,
            ),
        };

        let mut grid = Grid::default();
        let sheet_names = workbook.sheet_names().to_vec();

        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                SheetError::Encoding(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;

            // Column indices are absolute so every sheet lines up with one header row
            let first_col = range.start().map_or(0, |(_, col)| col as usize);
            let before = grid.len();
            self.collect_rows(first_col, range.rows(), &mut grid);
            debug!(
                "Sheet '{}': {} rows collected ({}x{} used range)",
                sheet_name,
                grid.len() - before,
                range.height(),
                range.width()
            );
        }

        Ok(grid)
    }

    /// Skip the header band, drop blank rows, append the rest to `grid`.
    ///
    /// The band counts from the first row of `rows`, i.e. the sheet's first
    /// populated row. `first_col` is the sheet column of each row's first item.
    pub fn collect_rows<'a>(
        &self,
        first_col: usize,
        rows: impl Iterator<Item = &'a [Data]>,
        grid: &mut Grid,
    ) {
        for raw in rows.skip(self.header_band) {
            if let Some(row) = convert_row(first_col, raw) {
                grid.push(row);
            }
        }
    }
}

/// Cells from sheet column 0 up to the last populated column; `None` for an
/// all-blank row
fn convert_row(first_col: usize, raw: &[Data]) -> Option<Row> {
    let cells: Vec<Cell> = std::iter::repeat(Cell::Empty)
        .take(first_col)
        .chain(raw.iter().map(convert_cell))
        .collect();
    let last = cells.iter().rposition(|cell| !cell.is_blank())?;
    Some(cells.into_iter().take(last + 1).collect())
}

pub fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(timestamp) if dt.is_datetime() => Cell::Temporal(timestamp),
            _ => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s)
            .map(Cell::Temporal)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn collect(reader: &GridReader, rows: &[Vec<Data>]) -> Grid {
        let mut grid = Grid::default();
        reader.collect_rows(0, rows.iter().map(|row| row.as_slice()), &mut grid);
        grid
    }

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_file_name("a.xls").unwrap(), FileKind::Xls);
        assert_eq!(FileKind::from_file_name("a.xlsx").unwrap(), FileKind::Xlsx);
        assert_eq!(FileKind::from_file_name("A.XLSX").unwrap(), FileKind::Xlsx);
        assert_eq!(
            FileKind::from_file_name("archive.tar.xls").unwrap(),
            FileKind::Xls
        );
    }

    #[test]
    fn test_file_kind_rejects_other_extensions() {
        for name in ["data.csv", "noext", "sheet.xlsm", "xlsx"] {
            assert!(matches!(
                FileKind::from_file_name(name),
                Err(SheetError::UnsupportedFileType(_))
            ));
        }
    }

    #[test]
    fn test_header_band_is_skipped() {
        let rows = vec![
            vec![s("Report title")],
            vec![s("generated today")],
            vec![s("Name"), s("Age")],
            vec![s("Alice"), Data::Float(30.0)],
        ];
        let grid = collect(&GridReader::new(), &rows);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.rows[0][0], Cell::Text("Name".to_string()));
        assert_eq!(grid.rows[1][1], Cell::Number(30.0));

        let all = collect(&GridReader::new().with_header_band(0), &rows);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_header_band_counts_from_first_populated_row() {
        // A used range that starts below a top margin still loses the full band
        let rows = vec![
            vec![s("Staff report")],
            vec![s("generated today")],
            vec![s("Name")],
            vec![s("Alice")],
        ];
        let grid = collect(&GridReader::new(), &rows);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.rows[0][0], Cell::Text("Name".to_string()));
        assert_eq!(grid.rows[1][0], Cell::Text("Alice".to_string()));
    }

    #[test]
    fn test_first_column_offset_pads_leading_cells() {
        let rows = vec![vec![s("Rome")]];
        let mut grid = Grid::default();
        GridReader::new()
            .with_header_band(0)
            .collect_rows(1, rows.iter().map(|row| row.as_slice()), &mut grid);
        assert_eq!(
            grid.rows[0],
            vec![Cell::Empty, Cell::Text("Rome".to_string())]
        );
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let rows = vec![
            vec![s("Name"), s("Age")],
            vec![s("Alice"), s("30")],
            vec![Data::Empty, s("  ")],
            vec![s(""), s("")],
            vec![s("Bob"), s("41")],
        ];
        let grid = collect(&GridReader::new().with_header_band(0), &rows);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.rows[2][0], Cell::Text("Bob".to_string()));
    }

    #[test]
    fn test_trailing_blanks_trimmed_leading_kept() {
        let rows = vec![vec![Data::Empty, s("x"), Data::Empty, Data::Empty]];
        let grid = collect(&GridReader::new().with_header_band(0), &rows);
        assert_eq!(
            grid.rows[0],
            vec![Cell::Empty, Cell::Text("x".to_string())]
        );
    }

    #[test]
    fn test_convert_cell_variants() {
        assert_eq!(convert_cell(&Data::Int(5)), Cell::Number(5.0));
        assert_eq!(convert_cell(&Data::Bool(true)), Cell::Boolean(true));
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-02-03T04:05:06".to_string())),
            Cell::Temporal(
                NaiveDate::from_ymd_opt(2024, 2, 3)
                    .unwrap()
                    .and_hms_opt(4, 5, 6)
                    .unwrap()
            )
        );
        assert_eq!(
            convert_cell(&Data::DurationIso("PT1H".to_string())),
            Cell::Text("PT1H".to_string())
        );
    }

    #[test]
    fn test_read_rejects_garbage_bytes() {
        let err = GridReader::new()
            .read(FileKind::Xlsx, b"not a workbook")
            .unwrap_err();
        assert!(matches!(err, SheetError::Encoding(_)));
    }
}
