//! Header row → column index

use std::collections::HashMap;

use tracing::warn;

use crate::error::{SheetError, SheetResult};
use crate::types::Grid;

/// Trimmed header text → zero-based column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Build from the 1-based `header_row` of `grid`.
    ///
    /// Blank headers are skipped. When the same text appears twice the first
    /// column keeps it.
    pub fn resolve(grid: &Grid, header_row: usize) -> SheetResult<Self> {
        if header_row == 0 {
            return Err(SheetError::InvalidOptions(
                "header row number is 1-based".to_string(),
            ));
        }
        let row = grid
            .row(header_row - 1)
            .ok_or(SheetError::MissingHeaderRow {
                row: header_row,
                available: grid.len(),
            })?;

        let mut columns = HashMap::new();
        for (col_idx, cell) in row.iter().enumerate() {
            let text = cell.text();
            let header = text.trim();
            if header.is_empty() {
                continue;
            }
            if let Some(first) = columns.get(header) {
                warn!(
                    "Duplicate header '{}' in column {} ignored (first seen in column {})",
                    header, col_idx, first
                );
                continue;
            }
            columns.insert(header.to_string(), col_idx);
        }

        Ok(Self { columns })
    }

    pub fn get(&self, header: &str) -> Option<usize> {
        self.columns.get(header).copied()
    }

    pub fn contains(&self, header: &str) -> bool {
        self.columns.contains_key(header)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
