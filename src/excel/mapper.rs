//! Grid rows → typed records

use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::dates;
use crate::error::{ImportRowError, SheetResult};
use crate::excel::header::HeaderIndex;
use crate::excel::importer::ImportOptions;
use crate::schema::FieldAccess;
use crate::types::{Cell, FieldSchema, FieldType, FieldValue, Grid, Schema};

static EMPTY_CELL: Cell = Cell::Empty;

/// Map the data rows of `grid` into records built by `factory`.
///
/// Fields whose header is not in `headers` keep their default. The first
/// failing row/field aborts the whole mapping.
pub fn map_records<R, F>(
    grid: &Grid,
    headers: &HeaderIndex,
    schema: &Schema,
    options: &ImportOptions,
    mut factory: F,
) -> SheetResult<Vec<R>>
where
    R: FieldAccess,
    F: FnMut() -> R,
{
    let start = options.data_start_row.saturating_sub(1);
    let end = grid.len().saturating_sub(options.ignore_end_rows);

    let mapped: Vec<(&FieldSchema, usize)> = schema
        .fields()
        .iter()
        .filter_map(|field| headers.get(&field.name).map(|col| (field, col)))
        .collect();

    let mut records = Vec::with_capacity(end.saturating_sub(start));
    for row_idx in start..end {
        let row = &grid.rows[row_idx];
        let mut record = factory();

        for (field, col) in &mapped {
            let cell = row.get(*col).unwrap_or(&EMPTY_CELL);
            let source_row = options.ignore_start_rows + row_idx + 1;

            let value = coerce_cell(cell, field)
                .map_err(|cause| ImportRowError::new(source_row, &field.name, cause))?;
            if let Some(value) = value {
                record
                    .set_field(&field.key, value)
                    .map_err(|cause| ImportRowError::new(source_row, &field.name, cause))?;
            }
        }

        records.push(record);
    }

    Ok(records)
}

/// Convert one cell to the field's declared type.
///
/// `Ok(None)` leaves the field untouched: a blank cell in a non-text field.
pub fn coerce_cell(cell: &Cell, field: &FieldSchema) -> Result<Option<FieldValue>, String> {
    if field.field_type == FieldType::Text {
        return Ok(Some(FieldValue::Text(cell.text())));
    }
    if cell.is_blank() {
        return Ok(None);
    }

    let value = match (field.field_type, cell) {
        (FieldType::Date, Cell::Temporal(dt)) => FieldValue::Date(dt.date()),
        (FieldType::DateTime, Cell::Temporal(dt)) => FieldValue::DateTime(*dt),
        (FieldType::Date, _) => FieldValue::Date(dates::parse_date(&cell.text())?),
        (FieldType::DateTime, _) => FieldValue::DateTime(dates::parse_date_time(&cell.text())?),
        (FieldType::Decimal, _) => {
            let text = cell.text();
            FieldValue::Decimal(
                BigDecimal::from_str(text.trim())
                    .map_err(|_| format!("invalid decimal '{}'", text))?,
            )
        }
        (FieldType::Integer, _) => FieldValue::Integer(parse_integer(&cell.text())?),
        (FieldType::Text, _) => FieldValue::Text(cell.text()),
    };
    Ok(Some(value))
}

fn parse_integer(text: &str) -> Result<i64, String> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
        _ => Err(format!("invalid integer '{}'", text)),
    }
}
