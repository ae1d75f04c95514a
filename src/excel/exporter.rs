//! Excel exporter implementation - records → .xlsx

use crate::error::{SheetError, SheetResult};
use crate::excel::formatter::{format_cell, RenderedCell};
use crate::excel::layout::{plan_column_widths, ColumnWidth};
use crate::schema::{schema_of, FieldAccess, SheetRecord};
use crate::types::{FieldSchema, Schema};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Name of the single worksheet an export produces
pub const EXPORT_SHEET_NAME: &str = "sheet1";

/// Header fill (light turquoise)
const HEADER_FILL: u32 = 0xCCFFFF;

/// Export settings
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub sheet_name: String,
    /// Also write fields pulled in from base schemas
    pub include_inherited: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: EXPORT_SHEET_NAME.to_string(),
            include_inherited: false,
        }
    }
}

/// Cells and widths computed for one export, before encoding
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RenderedCell>>,
    pub widths: Vec<ColumnWidth>,
}

/// Excel exporter for typed records
pub struct SheetExporter {
    options: ExportOptions,
}

impl Default for SheetExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetExporter {
    /// Create an exporter with default options
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Export records of a schema-bearing type to .xlsx bytes
    pub fn export<T: SheetRecord>(&self, records: &[T]) -> SheetResult<Vec<u8>> {
        let schema = schema_of::<T>();
        self.export_with_schema(records, &schema)
    }

    /// Export records against an explicit schema to .xlsx bytes
    pub fn export_with_schema<R: FieldAccess>(
        &self,
        records: &[R],
        schema: &Schema,
    ) -> SheetResult<Vec<u8>> {
        let mut workbook = self.build_workbook(records, schema)?;
        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| SheetError::Encoding(format!("Failed to encode workbook: {}", e)))?;

        info!(
            "Exported {} records ({} columns, {} bytes)",
            records.len(),
            self.columns(schema).len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Write the full workbook to a sink
    pub fn export_to_writer<R: FieldAccess, W: Write>(
        &self,
        records: &[R],
        schema: &Schema,
        sink: &mut W,
    ) -> SheetResult<()> {
        let bytes = self.export_with_schema(records, schema)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    /// Save the workbook to a file
    pub fn export_to_path<R: FieldAccess>(
        &self,
        records: &[R],
        schema: &Schema,
        output_path: &Path,
    ) -> SheetResult<()> {
        let mut workbook = self.build_workbook(records, schema)?;
        workbook
            .save(output_path)
            .map_err(|e| SheetError::Encoding(format!("Failed to save Excel file: {}", e)))?;
        info!("Exported {} records to {}", records.len(), output_path.display());
        Ok(())
    }

    /// Render every cell and plan column widths without encoding anything
    pub fn plan<R: FieldAccess>(&self, records: &[R], schema: &Schema) -> SheetResult<SheetPlan> {
        let columns = self.columns(schema);

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut row = Vec::with_capacity(columns.len());
            for field in &columns {
                let value = record.get_field(&field.key);
                row.push(format_cell(field, value.as_ref())?);
            }
            rows.push(row);
        }

        let widths = plan_column_widths(&columns, &rows);

        Ok(SheetPlan {
            headers: columns.iter().map(|field| field.name.clone()).collect(),
            rows,
            widths,
        })
    }

    /// Fields written by this exporter, in column order
    fn columns<'a>(&self, schema: &'a Schema) -> Vec<&'a FieldSchema> {
        if self.options.include_inherited {
            schema.fields().iter().collect()
        } else {
            schema.own_fields().collect()
        }
    }

    fn build_workbook<R: FieldAccess>(&self, records: &[R], schema: &Schema) -> SheetResult<Workbook> {
        let plan = self.plan(records, schema)?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&self.options.sheet_name)
            .map_err(|e| SheetError::Encoding(format!("Failed to set worksheet name: {}", e)))?;

        self.write_header(worksheet, &plan)?;
        self.write_rows(worksheet, &plan)?;

        debug!(
            "Sheet '{}' planned: {} rows x {} columns",
            self.options.sheet_name,
            plan.rows.len(),
            plan.headers.len()
        );
        Ok(workbook)
    }

    /// Header row (row 0) with border + fill, and column widths
    fn write_header(&self, worksheet: &mut Worksheet, plan: &SheetPlan) -> SheetResult<()> {
        let header_format = Format::new()
            .set_border(FormatBorder::Thin)
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(HEADER_FILL));

        for (col_idx, (header, width)) in plan.headers.iter().zip(&plan.widths).enumerate() {
            let col = column_index(col_idx)?;
            worksheet
                .set_column_width(col, width.characters())
                .map_err(|e| SheetError::Encoding(format!("Failed to set column width: {}", e)))?;
            worksheet
                .write_string_with_format(0, col, header, &header_format)
                .map_err(|e| SheetError::Encoding(format!("Failed to write header: {}", e)))?;
        }
        Ok(())
    }

    /// Data rows starting at row 1
    fn write_rows(&self, worksheet: &mut Worksheet, plan: &SheetPlan) -> SheetResult<()> {
        let mut number_formats: HashMap<&str, Format> = HashMap::new();

        for (row_idx, row) in plan.rows.iter().enumerate() {
            let excel_row = u32::try_from(row_idx + 1)
                .map_err(|_| SheetError::Encoding("Too many rows for one worksheet".to_string()))?;

            for (col_idx, cell) in row.iter().enumerate() {
                let col = column_index(col_idx)?;
                match cell {
                    RenderedCell::Text(text) => {
                        worksheet.write_string(excel_row, col, text).map_err(|e| {
                            SheetError::Encoding(format!("Failed to write text: {}", e))
                        })?;
                    }
                    RenderedCell::Number {
                        value, num_format, ..
                    } => {
                        let format = number_formats
                            .entry(num_format.as_str())
                            .or_insert_with(|| Format::new().set_num_format(num_format));
                        worksheet
                            .write_number_with_format(excel_row, col, *value, format)
                            .map_err(|e| {
                                SheetError::Encoding(format!("Failed to write number: {}", e))
                            })?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn column_index(idx: usize) -> SheetResult<u16> {
    u16::try_from(idx)
        .map_err(|_| SheetError::Encoding("Too many columns for one worksheet".to_string()))
}
