use crate::error::{SheetError, SheetResult};
use crate::excel::formatter::numeric_format;
use crate::excel::{ExportOptions, ImportOptions, SheetExporter, SheetImporter};
use crate::schema::{load_schema_file, DynamicRecord};
use crate::types::{FieldSchema, Schema};
use colored::Colorize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Row window flags of the import command
#[derive(Debug, Clone, Default)]
pub struct ImportArgs {
    pub ignore_start: Option<usize>,
    pub header_row: Option<usize>,
    pub data_start: Option<usize>,
    pub ignore_end: Option<usize>,
    pub header_band: Option<usize>,
}

impl ImportArgs {
    /// Apply the given flags over the default options
    pub fn to_options(&self) -> ImportOptions {
        let defaults = ImportOptions::default();
        ImportOptions {
            ignore_start_rows: self.ignore_start.unwrap_or(defaults.ignore_start_rows),
            header_row: self.header_row.unwrap_or(defaults.header_row),
            data_start_row: self.data_start.unwrap_or(defaults.data_start_row),
            ignore_end_rows: self.ignore_end.unwrap_or(defaults.ignore_end_rows),
            header_band: self.header_band.unwrap_or(defaults.header_band),
        }
    }
}

/// Read a JSON array of record objects
fn read_records(path: &Path, schema: &Schema) -> SheetResult<Vec<DynamicRecord>> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(SheetError::Schema(format!(
                "{}: expected a JSON array of records, found {}",
                path.display(),
                json_kind(&other)
            )))
        }
    };
    items
        .iter()
        .map(|item| DynamicRecord::from_json(item, schema))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Execute the export command
pub fn export(
    schema_path: PathBuf,
    records_path: PathBuf,
    output: PathBuf,
    include_inherited: bool,
    verbose: bool,
) -> SheetResult<()> {
    println!("{}", "📊 Sheetmap - Excel Export".bold().green());
    println!("   Schema:  {}", schema_path.display());
    println!("   Records: {}", records_path.display());
    println!("   Output:  {}\n", output.display());

    if verbose {
        println!("{}", "📖 Loading schema...".cyan());
    }
    let schema = load_schema_file(&schema_path)?;
    if verbose {
        println!("   {} fields: {}\n", schema.len(), schema.headers().join(", "));
    }

    if verbose {
        println!("{}", "📖 Reading records...".cyan());
    }
    let records = read_records(&records_path, &schema)?;
    if verbose {
        println!("   Found {} records\n", records.len());
        println!("{}", "💾 Writing workbook...".cyan());
    }

    let exporter = SheetExporter::with_options(ExportOptions {
        include_inherited,
        ..ExportOptions::default()
    });
    exporter.export_to_path(&records, &schema, &output)?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   {} rows written to {}\n", records.len(), output.display());
    Ok(())
}

/// Execute the import command. Without `output` the records go to stdout
/// as JSON and nothing else is printed.
pub fn import(
    schema_path: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
    args: ImportArgs,
    verbose: bool,
) -> SheetResult<()> {
    let report = output.is_some();
    if report {
        println!("{}", "📊 Sheetmap - Excel Import".bold().green());
        println!("   Schema: {}", schema_path.display());
        println!("   Input:  {}\n", input.display());
    }

    let schema = load_schema_file(&schema_path)?;
    let options = args.to_options();
    if report && verbose {
        println!("{}", "📖 Reading workbook...".cyan());
        println!(
            "   header band {}, header row {}, data from row {}, {} trailing rows ignored\n",
            options.header_band,
            options.header_row,
            options.data_start_row,
            options.ignore_end_rows
        );
    }

    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| SheetError::UnsupportedFileType(input.display().to_string()))?;
    let bytes = fs::read(&input)?;
    let records =
        SheetImporter::new(options).import_with_schema(file_name, &bytes, &schema, DynamicRecord::new)?;

    let json = Value::Array(records.iter().map(|r| r.to_json(&schema)).collect());
    let rendered = serde_json::to_string_pretty(&json)?;

    match output {
        Some(path) => {
            fs::write(&path, rendered)?;
            println!("{}", "✅ Import Complete!".bold().green());
            println!("   {} records written to {}\n", records.len(), path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Execute the inspect command: print the column plan of a schema
pub fn inspect(schema_path: PathBuf) -> SheetResult<()> {
    let schema = load_schema_file(&schema_path)?;

    println!("{}", "📋 Sheetmap - Schema".bold().green());
    println!("   File: {}\n", schema_path.display());

    if schema.is_empty() {
        println!("{}", "   (no fields)".yellow());
        return Ok(());
    }

    println!(
        "   {:<5} {:<20} {:<16} {:<10} {:>6}  {}",
        "ORDER".bold(),
        "HEADER".bold(),
        "KEY".bold(),
        "TYPE".bold(),
        "WIDTH".bold(),
        "FORMAT".bold()
    );
    for field in schema.fields() {
        let line = format!(
            "   {:<5} {:<20} {:<16} {:<10} {:>6}  {}",
            field.order,
            field.name,
            field.key,
            field.field_type.type_name(),
            field.preferred_width,
            display_format(field)
        );
        if field.inherited {
            println!("{}  {}", line.dimmed(), "(inherited)".dimmed());
        } else {
            println!("{}", line);
        }
    }
    println!();
    Ok(())
}

/// Number format for numeric columns, rendering pattern for temporal ones
fn display_format(field: &FieldSchema) -> String {
    if let Some(format) = numeric_format(field) {
        format
    } else if field.field_type.is_temporal() {
        field.date_pattern.clone()
    } else {
        "-".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use tempfile::TempDir;

    #[test]
    fn test_import_args_fall_back_to_defaults() {
        let args = ImportArgs {
            header_band: Some(0),
            ignore_end: Some(1),
            ..ImportArgs::default()
        };
        let options = args.to_options();
        assert_eq!(options.header_band, 0);
        assert_eq!(options.ignore_end_rows, 1);
        assert_eq!(options.header_row, 1);
        assert_eq!(options.ignore_start_rows, 2);
    }

    #[test]
    fn test_display_format() {
        let decimal = FieldSchema::decimal("salary", "Salary");
        assert_eq!(display_format(&decimal), "0.00");

        let date = FieldSchema::date("hired", "Hired").pattern("yyyy/MM/dd");
        assert_eq!(display_format(&date), "yyyy/MM/dd");

        let text = FieldSchema::new("name", "Name", FieldType::Text);
        assert_eq!(display_format(&text), "-");
    }

    #[test]
    fn test_read_records_rejects_non_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, r#"{"name": "Alice"}"#).unwrap();

        let schema = Schema::new(vec![FieldSchema::text("name", "Name")]);
        let err = read_records(&path, &schema).unwrap_err();
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_read_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, r#"[{"name": "Alice"}, {"name": "Bob"}]"#).unwrap();

        let schema = Schema::new(vec![FieldSchema::text("name", "Name")]);
        let records = read_records(&path, &schema).unwrap();
        assert_eq!(records.len(), 2);
    }
}
