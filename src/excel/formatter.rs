//! Export-side cell rendering

use crate::dates;
use crate::error::{SheetError, SheetResult};
use crate::types::{
    FieldSchema, FieldType, FieldValue, DEFAULT_DATE_PATTERN, DEFAULT_DATE_TIME_PATTERN,
};

/// A field value ready to be written to the sheet
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedCell {
    Text(String),
    Number {
        value: f64,
        /// Rendered text the number was parsed from
        text: String,
        num_format: String,
    },
}

impl RenderedCell {
    pub fn text(&self) -> &str {
        match self {
            RenderedCell::Text(text) => text,
            RenderedCell::Number { text, .. } => text,
        }
    }
}

/// True when a numeric field's pattern carries no explicit number format.
///
/// Both the field default and the date-time default count as "not set".
pub fn is_default_pattern(pattern: &str) -> bool {
    pattern == DEFAULT_DATE_TIME_PATTERN || pattern == DEFAULT_DATE_PATTERN
}

/// Display format for a numeric column, `None` for non-numeric fields
pub fn numeric_format(field: &FieldSchema) -> Option<String> {
    let default = match field.field_type {
        FieldType::Integer => "0",
        FieldType::Decimal => "0.00",
        _ => return None,
    };
    if is_default_pattern(&field.date_pattern) {
        Some(default.to_string())
    } else {
        Some(field.date_pattern.clone())
    }
}

/// Render one field value.
///
/// An absent value is an empty text cell, for temporal fields too.
pub fn format_cell(field: &FieldSchema, value: Option<&FieldValue>) -> SheetResult<RenderedCell> {
    let Some(value) = value else {
        return Ok(RenderedCell::Text(String::new()));
    };

    let rendered = render_text(field, value)?;

    match numeric_format(field) {
        Some(num_format) => {
            let number = rendered.trim().parse::<f64>().map_err(|_| {
                SheetError::Encoding(format!(
                    "field '{}' is numeric but its value '{}' is not a number",
                    field.name, rendered
                ))
            })?;
            Ok(RenderedCell::Number {
                value: number,
                text: rendered,
                num_format,
            })
        }
        None => Ok(RenderedCell::Text(rendered)),
    }
}

fn render_text(field: &FieldSchema, value: &FieldValue) -> SheetResult<String> {
    if !field.field_type.is_temporal() {
        return Ok(value.to_string());
    }

    let timestamp = match value {
        FieldValue::DateTime(dt) => *dt,
        FieldValue::Date(d) => d.and_time(chrono::NaiveTime::MIN),
        other => return Ok(other.to_string()),
    };

    dates::format_with_pattern(&timestamp, &field.date_pattern)
        .map_err(|cause| SheetError::Encoding(format!("field '{}': {}", field.name, cause)))
}
