//! Column width planning
//!
//! Widths are in 1/256 of a default character, the unit spreadsheet files
//! store column widths in. Text is measured by its GBK byte length, so a
//! CJK character counts double an ASCII one.

use encoding_rs::GBK;

use crate::excel::formatter::RenderedCell;
use crate::types::FieldSchema;

/// Width units per encoded byte
pub const WIDTH_UNITS_PER_BYTE: u32 = 260;

/// Upper bound for any computed column width
pub const MAX_COLUMN_WIDTH: u32 = 30_000;

/// Width units per character on the worksheet
pub const UNITS_PER_CHARACTER: f64 = 256.0;

/// Planned width of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidth {
    pub units: u32,
}

impl ColumnWidth {
    /// Width in characters, as the worksheet API expects it
    pub fn characters(&self) -> f64 {
        f64::from(self.units) / UNITS_PER_CHARACTER
    }
}

/// Byte length of `text` in the legacy double-byte encoding
pub fn legacy_byte_len(text: &str) -> usize {
    let (encoded, _, _) = GBK.encode(text);
    encoded.len()
}

/// Width a rendered text cell asks for
pub fn rendered_width(text: &str) -> u32 {
    let bytes = u32::try_from(legacy_byte_len(text)).unwrap_or(u32::MAX);
    bytes.saturating_mul(WIDTH_UNITS_PER_BYTE)
}

/// `min(max(preferred, observed), MAX_COLUMN_WIDTH)` per column.
///
/// Numeric cells are left out of the observed maximum: numeric columns are
/// sized by their preferred width alone.
pub fn plan_column_widths(fields: &[&FieldSchema], rows: &[Vec<RenderedCell>]) -> Vec<ColumnWidth> {
    let mut observed = vec![0u32; fields.len()];

    for row in rows {
        for (col, cell) in row.iter().enumerate().take(fields.len()) {
            if let RenderedCell::Text(text) = cell {
                observed[col] = observed[col].max(rendered_width(text));
            }
        }
    }

    fields
        .iter()
        .zip(observed)
        .map(|(field, seen)| ColumnWidth {
            units: field.preferred_width.max(seen).min(MAX_COLUMN_WIDTH),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldSchema;

    fn text(s: &str) -> RenderedCell {
        RenderedCell::Text(s.to_string())
    }

    #[test]
    fn test_legacy_byte_len_counts_cjk_double() {
        assert_eq!(legacy_byte_len("abc"), 3);
        assert_eq!(legacy_byte_len("中文"), 4);
        assert_eq!(legacy_byte_len("a中"), 3);
        assert_eq!(legacy_byte_len(""), 0);
    }

    #[test]
    fn test_preferred_width_wins_for_short_values() {
        let field = FieldSchema::text("name", "Name");
        let widths = plan_column_widths(&[&field], &[vec![text("Bob")]]);
        assert_eq!(widths[0].units, 4700);
    }

    #[test]
    fn test_long_values_widen_column() {
        let field = FieldSchema::text("name", "Name").width(100);
        let value = "x".repeat(40);
        let widths = plan_column_widths(&[&field], &[vec![text(&value)]]);
        assert_eq!(widths[0].units, 40 * 260);
    }

    #[test]
    fn test_width_is_capped() {
        let field = FieldSchema::text("note", "Note");
        let value = "y".repeat(500);
        let widths = plan_column_widths(&[&field], &[vec![text(&value)]]);
        assert_eq!(widths[0].units, MAX_COLUMN_WIDTH);

        let wide = FieldSchema::text("wide", "Wide").width(90_000);
        let widths = plan_column_widths(&[&wide], &[]);
        assert_eq!(widths[0].units, MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_width_is_monotonic_in_content() {
        let field = FieldSchema::text("name", "Name").width(0);
        let mut rows = vec![vec![text("abc")]];
        let mut last = plan_column_widths(&[&field], &rows)[0].units;
        for len in [2, 10, 5, 60, 200] {
            rows.push(vec![text(&"z".repeat(len))]);
            let now = plan_column_widths(&[&field], &rows)[0].units;
            assert!(now >= last);
            assert!(now <= MAX_COLUMN_WIDTH);
            last = now;
        }
    }

    #[test]
    fn test_numeric_cells_do_not_widen() {
        let field = FieldSchema::decimal("amount", "Amount").width(1000);
        let rows = vec![vec![RenderedCell::Number {
            value: 123456789012.5,
            text: "123456789012.5".to_string(),
            num_format: "0.00".to_string(),
        }]];
        let widths = plan_column_widths(&[&field], &rows);
        assert_eq!(widths[0].units, 1000);
    }

    #[test]
    fn test_characters_conversion() {
        let width = ColumnWidth { units: 2560 };
        assert!((width.characters() - 10.0).abs() < f64::EPSILON);
    }
}
