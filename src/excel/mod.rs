//! Excel import/export for typed records
//!
//! Export: records → schema-ordered columns → .xlsx
//! Import: .xls/.xlsx → grid → header index → records

pub mod exporter;
pub mod formatter;
pub mod header;
pub mod importer;
pub mod layout;
pub mod mapper;
pub mod reader;

pub use exporter::{ExportOptions, SheetExporter, SheetPlan};
pub use formatter::RenderedCell;
pub use header::HeaderIndex;
pub use importer::{ImportOptions, SheetImporter};
pub use layout::ColumnWidth;
pub use reader::{FileKind, GridReader};
