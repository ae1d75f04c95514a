//! Sheetmap - typed records to spreadsheets and back
//!
//! A record type declares its columns once (header text, column order,
//! preferred width, date/number pattern). The library exports lists of
//! records to .xlsx and imports .xls/.xlsx workbooks back into records,
//! coercing each cell to the field's declared type.
//!
//! # Example
//!
//! ```no_run
//! use royalbit_sheetmap::excel::{ImportOptions, SheetExporter, SheetImporter};
//! use royalbit_sheetmap::schema::{FieldAccess, SheetRecord};
//! use royalbit_sheetmap::types::{FieldSchema, FieldValue, Schema};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//! }
//!
//! impl FieldAccess for Person {
//!     fn get_field(&self, key: &str) -> Option<FieldValue> {
//!         (key == "name").then(|| FieldValue::Text(self.name.clone()))
//!     }
//!
//!     fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), String> {
//!         if key == "name" {
//!             self.name = value.into_text()?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl SheetRecord for Person {
//!     fn schema() -> Schema {
//!         Schema::builder().field(FieldSchema::text("name", "Name")).build()
//!     }
//! }
//!
//! let bytes = SheetExporter::new().export(&[Person { name: "Ada".into() }])?;
//! let people: Vec<Person> = SheetImporter::new(ImportOptions::for_exported_sheet())
//!     .import("people.xlsx", &bytes)?;
//! # Ok::<(), royalbit_sheetmap::error::SheetError>(())
//! ```

pub mod api;
pub mod cli;
pub mod dates;
pub mod error;
pub mod excel;
pub mod fetch;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use error::{ImportRowError, SheetError, SheetResult};
pub use schema::{DynamicRecord, FieldAccess, SheetRecord};
pub use types::{Cell, FieldSchema, FieldType, FieldValue, Grid, Schema};
