use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//==============================================================================
// Field metadata
//==============================================================================

/// Default date pattern carried by every field that does not declare one.
pub const DEFAULT_DATE_PATTERN: &str = "yyyy-MM-dd";

/// Date-time pattern treated as "no explicit numeric format" for numeric columns.
pub const DEFAULT_DATE_TIME_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";

/// Default preferred column width, in 1/256 character units.
pub const DEFAULT_COLUMN_WIDTH: u32 = 4700;

/// Declared semantic type of a mapped field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Date,
    DateTime,
}

impl FieldType {
    /// Integer and decimal kinds are written as numeric cells
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Decimal)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateTime)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
            FieldType::DateTime => "date_time",
        }
    }
}

/// One mapped field: how a record field becomes a sheet column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Record field identifier used by [`crate::schema::FieldAccess`]
    pub key: String,
    /// Header text
    pub name: String,
    pub order: i32,
    /// Preferred column width in 1/256 character units
    pub preferred_width: u32,
    pub date_pattern: String,
    pub field_type: FieldType,
    /// Declared on a base schema and pulled in through inheritance
    pub inherited: bool,
}

impl FieldSchema {
    pub fn new(key: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            order: 0,
            preferred_width: DEFAULT_COLUMN_WIDTH,
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            field_type,
            inherited: false,
        }
    }

    pub fn text(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, FieldType::Text)
    }

    pub fn integer(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, FieldType::Integer)
    }

    pub fn decimal(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, FieldType::Decimal)
    }

    pub fn date(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, FieldType::Date)
    }

    pub fn date_time(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, FieldType::DateTime)
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.preferred_width = width;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = pattern.into();
        self
    }
}

/// Ordered field list for one record type, ascending by `order`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    /// Stable-sorts by `order`; ties keep declaration order.
    pub fn new(mut fields: Vec<FieldSchema>) -> Self {
        fields.sort_by_key(|field| field.order);
        Self { fields }
    }

    pub fn builder() -> crate::schema::SchemaBuilder {
        crate::schema::SchemaBuilder::default()
    }

    /// All fields, own and inherited
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Fields declared directly on the type
    pub fn own_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|field| !field.inherited)
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_fields(self) -> Vec<FieldSchema> {
        self.fields
    }
}

//==============================================================================
// Field values
//==============================================================================

/// Runtime value of one record field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(BigDecimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "date_time",
        }
    }

    pub fn into_text(self) -> Result<String, String> {
        match self {
            FieldValue::Text(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    pub fn into_integer(self) -> Result<i64, String> {
        match self {
            FieldValue::Integer(i) => Ok(i),
            FieldValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid integer '{}'", s)),
            other => Err(format!("expected integer, got {}", other.type_name())),
        }
    }

    pub fn into_decimal(self) -> Result<BigDecimal, String> {
        match self {
            FieldValue::Decimal(d) => Ok(d),
            FieldValue::Integer(i) => Ok(BigDecimal::from(i)),
            FieldValue::Text(s) => {
                BigDecimal::from_str(s.trim()).map_err(|_| format!("invalid decimal '{}'", s))
            }
            other => Err(format!("expected decimal, got {}", other.type_name())),
        }
    }

    pub fn into_date(self) -> Result<NaiveDate, String> {
        match self {
            FieldValue::Date(d) => Ok(d),
            FieldValue::DateTime(dt) => Ok(dt.date()),
            FieldValue::Text(s) => crate::dates::parse_date(&s),
            other => Err(format!("expected date, got {}", other.type_name())),
        }
    }

    pub fn into_date_time(self) -> Result<NaiveDateTime, String> {
        match self {
            FieldValue::DateTime(dt) => Ok(dt),
            FieldValue::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
            FieldValue::Text(s) => crate::dates::parse_date_time(&s),
            other => Err(format!("expected date_time, got {}", other.type_name())),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<BigDecimal> for FieldValue {
    fn from(value: BigDecimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

//==============================================================================
// Grid
//==============================================================================

/// One decoded sheet cell, raw typing preserved
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    Temporal(NaiveDateTime),
}

impl Cell {
    /// Empty, or text that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form used for header matching and coercion.
    ///
    /// Whole numbers drop the fractional part, midnight timestamps render as dates.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Cell::Boolean(b) => b.to_string(),
            Cell::Temporal(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0 {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }
}

pub type Row = Vec<Cell>;

/// Rows of cells, concatenated across every sheet of a workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Row>,
}

impl Grid {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }
}
