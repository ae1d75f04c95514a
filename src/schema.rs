//! Schema discovery
//!
//! A record type describes its columns once through [`SheetRecord::schema`]
//! and exposes its fields by key through [`FieldAccess`]. Inheritance is
//! explicit: a derived type pulls its base's schema in with
//! [`SchemaBuilder::inherit`].
//!
//! For callers without a compile-time type (the CLI and the API server),
//! schemas are loaded from YAML documents into a [`SchemaRegistry`] and
//! records are carried as [`DynamicRecord`]s.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SheetError, SheetResult};
use crate::types::{FieldSchema, FieldType, FieldValue, Schema, DEFAULT_COLUMN_WIDTH};

/// Keyed get/set over a record's mapped fields
pub trait FieldAccess {
    /// `None` means the value is absent
    fn get_field(&self, key: &str) -> Option<FieldValue>;

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), String>;
}

/// A record type with a declared column mapping
pub trait SheetRecord: FieldAccess + Default + 'static {
    fn schema() -> Schema;
}

//==============================================================================
// Builder
//==============================================================================

/// Assembles a [`Schema`] from base schemas and own fields
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    inherited: Vec<FieldSchema>,
    own: Vec<FieldSchema>,
}

impl SchemaBuilder {
    /// Pull in every field of a base schema. Call base-most first.
    pub fn inherit(mut self, base: Schema) -> Self {
        self.inherited
            .extend(base.into_fields().into_iter().map(|mut field| {
                field.inherited = true;
                field
            }));
        self
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.own.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSchema>) -> Self {
        self.own.extend(fields);
        self
    }

    pub fn build(self) -> Schema {
        let mut all = self.inherited;
        all.extend(self.own);
        Schema::new(all)
    }
}

/// Reject duplicate keys and blank headers
pub fn validate_schema(schema: &Schema) -> SheetResult<()> {
    let mut seen = HashSet::new();
    for field in schema.fields() {
        if field.name.trim().is_empty() {
            return Err(SheetError::Schema(format!(
                "field '{}' has an empty header",
                field.key
            )));
        }
        if !seen.insert(field.key.as_str()) {
            return Err(SheetError::Schema(format!(
                "field key '{}' is declared more than once",
                field.key
            )));
        }
    }
    Ok(())
}

//==============================================================================
// Per-type cache
//==============================================================================

fn schema_cache() -> &'static RwLock<HashMap<TypeId, Arc<Schema>>> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, Arc<Schema>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Schema of `T`, built on first use and shared afterwards
pub fn schema_of<T: SheetRecord>() -> Arc<Schema> {
    let type_id = TypeId::of::<T>();

    if let Ok(cache) = schema_cache().read() {
        if let Some(schema) = cache.get(&type_id) {
            return Arc::clone(schema);
        }
    }

    let built = Arc::new(T::schema());
    match schema_cache().write() {
        Ok(mut cache) => Arc::clone(cache.entry(type_id).or_insert(built)),
        // A poisoned cache only costs a rebuild per call
        Err(_) => built,
    }
}

//==============================================================================
// YAML schema documents
//==============================================================================

/// On-disk schema declaration
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDocument {
    pub key: String,
    pub header: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub pattern: Option<String>,
}

fn default_field_type() -> FieldType {
    FieldType::Text
}

fn default_width() -> u32 {
    DEFAULT_COLUMN_WIDTH
}

impl FieldDocument {
    fn to_field(&self) -> FieldSchema {
        let field = FieldSchema::new(&self.key, &self.header, self.field_type)
            .order(self.order)
            .width(self.width);
        match &self.pattern {
            Some(pattern) => field.pattern(pattern),
            None => field,
        }
    }
}

impl SchemaDocument {
    pub fn from_yaml(content: &str) -> SheetResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Named schemas resolved from YAML documents. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Resolve `extends` chains and validate every document
    pub fn from_documents(documents: Vec<SchemaDocument>) -> SheetResult<Self> {
        let mut by_name: HashMap<String, SchemaDocument> = HashMap::new();
        for doc in documents {
            if by_name.contains_key(&doc.name) {
                return Err(SheetError::Schema(format!(
                    "schema '{}' is declared more than once",
                    doc.name
                )));
            }
            by_name.insert(doc.name.clone(), doc);
        }

        let mut schemas = HashMap::new();
        for name in by_name.keys() {
            let schema = resolve_document(name, &by_name, &mut Vec::new())?;
            if schema.is_empty() {
                return Err(SheetError::Schema(format!(
                    "schema '{}' declares no fields",
                    name
                )));
            }
            validate_schema(&schema)?;
            schemas.insert(name.clone(), Arc::new(schema));
        }

        Ok(Self { schemas })
    }

    /// Load every `*.yaml` / `*.yml` file in a directory
    pub fn load_dir(dir: &Path) -> SheetResult<Self> {
        let mut documents = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            if !is_yaml {
                continue;
            }
            debug!("Loading schema document {}", path.display());
            let content = fs::read_to_string(&path)?;
            documents.push(SchemaDocument::from_yaml(&content)?);
        }
        Self::from_documents(documents)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> SheetResult<Arc<Schema>> {
        self.get(name)
            .ok_or_else(|| SheetError::Schema(format!("unknown schema '{}'", name)))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn resolve_document(
    name: &str,
    documents: &HashMap<String, SchemaDocument>,
    chain: &mut Vec<String>,
) -> SheetResult<Schema> {
    if chain.iter().any(|seen| seen == name) {
        chain.push(name.to_string());
        return Err(SheetError::Schema(format!(
            "cyclic extends chain: {}",
            chain.join(" -> ")
        )));
    }
    let doc = documents.get(name).ok_or_else(|| {
        SheetError::Schema(match chain.last() {
            Some(child) => format!("schema '{}' extends unknown schema '{}'", child, name),
            None => format!("unknown schema '{}'", name),
        })
    })?;

    chain.push(name.to_string());
    let mut builder = Schema::builder();
    if let Some(base) = &doc.extends {
        builder = builder.inherit(resolve_document(base, documents, chain)?);
    }
    chain.pop();

    Ok(builder.fields(doc.fields.iter().map(FieldDocument::to_field)).build())
}

/// Load one schema file; `extends` resolves against YAML files in the same directory.
pub fn load_schema_file(path: &Path) -> SheetResult<Arc<Schema>> {
    let content = fs::read_to_string(path)?;
    let doc = SchemaDocument::from_yaml(&content)?;

    let registry = match (&doc.extends, path.parent()) {
        (Some(_), Some(dir)) if dir.as_os_str().is_empty() => {
            SchemaRegistry::load_dir(Path::new("."))?
        }
        (Some(_), Some(dir)) => SchemaRegistry::load_dir(dir)?,
        _ => SchemaRegistry::from_documents(vec![doc.clone()])?,
    };
    registry.require(&doc.name)
}

//==============================================================================
// Dynamic records
//==============================================================================

/// Record without a compile-time type: values keyed by field key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    values: BTreeMap<String, FieldValue>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build from a JSON object, converting each mapped value to its field type.
    ///
    /// Keys not in the schema are ignored; `null` and missing keys stay absent.
    pub fn from_json(value: &Value, schema: &Schema) -> SheetResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SheetError::Schema("record must be a JSON object".to_string()))?;

        let mut record = Self::new();
        for field in schema.fields() {
            let Some(raw) = object.get(&field.key) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            let converted = json_to_field_value(raw, field.field_type).map_err(|cause| {
                SheetError::Schema(format!("field '{}': {}", field.key, cause))
            })?;
            record.values.insert(field.key.clone(), converted);
        }
        Ok(record)
    }

    /// JSON object with every schema key; absent values become `null`
    pub fn to_json(&self, schema: &Schema) -> Value {
        let mut object = Map::new();
        for field in schema.fields() {
            let value = match self.values.get(&field.key) {
                Some(FieldValue::Integer(i)) => Value::from(*i),
                Some(other) => Value::String(other.to_string()),
                None => Value::Null,
            };
            object.insert(field.key.clone(), value);
        }
        Value::Object(object)
    }
}

impl FieldAccess for DynamicRecord {
    fn get_field(&self, key: &str) -> Option<FieldValue> {
        self.values.get(key).cloned()
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), String> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

fn json_to_field_value(raw: &Value, field_type: FieldType) -> Result<FieldValue, String> {
    let as_text = || -> String {
        match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    };

    match field_type {
        FieldType::Text => Ok(FieldValue::Text(as_text())),
        FieldType::Integer => match raw.as_i64() {
            Some(i) => Ok(FieldValue::Integer(i)),
            None => FieldValue::Text(as_text()).into_integer().map(FieldValue::Integer),
        },
        FieldType::Decimal => FieldValue::Text(as_text())
            .into_decimal()
            .map(FieldValue::Decimal),
        FieldType::Date => crate::dates::parse_date(&as_text()).map(FieldValue::Date),
        FieldType::DateTime => {
            let text = as_text();
            crate::dates::parse_date_time(&text.replacen('T', " ", 1)).map(FieldValue::DateTime)
        }
    }
}
