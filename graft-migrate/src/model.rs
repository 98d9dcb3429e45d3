//! Declared model shapes consumed by schema diff capture.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

/// Logical column type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// Floating point number.
    Float,
    /// Variable length text.
    String,
    /// True/false.
    Bool,
    /// Binary data.
    Bytes,
    /// Point in time.
    DateTime,
}

/// A field of a declared model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name as declared.
    pub name: String,
    /// Column name override.
    #[serde(default)]
    pub column: Option<String>,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether NULL is allowed.
    #[serde(default)]
    pub nullable: bool,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Carries a unique constraint.
    #[serde(default)]
    pub unique: bool,
}

impl Field {
    /// Create a non-null field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            column: None,
            field_type,
            nullable: false,
            primary_key: false,
            unique: false,
        }
    }

    /// Allow NULL.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Override the column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Column name: the override, or the snake_case field name.
    pub fn column_name(&self) -> String {
        self.column
            .clone()
            .unwrap_or_else(|| self.name.to_case(Case::Snake))
    }
}

/// A declared model, mapped to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Model name, usually a type name such as `UserProfile`.
    pub name: String,
    /// Table name override.
    #[serde(default)]
    pub table: Option<String>,
    /// Declared fields.
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Model {
    /// Create a model without fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Override the table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Table name: the override, or the pluralized snake_case model name.
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| pluralize(&self.name.to_case(Case::Snake)))
    }
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) && !stem.is_empty() {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}
