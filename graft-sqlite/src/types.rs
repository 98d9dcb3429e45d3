//! Type mapping and SQL quoting for SQLite DDL.

use graft_migrate::FieldType;

/// SQLite column type for a declared field type.
pub fn column_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Int | FieldType::BigInt => "INTEGER",
        FieldType::Float => "REAL",
        FieldType::String => "TEXT",
        FieldType::Bool => "NUMERIC",
        FieldType::Bytes => "BLOB",
        FieldType::DateTime => "DATETIME",
    }
}

/// Constant default used when a NOT NULL column is added to an existing table.
///
/// SQLite refuses `ADD COLUMN ... NOT NULL` without a default, and the default
/// must be constant.
pub fn zero_default(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Int | FieldType::BigInt | FieldType::Bool => "0",
        FieldType::Float => "0.0",
        FieldType::String => "''",
        FieldType::Bytes => "X''",
        FieldType::DateTime => "'1970-01-01 00:00:00'",
    }
}

/// Quote an identifier.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
