//! Auto-migration dry run.
//!
//! Inspects the live schema and reports the DDL that would bring it in line
//! with the declared models. Introspection queries are executed and recorded;
//! DDL is only recorded, never executed. Changes are additive: missing tables,
//! missing columns and the unique indexes those columns need.

use std::collections::{HashMap, HashSet};

use graft_migrate::{DryRun, Field, MigrateResult, Model, StatementSink};
use tracing::{debug, warn};

use crate::connection::SqliteDatabase;
use crate::error::SqliteResult;
use crate::types::{column_type, quote_ident, quote_literal, zero_default};

impl DryRun for SqliteDatabase {
    fn auto_migrate(&mut self, models: &[Model], sink: &mut StatementSink) -> MigrateResult<()> {
        Ok(self.plan(models, sink)?)
    }
}

impl SqliteDatabase {
    fn plan(&self, models: &[Model], sink: &mut StatementSink) -> SqliteResult<()> {
        // Columns of tables already planned in this run, keyed by table.
        let mut planned: HashMap<String, HashSet<String>> = HashMap::new();

        for model in models {
            let table = model.table_name();
            if model.fields.is_empty() {
                debug!(model = %model.name, "Skipping model without fields");
                continue;
            }

            let existing = match planned.get(&table) {
                Some(columns) => Some(columns.clone()),
                None => self.existing_columns(&table, sink)?,
            };

            let columns = match existing {
                None => {
                    sink.record_reversible(
                        create_table_sql(&table, &model.fields),
                        format!("DROP TABLE {}", quote_ident(&table)),
                    );
                    model.fields.iter().map(Field::column_name).collect()
                }
                Some(mut columns) => {
                    for field in &model.fields {
                        let column = field.column_name();
                        if columns.contains(&column) {
                            continue;
                        }
                        add_column(&table, field, sink);
                        columns.insert(column);
                    }
                    columns
                }
            };
            planned.insert(table, columns);
        }
        Ok(())
    }

    /// Column names of `table`, or `None` when it does not exist.
    fn existing_columns(
        &self,
        table: &str,
        sink: &mut StatementSink,
    ) -> SqliteResult<Option<HashSet<String>>> {
        let probe = format!(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = {}",
            quote_literal(table)
        );
        sink.record(probe.as_str());
        let count: i64 = self.conn.query_row(&probe, [], |row| row.get(0))?;
        if count == 0 {
            return Ok(None);
        }

        let columns_sql = format!("SELECT name FROM pragma_table_info({})", quote_literal(table));
        sink.record(columns_sql.as_str());
        let mut stmt = self.conn.prepare(&columns_sql)?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Some(columns))
    }
}

fn create_table_sql(table: &str, fields: &[Field]) -> String {
    let mut defs: Vec<String> = fields
        .iter()
        .map(|field| {
            let mut def = format!(
                "{} {}",
                quote_ident(&field.column_name()),
                column_type(field.field_type)
            );
            if !field.nullable {
                def.push_str(" NOT NULL");
            }
            if field.unique && !field.primary_key {
                def.push_str(" UNIQUE");
            }
            def
        })
        .collect();

    let keys: Vec<String> = fields
        .iter()
        .filter(|f| f.primary_key)
        .map(|f| quote_ident(&f.column_name()))
        .collect();
    if !keys.is_empty() {
        defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
}

fn add_column(table: &str, field: &Field, sink: &mut StatementSink) {
    let column = field.column_name();
    if field.primary_key {
        warn!(table, column = %column, "Cannot add a primary key column to an existing table, adding it as a plain column");
    }

    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_ident(table),
        quote_ident(&column),
        column_type(field.field_type)
    );
    if !field.nullable {
        sql.push_str(" NOT NULL DEFAULT ");
        sql.push_str(zero_default(field.field_type));
    }
    sink.record_reversible(
        sql,
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(table),
            quote_ident(&column)
        ),
    );

    if field.unique {
        let index = format!("idx_{}_{}", table, column);
        sink.record_reversible(
            format!(
                "CREATE UNIQUE INDEX {} ON {} ({})",
                quote_ident(&index),
                quote_ident(table),
                quote_ident(&column)
            ),
            format!("DROP INDEX {}", quote_ident(&index)),
        );
    }
}
