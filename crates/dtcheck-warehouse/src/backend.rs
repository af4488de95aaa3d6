//! DuckDB-backed warehouse.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use duckdb::types::Value;
use duckdb::{Connection, Row, params, params_from_iter};
use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series, TimeUnit};
use tracing::{debug, info};

use dtcheck_model::{ColumnDescriptor, FixtureRow, FixtureValue, TableName, TableSchema};

use crate::config::WarehouseConfig;
use crate::error::{Result, WarehouseError};
use crate::sql::{
    DESCRIBE_TABLE, ExtractKind, LIST_TABLES, insert_statement, quote_ident, select_statement,
    truncate_statement,
};
use crate::warehouse::{TruncateSummary, Warehouse};

/// Configured path that selects an in-memory database.
const MEMORY_PATH: &str = ":memory:";

enum Target {
    /// Root connection; sessions are clones sharing the same database.
    Memory(Connection),
    /// Sessions open the file and close it again, so external processes
    /// (the transformation pipeline) can take the write lock in between.
    File(PathBuf),
}

pub struct DuckDbWarehouse {
    target: Target,
    schema: String,
}

impl DuckDbWarehouse {
    /// Open the warehouse, create the schema if needed and run `init_sql`.
    pub fn open(config: &WarehouseConfig) -> Result<Self> {
        let target = match &config.path {
            Some(path) if path.as_os_str() != MEMORY_PATH => Target::File(path.clone()),
            _ => Target::Memory(Connection::open_in_memory()?),
        };
        let warehouse = Self {
            target,
            schema: config.schema.clone(),
        };
        warehouse.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(&warehouse.schema)
        ))?;
        if let Some(path) = &config.init_sql {
            let sql = fs::read_to_string(path).map_err(|source| WarehouseError::InitSql {
                path: path.clone(),
                source,
            })?;
            warehouse.execute_batch(&sql)?;
            debug!(init_sql = %path.display(), "ran warehouse init script");
        }
        info!(
            location = %config.location(),
            schema = %warehouse.schema,
            "warehouse opened"
        );
        Ok(warehouse)
    }

    /// Private in-memory warehouse.
    pub fn in_memory(schema: impl Into<String>) -> Result<Self> {
        Self::open(&WarehouseConfig::in_memory(schema))
    }

    /// Run raw SQL on a scoped connection.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        let conn = match &self.target {
            Target::Memory(root) => root.try_clone()?,
            Target::File(path) => Connection::open(path)?,
        };
        Ok(conn)
    }
}

impl Warehouse for DuckDbWarehouse {
    fn schema_name(&self) -> &str {
        &self.schema
    }

    fn truncate_tables(&self, tables: &BTreeSet<TableName>) -> Result<TruncateSummary> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let existing = list_tables(&tx, &self.schema)?;
        let mut summary = TruncateSummary::default();
        for table in tables {
            match resolve_stored_name(&self.schema, table, &existing)? {
                Some(name) => {
                    tx.execute_batch(&truncate_statement(&self.schema, name))?;
                    summary.truncated.push(table.clone());
                }
                None => {
                    debug!(table = %table, "table does not exist; nothing to truncate");
                    summary.missing.push(table.clone());
                }
            }
        }
        tx.commit()?;
        Ok(summary)
    }

    fn describe_table(&self, table: &TableName) -> Result<Option<TableSchema>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(DESCRIBE_TABLE)?;
        let rows = stmt.query_map(params![self.schema, table.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut described: Vec<(String, ColumnDescriptor)> = Vec::new();
        for row in rows {
            let (table_name, column_name, data_type) = row?;
            described.push((table_name, ColumnDescriptor::new(column_name, data_type)));
        }

        let mut candidates: Vec<String> = described.iter().map(|(name, _)| name.clone()).collect();
        candidates.dedup();
        let Some(stored_name) = resolve_stored_name(&self.schema, table, &candidates)? else {
            return Ok(None);
        };
        let stored_name = stored_name.clone();
        let columns: Vec<ColumnDescriptor> = described
            .into_iter()
            .filter(|(name, _)| *name == stored_name)
            .map(|(_, column)| column)
            .collect();
        // Stored names from the catalog may not be plain identifiers.
        let table = TableName::new(stored_name).unwrap_or_else(|_| table.clone());
        debug!(table = %table, column_count = columns.len(), "introspected table");
        Ok(Some(TableSchema {
            schema: self.schema.clone(),
            table,
            columns,
        }))
    }

    fn insert_rows(&self, schema: &TableSchema, rows: &[FixtureRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let columns = insert_columns(schema, rows)?;
        if columns.is_empty() {
            return Ok(0);
        }

        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for row in rows {
            for column in &columns {
                let value = row
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&column.name))
                    .map_or(Value::Null, |(_, value)| to_sql_value(value));
                values.push(value);
            }
        }

        let sql = insert_statement(schema, &columns, rows.len());
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(&sql, params_from_iter(values))?;
        tx.commit()?;
        debug!(table = %schema.table, row_count = inserted, "inserted fixture rows");
        Ok(inserted)
    }

    fn read_table(&self, schema: &TableSchema) -> Result<DataFrame> {
        if schema.columns.is_empty() {
            return Ok(DataFrame::empty());
        }
        let mut builders: Vec<ColumnBuilder> = schema
            .columns
            .iter()
            .map(|column| ColumnBuilder::new(ExtractKind::for_type(&column.column_type)))
            .collect();

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&select_statement(schema))?;
        let mut rows = stmt.query(params![])?;
        while let Some(row) = rows.next()? {
            for (idx, builder) in builders.iter_mut().enumerate() {
                builder.push(row, idx)?;
            }
        }

        let columns = schema
            .columns
            .iter()
            .zip(builders)
            .map(|(descriptor, builder)| builder.finish(&descriptor.name))
            .collect::<Result<Vec<_>>>()?;
        let frame = DataFrame::new(columns)?;
        debug!(table = %schema.table, row_count = frame.height(), "extracted table");
        Ok(frame)
    }
}

fn list_tables(conn: &Connection, schema: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(LIST_TABLES)?;
    let names = stmt
        .query_map(params![schema], |row| row.get::<_, String>(0))?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(names)
}

/// Pick the stored table a name refers to: the exact-case match when there
/// is one, otherwise the only case-insensitive match.
fn resolve_stored_name<'a>(
    schema: &str,
    table: &TableName,
    existing: &'a [String],
) -> Result<Option<&'a String>> {
    if let Some(exact) = existing.iter().find(|name| name.as_str() == table.as_str()) {
        return Ok(Some(exact));
    }
    let mut matches = existing.iter().filter(|name| table.matches(name));
    let first = matches.next();
    if matches.next().is_some() {
        let candidates: Vec<&str> = existing
            .iter()
            .filter(|name| table.matches(name))
            .map(String::as_str)
            .collect();
        return Err(WarehouseError::AmbiguousTable {
            schema: schema.to_string(),
            table: table.to_string(),
            candidates: candidates.join(", "),
        });
    }
    Ok(first)
}

/// Schema columns referenced by at least one fixture row, in ordinal order.
fn insert_columns<'a>(
    schema: &'a TableSchema,
    rows: &[FixtureRow],
) -> Result<Vec<&'a ColumnDescriptor>> {
    let mut used = BTreeSet::new();
    for row in rows {
        for name in row.keys() {
            let column = schema
                .column(name)
                .ok_or_else(|| WarehouseError::UnknownColumn {
                    table: schema.table.to_string(),
                    column: name.clone(),
                })?;
            used.insert(column.name.as_str());
        }
    }
    Ok(schema
        .columns
        .iter()
        .filter(|column| used.contains(column.name.as_str()))
        .collect())
}

fn to_sql_value(value: &FixtureValue) -> Value {
    match value {
        FixtureValue::Null => Value::Null,
        FixtureValue::Bool(v) => Value::Boolean(*v),
        FixtureValue::Int(v) => Value::BigInt(*v),
        FixtureValue::Float(v) => Value::Double(*v),
        FixtureValue::Text(v) => Value::Text(v.clone()),
    }
}

enum ColumnBuilder {
    Integer(Vec<Option<i64>>),
    Double(Vec<Option<f64>>),
    EpochMicros(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
}

impl ColumnBuilder {
    fn new(kind: ExtractKind) -> Self {
        match kind {
            ExtractKind::Integer => Self::Integer(Vec::new()),
            ExtractKind::Double => Self::Double(Vec::new()),
            ExtractKind::EpochMicros => Self::EpochMicros(Vec::new()),
            ExtractKind::Text => Self::Text(Vec::new()),
        }
    }

    fn push(&mut self, row: &Row<'_>, idx: usize) -> Result<()> {
        match self {
            Self::Integer(values) | Self::EpochMicros(values) => values.push(row.get(idx)?),
            Self::Double(values) => values.push(row.get(idx)?),
            Self::Text(values) => values.push(row.get(idx)?),
        }
        Ok(())
    }

    fn finish(self, name: &str) -> Result<Column> {
        let column = match self {
            Self::Integer(values) => Series::new(name.into(), values).into_column(),
            Self::Double(values) => Series::new(name.into(), values).into_column(),
            Self::EpochMicros(values) => Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
                .into_column(),
            Self::Text(values) => Series::new(name.into(), values).into_column(),
        };
        Ok(column)
    }
}
