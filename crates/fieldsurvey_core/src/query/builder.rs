//! Selection builder over schema descriptors.
//!
//! # Responsibility
//! - Bind one FROM target (table or fixed join).
//! - Remap logical column names to table-qualified expressions.
//! - Accumulate parameterized predicates and execute SELECT/UPDATE/DELETE.
//!
//! # Invariants
//! - Predicates are only ever ANDed; a caller filter is appended as one more
//!   parenthesized conjunct and can never replace a scoping predicate.
//! - UPDATE and DELETE require a base table; joins are read-only.
//! - Caller-provided identifiers (projection, sort order, value keys) are
//!   validated before any SQL text is assembled.

use crate::error::{StoreError, StoreResult};
use crate::query::{ContentValues, RowSet};
use crate::schema::{Column, Source, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("valid identifier regex")
});
static SORT_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?(\s+(asc|desc))?$")
        .expect("valid sort term regex")
});

/// Composable query plan for one resource shape.
#[derive(Debug, Clone, Default)]
pub struct SelectionBuilder {
    source: Option<Source>,
    projection_map: BTreeMap<String, String>,
    default_projection: Vec<String>,
    clauses: Vec<String>,
    args: Vec<Value>,
}

impl SelectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the FROM target.
    pub fn table(mut self, source: impl Into<Source>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<Source> {
        self.source
    }

    /// Reads `column.name()` from its owning table whenever it is projected.
    pub fn map_to_table(mut self, column: Column) -> Self {
        self.projection_map
            .insert(column.name().to_string(), column.qualified());
        self
    }

    /// Projects `name` as an arbitrary SQL expression.
    pub fn map(mut self, name: &str, expression: impl Into<String>) -> Self {
        self.projection_map
            .insert(name.to_string(), expression.into());
        self
    }

    /// Maps each column to its owner and adds it to the default projection.
    ///
    /// Later calls win when two columns share a name, so the entity the route
    /// is about must be exposed last.
    pub fn expose(mut self, columns: &[Column]) -> Self {
        for column in columns {
            self = self.map_to_table(*column);
            self.push_default(column.name());
        }
        self
    }

    /// Adds an already-mapped name to the default projection.
    pub fn expose_mapped(mut self, name: &str) -> Self {
        self.push_default(name);
        self
    }

    /// Adds `column = ?` as a conjunct.
    pub fn where_eq(self, column: Column, value: impl Into<Value>) -> Self {
        self.where_sql(format!("{} = ?", column.qualified()), [value.into()])
    }

    /// Adds a trusted, internally assembled conjunct.
    pub fn where_sql(
        mut self,
        clause: impl Into<String>,
        args: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.clauses.push(clause.into());
        self.args.extend(args);
        self
    }

    /// Appends a caller-supplied filter as one more conjunct.
    ///
    /// # Errors
    /// - `InvalidSelection` when arguments are given without a clause.
    pub fn filter(self, selection: Option<&str>, args: &[Value]) -> StoreResult<Self> {
        let clause = selection.map(str::trim).filter(|text| !text.is_empty());
        match clause {
            Some(clause) => Ok(self.where_sql(clause.to_string(), args.iter().cloned())),
            None if !args.is_empty() => Err(StoreError::InvalidSelection(
                "selection arguments given without a selection clause".to_string(),
            )),
            None => Ok(self),
        }
    }

    /// Returns the combined WHERE body, or `None` when unrestricted.
    pub fn selection(&self) -> Option<String> {
        if self.clauses.is_empty() {
            return None;
        }
        Some(
            self.clauses
                .iter()
                .map(|clause| format!("({clause})"))
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Renders the SELECT statement for `projection` and `sort_order`.
    pub fn select_sql(
        &self,
        projection: Option<&[&str]>,
        sort_order: Option<&str>,
    ) -> StoreResult<String> {
        let source = self.source.ok_or(StoreError::NoTableBound)?;

        let requested = projection.filter(|columns| !columns.is_empty());
        let columns = match requested {
            Some(columns) => self.render_projection(columns.iter().copied())?,
            None if !self.default_projection.is_empty() => {
                self.render_projection(self.default_projection.iter().map(String::as_str))?
            }
            None => "*".to_string(),
        };

        let mut sql = format!("SELECT {columns} FROM {}", source.from_clause());
        self.push_where(&mut sql);
        if let Some(order) = render_sort_order(sort_order)? {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        Ok(sql)
    }

    /// Runs the SELECT and materializes all rows.
    pub fn query(
        &self,
        conn: &Connection,
        projection: Option<&[&str]>,
        sort_order: Option<&str>,
    ) -> StoreResult<RowSet> {
        let sql = self.select_sql(projection, sort_order)?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = RowSet::from_statement(&mut stmt, params_from_iter(self.args.iter()))?;
        Ok(rows)
    }

    /// Renders the UPDATE statement and its bind values (SET values first).
    pub fn update_sql(&self, values: &ContentValues) -> StoreResult<(String, Vec<Value>)> {
        let table = self.mutation_table("update")?;
        if values.is_empty() {
            return Err(StoreError::MissingValue("values"));
        }

        let mut assignments = Vec::with_capacity(values.len());
        let mut bind_values = Vec::with_capacity(values.len() + self.args.len());
        for (key, value) in values.iter() {
            let column = table_column(table, key)?;
            assignments.push(format!("{} = ?", column.name()));
            bind_values.push(value.clone());
        }
        bind_values.extend(self.args.iter().cloned());

        let mut sql = format!("UPDATE {} SET {}", table.name(), assignments.join(", "));
        self.push_where(&mut sql);
        Ok((sql, bind_values))
    }

    /// Executes the UPDATE and returns the affected-row count.
    pub fn update(&self, conn: &Connection, values: &ContentValues) -> StoreResult<usize> {
        let (sql, bind_values) = self.update_sql(values)?;
        Ok(conn.execute(&sql, params_from_iter(bind_values))?)
    }

    pub fn delete_sql(&self) -> StoreResult<String> {
        let table = self.mutation_table("delete")?;
        let mut sql = format!("DELETE FROM {}", table.name());
        self.push_where(&mut sql);
        Ok(sql)
    }

    /// Executes the DELETE and returns the count of directly deleted rows.
    ///
    /// Rows removed by `ON DELETE CASCADE` are not included.
    pub fn delete(&self, conn: &Connection) -> StoreResult<usize> {
        let sql = self.delete_sql()?;
        Ok(conn.execute(&sql, params_from_iter(self.args.iter()))?)
    }

    fn mutation_table(&self, operation: &'static str) -> StoreResult<Table> {
        let source = self.source.ok_or(StoreError::NoTableBound)?;
        source
            .base_table()
            .ok_or_else(|| StoreError::UnsupportedOperation {
                operation,
                target: source.to_string(),
            })
    }

    fn render_projection<'a>(&self, names: impl Iterator<Item = &'a str>) -> StoreResult<String> {
        let mut rendered = Vec::new();
        for name in names {
            if name == "*" {
                rendered.push(name.to_string());
                continue;
            }
            if !IDENTIFIER_RE.is_match(name) {
                return Err(StoreError::InvalidIdentifier(name.to_string()));
            }
            match self.projection_map.get(name) {
                Some(expression) => rendered.push(format!("{expression} AS {name}")),
                None => rendered.push(name.to_string()),
            }
        }
        Ok(rendered.join(", "))
    }

    fn push_default(&mut self, name: &str) {
        if !self.default_projection.iter().any(|existing| existing == name) {
            self.default_projection.push(name.to_string());
        }
    }

    fn push_where(&self, sql: &mut String) {
        if let Some(selection) = self.selection() {
            sql.push_str(" WHERE ");
            sql.push_str(&selection);
        }
    }
}

/// Inserts one row into `table` and returns its rowid.
pub fn insert_row(conn: &Connection, table: Table, values: &ContentValues) -> StoreResult<i64> {
    if values.is_empty() {
        conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", table.name()), [])?;
        return Ok(conn.last_insert_rowid());
    }

    let mut columns = Vec::with_capacity(values.len());
    for (key, _) in values.iter() {
        columns.push(table_column(table, key)?.name());
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(values.iter().map(|(_, value)| value)))?;
    Ok(conn.last_insert_rowid())
}

fn table_column(table: Table, key: &str) -> StoreResult<Column> {
    if !IDENTIFIER_RE.is_match(key) {
        return Err(StoreError::InvalidIdentifier(key.to_string()));
    }
    table.column(key).ok_or_else(|| StoreError::UnknownColumn {
        table: table.name(),
        column: key.to_string(),
    })
}

fn render_sort_order(sort_order: Option<&str>) -> StoreResult<Option<String>> {
    let Some(order) = sort_order.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };

    let mut terms = Vec::new();
    for term in order.split(',') {
        let term = term.trim();
        if !SORT_TERM_RE.is_match(term) {
            return Err(StoreError::InvalidIdentifier(term.to_string()));
        }
        terms.push(term.to_string());
    }
    Ok(Some(terms.join(", ")))
}
