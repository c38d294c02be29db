//! Owned query results.

use rusqlite::types::Value;
use rusqlite::Statement;

/// Materialized result of one SELECT: column names plus row values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Runs a prepared statement and collects every row.
    pub(crate) fn from_statement(
        stmt: &mut Statement<'_>,
        params: impl rusqlite::Params,
    ) -> rusqlite::Result<Self> {
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let width = columns.len();
        let mut rows = Vec::new();
        let mut cursor = stmt.query(params)?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(row.get::<_, Value>(idx)?);
            }
            rows.push(values);
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(move |values| RowRef {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of one row with by-name accessors.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.values.get(index)
    }

    /// Text value; `None` for NULL, missing columns and non-text values.
    pub fn get_text(&self, column: &str) -> Option<&'a str> {
        match self.get(column)? {
            Value::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value, widening integers.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Real(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn is_null(&self, column: &str) -> bool {
        matches!(self.get(column), Some(Value::Null))
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::RowSet;
    use rusqlite::types::Value;

    #[test]
    fn row_accessors_resolve_by_column_name() {
        let rows = RowSet::new(
            vec!["_id".to_string(), "aggregate".to_string(), "name".to_string()],
            vec![vec![
                Value::Integer(7),
                Value::Real(4.0),
                Value::Text("a".to_string()),
            ]],
        );
        let row = rows.row(0).expect("row 0 should exist");
        assert_eq!(row.get_i64("_id"), Some(7));
        assert_eq!(row.get_f64("aggregate"), Some(4.0));
        assert_eq!(row.get_f64("_id"), Some(7.0));
        assert_eq!(row.get_text("name"), Some("a"));
        assert_eq!(row.get_text("missing"), None);
    }
}
