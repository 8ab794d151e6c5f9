//! Statement helpers over a borrowed connection.
//!
//! These work on any `&Connection`, so they serve a [`super::SpatialConnection`]
//! and an open `rusqlite::Transaction` alike.

use rusqlite::{Connection, Params, types::ValueRef};

use super::error::EngineError;

/// The first row of a query, with every column rendered as text.
///
/// `NULL` columns are kept as `None`; blobs are rendered as upper-case hex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRow {
    values: Vec<Option<String>>,
}

impl QueryRow {
    /// Row built from already materialised column values.
    #[must_use]
    pub const fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Text of the column at `index`, or `None` when it is `NULL` or absent.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(Option::as_deref)
    }

    /// Text of the first column.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    /// All column values in select-list order.
    #[must_use]
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Execute one or more statements that produce no rows.
///
/// # Errors
/// Returns [`EngineError::Exec`] carrying the engine's message when any
/// statement fails.
pub fn exec(connection: &Connection, sql: &str) -> Result<(), EngineError> {
    connection.execute_batch(sql).map_err(EngineError::exec)
}

/// Execute a single parameterised statement and return the affected row count.
///
/// # Errors
/// Returns [`EngineError::Exec`] when preparation, binding or execution fails.
pub fn execute<P: Params>(
    connection: &Connection,
    sql: &str,
    params: P,
) -> Result<usize, EngineError> {
    connection.execute(sql, params).map_err(EngineError::exec)
}

/// Prepare `sql`, step it once and return the first row as text.
///
/// The statement is finalised before returning. A query producing no rows
/// yields `Ok(None)`.
///
/// # Errors
/// Returns [`EngineError::Prepare`] when the statement cannot be prepared or
/// its parameters cannot be bound, and [`EngineError::Step`] when stepping or
/// reading the row fails.
pub fn query_one<P: Params>(
    connection: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<QueryRow>, EngineError> {
    let mut statement = connection
        .prepare(sql)
        .map_err(|source| EngineError::Prepare { source })?;
    let columns = statement.column_count();
    let mut rows = statement
        .query(params)
        .map_err(|source| EngineError::Prepare { source })?;
    let Some(row) = rows.next().map_err(|source| EngineError::Step { source })? else {
        return Ok(None);
    };
    let values = (0..columns)
        .map(|index| row.get_ref(index).map(render_value))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| EngineError::Step { source })?;
    Ok(Some(QueryRow::new(values)))
}

fn render_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(number) => Some(number.to_string()),
        ValueRef::Real(number) => Some(number.to_string()),
        ValueRef::Text(text) => Some(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Some(bytes.iter().fold(
            String::with_capacity(bytes.len().saturating_mul(2)),
            |mut hex, byte| {
                hex.push_str(&format!("{byte:02X}"));
                hex
            },
        )),
    }
}
