//! The driver seam.
//!
//! The dialect never talks to DB2 itself. Reflection and execution hooks run
//! their SQL through whatever [`Connection`] the caller hands in, one
//! statement at a time, on the caller's task.

use async_trait::async_trait;

use crate::error::{DialectError, DialectResult, DriverError};
use crate::value::Value;

/// A live connection supplied by the driver.
#[async_trait]
pub trait Connection: Send {
    /// Execute one statement with positional (`?`) parameters and return
    /// every row it produced.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;

    /// The CURRENT SCHEMA special register.
    async fn current_schema(&mut self) -> Result<String, DriverError>;

    /// Server product information.
    async fn server_info(&mut self) -> Result<ServerInfo, DriverError>;

    /// Identity value the driver recorded for the last INSERT, if it tracks one.
    fn last_identity_val(&self) -> Option<i64> {
        None
    }
}

/// One result row, positional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn value(&self, idx: usize) -> DialectResult<&Value> {
        self.values.get(idx).ok_or_else(|| {
            DialectError::catalog(format!(
                "expected column {} in a row of {} columns",
                idx,
                self.values.len()
            ))
        })
    }

    /// Non-null string column. Catalog CHAR columns are blank-padded; the
    /// padding is trimmed.
    pub fn try_get_str(&self, idx: usize) -> DialectResult<&str> {
        match self.value(idx)? {
            Value::String(s) => Ok(s.trim_end()),
            other => Err(DialectError::catalog(format!(
                "expected text in column {}, got {:?}",
                idx, other
            ))),
        }
    }

    /// Nullable string column.
    pub fn try_get_opt_str(&self, idx: usize) -> DialectResult<Option<&str>> {
        match self.value(idx)? {
            Value::Null => Ok(None),
            _ => self.try_get_str(idx).map(Some),
        }
    }

    /// Nullable integer column.
    pub fn try_get_opt_i64(&self, idx: usize) -> DialectResult<Option<i64>> {
        let v = self.value(idx)?;
        if v.is_null() {
            return Ok(None);
        }
        v.as_i64().map(Some).ok_or_else(|| {
            DialectError::catalog(format!("expected integer in column {}, got {:?}", idx, v))
        })
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// What the driver reports about the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// e.g. `DB2/LINUXX8664`, or `AS` for DB2 for i.
    pub dbms_name: String,
    /// e.g. `11.05.0800`.
    pub dbms_ver: String,
}

impl ServerInfo {
    /// Version as numeric components, `11.05.0800` → `[11, 5, 800]`.
    pub fn version_info(&self) -> Vec<u32> {
        self.dbms_ver
            .split('.')
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    }

    /// Whether the server uses the DB2 for i (AS/400) catalog.
    pub fn is_as400(&self) -> bool {
        let name = self.dbms_name.trim();
        name == "AS" || name.starts_with("QSQ") || name.contains("DB2 for i") || name.contains("AS/400")
    }
}
