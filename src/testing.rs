//! In-memory connection for unit tests.

use async_trait::async_trait;

use crate::connection::{Connection, Row, ServerInfo};
use crate::error::DriverError;
use crate::value::Value;

/// Answers each statement with the rows of the first registered pattern the
/// SQL contains, or no rows. Every statement is recorded.
pub(crate) struct ScriptedConnection {
    schema: String,
    server: ServerInfo,
    identity: Option<i64>,
    responses: Vec<(String, Vec<Row>)>,
    failure: Option<DriverError>,
    executed: Vec<(String, Vec<Value>)>,
}

impl ScriptedConnection {
    pub(crate) fn new(schema: &str) -> Self {
        Self {
            schema: format!("{:<8}", schema),
            server: ServerInfo {
                dbms_name: "DB2/LINUXX8664".into(),
                dbms_ver: "11.05.0800".into(),
            },
            identity: None,
            responses: Vec::new(),
            failure: None,
            executed: Vec::new(),
        }
    }

    pub(crate) fn respond(mut self, pattern: &str, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows.into_iter().map(Row::new).collect();
        self.responses.push((pattern.to_string(), rows));
        self
    }

    pub(crate) fn server(mut self, dbms_name: &str, dbms_ver: &str) -> Self {
        self.server = ServerInfo {
            dbms_name: dbms_name.into(),
            dbms_ver: dbms_ver.into(),
        };
        self
    }

    pub(crate) fn identity(mut self, value: i64) -> Self {
        self.identity = Some(value);
        self
    }

    pub(crate) fn fail(mut self, err: DriverError) -> Self {
        self.failure = Some(err);
        self
    }

    pub(crate) fn executed(&self) -> &[(String, Vec<Value>)] {
        &self.executed
    }

    pub(crate) fn statements(&self) -> Vec<&str> {
        self.executed.iter().map(|(sql, _)| sql.as_str()).collect()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        self.executed.push((sql.to_string(), params.to_vec()));
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn current_schema(&mut self) -> Result<String, DriverError> {
        Ok(self.schema.clone())
    }

    async fn server_info(&mut self) -> Result<ServerInfo, DriverError> {
        Ok(self.server.clone())
    }

    fn last_identity_val(&self) -> Option<i64> {
        self.identity
    }
}
