//! Per-statement execution hooks: identity retrieval after INSERT and
//! explicit sequence fetches.

use crate::ast::{Sequence, Statement};
use crate::compiler::{DUMMY_TABLE, StatementCompiler};
use crate::connection::{Connection, Row};
use crate::error::{DialectError, DialectResult};
use crate::value::Value;

/// Execution state for one statement at a time.
///
/// DB2 has no RETURNING on a plain INSERT, so the generated identity is read
/// back after the fact with `IDENTITY_VAL_LOCAL()` (or from the driver, when
/// it records it).
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    compiler: StatementCompiler,
    use_driver_identity: bool,
    select_lastrowid: bool,
    lastrowid: Option<i64>,
}

impl ExecutionContext {
    pub fn new(compiler: StatementCompiler, use_driver_identity: bool) -> Self {
        Self {
            compiler,
            use_driver_identity,
            select_lastrowid: false,
            lastrowid: None,
        }
    }

    /// Decide whether the identity must be fetched once `statement` has run.
    pub fn pre_exec(&mut self, statement: &Statement) {
        self.lastrowid = None;
        self.select_lastrowid = match statement {
            Statement::Insert(insert) => {
                insert.autoincrement_column.is_some()
                    && insert.returning.is_empty()
                    && !insert.inline
            }
            _ => false,
        };
    }

    pub fn select_lastrowid(&self) -> bool {
        self.select_lastrowid
    }

    /// Fetch the identity value if [`pre_exec`](Self::pre_exec) asked for it.
    /// The flag is cleared either way.
    pub async fn post_exec(&mut self, conn: &mut dyn Connection) -> DialectResult<()> {
        if !std::mem::take(&mut self.select_lastrowid) {
            return Ok(());
        }

        let id = if self.use_driver_identity {
            conn.last_identity_val()
        } else {
            let sql = format!("SELECT IDENTITY_VAL_LOCAL() FROM {}", DUMMY_TABLE);
            tracing::debug!(sql = %sql, "fetching identity");
            let rows = conn.execute(&sql, &[]).await?;
            rows.first().and_then(|r| r.get(0)).and_then(Value::as_i64)
        };

        if id.is_some() {
            self.lastrowid = id;
        }
        Ok(())
    }

    /// Identity generated by the last INSERT, when one was fetched.
    pub fn lastrowid(&self) -> Option<i64> {
        self.lastrowid
    }

    /// `NEXTVAL FOR seq`, fetched through the dummy table.
    pub async fn fire_sequence(
        &self,
        conn: &mut dyn Connection,
        seq: &Sequence,
    ) -> DialectResult<Value> {
        let sql = format!(
            "SELECT {} FROM {}",
            self.compiler.next_value(seq),
            DUMMY_TABLE
        );
        tracing::debug!(sql = %sql, "firing sequence");
        let rows = conn.execute(&sql, &[]).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|r| r.into_values().into_iter().next())
            .unwrap_or(Value::Null))
    }

    /// Compile and run `statement`, with the pre- and post-execution hooks
    /// around it.
    ///
    /// Statements compile with named placeholders; they reach the driver as
    /// `?` with `params` reordered to match.
    pub async fn execute(
        &mut self,
        conn: &mut dyn Connection,
        statement: &Statement,
        params: &[(&str, Value)],
    ) -> DialectResult<Vec<Row>> {
        let (sql, names) = self.compiler.compile_positional(statement);
        let values = bind_named(&names.named_params, params)?;

        self.pre_exec(statement);
        let rows = match conn.execute(&sql, &values).await {
            Ok(rows) => rows,
            Err(e) => {
                self.select_lastrowid = false;
                return Err(e.into());
            }
        };
        self.post_exec(conn).await?;
        Ok(rows)
    }
}

/// Values for `names`, in order. A name may be bound more than once.
fn bind_named(names: &[String], params: &[(&str, Value)]) -> DialectResult<Vec<Value>> {
    names
        .iter()
        .map(|name| {
            params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| DialectError::MissingParam(name.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Column, Insert, Select, Table};
    use crate::compiler::{IdentifierPreparer, TypeCompiler};
    use crate::error::{DriverError, DriverErrorKind};
    use crate::testing::ScriptedConnection;
    use crate::types::SqlType;
    use pretty_assertions::assert_eq;

    fn context(use_driver_identity: bool) -> ExecutionContext {
        let compiler = StatementCompiler::new(IdentifierPreparer::default(), TypeCompiler::new(true));
        ExecutionContext::new(compiler, use_driver_identity)
    }

    fn orders() -> Table {
        Table::new("orders")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .column(Column::new("total", SqlType::Float))
    }

    #[test]
    fn test_pre_exec_flags_identity_inserts_only() {
        let mut ctx = context(false);
        ctx.pre_exec(&Statement::Insert(Insert::for_table(&orders())));
        assert!(ctx.select_lastrowid());

        ctx.pre_exec(&Statement::Insert(Insert::for_table(&orders()).returning(&["id"])));
        assert!(!ctx.select_lastrowid());

        let mut inline = Insert::for_table(&orders());
        inline.inline = true;
        ctx.pre_exec(&Statement::Insert(inline));
        assert!(!ctx.select_lastrowid());

        ctx.pre_exec(&Statement::Select(Select::new()));
        assert!(!ctx.select_lastrowid());
    }

    #[tokio::test]
    async fn test_identity_val_local() {
        let mut conn = ScriptedConnection::new("APP")
            .respond("IDENTITY_VAL_LOCAL", vec![vec!["42".into()]]);
        let mut ctx = context(false);
        let insert = Statement::Insert(Insert::for_table(&orders()));
        ctx.execute(&mut conn, &insert, &[("total", Value::Float(9.5))])
            .await
            .unwrap();
        assert_eq!(ctx.lastrowid(), Some(42));
        assert!(!ctx.select_lastrowid());
        assert_eq!(
            conn.statements(),
            vec![
                "INSERT INTO orders (total) VALUES (?)",
                "SELECT IDENTITY_VAL_LOCAL() FROM SYSIBM.SYSDUMMY1",
            ]
        );
        assert_eq!(conn.executed()[0].1, vec![Value::Float(9.5)]);
    }

    #[tokio::test]
    async fn test_null_identity_leaves_lastrowid_unset() {
        let mut conn = ScriptedConnection::new("APP")
            .respond("IDENTITY_VAL_LOCAL", vec![vec![Value::Null]]);
        let mut ctx = context(false);
        ctx.pre_exec(&Statement::Insert(Insert::for_table(&orders())));
        ctx.post_exec(&mut conn).await.unwrap();
        assert_eq!(ctx.lastrowid(), None);
        assert!(!ctx.select_lastrowid());
    }

    #[tokio::test]
    async fn test_driver_identity() {
        let mut conn = ScriptedConnection::new("APP").identity(7);
        let mut ctx = context(true);
        ctx.pre_exec(&Statement::Insert(Insert::for_table(&orders())));
        ctx.post_exec(&mut conn).await.unwrap();
        assert_eq!(ctx.lastrowid(), Some(7));
        assert!(conn.executed().is_empty());
    }

    #[tokio::test]
    async fn test_fire_sequence() {
        let mut conn = ScriptedConnection::new("APP")
            .respond("NEXTVAL FOR", vec![vec![Value::Int(1001)]]);
        let value = context(false)
            .fire_sequence(&mut conn, &Sequence::new("order_seq"))
            .await
            .unwrap();
        assert_eq!(value, Value::Int(1001));
        assert_eq!(
            conn.statements(),
            vec!["SELECT NEXTVAL FOR order_seq FROM SYSIBM.SYSDUMMY1"]
        );
    }

    #[tokio::test]
    async fn test_failed_insert_clears_flag() {
        let mut conn = ScriptedConnection::new("APP").fail(DriverError::new(
            DriverErrorKind::Integrity,
            "SQL0803N duplicate key",
        ));
        let mut ctx = context(false);
        let insert = Statement::Insert(Insert::for_table(&orders()));
        let params = [("total", Value::Float(1.0))];
        assert!(ctx.execute(&mut conn, &insert, &params).await.is_err());
        assert!(!ctx.select_lastrowid());
        assert_eq!(conn.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_named_params_reach_driver_in_placeholder_order() {
        let mut conn = ScriptedConnection::new("APP");
        let mut ctx = context(true);
        let select = Statement::Raw("SELECT id FROM orders WHERE total > :low AND total < :high".into());
        ctx.execute(
            &mut conn,
            &select,
            &[("high", Value::Int(100)), ("low", Value::Int(10))],
        )
        .await
        .unwrap();
        assert_eq!(
            conn.executed(),
            &[(
                "SELECT id FROM orders WHERE total > ? AND total < ?".to_string(),
                vec![Value::Int(10), Value::Int(100)],
            )]
        );
    }

    #[tokio::test]
    async fn test_missing_param_is_rejected_before_execution() {
        let mut conn = ScriptedConnection::new("APP");
        let mut ctx = context(false);
        let insert = Statement::Insert(Insert::for_table(&orders()));
        let err = ctx.execute(&mut conn, &insert, &[]).await.unwrap_err();
        assert!(matches!(err, DialectError::MissingParam(ref name) if name == "total"));
        assert!(conn.executed().is_empty());
        assert!(!ctx.select_lastrowid());
    }
}
