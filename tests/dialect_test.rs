use async_trait::async_trait;
use db2_dialect::prelude::*;
use db2_dialect::reserved::RESERVED_WORDS;
use pretty_assertions::assert_eq;

/// Connection stub answering every catalog query with the same rows.
struct FixedRows {
    rows: Vec<Vec<Value>>,
    seen: Vec<String>,
    bound: Vec<Vec<Value>>,
}

impl FixedRows {
    fn new(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows,
            seen: Vec::new(),
            bound: Vec::new(),
        }
    }
}

#[async_trait]
impl Connection for FixedRows {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        self.seen.push(sql.to_string());
        self.bound.push(params.to_vec());
        Ok(self.rows.iter().cloned().map(Row::new).collect())
    }

    async fn current_schema(&mut self) -> Result<String, DriverError> {
        Ok("APP".into())
    }

    async fn server_info(&mut self) -> Result<ServerInfo, DriverError> {
        Ok(ServerInfo {
            dbms_name: "DB2/LINUXX8664".into(),
            dbms_ver: "11.05.0800".into(),
        })
    }
}

#[test]
fn test_reserved_words_require_quotes() {
    let preparer = IdentifierPreparer::default();
    for word in RESERVED_WORDS {
        assert!(preparer.requires_quotes(word), "{word:?} should be quoted");
    }
}

#[test]
fn test_leading_character_requires_quotes() {
    let preparer = IdentifierPreparer::default();
    for ident in ["1abc", "_hidden", "$amount", "9", "_"] {
        assert!(preparer.requires_quotes(ident), "{ident:?} should be quoted");
    }
    assert!(!preparer.requires_quotes("amount_1"));
    assert_eq!(preparer.quote_identifier("a\"b"), "\"a\"\"b\"");
}

#[test]
fn test_decimal_rendering() {
    let types = Db2Dialect::default().type_compiler();
    let decimal = |precision, scale| SqlType::Decimal { precision, scale };
    assert_eq!(types.process(&decimal(None, None)), "DECIMAL(31, 0)");
    assert_eq!(types.process(&decimal(Some(10), None)), "DECIMAL(10, 0)");
    assert_eq!(types.process(&decimal(Some(10), Some(2))), "DECIMAL(10, 2)");
}

#[test]
fn test_varchar_rendering() {
    let types = Db2Dialect::default().type_compiler();
    assert_eq!(types.process(&SqlType::Varchar { length: None }), "LONG VARCHAR");
    assert_eq!(types.process(&SqlType::Varchar { length: Some(0) }), "LONG VARCHAR");
    assert_eq!(types.process(&SqlType::Varchar { length: Some(50) }), "VARCHAR(50)");
}

#[test]
fn test_limit_clause() {
    let compiler = Db2Dialect::default().statement_compiler();
    assert_eq!(compiler.limit_clause(Some(5)), " FETCH FIRST 5 ROWS ONLY");
    assert_eq!(compiler.limit_clause(None), "");
}

#[test]
fn test_connect_args() {
    let args = db2_dialect::connect_args("ibm_db_sa:///mydb?UID=u&PWD=p").unwrap();
    assert_eq!((args.dsn.as_str(), args.uid.as_str(), args.pwd.as_str()), ("mydb", "u", "p"));

    let args = db2_dialect::connect_args("ibm_db_sa://u:p@dbhost:50000/mydb").unwrap();
    assert!(
        args.dsn
            .contains("DATABASE=mydb;HOSTNAME=dbhost;PORT=50000;PROTOCOL=TCPIP;")
    );
    assert!(args.dsn.ends_with(';'));
}

#[test]
fn test_create_table_round_trip_from_json() {
    let table: Table = serde_json::from_str(
        r#"{
            "name": "invoices",
            "columns": [
                {"name": "id", "type": {"type": "integer"}, "primary_key": true},
                {"name": "issued", "type": {"type": "date"}, "nullable": false},
                {"name": "amount", "type": {"type": "numeric", "precision": 12, "scale": 2}}
            ]
        }"#,
    )
    .unwrap();
    let ddl = Db2Dialect::default().ddl_compiler().create_table(&table);
    assert_eq!(
        ddl,
        "\nCREATE TABLE invoices (\n\
         \tid INT NOT NULL GENERATED BY DEFAULT AS IDENTITY (START WITH 1), \n\
         \tissued DATE NOT NULL, \n\
         \tamount DECIMAL(12, 2), \n\
         \tPRIMARY KEY (id)\n)\n\n"
    );
}

#[tokio::test]
async fn test_reflect_primary_keys() {
    let dialect = Db2Dialect::default();
    let mut conn = FixedRows::new(vec![vec!["ID".into()], vec!["LINE_NO".into()]]);
    let pk = dialect
        .get_primary_keys(&mut conn, "invoice_lines", None)
        .await
        .unwrap();
    assert_eq!(pk, vec!["id", "line_no"]);
    assert!(conn.seen[0].contains("SYSCAT.KEYCOLUSE"));
}

#[tokio::test]
async fn test_execute_insert_reads_identity() {
    let dialect = Db2Dialect::new(DialectFlags::base(), ServerFlavor::Db2);
    let table = Table::new("invoices")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("amount", SqlType::Float));
    let mut conn = FixedRows::new(vec![vec![Value::Int(17)]]);
    let mut ctx = dialect.execution_context();
    let insert = Statement::Insert(Insert::for_table(&table));
    ctx.execute(&mut conn, &insert, &[("amount", Value::Float(12.5))])
        .await
        .unwrap();
    assert_eq!(ctx.lastrowid(), Some(17));
    assert_eq!(
        conn.seen,
        vec![
            "INSERT INTO invoices (amount) VALUES (?)".to_string(),
            "SELECT IDENTITY_VAL_LOCAL() FROM SYSIBM.SYSDUMMY1".to_string(),
        ]
    );
    assert_eq!(conn.bound, vec![vec![Value::Float(12.5)], vec![]]);
}
