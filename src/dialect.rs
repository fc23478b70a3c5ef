//! The dialect object: capability flags plus dispatch to the compilers,
//! the reflector and the execution context.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compiler::{DdlCompiler, IdentifierPreparer, StatementCompiler, TypeCompiler};
use crate::connection::Connection;
use crate::error::{DialectResult, DriverError};
use crate::execution::ExecutionContext;
use crate::reflection::{ForeignKey, ReflectedColumn, ReflectedIndex, Reflector, ServerFlavor};
use crate::url::{self, ConnectArgs};

/// DB-API parameter styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paramstyle {
    Qmark,
    Numeric,
    Named,
    Format,
    Pyformat,
}

/// Which flag preset a dialect starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverVariant {
    /// Generic DB2 behavior.
    Base,
    /// The `ibm_db` CLI driver, which reports rowcounts and identity values.
    #[default]
    IbmDb,
}

impl DriverVariant {
    pub fn flags(self) -> DialectFlags {
        match self {
            DriverVariant::Base => DialectFlags::base(),
            DriverVariant::IbmDb => DialectFlags::ibm_db(),
        }
    }
}

/// Capability flags the host toolkit reads off the dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectFlags {
    pub name: String,
    pub driver: Option<String>,
    pub max_identifier_length: usize,
    pub encoding: String,
    pub paramstyle: Paramstyle,
    pub quote_char: char,
    pub supports_char_length: bool,
    pub supports_unicode_statements: bool,
    pub supports_unicode_binds: bool,
    pub returns_unicode_strings: bool,
    pub postfetch_lastrowid: bool,
    pub supports_sane_rowcount: bool,
    pub supports_sane_multi_rowcount: bool,
    pub supports_native_decimal: bool,
    pub preexecute_sequences: bool,
    pub supports_alter: bool,
    pub supports_sequences: bool,
    pub sequences_optional: bool,
}

impl DialectFlags {
    pub fn base() -> Self {
        Self {
            name: "ibm_db_sa".into(),
            driver: None,
            max_identifier_length: 128,
            encoding: "utf-8".into(),
            paramstyle: Paramstyle::Named,
            quote_char: '"',
            supports_char_length: false,
            supports_unicode_statements: false,
            supports_unicode_binds: false,
            returns_unicode_strings: false,
            postfetch_lastrowid: true,
            supports_sane_rowcount: false,
            supports_sane_multi_rowcount: false,
            supports_native_decimal: true,
            preexecute_sequences: false,
            supports_alter: true,
            supports_sequences: true,
            sequences_optional: true,
        }
    }

    pub fn ibm_db() -> Self {
        Self {
            driver: Some("ibm_db_sa".into()),
            supports_char_length: true,
            supports_sane_rowcount: true,
            supports_native_decimal: false,
            ..Self::base()
        }
    }

    /// The `ibm_db` preset is the one that reads identities from the driver.
    pub fn uses_driver_identity(&self) -> bool {
        self.driver.is_some()
    }
}

impl Default for DialectFlags {
    fn default() -> Self {
        Self::ibm_db()
    }
}

/// The DB2 dialect.
pub struct Db2Dialect {
    flags: DialectFlags,
    preparer: IdentifierPreparer,
    reflector: Box<dyn Reflector>,
}

impl Db2Dialect {
    pub fn new(flags: DialectFlags, flavor: ServerFlavor) -> Self {
        let preparer = IdentifierPreparer::new(flags.quote_char, flags.max_identifier_length);
        Self {
            reflector: flavor.reflector(preparer),
            preparer,
            flags,
        }
    }

    /// `ibm_db` flags against the given catalog flavor.
    pub fn with_flavor(flavor: ServerFlavor) -> Self {
        Self::new(DialectFlags::default(), flavor)
    }

    pub fn flags(&self) -> &DialectFlags {
        &self.flags
    }

    pub fn flavor(&self) -> ServerFlavor {
        self.reflector.flavor()
    }

    pub fn preparer(&self) -> IdentifierPreparer {
        self.preparer
    }

    pub fn type_compiler(&self) -> TypeCompiler {
        TypeCompiler::new(self.flags.supports_char_length)
    }

    pub fn statement_compiler(&self) -> StatementCompiler {
        StatementCompiler::new(self.preparer, self.type_compiler())
    }

    pub fn ddl_compiler(&self) -> DdlCompiler {
        DdlCompiler::new(self.preparer, self.type_compiler())
    }

    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::new(self.statement_compiler(), self.flags.uses_driver_identity())
    }

    /// Parse `url` and build the driver's connect arguments.
    pub fn create_connect_args(&self, url: &str) -> DialectResult<ConnectArgs> {
        url::create_connect_args(&url::parse_url(url)?)
    }

    pub fn is_disconnect(&self, err: &DriverError) -> bool {
        err.is_disconnect()
    }

    /// Pick the reflector matching what the server reports about itself.
    pub async fn initialize(&mut self, conn: &mut dyn Connection) -> DialectResult<()> {
        let info = conn.server_info().await?;
        let flavor = if info.is_as400() {
            ServerFlavor::As400
        } else {
            ServerFlavor::Db2
        };
        if flavor != self.reflector.flavor() {
            tracing::info!(dbms = %info.dbms_name, ?flavor, "switching catalog flavor");
            self.reflector = flavor.reflector(self.preparer);
        }
        Ok(())
    }

    pub async fn default_schema_name(&self, conn: &mut dyn Connection) -> DialectResult<String> {
        let schema = conn.current_schema().await?;
        Ok(self.preparer.normalize_name(schema.trim_end()))
    }

    pub async fn server_version_info(&self, conn: &mut dyn Connection) -> DialectResult<Vec<u32>> {
        Ok(conn.server_info().await?.version_info())
    }

    pub async fn has_table(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<bool> {
        self.reflector.has_table(conn, table, schema).await
    }

    pub async fn has_sequence(
        &self,
        conn: &mut dyn Connection,
        sequence: &str,
        schema: Option<&str>,
    ) -> DialectResult<bool> {
        self.reflector.has_sequence(conn, sequence, schema).await
    }

    pub async fn get_schema_names(&self, conn: &mut dyn Connection) -> DialectResult<Vec<String>> {
        self.reflector.get_schema_names(conn).await
    }

    pub async fn get_table_names(
        &self,
        conn: &mut dyn Connection,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>> {
        self.reflector.get_table_names(conn, schema).await
    }

    pub async fn get_view_names(
        &self,
        conn: &mut dyn Connection,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>> {
        self.reflector.get_view_names(conn, schema).await
    }

    pub async fn get_view_definition(
        &self,
        conn: &mut dyn Connection,
        view: &str,
        schema: Option<&str>,
    ) -> DialectResult<Option<String>> {
        self.reflector.get_view_definition(conn, view, schema).await
    }

    pub async fn get_columns(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ReflectedColumn>> {
        self.reflector.get_columns(conn, table, schema).await
    }

    pub async fn get_primary_keys(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>> {
        self.reflector.get_primary_keys(conn, table, schema).await
    }

    pub async fn get_foreign_keys(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ForeignKey>> {
        self.reflector.get_foreign_keys(conn, table, schema).await
    }

    pub async fn get_indexes(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ReflectedIndex>> {
        self.reflector.get_indexes(conn, table, schema).await
    }
}

impl Default for Db2Dialect {
    fn default() -> Self {
        Self::with_flavor(ServerFlavor::Db2)
    }
}

impl fmt::Debug for Db2Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db2Dialect")
            .field("flags", &self.flags)
            .field("flavor", &self.flavor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverErrorKind;
    use crate::testing::ScriptedConnection;
    use crate::types::SqlType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flag_presets() {
        let base = DialectFlags::base();
        assert!(!base.supports_char_length);
        assert!(!base.supports_sane_rowcount);
        assert!(base.supports_native_decimal);
        assert!(!base.uses_driver_identity());

        let ibm = DialectFlags::ibm_db();
        assert!(ibm.supports_char_length);
        assert!(ibm.supports_sane_rowcount);
        assert!(!ibm.supports_native_decimal);
        assert_eq!(ibm.name, "ibm_db_sa");
        assert_eq!(ibm.max_identifier_length, 128);
        assert_eq!(ibm.paramstyle, Paramstyle::Named);
        assert!(ibm.postfetch_lastrowid && ibm.sequences_optional);
        assert!(!ibm.preexecute_sequences);
    }

    #[test]
    fn test_type_compiler_follows_flags() {
        let ty = SqlType::String { length: Some(50) };
        assert_eq!(Db2Dialect::default().type_compiler().process(&ty), "VARCHAR(50)");
        let base = Db2Dialect::new(DialectFlags::base(), ServerFlavor::Db2);
        assert_eq!(base.type_compiler().process(&ty), "LONG VARCHAR");
    }

    #[test]
    fn test_is_disconnect() {
        let d = Db2Dialect::default();
        let gone = DriverError::new(
            DriverErrorKind::Operational,
            "[IBM][CLI Driver] CLI0106E  Connection is not active",
        );
        assert!(d.is_disconnect(&gone));
        let data = DriverError::new(DriverErrorKind::Data, "Connection is not active");
        assert!(!d.is_disconnect(&data));
    }

    #[tokio::test]
    async fn test_initialize_detects_as400() {
        let mut d = Db2Dialect::default();
        let mut conn = ScriptedConnection::new("MYLIB").server("AS", "07.04.0000");
        d.initialize(&mut conn).await.unwrap();
        assert_eq!(d.flavor(), ServerFlavor::As400);
        assert_eq!(d.server_version_info(&mut conn).await.unwrap(), vec![7, 4, 0]);
    }

    #[tokio::test]
    async fn test_default_schema_name() {
        let d = Db2Dialect::default();
        let mut conn = ScriptedConnection::new("DB2INST1");
        assert_eq!(d.default_schema_name(&mut conn).await.unwrap(), "db2inst1");
    }

    #[tokio::test]
    async fn test_reflection_dispatch() {
        let d = Db2Dialect::default();
        let mut conn = ScriptedConnection::new("DB2INST1")
            .respond("FROM SYSCAT.TABLES", vec![vec!["EMPLOYEE".into()]]);
        assert_eq!(
            d.get_table_names(&mut conn, None).await.unwrap(),
            vec!["employee"]
        );
    }
}
