//! Schema reflection through catalog queries.
//!
//! DB2 for Linux/UNIX/Windows describes itself in the `SYSCAT` views, DB2 for
//! i (AS/400) in `QSYS2`. Each flavor supplies a [`CatalogQueries`] table;
//! one [`CatalogReflector`] asks the same questions through whichever table
//! it was built with. Each call runs its queries on the connection it is
//! given; nothing is cached between calls.
//!
//! Table and schema names are accepted in their normalized (lowercase) form
//! and returned the same way; the catalog itself stores upper case.

mod as400;
mod db2;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::compiler::IdentifierPreparer;
use crate::connection::{Connection, Row};
use crate::error::DialectResult;
use crate::types::SqlType;
use crate::value::Value;

/// Which system catalog the server exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerFlavor {
    /// DB2 LUW and z/OS style `SYSCAT` views.
    #[default]
    Db2,
    /// DB2 for i `QSYS2` views.
    As400,
}

impl ServerFlavor {
    /// Catalog queries for this flavor.
    pub fn queries(self) -> &'static CatalogQueries {
        match self {
            ServerFlavor::Db2 => &db2::QUERIES,
            ServerFlavor::As400 => &as400::QUERIES,
        }
    }

    /// The reflector that reads this flavor's catalog.
    pub fn reflector(self, preparer: IdentifierPreparer) -> Box<dyn Reflector> {
        Box::new(CatalogReflector::new(self, preparer))
    }
}

/// A reflected column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectedColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    pub nullable: bool,
    pub default: Option<String>,
    pub autoincrement: bool,
}

/// A reflected foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub name: String,
    pub constrained_columns: Vec<String>,
    /// Set only when the referenced table lives in another schema.
    pub referred_schema: Option<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

/// A reflected index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflectedIndex {
    pub name: String,
    pub column_names: Vec<String>,
    pub unique: bool,
}

/// Catalog introspection for one server flavor.
#[async_trait]
pub trait Reflector: Send + Sync {
    fn flavor(&self) -> ServerFlavor;

    async fn has_table(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<bool>;

    async fn has_sequence(
        &self,
        conn: &mut dyn Connection,
        sequence: &str,
        schema: Option<&str>,
    ) -> DialectResult<bool>;

    async fn get_schema_names(&self, conn: &mut dyn Connection) -> DialectResult<Vec<String>>;

    async fn get_table_names(
        &self,
        conn: &mut dyn Connection,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>>;

    async fn get_view_names(
        &self,
        conn: &mut dyn Connection,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>>;

    async fn get_view_definition(
        &self,
        conn: &mut dyn Connection,
        view: &str,
        schema: Option<&str>,
    ) -> DialectResult<Option<String>>;

    async fn get_columns(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ReflectedColumn>>;

    async fn get_primary_keys(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>>;

    async fn get_foreign_keys(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ForeignKey>>;

    async fn get_indexes(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ReflectedIndex>>;
}

/// The catalog statements one flavor answers reflection with. Every query
/// takes qmark parameters: schema first, then the object name.
pub struct CatalogQueries {
    pub has_table: &'static str,
    pub has_sequence: &'static str,
    pub schema_names: &'static str,
    pub table_names: &'static str,
    pub view_names: &'static str,
    pub view_definition: &'static str,
    /// Name, type, default, nullable flag, length, scale, identity flag.
    pub columns: &'static str,
    pub primary_keys: &'static str,
    /// Constraint, referred schema, referred table, column, referred column.
    pub foreign_keys: &'static str,
    pub indexes: &'static str,
    /// Spellings of "yes" in the nullable column.
    pub nullable_yes: &'static [&'static str],
    /// Spellings of "yes" in the identity column.
    pub identity_yes: &'static [&'static str],
    /// Folds the rows of `indexes` into reflected indexes.
    pub(crate) index_rows: fn(&Catalog, &[Row]) -> DialectResult<Vec<ReflectedIndex>>,
}

/// [`Reflector`] driven by a flavor's [`CatalogQueries`].
#[derive(Clone, Copy)]
pub struct CatalogReflector {
    flavor: ServerFlavor,
    queries: &'static CatalogQueries,
    catalog: Catalog,
}

impl CatalogReflector {
    pub fn new(flavor: ServerFlavor, preparer: IdentifierPreparer) -> Self {
        Self {
            flavor,
            queries: flavor.queries(),
            catalog: Catalog { preparer },
        }
    }

    /// Runs a `(schema, name)` query for `name` in `schema`, or in the
    /// current schema.
    async fn lookup(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        name: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<Row>> {
        let schema = self.catalog.schema(conn, schema).await?;
        let name = self.catalog.denormalize(name);
        self.catalog.query(conn, sql, &[&schema, &name]).await
    }

    async fn names_in(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>> {
        let schema = self.catalog.schema(conn, schema).await?;
        self.catalog.names(conn, sql, &[&schema]).await
    }
}

impl fmt::Debug for CatalogReflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogReflector")
            .field("flavor", &self.flavor)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Reflector for CatalogReflector {
    fn flavor(&self) -> ServerFlavor {
        self.flavor
    }

    async fn has_table(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<bool> {
        let rows = self.lookup(conn, self.queries.has_table, table, schema).await?;
        Ok(!rows.is_empty())
    }

    async fn has_sequence(
        &self,
        conn: &mut dyn Connection,
        sequence: &str,
        schema: Option<&str>,
    ) -> DialectResult<bool> {
        let rows = self
            .lookup(conn, self.queries.has_sequence, sequence, schema)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn get_schema_names(&self, conn: &mut dyn Connection) -> DialectResult<Vec<String>> {
        self.catalog.names(conn, self.queries.schema_names, &[]).await
    }

    async fn get_table_names(
        &self,
        conn: &mut dyn Connection,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>> {
        self.names_in(conn, self.queries.table_names, schema).await
    }

    async fn get_view_names(
        &self,
        conn: &mut dyn Connection,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>> {
        self.names_in(conn, self.queries.view_names, schema).await
    }

    async fn get_view_definition(
        &self,
        conn: &mut dyn Connection,
        view: &str,
        schema: Option<&str>,
    ) -> DialectResult<Option<String>> {
        let rows = self
            .lookup(conn, self.queries.view_definition, view, schema)
            .await?;
        match rows.first() {
            Some(row) => Ok(row.try_get_opt_str(0)?.map(str::to_string)),
            None => Ok(None),
        }
    }

    async fn get_columns(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ReflectedColumn>> {
        let rows = self.lookup(conn, self.queries.columns, table, schema).await?;
        rows.iter()
            .map(|row| {
                Ok(self.catalog.column(RawColumn {
                    name: row.try_get_str(0)?,
                    type_name: row.try_get_str(1)?,
                    default: row.try_get_opt_str(2)?,
                    nullable: flag(row.try_get_opt_str(3)?, self.queries.nullable_yes),
                    length: row.try_get_opt_i64(4)?,
                    scale: row.try_get_opt_i64(5)?,
                    autoincrement: flag(row.try_get_opt_str(6)?, self.queries.identity_yes),
                }))
            })
            .collect()
    }

    async fn get_primary_keys(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<String>> {
        let rows = self
            .lookup(conn, self.queries.primary_keys, table, schema)
            .await?;
        rows.iter()
            .map(|row| row.try_get_str(0).map(|n| self.catalog.normalize(n)))
            .collect()
    }

    async fn get_foreign_keys(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ForeignKey>> {
        let schema = self.catalog.schema(conn, schema).await?;
        let table = self.catalog.denormalize(table);
        let rows = self
            .catalog
            .query(conn, self.queries.foreign_keys, &[&schema, &table])
            .await?;
        self.catalog.foreign_keys(&rows, &schema)
    }

    async fn get_indexes(
        &self,
        conn: &mut dyn Connection,
        table: &str,
        schema: Option<&str>,
    ) -> DialectResult<Vec<ReflectedIndex>> {
        let rows = self.lookup(conn, self.queries.indexes, table, schema).await?;
        (self.queries.index_rows)(&self.catalog, &rows)
    }
}

/// Query helpers shared by both flavors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Catalog {
    pub(crate) preparer: IdentifierPreparer,
}

impl Catalog {
    /// Catalog spelling of `schema`, or the connection's current schema.
    pub(crate) async fn schema(
        &self,
        conn: &mut dyn Connection,
        schema: Option<&str>,
    ) -> DialectResult<String> {
        match schema {
            Some(s) => Ok(self.preparer.denormalize_name(s)),
            None => Ok(conn.current_schema().await?.trim_end().to_string()),
        }
    }

    pub(crate) fn denormalize(&self, name: &str) -> String {
        self.preparer.denormalize_name(name)
    }

    pub(crate) fn normalize(&self, name: &str) -> String {
        self.preparer.normalize_name(name)
    }

    pub(crate) async fn query(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        params: &[&str],
    ) -> DialectResult<Vec<Row>> {
        tracing::debug!(sql, ?params, "catalog query");
        let params: Vec<Value> = params.iter().map(|p| Value::from(*p)).collect();
        Ok(conn.execute(sql, &params).await?)
    }

    /// First column of every row, normalized.
    pub(crate) async fn names(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        params: &[&str],
    ) -> DialectResult<Vec<String>> {
        self.query(conn, sql, params)
            .await?
            .iter()
            .map(|row| row.try_get_str(0).map(|n| self.normalize(n)))
            .collect()
    }

    /// Rows of `(constraint, ref schema, ref table, column, ref column)`
    /// ordered by constraint and key position, folded into foreign keys.
    pub(crate) fn foreign_keys(
        &self,
        rows: &[Row],
        table_schema: &str,
    ) -> DialectResult<Vec<ForeignKey>> {
        let mut fks: Vec<ForeignKey> = Vec::new();
        for row in rows {
            let name = self.normalize(row.try_get_str(0)?);
            let ref_schema = row.try_get_str(1)?;
            let ref_table = self.normalize(row.try_get_str(2)?);
            let column = self.normalize(row.try_get_str(3)?);
            let ref_column = self.normalize(row.try_get_str(4)?);

            match fks.last_mut() {
                Some(fk) if fk.name == name => {
                    fk.constrained_columns.push(column);
                    fk.referred_columns.push(ref_column);
                }
                _ => fks.push(ForeignKey {
                    name,
                    constrained_columns: vec![column],
                    referred_schema: (ref_schema != table_schema)
                        .then(|| self.normalize(ref_schema)),
                    referred_table: ref_table,
                    referred_columns: vec![ref_column],
                }),
            }
        }
        Ok(fks)
    }

    pub(crate) fn column(&self, raw: RawColumn<'_>) -> ReflectedColumn {
        let length = raw.length.and_then(|n| u32::try_from(n).ok());
        let scale = raw.scale.and_then(|n| u32::try_from(n).ok());
        ReflectedColumn {
            name: self.normalize(raw.name),
            sql_type: crate::types::from_catalog(raw.type_name, length, scale),
            nullable: raw.nullable,
            default: raw.default.map(str::to_string),
            autoincrement: raw.autoincrement,
        }
    }
}

/// Catalog values describing one column, common to both flavors.
pub(crate) struct RawColumn<'a> {
    pub(crate) name: &'a str,
    pub(crate) type_name: &'a str,
    pub(crate) default: Option<&'a str>,
    pub(crate) nullable: bool,
    pub(crate) length: Option<i64>,
    pub(crate) scale: Option<i64>,
    pub(crate) autoincrement: bool,
}

/// `true` when a catalog flag column holds one of `yes` (case-insensitive).
pub(crate) fn flag(value: Option<&str>, yes: &[&str]) -> bool {
    value.is_some_and(|v| yes.iter().any(|y| v.trim().eq_ignore_ascii_case(y)))
}
