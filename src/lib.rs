//! # db2-dialect
//!
//! > **Teach a SQL toolkit to speak DB2.**
//!
//! Type rendering, statement and DDL fragments, identifier quoting,
//! connection-URL translation and catalog reflection for IBM DB2 (LUW) and
//! DB2 for i.
//!
//! ## Quick Example
//!
//! ```rust
//! use db2_dialect::prelude::*;
//!
//! let dialect = Db2Dialect::default();
//! let select = Select::new()
//!     .column(Expr::column("id"))
//!     .from(FromItem::table("users"))
//!     .limit(10);
//!
//! let sql = dialect.statement_compiler().select(&select);
//! assert_eq!(sql, "SELECT id FROM users FETCH FIRST 10 ROWS ONLY");
//! ```
//!
//! ## DB2 Specifics
//!
//! | Generic            | DB2                                    |
//! |--------------------|----------------------------------------|
//! | `LIMIT n`          | `FETCH FIRST n ROWS ONLY`              |
//! | `SELECT 1`         | `SELECT 1 FROM SYSIBM.SYSDUMMY1`       |
//! | `SERIAL`           | `GENERATED BY DEFAULT AS IDENTITY`     |
//! | `RETURNING id`     | `IDENTITY_VAL_LOCAL()` after the INSERT |
//! | `nextval('s')`     | `NEXTVAL FOR s`                        |

pub mod ast;
pub mod compiler;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod execution;
pub mod reflection;
pub mod reserved;
pub mod types;
pub mod url;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::compiler::{DdlCompiler, IdentifierPreparer, StatementCompiler, TypeCompiler};
    pub use crate::config::Config;
    pub use crate::connection::{Connection, Row, ServerInfo};
    pub use crate::dialect::{Db2Dialect, DialectFlags, DriverVariant};
    pub use crate::error::*;
    pub use crate::execution::ExecutionContext;
    pub use crate::reflection::{Reflector, ServerFlavor};
    pub use crate::types::SqlType;
    pub use crate::value::Value;
}

/// Render a column type with the default dialect.
///
/// # Example
///
/// ```
/// use db2_dialect::{render_type, types::SqlType};
///
/// assert_eq!(render_type(&SqlType::Boolean), "SMALLINT");
/// ```
pub fn render_type(ty: &types::SqlType) -> String {
    dialect::Db2Dialect::default().type_compiler().process(ty)
}

/// Translate a connection URL into driver connect arguments.
pub fn connect_args(url: &str) -> Result<url::ConnectArgs, error::DialectError> {
    url::create_connect_args(&url::parse_url(url)?)
}
