//! SQL compilers for the DB2 dialect.
//!
//! Each compiler covers one host override point: type names, statements,
//! DDL, and identifier quoting.

pub mod ddl;
pub mod preparer;
pub mod statement;
pub mod types;

pub use ddl::DdlCompiler;
pub use preparer::IdentifierPreparer;
pub use statement::{DUMMY_TABLE, ParamContext, StatementCompiler};
pub use types::TypeCompiler;
