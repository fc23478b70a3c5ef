//! Type compiler: column-type descriptor → DB2 type text.

use crate::types::SqlType;

/// Renders [`SqlType`]s as DB2 DDL type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCompiler {
    supports_char_length: bool,
}

/// `None` and `Some(0)` both mean "no length given".
fn given(length: Option<u32>) -> Option<u32> {
    length.filter(|n| *n != 0)
}

fn sized(name: &str, length: Option<u32>, unbounded: &str) -> String {
    match given(length) {
        Some(n) => format!("{}({})", name, n),
        None => unbounded.to_string(),
    }
}

impl TypeCompiler {
    /// Without `supports_char_length` every VARCHAR and VARGRAPHIC renders as
    /// its LONG form.
    pub fn new(supports_char_length: bool) -> Self {
        Self {
            supports_char_length,
        }
    }

    pub fn process(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::Timestamp | SqlType::DateTime => "TIMESTAMP".into(),
            SqlType::Date => "DATE".into(),
            SqlType::Time => "TIME".into(),
            SqlType::SmallInteger | SqlType::Boolean => "SMALLINT".into(),
            SqlType::Integer | SqlType::Int => "INT".into(),
            SqlType::BigInteger => "BIGINT".into(),
            SqlType::Float | SqlType::Real => "REAL".into(),
            SqlType::Double => "DOUBLE".into(),
            SqlType::Xml => "XML".into(),
            SqlType::Clob => "CLOB".into(),
            SqlType::Blob { length } | SqlType::LargeBinary { length } => {
                sized("BLOB", *length, "BLOB(1M)")
            }
            SqlType::DbClob { length } => sized("DBCLOB", *length, "DBCLOB(1M)"),
            SqlType::Varchar { length }
            | SqlType::String { length }
            | SqlType::Text { length } => self.varying("VARCHAR", *length),
            SqlType::LongVarchar => "LONG VARCHAR".into(),
            SqlType::Vargraphic { length }
            | SqlType::Unicode { length }
            | SqlType::UnicodeText { length } => self.varying("VARGRAPHIC", *length),
            SqlType::LongVargraphic => "LONG VARGRAPHIC".into(),
            SqlType::Char { length } => sized("CHAR", *length, "CHAR"),
            SqlType::Graphic { length } => sized("GRAPHIC", *length, "GRAPHIC"),
            SqlType::Decimal { precision, scale } | SqlType::Numeric { precision, scale } => {
                decimal(*precision, *scale)
            }
            SqlType::Unknown { name } => name.clone(),
        }
    }

    fn varying(&self, name: &str, length: Option<u32>) -> String {
        let long = format!("LONG {}", name);
        if !self.supports_char_length {
            return long;
        }
        sized(name, length, &long)
    }
}

fn decimal(precision: Option<u32>, scale: Option<u32>) -> String {
    match (given(precision), given(scale)) {
        (None, _) => "DECIMAL(31, 0)".into(),
        (Some(p), None) => format!("DECIMAL({}, 0)", p),
        (Some(p), Some(s)) => format!("DECIMAL({}, {})", p, s),
    }
}
