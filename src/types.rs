//! Abstract column types and the DB2 catalog type-name table.
//!
//! [`SqlType`] carries both the host's generic types (`Integer`, `String`, ...)
//! and the DB2-native ones (`Varchar`, `Graphic`, `DbClob`, ...). The type
//! compiler decides how each renders; [`from_catalog`] goes the other way for
//! reflection.

use serde::{Deserialize, Serialize};

/// An abstract column-type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SqlType {
    // Generic types
    Integer,
    SmallInteger,
    BigInteger,
    Boolean,
    Float,
    Numeric {
        #[serde(default)]
        precision: Option<u32>,
        #[serde(default)]
        scale: Option<u32>,
    },
    String {
        #[serde(default)]
        length: Option<u32>,
    },
    Text {
        #[serde(default)]
        length: Option<u32>,
    },
    Unicode {
        #[serde(default)]
        length: Option<u32>,
    },
    UnicodeText {
        #[serde(default)]
        length: Option<u32>,
    },
    LargeBinary {
        #[serde(default)]
        length: Option<u32>,
    },
    DateTime,
    Date,
    Time,

    // DB2 native types
    Timestamp,
    Int,
    Real,
    Double,
    Decimal {
        #[serde(default)]
        precision: Option<u32>,
        #[serde(default)]
        scale: Option<u32>,
    },
    Char {
        #[serde(default)]
        length: Option<u32>,
    },
    Varchar {
        #[serde(default)]
        length: Option<u32>,
    },
    LongVarchar,
    Graphic {
        #[serde(default)]
        length: Option<u32>,
    },
    Vargraphic {
        #[serde(default)]
        length: Option<u32>,
    },
    LongVargraphic,
    Clob,
    Blob {
        #[serde(default)]
        length: Option<u32>,
    },
    DbClob {
        #[serde(default)]
        length: Option<u32>,
    },
    Xml,

    /// A catalog type name with no entry in the type-name table.
    Unknown { name: String },
}

impl SqlType {
    /// Whether values of this type are integers.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::SmallInteger | Self::BigInteger | Self::Int
        )
    }

    /// Whether `CAST(... AS <type>)` is kept when compiled. DB2 lets other
    /// casts fall back to the bare expression.
    pub fn renders_in_cast(&self) -> bool {
        matches!(
            self,
            Self::Timestamp
                | Self::DateTime
                | Self::Date
                | Self::Time
                | Self::Decimal { .. }
                | Self::Numeric { .. }
        )
    }

    /// How bound and fetched values of this type are converted.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Boolean => ValueKind::Boolean,
            Self::DateTime | Self::Timestamp => ValueKind::DateTime,
            Self::Date => ValueKind::Date,
            _ => ValueKind::Plain,
        }
    }
}

/// Types that need a value processor on the way in or out of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    DateTime,
    Date,
    Plain,
}

/// Semantic type named by a DB2 catalog `TYPENAME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogType {
    Blob,
    Char,
    Clob,
    Date,
    DateTime,
    Integer,
    SmallInt,
    BigInt,
    Decimal,
    Numeric,
    Real,
    Double,
    Time,
    Timestamp,
    Varchar,
    LongVarchar,
    Xml,
    Graphic,
    Vargraphic,
    DbClob,
}

/// The type-name table, keyed by upper-case catalog name.
pub const ISCHEMA_NAMES: &[(&str, CatalogType)] = &[
    ("BLOB", CatalogType::Blob),
    ("CHAR", CatalogType::Char),
    ("CHARACTER", CatalogType::Char),
    ("CLOB", CatalogType::Clob),
    ("DATE", CatalogType::Date),
    ("DATETIME", CatalogType::DateTime),
    ("INTEGER", CatalogType::Integer),
    ("SMALLINT", CatalogType::SmallInt),
    ("BIGINT", CatalogType::BigInt),
    ("DECIMAL", CatalogType::Decimal),
    ("NUMERIC", CatalogType::Numeric),
    ("REAL", CatalogType::Real),
    ("DOUBLE", CatalogType::Double),
    ("TIME", CatalogType::Time),
    ("TIMESTAMP", CatalogType::Timestamp),
    ("VARCHAR", CatalogType::Varchar),
    ("LONGVARCHAR", CatalogType::LongVarchar),
    ("XML", CatalogType::Xml),
    ("GRAPHIC", CatalogType::Graphic),
    ("VARGRAPHIC", CatalogType::Vargraphic),
    ("LONGVARGRAPHIC", CatalogType::Vargraphic),
    ("DBCLOB", CatalogType::DbClob),
];

/// Look up a catalog type name.
///
/// Case-insensitive; spaces are ignored so `LONG VARCHAR` finds
/// `LONGVARCHAR`. The AS/400 catalog's `CHARACTER VARYING` maps to VARCHAR.
pub fn lookup(name: &str) -> Option<CatalogType> {
    let key: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if key == "CHARACTERVARYING" {
        return Some(CatalogType::Varchar);
    }
    ISCHEMA_NAMES
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, t)| *t)
}

impl CatalogType {
    /// Build a descriptor from the catalog's LENGTH and SCALE columns.
    ///
    /// LENGTH is the precision for DECIMAL/NUMERIC and the character or byte
    /// length for string and LOB types. Fixed-size types ignore both.
    pub fn with_params(self, length: Option<u32>, scale: Option<u32>) -> SqlType {
        match self {
            Self::Blob => SqlType::Blob { length },
            Self::Char => SqlType::Char { length },
            Self::Clob => SqlType::Clob,
            Self::Date => SqlType::Date,
            Self::DateTime => SqlType::DateTime,
            Self::Integer => SqlType::Integer,
            Self::SmallInt => SqlType::SmallInteger,
            Self::BigInt => SqlType::BigInteger,
            Self::Decimal => SqlType::Decimal {
                precision: length,
                scale,
            },
            Self::Numeric => SqlType::Numeric {
                precision: length,
                scale,
            },
            Self::Real => SqlType::Real,
            Self::Double => SqlType::Double,
            Self::Time => SqlType::Time,
            Self::Timestamp => SqlType::Timestamp,
            Self::Varchar => SqlType::Varchar { length },
            Self::LongVarchar => SqlType::LongVarchar,
            Self::Xml => SqlType::Xml,
            Self::Graphic => SqlType::Graphic { length },
            Self::Vargraphic => SqlType::Vargraphic { length },
            Self::DbClob => SqlType::DbClob { length },
        }
    }
}

/// Map a reflected catalog type to a descriptor.
///
/// Names missing from the table come back as [`SqlType::Unknown`] with a
/// warning, so reflection of an exotic column never fails outright.
pub fn from_catalog(name: &str, length: Option<u32>, scale: Option<u32>) -> SqlType {
    match lookup(name) {
        Some(t) => t.with_params(length, scale),
        None => {
            tracing::warn!("Did not recognize type '{}'", name.trim());
            SqlType::Unknown {
                name: name.trim().to_string(),
            }
        }
    }
}
