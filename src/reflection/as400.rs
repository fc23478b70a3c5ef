//! Reflection against the DB2 for i `QSYS2` catalog.

use super::{Catalog, CatalogQueries, ReflectedIndex};
use crate::connection::Row;
use crate::error::DialectResult;

const HAS_TABLE: &str =
    "SELECT TABLE_NAME FROM QSYS2.SYSTABLES WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

const HAS_SEQUENCE: &str = "SELECT SEQUENCE_NAME FROM QSYS2.SYSSEQUENCES \
     WHERE SEQUENCE_SCHEMA = ? AND SEQUENCE_NAME = ?";

const SCHEMA_NAMES: &str = "SELECT SCHEMA_NAME FROM QSYS2.SYSSCHEMAS \
     WHERE SCHEMA_NAME NOT LIKE 'Q%' AND SCHEMA_NAME NOT LIKE 'SYS%' ORDER BY SCHEMA_NAME";

const TABLE_NAMES: &str = "SELECT TABLE_NAME FROM QSYS2.SYSTABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_TYPE IN ('T', 'P') ORDER BY TABLE_NAME";

const VIEW_NAMES: &str =
    "SELECT TABLE_NAME FROM QSYS2.SYSVIEWS WHERE TABLE_SCHEMA = ? ORDER BY TABLE_NAME";

const VIEW_DEFINITION: &str =
    "SELECT VIEW_DEFINITION FROM QSYS2.SYSVIEWS WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

const COLUMNS: &str = "SELECT COLUMN_NAME, DATA_TYPE, COLUMN_DEFAULT, IS_NULLABLE, LENGTH, \
     NUMERIC_SCALE, IS_IDENTITY FROM QSYS2.SYSCOLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION";

const PRIMARY_KEYS: &str = "SELECT K.COLUMN_NAME FROM QSYS2.SYSCST C \
     JOIN QSYS2.SYSKEYCST K ON K.CONSTRAINT_SCHEMA = C.CONSTRAINT_SCHEMA \
     AND K.CONSTRAINT_NAME = C.CONSTRAINT_NAME \
     WHERE C.CONSTRAINT_TYPE = 'PRIMARY KEY' AND C.TABLE_SCHEMA = ? AND C.TABLE_NAME = ? \
     ORDER BY K.ORDINAL_POSITION";

const FOREIGN_KEYS: &str = "SELECT R.CONSTRAINT_NAME, PK.TABLE_SCHEMA, PK.TABLE_NAME, \
     FK.COLUMN_NAME, PK.COLUMN_NAME FROM QSYS2.SYSREFCST R \
     JOIN QSYS2.SYSKEYCST FK ON FK.CONSTRAINT_SCHEMA = R.CONSTRAINT_SCHEMA \
     AND FK.CONSTRAINT_NAME = R.CONSTRAINT_NAME \
     JOIN QSYS2.SYSKEYCST PK ON PK.CONSTRAINT_SCHEMA = R.UNIQUE_CONSTRAINT_SCHEMA \
     AND PK.CONSTRAINT_NAME = R.UNIQUE_CONSTRAINT_NAME AND PK.ORDINAL_POSITION = FK.ORDINAL_POSITION \
     WHERE FK.TABLE_SCHEMA = ? AND FK.TABLE_NAME = ? \
     ORDER BY R.CONSTRAINT_NAME, FK.ORDINAL_POSITION";

const INDEXES: &str = "SELECT I.INDEX_NAME, K.COLUMN_NAME, I.IS_UNIQUE FROM QSYS2.SYSINDEXES I \
     JOIN QSYS2.SYSKEYS K ON K.INDEX_SCHEMA = I.INDEX_SCHEMA AND K.INDEX_NAME = I.INDEX_NAME \
     WHERE I.TABLE_SCHEMA = ? AND I.TABLE_NAME = ? ORDER BY I.INDEX_NAME, K.ORDINAL_POSITION";

pub(super) static QUERIES: CatalogQueries = CatalogQueries {
    has_table: HAS_TABLE,
    has_sequence: HAS_SEQUENCE,
    schema_names: SCHEMA_NAMES,
    table_names: TABLE_NAMES,
    view_names: VIEW_NAMES,
    view_definition: VIEW_DEFINITION,
    columns: COLUMNS,
    primary_keys: PRIMARY_KEYS,
    foreign_keys: FOREIGN_KEYS,
    indexes: INDEXES,
    nullable_yes: &["Y", "YES"],
    identity_yes: &["YES"],
    index_rows: indexes,
};

/// One catalog row per index column; rows of the same index are folded.
fn indexes(catalog: &Catalog, rows: &[Row]) -> DialectResult<Vec<ReflectedIndex>> {
    let mut indexes: Vec<ReflectedIndex> = Vec::new();
    for row in rows {
        let name = catalog.normalize(row.try_get_str(0)?);
        let column = catalog.normalize(row.try_get_str(1)?);
        match indexes.last_mut() {
            Some(ix) if ix.name == name => ix.column_names.push(column),
            _ => indexes.push(ReflectedIndex {
                name,
                column_names: vec![column],
                // 'V' is unique where not null.
                unique: matches!(row.try_get_str(2)?, "U" | "V"),
            }),
        }
    }
    Ok(indexes)
}
