//! Reflection against the DB2 `SYSCAT` catalog views.

use super::{Catalog, CatalogQueries, ReflectedIndex};
use crate::connection::Row;
use crate::error::DialectResult;

const HAS_TABLE: &str =
    "SELECT TABNAME FROM SYSCAT.TABLES WHERE TABSCHEMA = ? AND TABNAME = ?";

const HAS_SEQUENCE: &str =
    "SELECT SEQNAME FROM SYSCAT.SEQUENCES WHERE SEQSCHEMA = ? AND SEQNAME = ? AND SEQTYPE = 'S'";

const SCHEMA_NAMES: &str = "SELECT SCHEMANAME FROM SYSCAT.SCHEMATA \
     WHERE SCHEMANAME NOT LIKE 'SYS%' AND SCHEMANAME NOT IN ('NULLID', 'SQLJ') \
     ORDER BY SCHEMANAME";

const TABLE_NAMES: &str = "SELECT TABNAME FROM SYSCAT.TABLES \
     WHERE TABSCHEMA = ? AND TYPE = 'T' ORDER BY TABNAME";

const VIEW_NAMES: &str =
    "SELECT VIEWNAME FROM SYSCAT.VIEWS WHERE VIEWSCHEMA = ? ORDER BY VIEWNAME";

const VIEW_DEFINITION: &str =
    "SELECT TEXT FROM SYSCAT.VIEWS WHERE VIEWSCHEMA = ? AND VIEWNAME = ?";

const COLUMNS: &str = "SELECT COLNAME, TYPENAME, DEFAULT, NULLS, LENGTH, SCALE, IDENTITY \
     FROM SYSCAT.COLUMNS WHERE TABSCHEMA = ? AND TABNAME = ? ORDER BY COLNO";

const PRIMARY_KEYS: &str = "SELECT K.COLNAME FROM SYSCAT.KEYCOLUSE K \
     JOIN SYSCAT.TABCONST C ON C.CONSTNAME = K.CONSTNAME \
     AND C.TABSCHEMA = K.TABSCHEMA AND C.TABNAME = K.TABNAME \
     WHERE C.TYPE = 'P' AND C.TABSCHEMA = ? AND C.TABNAME = ? ORDER BY K.COLSEQ";

const FOREIGN_KEYS: &str = "SELECT R.CONSTNAME, R.REFTABSCHEMA, R.REFTABNAME, FK.COLNAME, PK.COLNAME \
     FROM SYSCAT.REFERENCES R \
     JOIN SYSCAT.KEYCOLUSE FK ON FK.CONSTNAME = R.CONSTNAME \
     AND FK.TABSCHEMA = R.TABSCHEMA AND FK.TABNAME = R.TABNAME \
     JOIN SYSCAT.KEYCOLUSE PK ON PK.CONSTNAME = R.REFKEYNAME \
     AND PK.TABSCHEMA = R.REFTABSCHEMA AND PK.TABNAME = R.REFTABNAME AND PK.COLSEQ = FK.COLSEQ \
     WHERE R.TABSCHEMA = ? AND R.TABNAME = ? ORDER BY R.CONSTNAME, FK.COLSEQ";

const INDEXES: &str = "SELECT INDNAME, COLNAMES, UNIQUERULE FROM SYSCAT.INDEXES \
     WHERE TABSCHEMA = ? AND TABNAME = ? ORDER BY INDNAME";

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
    nullable_yes: &["Y"],
    identity_yes: &["Y"],
    index_rows: indexes,
};

/// Split `SYSCAT.INDEXES.COLNAMES` (`+COL1-COL2`, one sign per column
/// giving its direction) into column names.
fn index_columns(colnames: &str) -> Vec<&str> {
    colnames
        .split(['+', '-'])
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

/// One row per index, columns packed into `COLNAMES`.
fn indexes(catalog: &Catalog, rows: &[Row]) -> DialectResult<Vec<ReflectedIndex>> {
    let mut indexes = Vec::new();
    for row in rows {
        let rule = row.try_get_str(2)?;
        // 'P' backs the primary key, which is reported separately.
        if rule == "P" {
            continue;
        }
        indexes.push(ReflectedIndex {
            name: catalog.normalize(row.try_get_str(0)?),
            column_names: index_columns(row.try_get_str(1)?)
                .into_iter()
                .map(|c| catalog.normalize(c))
                .collect(),
            unique: rule == "U",
        });
    }
    Ok(indexes)
}
