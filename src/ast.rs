//! Schema and statement model consumed by the compilers.
//!
//! These are the already-validated structures a host ORM hands to a dialect:
//! tables with their columns and constraints, indexes, sequences, and the
//! handful of statement shapes whose rendering DB2 changes.

use serde::{Deserialize, Serialize};

use crate::types::SqlType;
use crate::value::Value;

fn default_true() -> bool {
    true
}

/// Whether a column takes part in identity generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Autoincrement {
    /// Identity if it is the table's only integer primary-key column.
    #[default]
    Auto,
    /// Always the identity column.
    Always,
    Never,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Server-side default, as SQL text.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub autoincrement: Autoincrement,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            primary_key: false,
            default: None,
            autoincrement: Autoincrement::Auto,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default(mut self, sql: impl Into<String>) -> Self {
        self.default = Some(sql.into());
        self
    }

    pub fn autoincrement(mut self, mode: Autoincrement) -> Self {
        self.autoincrement = mode;
        self
    }
}

/// Table-level constraint kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey {
        columns: Vec<String>,
    },
    ForeignKey {
        columns: Vec<String>,
        ref_table: String,
        #[serde(default)]
        ref_schema: Option<String>,
        ref_columns: Vec<String>,
    },
    Unique {
        columns: Vec<String>,
    },
    Check {
        sql: String,
    },
}

/// A named or anonymous table constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn new(name: Option<&str>, kind: ConstraintKind) -> Self {
        Self {
            name: name.map(str::to_string),
            kind,
        }
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Primary-key column names, from column flags or a table constraint.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        let flagged: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect();
        if !flagged.is_empty() {
            return flagged;
        }
        self.constraints
            .iter()
            .find_map(|c| match &c.kind {
                ConstraintKind::PrimaryKey { columns } => {
                    Some(columns.iter().map(String::as_str).collect())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key_columns().contains(&column)
    }

    /// The column DB2 generates values for, if any.
    ///
    /// An explicit `Always` wins. Otherwise a single integer primary-key
    /// column left on `Auto` without a server default qualifies.
    pub fn autoincrement_column(&self) -> Option<&Column> {
        if let Some(col) = self
            .columns
            .iter()
            .find(|c| c.autoincrement == Autoincrement::Always)
        {
            return Some(col);
        }
        let pk = self.primary_key_columns();
        if pk.len() != 1 {
            return None;
        }
        self.columns.iter().find(|c| {
            c.name == pk[0]
                && c.autoincrement == Autoincrement::Auto
                && c.sql_type.is_integer()
                && c.default.is_none()
        })
    }
}

/// An index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// A sequence definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub increment: Option<i64>,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            start: None,
            increment: None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Scalar expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column {
        table: Option<String>,
        name: String,
    },
    Literal(Value),
    /// Named bind parameter.
    Param(String),
    /// The current timestamp, `now()` in the host's vocabulary.
    Now,
    Cast {
        expr: Box<Expr>,
        to: SqlType,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    NextValue(Sequence),
    /// Pre-rendered SQL.
    Raw(String),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn cast(self, to: SqlType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            to,
        }
    }

    pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn and(self, right: Expr) -> Self {
        self.binary(BinaryOp::And, right)
    }

    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }
}

/// Something a SELECT reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    Table {
        name: String,
        schema: Option<String>,
        alias: Option<String>,
    },
    Join(Box<Join>),
}

impl FromItem {
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table {
            name: name.into(),
            schema: None,
            alias: None,
        }
    }

    pub fn join(self, right: FromItem, on: Expr) -> Self {
        Self::Join(Box::new(Join {
            left: self,
            right,
            on,
            outer: false,
        }))
    }

    pub fn outer_join(self, right: FromItem, on: Expr) -> Self {
        Self::Join(Box::new(Join {
            left: self,
            right,
            on,
            outer: true,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: FromItem,
    pub right: FromItem,
    pub on: Expr,
    /// LEFT OUTER when set, INNER otherwise.
    pub outer: bool,
}

/// DISTINCT handling of a SELECT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Distinct {
    #[default]
    None,
    Distinct,
    /// An explicit keyword such as `all`, rendered upper-cased.
    Keyword(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

/// A SELECT statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub distinct: Distinct,
    pub columns: Vec<SelectItem>,
    pub from: Vec<FromItem>,
    pub filter: Option<Expr>,
    pub order_by: Vec<(Expr, SortOrder)>,
    pub limit: Option<u64>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, expr: Expr) -> Self {
        self.columns.push(SelectItem { expr, alias: None });
        self
    }

    pub fn column_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.columns.push(SelectItem {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    pub fn from(mut self, item: FromItem) -> Self {
        self.from.push(item);
        self
    }

    /// Add a WHERE condition; repeated calls are ANDed.
    pub fn filter(mut self, cond: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(prev) => prev.and(cond),
            None => cond,
        });
        self
    }

    pub fn order_by(mut self, expr: Expr, order: SortOrder) -> Self {
        self.order_by.push((expr, order));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = Distinct::Distinct;
        self
    }
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub schema: Option<String>,
    pub values: Vec<(String, Expr)>,
    /// The table's identity column, if it has one.
    pub autoincrement_column: Option<String>,
    /// Columns to hand back; rendered through `FINAL TABLE`.
    pub returning: Vec<String>,
    /// Values were rendered inline rather than bound.
    pub inline: bool,
}

impl Insert {
    /// Insert binding one named parameter per column, skipping the identity
    /// column.
    pub fn for_table(table: &Table) -> Self {
        let identity = table.autoincrement_column().map(|c| c.name.clone());
        let values = table
            .columns
            .iter()
            .filter(|c| Some(&c.name) != identity.as_ref())
            .map(|c| (c.name.clone(), Expr::param(c.name.clone())))
            .collect();
        Self {
            table: table.name.clone(),
            schema: table.schema.clone(),
            values,
            autoincrement_column: identity,
            returning: Vec::new(),
            inline: false,
        }
    }

    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Statements the execution context knows how to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Raw(String),
}
