//! Statement compiler: the DB2-specific parts of SELECT and INSERT.

use crate::ast::*;
use crate::compiler::preparer::IdentifierPreparer;
use crate::compiler::types::TypeCompiler;
use crate::value::Value;

/// Row source for selects without a FROM list.
pub const DUMMY_TABLE: &str = "SYSIBM.SYSDUMMY1";

/// Named placeholders of a compiled statement, in binding order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamContext {
    pub named_params: Vec<String>,
}

impl ParamContext {
    /// Placeholder for the next named parameter.
    fn add_named_param(&mut self, name: String) -> &'static str {
        self.named_params.push(name);
        "?"
    }
}

/// Renders statements with DB2 hooks applied.
#[derive(Debug, Clone, Copy)]
pub struct StatementCompiler {
    preparer: IdentifierPreparer,
    types: TypeCompiler,
}

impl StatementCompiler {
    pub fn new(preparer: IdentifierPreparer, types: TypeCompiler) -> Self {
        Self { preparer, types }
    }

    /// Trailing row-limit clause. DB2 has no LIMIT keyword.
    pub fn limit_clause(&self, limit: Option<u64>) -> String {
        match limit {
            Some(n) => format!(" FETCH FIRST {} ROWS ONLY", n),
            None => String::new(),
        }
    }

    pub fn default_from(&self) -> String {
        format!(" FROM {}", DUMMY_TABLE)
    }

    /// Text between `SELECT` and the column list.
    pub fn select_precolumns(&self, distinct: &Distinct) -> String {
        match distinct {
            Distinct::None => String::new(),
            Distinct::Distinct => "DISTINCT ".into(),
            Distinct::Keyword(k) => format!("{} ", k.to_uppercase()),
        }
    }

    pub fn join(&self, join: &Join) -> String {
        let kind = if join.outer {
            " LEFT OUTER JOIN "
        } else {
            " INNER JOIN "
        };
        [
            self.from_item(&join.left).as_str(),
            kind,
            self.from_item(&join.right).as_str(),
            " ON ",
            self.expr(&join.on).as_str(),
        ]
        .concat()
    }

    pub fn from_item(&self, item: &FromItem) -> String {
        match item {
            FromItem::Table {
                name,
                schema,
                alias,
            } => {
                let table = self.preparer.format_table(name, schema.as_deref());
                match alias {
                    Some(a) => format!("{} AS {}", table, self.preparer.quote(a)),
                    None => table,
                }
            }
            FromItem::Join(j) => self.join(j),
        }
    }

    /// `CAST(expr AS type)` for date, time and decimal targets; DB2 converts
    /// the rest implicitly, so only the inner expression is emitted.
    pub fn cast(&self, expr: &Expr, to: &crate::types::SqlType) -> String {
        let inner = self.expr(expr);
        if to.renders_in_cast() {
            format!("CAST({} AS {})", inner, self.types.process(to))
        } else {
            inner
        }
    }

    pub fn next_value(&self, seq: &Sequence) -> String {
        format!("NEXTVAL FOR {}", self.preparer.format_sequence(seq))
    }

    pub fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".into(),
            Value::Bool(true) => "1".into(),
            Value::Bool(false) => "0".into(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => float_literal(*f),
            Value::String(s) => quote_string(s),
            Value::Date(d) => quote_string(&d.to_string()),
            Value::DateTime(dt) => quote_string(&dt.to_string()),
            Value::Time(t) => quote_string(&t.to_string()),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02X}", byte)).collect();
                format!("BLOB(X'{}')", hex)
            }
        }
    }

    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Column { table, name } => match table {
                Some(t) => format!("{}.{}", self.preparer.quote(t), self.preparer.quote(name)),
                None => self.preparer.format_column(name),
            },
            Expr::Literal(v) => self.literal(v),
            Expr::Param(name) => format!(":{}", name),
            Expr::Now => "CURRENT_TIMESTAMP".into(),
            Expr::Cast { expr, to } => self.cast(expr, to),
            Expr::Function { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", name, args.join(", "))
            }
            Expr::Binary { left, op, right } => format!(
                "{} {} {}",
                self.operand(left, *op),
                op.as_sql(),
                self.operand(right, *op)
            ),
            Expr::IsNull { expr, negated } => {
                let not = if *negated { " NOT" } else { "" };
                format!("{} IS{} NULL", self.expr(expr), not)
            }
            Expr::NextValue(seq) => self.next_value(seq),
            Expr::Raw(sql) => sql.clone(),
        }
    }

    // Nested AND/OR under a different operator keeps its grouping.
    fn operand(&self, expr: &Expr, parent: BinaryOp) -> String {
        match expr {
            Expr::Binary { op, .. }
                if matches!(op, BinaryOp::And | BinaryOp::Or) && *op != parent =>
            {
                format!("({})", self.expr(expr))
            }
            _ => self.expr(expr),
        }
    }

    pub fn select(&self, select: &Select) -> String {
        let mut sql = String::from("SELECT ");
        sql.push_str(&self.select_precolumns(&select.distinct));

        if select.columns.is_empty() {
            sql.push('*');
        } else {
            let cols: Vec<String> = select
                .columns
                .iter()
                .map(|c| match &c.alias {
                    Some(a) => format!("{} AS {}", self.expr(&c.expr), self.preparer.quote(a)),
                    None => self.expr(&c.expr),
                })
                .collect();
            sql.push_str(&cols.join(", "));
        }

        if select.from.is_empty() {
            sql.push_str(&self.default_from());
        } else {
            let froms: Vec<String> = select.from.iter().map(|f| self.from_item(f)).collect();
            sql.push_str(" FROM ");
            sql.push_str(&froms.join(", "));
        }

        if let Some(filter) = &select.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(filter));
        }

        if !select.order_by.is_empty() {
            let order: Vec<String> = select
                .order_by
                .iter()
                .map(|(e, dir)| {
                    let dir = match dir {
                        SortOrder::Asc => "ASC",
                        SortOrder::Desc => "DESC",
                    };
                    format!("{} {}", self.expr(e), dir)
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        sql.push_str(&self.limit_clause(select.limit));
        sql
    }

    pub fn insert(&self, insert: &Insert) -> String {
        let table = self
            .preparer
            .format_table(&insert.table, insert.schema.as_deref());
        let mut sql = format!("INSERT INTO {}", table);

        if insert.values.is_empty() {
            sql.push_str(" VALUES (DEFAULT)");
        } else {
            let cols: Vec<String> = insert
                .values
                .iter()
                .map(|(c, _)| self.preparer.format_column(c))
                .collect();
            let vals: Vec<String> = insert.values.iter().map(|(_, v)| self.expr(v)).collect();
            sql.push_str(&format!(" ({}) VALUES ({})", cols.join(", "), vals.join(", ")));
        }

        if insert.returning.is_empty() {
            return sql;
        }
        let cols: Vec<String> = insert
            .returning
            .iter()
            .map(|c| self.preparer.format_column(c))
            .collect();
        format!("SELECT {} FROM FINAL TABLE ({})", cols.join(", "), sql)
    }

    pub fn compile(&self, statement: &Statement) -> String {
        let sql = match statement {
            Statement::Select(s) => self.select(s),
            Statement::Insert(i) => self.insert(i),
            Statement::Raw(sql) => sql.clone(),
        };
        tracing::debug!(sql = %sql, "compiled statement");
        sql
    }

    /// Compile `statement` for a qmark driver. Every `:name` outside a
    /// quoted literal or identifier becomes `?`; the names come back in the
    /// order their values must be bound.
    pub fn compile_positional(&self, statement: &Statement) -> (String, ParamContext) {
        to_positional(&self.compile(statement))
    }
}

fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#' | '@')
}

fn to_positional(sql: &str) -> (String, ParamContext) {
    let mut out = String::with_capacity(sql.len());
    let mut params = ParamContext::default();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                // A doubled quote closes and reopens, which leaves it balanced.
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                out.push(c);
            }
            None if c == ':' && chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if !is_param_char(n) {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                out.push_str(params.add_named_param(name));
            }
            None => out.push(c),
        }
    }
    (out, params)
}

// DOUBLE has no NaN or infinity; DECFLOAT carries both.
fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "DECFLOAT('NaN')".into()
    } else if f.is_infinite() {
        let sign = if f < 0.0 { "-" } else { "" };
        format!("DECFLOAT('{}Infinity')", sign)
    } else {
        f.to_string()
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
