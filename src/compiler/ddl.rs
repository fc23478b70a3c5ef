//! DDL compiler: CREATE/DROP text for tables, indexes, constraints and
//! sequences.

use crate::ast::*;
use crate::compiler::preparer::IdentifierPreparer;
use crate::compiler::types::TypeCompiler;

#[derive(Debug, Clone, Copy)]
pub struct DdlCompiler {
    preparer: IdentifierPreparer,
    types: TypeCompiler,
}

impl DdlCompiler {
    pub fn new(preparer: IdentifierPreparer, types: TypeCompiler) -> Self {
        Self { preparer, types }
    }

    /// One column of a CREATE TABLE body.
    ///
    /// `name type [NOT NULL] [WITH DEFAULT d] [GENERATED BY DEFAULT AS IDENTITY (START WITH 1)]`
    pub fn column_specification(&self, table: &Table, column: &Column) -> String {
        let mut spec = vec![
            self.preparer.format_column(&column.name),
            self.types.process(&column.sql_type),
        ];

        if !column.nullable || column.primary_key || table.is_primary_key(&column.name) {
            spec.push("NOT NULL".into());
        }

        if let Some(default) = &column.default {
            spec.push("WITH DEFAULT".into());
            spec.push(default.clone());
        }

        let is_identity = table
            .autoincrement_column()
            .is_some_and(|c| c.name == column.name);
        if is_identity {
            spec.push("GENERATED BY DEFAULT".into());
            spec.push("AS IDENTITY".into());
            spec.push("(START WITH 1)".into());
        }

        spec.join(" ")
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.preparer.format_column(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn constraint_prefix(&self, constraint: &Constraint) -> String {
        match constraint.name {
            Some(_) => format!("CONSTRAINT {} ", self.preparer.format_constraint(constraint)),
            None => String::new(),
        }
    }

    /// Table-level constraint clause for CREATE TABLE.
    pub fn constraint_definition(&self, constraint: &Constraint) -> String {
        let prefix = self.constraint_prefix(constraint);
        match &constraint.kind {
            ConstraintKind::PrimaryKey { columns } => {
                format!("{}PRIMARY KEY ({})", prefix, self.column_list(columns))
            }
            ConstraintKind::Unique { columns } => {
                format!("{}UNIQUE ({})", prefix, self.column_list(columns))
            }
            ConstraintKind::ForeignKey {
                columns,
                ref_table,
                ref_schema,
                ref_columns,
            } => format!(
                "{}FOREIGN KEY({}) REFERENCES {} ({})",
                prefix,
                self.column_list(columns),
                self.preparer.format_table(ref_table, ref_schema.as_deref()),
                self.column_list(ref_columns)
            ),
            ConstraintKind::Check { sql } => format!("{}CHECK ({})", prefix, sql),
        }
    }

    pub fn create_table(&self, table: &Table) -> String {
        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("\t{}", self.column_specification(table, c)))
            .collect();

        let has_pk_constraint = table
            .constraints
            .iter()
            .any(|c| matches!(c.kind, ConstraintKind::PrimaryKey { .. }));
        let flagged: Vec<String> = table
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.clone())
            .collect();
        if !has_pk_constraint && !flagged.is_empty() {
            defs.push(format!("\tPRIMARY KEY ({})", self.column_list(&flagged)));
        }

        for constraint in &table.constraints {
            defs.push(format!("\t{}", self.constraint_definition(constraint)));
        }

        format!(
            "\nCREATE TABLE {} (\n{}\n)\n\n",
            self.preparer.format_table(&table.name, table.schema.as_deref()),
            defs.join(", \n")
        )
    }

    pub fn drop_table(&self, table: &Table) -> String {
        format!(
            "\nDROP TABLE {}",
            self.preparer.format_table(&table.name, table.schema.as_deref())
        )
    }

    pub fn create_index(&self, index: &Index) -> String {
        let unique = if index.unique { "UNIQUE " } else { "" };
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
            self.preparer.format_index(index),
            self.preparer.format_table(&index.table, index.schema.as_deref()),
            self.column_list(&index.columns)
        )
    }

    /// DB2 drops an index by name alone; no table clause.
    pub fn drop_index(&self, index: &Index) -> String {
        format!("\nDROP INDEX {}", self.preparer.format_index(index))
    }

    /// `ALTER TABLE t DROP ...` with the keyword DB2 wants per constraint kind.
    /// Unique constraints are backed by an index and dropped as one.
    pub fn drop_constraint(&self, table: &Table, constraint: &Constraint) -> String {
        let (qual, name) = match constraint.kind {
            ConstraintKind::ForeignKey { .. } => {
                ("FOREIGN KEY ", self.preparer.format_constraint(constraint))
            }
            ConstraintKind::PrimaryKey { .. } => ("PRIMARY KEY ", String::new()),
            ConstraintKind::Unique { .. } => ("INDEX ", self.preparer.format_constraint(constraint)),
            ConstraintKind::Check { .. } => ("", self.preparer.format_constraint(constraint)),
        };
        format!(
            "ALTER TABLE {} DROP {}{}",
            self.preparer.format_table(&table.name, table.schema.as_deref()),
            qual,
            name
        )
    }

    pub fn create_sequence(&self, seq: &Sequence) -> String {
        let mut sql = format!("CREATE SEQUENCE {}", self.preparer.format_sequence(seq));
        if let Some(n) = seq.increment {
            sql.push_str(&format!(" INCREMENT BY {}", n));
        }
        if let Some(n) = seq.start {
            sql.push_str(&format!(" START WITH {}", n));
        }
        sql
    }

    pub fn drop_sequence(&self, seq: &Sequence) -> String {
        format!("DROP SEQUENCE {}", self.preparer.format_sequence(seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;
    use pretty_assertions::assert_eq;

    fn ddl() -> DdlCompiler {
        DdlCompiler::new(IdentifierPreparer::default(), TypeCompiler::new(true))
    }

    fn accounts() -> Table {
        Table::new("accounts")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .column(Column::new("owner", SqlType::String { length: Some(40) }).not_null())
            .column(Column::new("balance", SqlType::Numeric { precision: Some(12), scale: Some(2) }).default("0"))
            .column(Column::new("note", SqlType::Text { length: None }))
    }

    #[test]
    fn test_column_specs() {
        let t = accounts();
        let d = ddl();
        assert_eq!(
            d.column_specification(&t, &t.columns[0]),
            "id INT NOT NULL GENERATED BY DEFAULT AS IDENTITY (START WITH 1)"
        );
        assert_eq!(d.column_specification(&t, &t.columns[1]), "owner VARCHAR(40) NOT NULL");
        assert_eq!(
            d.column_specification(&t, &t.columns[2]),
            "balance DECIMAL(12, 2) WITH DEFAULT 0"
        );
        assert_eq!(d.column_specification(&t, &t.columns[3]), "note LONG VARCHAR");
    }

    #[test]
    fn test_create_table() {
        let t = accounts().constraint(Constraint::new(
            Some("uq_owner"),
            ConstraintKind::Unique {
                columns: vec!["owner".into()],
            },
        ));
        assert_eq!(
            ddl().create_table(&t),
            "\nCREATE TABLE accounts (\n\
             \tid INT NOT NULL GENERATED BY DEFAULT AS IDENTITY (START WITH 1), \n\
             \towner VARCHAR(40) NOT NULL, \n\
             \tbalance DECIMAL(12, 2) WITH DEFAULT 0, \n\
             \tnote LONG VARCHAR, \n\
             \tPRIMARY KEY (id), \n\
             \tCONSTRAINT uq_owner UNIQUE (owner)\n)\n\n"
        );
    }

    #[test]
    fn test_drop_constraint() {
        let t = accounts();
        let d = ddl();
        let fk = Constraint::new(
            Some("fk_owner"),
            ConstraintKind::ForeignKey {
                columns: vec!["owner".into()],
                ref_table: "people".into(),
                ref_schema: None,
                ref_columns: vec!["login".into()],
            },
        );
        assert_eq!(d.drop_constraint(&t, &fk), "ALTER TABLE accounts DROP FOREIGN KEY fk_owner");

        let pk = Constraint::new(None, ConstraintKind::PrimaryKey { columns: vec!["id".into()] });
        assert_eq!(d.drop_constraint(&t, &pk), "ALTER TABLE accounts DROP PRIMARY KEY ");

        let uq = Constraint::new(Some("uq_owner"), ConstraintKind::Unique { columns: vec!["owner".into()] });
        assert_eq!(d.drop_constraint(&t, &uq), "ALTER TABLE accounts DROP INDEX uq_owner");

        let ck = Constraint::new(Some("ck_balance"), ConstraintKind::Check { sql: "balance >= 0".into() });
        assert_eq!(d.drop_constraint(&t, &ck), "ALTER TABLE accounts DROP ck_balance");
    }

    #[test]
    fn test_indexes() {
        let ix = Index {
            name: "ix_accounts_owner".into(),
            table: "accounts".into(),
            schema: None,
            columns: vec!["owner".into()],
            unique: true,
        };
        let d = ddl();
        assert_eq!(
            d.create_index(&ix),
            "CREATE UNIQUE INDEX ix_accounts_owner ON accounts (owner)"
        );
        assert_eq!(d.drop_index(&ix), "\nDROP INDEX ix_accounts_owner");
    }

    #[test]
    fn test_drop_index_truncates_long_names() {
        let d = DdlCompiler::new(IdentifierPreparer::new('"', 18), TypeCompiler::new(true));
        let ix = Index {
            name: "IX_Accounts_Owner_Balance".into(),
            table: "accounts".into(),
            schema: Some("sales".into()),
            columns: vec!["owner".into(), "balance".into()],
            unique: false,
        };
        let sql = d.drop_index(&ix);
        let name = sql
            .strip_prefix("\nDROP INDEX sales.\"")
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap();
        assert_eq!(name.len(), 15);
        assert!(name.starts_with("IX_Account_"));
        assert!(name[11..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            name,
            IdentifierPreparer::new('"', 18).truncate_identifier(&ix.name)
        );
    }

    #[test]
    fn test_sequences() {
        let seq = Sequence {
            name: "invoice_seq".into(),
            schema: None,
            start: Some(100),
            increment: Some(5),
        };
        let d = ddl();
        assert_eq!(
            d.create_sequence(&seq),
            "CREATE SEQUENCE invoice_seq INCREMENT BY 5 START WITH 100"
        );
        assert_eq!(d.drop_sequence(&seq), "DROP SEQUENCE invoice_seq");
    }
}
