//! Typed schema definitions rendered to idempotent DDL.

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub const CLIENTS_TABLE: &str = "clients";
pub const PHONES_TABLE: &str = "phones";

/// Schema definition for the SQLite database
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    /// `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT EXISTS` statements,
    /// one per line, tables in declaration order.
    pub fn to_sql(&self) -> String {
        let mut statements = Vec::new();
        for table in &self.tables {
            statements.push(table.create_statement());
            statements.extend(table.index_statements());
        }
        statements.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    fn create_statement(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(ColumnDefinition::to_sql).collect();
        parts.extend(self.foreign_keys.iter().map(ForeignKey::to_sql));
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            self.name,
            parts.join(", ")
        )
    }

    fn index_statements(&self) -> impl Iterator<Item = String> + '_ {
        self.indexes.iter().map(move |index| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
                index.name,
                self.name,
                index.columns.join(", ")
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            constraints: Vec::new(),
        }
    }

    pub fn with(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataType {
    Integer,
    Text,
}

impl DataType {
    fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnConstraint {
    /// Rendered as `PRIMARY KEY AUTOINCREMENT`; only valid on INTEGER columns.
    PrimaryKey,
    NotNull,
    Unique,
}

impl ColumnConstraint {
    fn as_sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY AUTOINCREMENT",
            ColumnConstraint::NotNull => "NOT NULL",
            ColumnConstraint::Unique => "UNIQUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
    pub on_delete: ForeignKeyAction,
}

impl ForeignKey {
    fn to_sql(&self) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            self.column,
            self.foreign_table,
            self.foreign_column,
            self.on_delete.as_sql()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForeignKeyAction {
    Cascade,
}

impl ForeignKeyAction {
    fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
}

/// The `clients` / `phones` schema.
pub fn directory_schema() -> Schema {
    use ColumnConstraint::*;

    let clients = TableDefinition::new(CLIENTS_TABLE)
        .column(ColumnDefinition::new("client_id", DataType::Integer).with(PrimaryKey))
        .column(ColumnDefinition::new("first_name", DataType::Text).with(NotNull))
        .column(ColumnDefinition::new("last_name", DataType::Text).with(NotNull))
        .column(
            ColumnDefinition::new("email", DataType::Text)
                .with(Unique)
                .with(NotNull),
        );

    let phones = TableDefinition::new(PHONES_TABLE)
        .column(ColumnDefinition::new("phone_id", DataType::Integer).with(PrimaryKey))
        .column(ColumnDefinition::new("client_id", DataType::Integer).with(NotNull))
        .column(ColumnDefinition::new("phone_number", DataType::Text).with(Unique))
        .foreign_key(ForeignKey {
            column: "client_id".to_string(),
            foreign_table: CLIENTS_TABLE.to_string(),
            foreign_column: "client_id".to_string(),
            on_delete: ForeignKeyAction::Cascade,
        })
        .index(IndexDefinition {
            name: "idx_phones_client_id".to_string(),
            columns: vec!["client_id".to_string()],
        });

    Schema::new().add_table(clients).add_table(phones)
}

/// Creates the directory tables if they do not exist yet and turns on foreign
/// key enforcement for `conn`. Safe to call on every startup.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Per-connection setting; without it ON DELETE CASCADE is ignored.
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.execute_batch(&directory_schema().to_sql())?;
    info!("client directory schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_directory_ddl() {
        let sql = directory_schema().to_sql();
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(
            lines,
            vec![
                "CREATE TABLE IF NOT EXISTS clients (client_id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 first_name TEXT NOT NULL, last_name TEXT NOT NULL, email TEXT UNIQUE NOT NULL);",
                "CREATE TABLE IF NOT EXISTS phones (phone_id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 client_id INTEGER NOT NULL, phone_number TEXT UNIQUE, \
                 FOREIGN KEY (client_id) REFERENCES clients (client_id) ON DELETE CASCADE);",
                "CREATE INDEX IF NOT EXISTS idx_phones_client_id ON phones (client_id);",
            ]
        );
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        let enabled: bool = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }
}
