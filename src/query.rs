//! Conditional SQL clause assembly.
//!
//! Column names are `&'static str` so only identifiers fixed at compile time
//! ever reach the SQL text. Values always travel as bound parameters.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

/// Core value types bound to SQL parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Predicate applied to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    /// `column = ?`
    Equal(Value),
    /// `column IN (SELECT column FROM table WHERE key = ?)`
    InSubquery {
        table: &'static str,
        key: &'static str,
        value: Value,
    },
}

impl QueryOperator {
    fn render(&self, column: &str, placeholder: usize) -> String {
        match self {
            QueryOperator::Equal(_) => format!("{column} = ?{placeholder}"),
            QueryOperator::InSubquery { table, key, .. } => format!(
                "{column} IN (SELECT {column} FROM {table} WHERE {key} = ?{placeholder})"
            ),
        }
    }

    fn value(&self) -> &Value {
        match self {
            QueryOperator::Equal(value) => value,
            QueryOperator::InSubquery { value, .. } => value,
        }
    }
}

/// Conjunction of column predicates, kept in insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    pub conditions: Vec<(&'static str, QueryOperator)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, field: &'static str, op: QueryOperator) -> Self {
        self.conditions.push((field, op));
        self
    }

    /// Adds `field = value` when a non-empty value is supplied.
    pub fn with_optional_eq(self, field: &'static str, value: Option<&str>) -> Self {
        match non_empty(value) {
            Some(value) => self.with_condition(field, QueryOperator::Equal(value.into())),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders `WHERE a = ?n AND b = ?n+1 ...` with placeholders numbered from
    /// `first_placeholder`. Returns `None` for an empty query.
    pub fn where_clause(&self, first_placeholder: usize) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let predicates: Vec<String> = self
            .conditions
            .iter()
            .enumerate()
            .map(|(i, (column, op))| op.render(column, first_placeholder + i))
            .collect();
        Some(format!("WHERE {}", predicates.join(" AND ")))
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> Vec<&Value> {
        self.conditions.iter().map(|(_, op)| op.value()).collect()
    }
}

/// Ordered `column = value` pairs for an UPDATE statement.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Assignments {
    pub values: Vec<(&'static str, Value)>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field = value` when a non-empty value is supplied.
    pub fn with_optional(mut self, field: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = non_empty(value) {
            self.values.push((field, value.into()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Renders `SET a = ?1, b = ?2 ...`. Returns `None` when nothing is assigned.
    pub fn set_clause(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let assignments: Vec<String> = self
            .values
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
            .collect();
        Some(format!("SET {}", assignments.join(", ")))
    }

    pub fn params(&self) -> Vec<&Value> {
        self.values.iter().map(|(_, value)| value).collect()
    }
}

// Empty strings are treated the same as an omitted field.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_renders_no_where_clause() {
        let query = Query::new()
            .with_optional_eq("first_name", None)
            .with_optional_eq("last_name", Some(""));
        assert!(query.is_empty());
        assert_eq!(query.where_clause(1), None);
        assert!(query.params().is_empty());
    }

    #[test]
    fn conditions_are_joined_in_order() {
        let query = Query::new()
            .with_optional_eq("first_name", Some("John"))
            .with_optional_eq("email", None)
            .with_condition(
                "client_id",
                QueryOperator::InSubquery {
                    table: "phones",
                    key: "phone_number",
                    value: "555-0100".into(),
                },
            );
        assert_eq!(
            query.where_clause(1).as_deref(),
            Some(
                "WHERE first_name = ?1 AND client_id IN \
                 (SELECT client_id FROM phones WHERE phone_number = ?2)"
            )
        );
        assert_eq!(
            query.params(),
            vec![&Value::from("John"), &Value::from("555-0100")]
        );
    }

    #[test]
    fn where_clause_placeholders_start_at_offset() {
        let query = Query::new().with_condition("client_id", QueryOperator::Equal(7.into()));
        assert_eq!(
            query.where_clause(3).as_deref(),
            Some("WHERE client_id = ?3")
        );
    }

    #[test]
    fn assignments_skip_missing_fields() {
        let set = Assignments::new()
            .with_optional("first_name", None)
            .with_optional("last_name", Some("Smith"))
            .with_optional("email", Some("s@example.com"));
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.set_clause().as_deref(),
            Some("SET last_name = ?1, email = ?2")
        );
    }

    #[test]
    fn empty_assignments_render_nothing() {
        let set = Assignments::new().with_optional("email", Some(""));
        assert!(set.is_empty());
        assert_eq!(set.set_clause(), None);
    }
}
