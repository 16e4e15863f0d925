//! Client and phone CRUD over a caller-supplied connection.
//!
//! Single-statement operations borrow the connection shared; operations that
//! issue several statements borrow it mutably and run inside one transaction,
//! which rolls back when dropped without a commit.

use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DirectoryError, Result};
use crate::query::{Assignments, Query, QueryOperator, Value};
use crate::schema::{CLIENTS_TABLE, PHONES_TABLE};

const CLIENT_COLUMNS: &str = "client_id, first_name, last_name, email";

/// A row of the `clients` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Client {
    pub client_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Client {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            client_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
        })
    }
}

/// Partial update of a client. `None` and empty strings leave a field as is.
///
/// `phones: Some(..)` replaces the whole phone list, `Some(vec![])` clears it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phones: Option<Vec<String>>,
}

impl ClientUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn phones<I, S>(mut self, phones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phones = Some(phones.into_iter().map(Into::into).collect());
        self
    }

    fn assignments(&self) -> Assignments {
        Assignments::new()
            .with_optional("first_name", self.first_name.as_deref())
            .with_optional("last_name", self.last_name.as_deref())
            .with_optional("email", self.email.as_deref())
    }
}

/// Lookup criteria for [`find_clients`]. Supplied fields are combined with AND.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ClientFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn phone_number(mut self, value: impl Into<String>) -> Self {
        self.phone_number = Some(value.into());
        self
    }

    fn query(&self) -> Query {
        let query = Query::new()
            .with_optional_eq("first_name", self.first_name.as_deref())
            .with_optional_eq("last_name", self.last_name.as_deref())
            .with_optional_eq("email", self.email.as_deref());
        match self.phone_number.as_deref().filter(|p| !p.is_empty()) {
            Some(phone) => query.with_condition(
                "client_id",
                QueryOperator::InSubquery {
                    table: PHONES_TABLE,
                    key: "phone_number",
                    value: phone.into(),
                },
            ),
            None => query,
        }
    }
}

/// Inserts a client together with its phone numbers and returns the new id.
///
/// All inserts share one transaction: a rejected phone number leaves no
/// client behind.
pub fn add_client<S: AsRef<str>>(
    conn: &mut Connection,
    first_name: &str,
    last_name: &str,
    email: &str,
    phones: &[S],
) -> Result<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO clients (first_name, last_name, email) VALUES (?1, ?2, ?3)",
        params![first_name, last_name, email],
    )?;
    let client_id = tx.last_insert_rowid();
    insert_phones(&tx, client_id, phones)?;
    tx.commit()?;
    debug!(client_id, phones = phones.len(), "client added");
    Ok(client_id)
}

/// Attaches one phone number to an existing client.
pub fn add_phone(conn: &Connection, client_id: i64, phone_number: &str) -> Result<()> {
    insert_phones(conn, client_id, &[phone_number])?;
    debug!(client_id, "phone added");
    Ok(())
}

/// Applies a partial update. When `update.phones` is set, the client's phone
/// list is replaced as a whole. Nothing is executed if the update is empty.
pub fn update_client(conn: &mut Connection, client_id: i64, update: &ClientUpdate) -> Result<()> {
    let assignments = update.assignments();
    let set_clause = assignments.set_clause();
    if set_clause.is_none() && update.phones.is_none() {
        debug!(client_id, "empty client update skipped");
        return Ok(());
    }

    let tx = conn.transaction()?;
    if let Some(set_clause) = set_clause {
        let sql = format!(
            "UPDATE {CLIENTS_TABLE} {set_clause} WHERE client_id = ?{}",
            assignments.len() + 1
        );
        let client_id_value = Value::from(client_id);
        let mut params = assignments.params();
        params.push(&client_id_value);
        let changed = tx.execute(&sql, params_from_iter(params))?;
        debug!(client_id, changed, "client fields updated");
    }
    if let Some(phones) = &update.phones {
        let removed = tx.execute("DELETE FROM phones WHERE client_id = ?1", [client_id])?;
        insert_phones(&tx, client_id, phones)?;
        debug!(client_id, removed, added = phones.len(), "phone list replaced");
    }
    tx.commit()?;
    Ok(())
}

/// Removes one phone number from a client. Unknown pairs are ignored.
pub fn delete_phone(conn: &Connection, client_id: i64, phone_number: &str) -> Result<()> {
    let removed = conn.execute(
        "DELETE FROM phones WHERE client_id = ?1 AND phone_number = ?2",
        params![client_id, phone_number],
    )?;
    debug!(client_id, removed, "phone deleted");
    Ok(())
}

/// Deletes a client; its phones go with it through the cascade.
pub fn delete_client(conn: &Connection, client_id: i64) -> Result<()> {
    let removed = conn.execute("DELETE FROM clients WHERE client_id = ?1", [client_id])?;
    debug!(client_id, removed, "client deleted");
    Ok(())
}

/// Returns the clients matching every supplied field of `filter`, in no
/// particular order.
///
/// Fails with [`DirectoryError::EmptyFilter`] when nothing is supplied; use
/// [`list_clients`] to read the whole table.
pub fn find_clients(conn: &Connection, filter: &ClientFilter) -> Result<Vec<Client>> {
    let query = filter.query();
    let where_clause = query.where_clause(1).ok_or(DirectoryError::EmptyFilter)?;
    let sql = format!("SELECT {CLIENT_COLUMNS} FROM {CLIENTS_TABLE} {where_clause}");

    let mut stmt = conn.prepare(&sql)?;
    let clients = stmt
        .query_map(params_from_iter(query.params()), Client::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(filters = query.conditions.len(), found = clients.len(), "clients found");
    Ok(clients)
}

/// Returns every client ordered by id.
pub fn list_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLIENT_COLUMNS} FROM {CLIENTS_TABLE} ORDER BY client_id"
    ))?;
    let clients = stmt
        .query_map([], Client::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(clients)
}

/// Phone numbers of a client in the order they were added.
pub fn client_phones(conn: &Connection, client_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT phone_number FROM phones WHERE client_id = ?1 ORDER BY phone_id")?;
    let phones = stmt
        .query_map([client_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(phones)
}

fn insert_phones<S: AsRef<str>>(conn: &Connection, client_id: i64, phones: &[S]) -> Result<()> {
    if phones.is_empty() {
        return Ok(());
    }
    let mut stmt =
        conn.prepare_cached("INSERT INTO phones (client_id, phone_number) VALUES (?1, ?2)")?;
    for phone in phones {
        stmt.execute(params![client_id, phone.as_ref()])?;
    }
    Ok(())
}
