//! SQLite-backed directory of clients and their phone numbers.
//!
//! # Intention
//!
//! - Create the `clients` / `phones` schema and keep it idempotent.
//! - Provide stateless CRUD functions over a caller-supplied connection.
//! - Surface database errors unchanged; reject degenerate lookups explicitly.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - Connection lifecycle belongs to the caller; [`DirectoryConfig`] is a convenience.

pub mod config;
pub mod directory;
pub mod error;
pub mod query;
pub mod schema;

pub use config::DirectoryConfig;
pub use directory::{
    add_client, add_phone, client_phones, delete_client, delete_phone, find_clients, list_clients,
    update_client, Client, ClientFilter, ClientUpdate,
};
pub use error::{DirectoryError, Result};
pub use schema::initialize_schema;
