//! SQLite-backed entity store.
//!
//! [`Database`] owns a single connection behind a mutex and runs migrations
//! before handing out access. Each repository is a thin handle over a shared
//! `Arc<Database>`; multi-statement writes go through [`Database::write`],
//! which wraps them in one IMMEDIATE transaction.

mod builder_groups;
mod contacts;
mod error;
mod favorites;
mod images;
pub mod migrations;
mod properties;
mod rows;
mod search_history;
mod subscriptions;
mod users;
mod viewings;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, TransactionBehavior};

use crate::repository::{Repositories, RepositoryError, RepositoryResult};

pub use builder_groups::SqliteBuilderGroups;
pub use contacts::SqliteContacts;
pub use error::StoreError;
pub use favorites::SqliteFavorites;
pub use images::SqliteImages;
pub use properties::SqliteProperties;
pub use search_history::SqliteSearchHistory;
pub use subscriptions::SqliteSubscriptions;
pub use users::SqliteUsers;
pub use viewings::SqliteViewings;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file, or a private in-memory one for `:memory:`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::open_in_memory();
        }

        tracing::info!(path = %path.display(), "opening database");
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::prepare(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        register_functions(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("database mutex poisoned".to_string()))
    }

    /// Single-statement access.
    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> RepositoryResult<T> {
        let conn = self.lock()?;
        f(&conn).map_err(RepositoryError::from)
    }

    /// Runs `f` inside an IMMEDIATE transaction; any error rolls the whole unit back.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&Connection) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// `unicode_lower(text)`: full Unicode lowercasing; SQLite's `LOWER` only folds ASCII.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

impl Repositories {
    /// Wires every repository to one shared database handle.
    pub fn sqlite(db: Arc<Database>) -> Self {
        Self {
            users: Arc::new(SqliteUsers::new(db.clone())),
            builder_groups: Arc::new(SqliteBuilderGroups::new(db.clone())),
            properties: Arc::new(SqliteProperties::new(db.clone())),
            images: Arc::new(SqliteImages::new(db.clone())),
            favorites: Arc::new(SqliteFavorites::new(db.clone())),
            viewings: Arc::new(SqliteViewings::new(db.clone())),
            subscriptions: Arc::new(SqliteSubscriptions::new(db.clone())),
            contacts: Arc::new(SqliteContacts::new(db.clone())),
            search_history: Arc::new(SqliteSearchHistory::new(db)),
        }
    }
}
