use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::rows::count;
use super::Database;
use crate::domain::{ContactAgent, ContactId, NewContactAgent, UserId};
use crate::repository::{ContactRepository, ContactScope, RepositoryError, RepositoryResult};

const COLUMNS: &str = "c.id, c.user_id, c.property_id, c.subject, c.message, c.sender_name,
    c.sender_email, c.sender_phone, c.additional_info, c.is_read, c.created_at, c.responded_at";

pub struct SqliteContacts {
    db: Arc<Database>,
}

impl SqliteContacts {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ContactRepository for SqliteContacts {
    fn insert(&self, contact: NewContactAgent) -> RepositoryResult<ContactAgent> {
        let now = Utc::now();
        self.db.read(|conn| {
            conn.execute(
                "INSERT INTO contact_agents (user_id, property_id, subject, message, sender_name,
                    sender_email, sender_phone, additional_info, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
                params![
                    contact.user_id,
                    contact.property_id,
                    contact.subject,
                    contact.message,
                    contact.sender_name,
                    contact.sender_email,
                    contact.sender_phone,
                    contact.additional_info,
                    now,
                ],
            )?;
            select_one(conn, conn.last_insert_rowid())
        })
    }

    fn find(&self, id: ContactId) -> RepositoryResult<Option<ContactAgent>> {
        self.db.read(|conn| select_one(conn, id).optional())
    }

    fn list(&self, scope: ContactScope, unread_only: bool) -> RepositoryResult<Vec<ContactAgent>> {
        let mut sql = format!("SELECT {COLUMNS} FROM contact_agents c");
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        match scope {
            ContactScope::All => {}
            ContactScope::User(user_id) => {
                clauses.push("c.user_id = ?");
                values.push(Value::Integer(user_id));
            }
            ContactScope::Property(property_id) => {
                clauses.push("c.property_id = ?");
                values.push(Value::Integer(property_id));
            }
            ContactScope::Owner(owner_id) => {
                sql.push_str(" JOIN properties p ON p.id = c.property_id");
                clauses.push("p.owner_id = ?");
                values.push(Value::Integer(owner_id));
            }
        }
        if unread_only {
            clauses.push("c.is_read = 0");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY c.created_at DESC, c.id DESC");

        self.db.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), row_to_contact)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn mark_read(&self, id: ContactId, at: DateTime<Utc>) -> RepositoryResult<ContactAgent> {
        self.db.write(|conn| {
            let updated = conn.execute(
                "UPDATE contact_agents
                 SET is_read = 1, responded_at = COALESCE(responded_at, ?1)
                 WHERE id = ?2",
                params![at, id],
            )?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(select_one(conn, id)?)
        })
    }

    fn count_unread_for_owner(&self, owner_id: UserId) -> RepositoryResult<u64> {
        self.db
            .read(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM contact_agents c
                     JOIN properties p ON p.id = c.property_id
                     WHERE p.owner_id = ?1 AND c.is_read = 0",
                    [owner_id],
                    |row| row.get::<_, i64>(0),
                )
            })
            .map(count)
    }

    fn delete(&self, id: ContactId) -> RepositoryResult<bool> {
        self.db
            .read(|conn| conn.execute("DELETE FROM contact_agents WHERE id = ?1", [id]))
            .map(|affected| affected > 0)
    }
}

fn select_one(conn: &Connection, id: ContactId) -> rusqlite::Result<ContactAgent> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM contact_agents c WHERE c.id = ?1"),
        [id],
        row_to_contact,
    )
}

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<ContactAgent> {
    Ok(ContactAgent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        property_id: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        sender_name: row.get(5)?,
        sender_email: row.get(6)?,
        sender_phone: row.get(7)?,
        additional_info: row.get(8)?,
        is_read: row.get(9)?,
        created_at: row.get(10)?,
        responded_at: row.get(11)?,
    })
}
