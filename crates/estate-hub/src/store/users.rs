use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::domain::{NewUser, PlanType, User, UserId};
use crate::repository::{RepositoryResult, UserRepository};

const COLUMNS: &str = "id, first_name, last_name, email, password, phone, user_type, role,
    subscription_type, company, license_number, bio, profile_image_url, active,
    created_at, updated_at";

pub struct SqliteUsers {
    db: Arc<Database>,
}

impl SqliteUsers {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl UserRepository for SqliteUsers {
    fn insert(&self, user: NewUser) -> RepositoryResult<User> {
        let now = Utc::now();
        self.db.read(|conn| {
            conn.execute(
                "INSERT INTO users (first_name, last_name, email, password, phone, user_type,
                    role, subscription_type, company, license_number, bio, profile_image_url,
                    active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13, ?13)",
                params![
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.password,
                    user.phone,
                    user.user_type,
                    user.role,
                    PlanType::Free,
                    user.company,
                    user.license_number,
                    user.bio,
                    user.profile_image_url,
                    now,
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                [id],
                row_to_user,
            )
        })
    }

    fn find(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.db.read(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                [id],
                row_to_user,
            )
            .optional()
        })
    }

    fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.db.read(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM users WHERE unicode_lower(email) = unicode_lower(?1)"
                ),
                [email],
                row_to_user,
            )
            .optional()
        })
    }
}

pub(crate) fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        phone: row.get(5)?,
        user_type: row.get(6)?,
        role: row.get(7)?,
        subscription_type: row.get(8)?,
        company: row.get(9)?,
        license_number: row.get(10)?,
        bio: row.get(11)?,
        profile_image_url: row.get(12)?,
        active: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
