use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::domain::{BuilderGroup, BuilderGroupId, NewBuilderGroup};
use crate::repository::{BuilderGroupRepository, RepositoryResult};

const SELECT: &str =
    "SELECT id, name, description, active, created_at, updated_at FROM builder_groups WHERE id = ?1";

pub struct SqliteBuilderGroups {
    db: Arc<Database>,
}

impl SqliteBuilderGroups {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl BuilderGroupRepository for SqliteBuilderGroups {
    fn insert(&self, group: NewBuilderGroup) -> RepositoryResult<BuilderGroup> {
        let now = Utc::now();
        self.db.read(|conn| {
            conn.execute(
                "INSERT INTO builder_groups (name, description, active, created_at, updated_at)
                 VALUES (?1, ?2, 1, ?3, ?3)",
                params![group.name, group.description, now],
            )?;
            conn.query_row(SELECT, [conn.last_insert_rowid()], row_to_group)
        })
    }

    fn find(&self, id: BuilderGroupId) -> RepositoryResult<Option<BuilderGroup>> {
        self.db
            .read(|conn| conn.query_row(SELECT, [id], row_to_group).optional())
    }
}

fn row_to_group(row: &Row<'_>) -> rusqlite::Result<BuilderGroup> {
    Ok(BuilderGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        active: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
