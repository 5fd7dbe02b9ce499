use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::rows::count;
use super::Database;
use crate::domain::{Favorite, FavoriteId, PropertyId, UserId};
use crate::page::PageRequest;
use crate::repository::{FavoriteOrder, FavoriteRepository, RepositoryError, RepositoryResult};

const COLUMNS: &str = "id, user_id, property_id, notes, created_at";

pub struct SqliteFavorites {
    db: Arc<Database>,
}

impl SqliteFavorites {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl FavoriteRepository for SqliteFavorites {
    fn insert(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        notes: Option<String>,
    ) -> RepositoryResult<Favorite> {
        let now = Utc::now();
        self.db.read(|conn| {
            conn.execute(
                "INSERT INTO favorites (user_id, property_id, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, property_id, notes, now],
            )?;
            select_one(conn, conn.last_insert_rowid())
        })
    }

    fn find(&self, id: FavoriteId) -> RepositoryResult<Option<Favorite>> {
        self.db.read(|conn| select_one(conn, id).optional())
    }

    fn find_pair(
        &self,
        user_id: UserId,
        property_id: PropertyId,
    ) -> RepositoryResult<Option<Favorite>> {
        self.db.read(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM favorites WHERE user_id = ?1 AND property_id = ?2"),
                [user_id, property_id],
                row_to_favorite,
            )
            .optional()
        })
    }

    fn delete(&self, id: FavoriteId) -> RepositoryResult<bool> {
        self.db
            .read(|conn| conn.execute("DELETE FROM favorites WHERE id = ?1", [id]))
            .map(|affected| affected > 0)
    }

    fn count_for_property(&self, property_id: PropertyId) -> RepositoryResult<u64> {
        self.db
            .read(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM favorites WHERE property_id = ?1",
                    [property_id],
                    |row| row.get::<_, i64>(0),
                )
            })
            .map(count)
    }

    fn for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
        order: FavoriteOrder,
    ) -> RepositoryResult<(Vec<Favorite>, u64)> {
        let order_by = match order {
            FavoriteOrder::CreatedAt(direction) => {
                format!("created_at {dir}, id {dir}", dir = direction.as_sql())
            }
            FavoriteOrder::Id(direction) => format!("id {}", direction.as_sql()),
        };
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        self.db.read(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM favorites WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM favorites WHERE user_id = ?1
                 ORDER BY {order_by} LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(
                    params![user_id, i64::from(page.size()), offset],
                    row_to_favorite,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok((rows, count(total)))
        })
    }

    fn update_notes(&self, id: FavoriteId, notes: Option<String>) -> RepositoryResult<Favorite> {
        self.db.write(|conn| {
            let updated = conn.execute(
                "UPDATE favorites SET notes = ?1 WHERE id = ?2",
                params![notes, id],
            )?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(select_one(conn, id)?)
        })
    }
}

fn select_one(conn: &Connection, id: FavoriteId) -> rusqlite::Result<Favorite> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM favorites WHERE id = ?1"),
        [id],
        row_to_favorite,
    )
}

fn row_to_favorite(row: &Row<'_>) -> rusqlite::Result<Favorite> {
    Ok(Favorite {
        id: row.get(0)?,
        user_id: row.get(1)?,
        property_id: row.get(2)?,
        notes: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::repository::RepositoryError;
    use crate::testing::Fixture;

    #[test]
    fn unique_pair_is_enforced_by_storage() {
        let fixture = Fixture::new();
        let user = fixture.user("fav@example.com");
        let property = fixture.property("Flat", "Oslo");
        let favorites = &fixture.repositories.favorites;

        favorites.insert(user.id, property.id, None).expect("first");
        let err = favorites
            .insert(user.id, property.id, Some("again".into()))
            .expect_err("duplicate pair");
        assert_eq!(err, RepositoryError::Conflict);
        assert_eq!(favorites.count_for_property(property.id).expect("count"), 1);
    }

    #[test]
    fn unknown_property_maps_to_not_found() {
        let fixture = Fixture::new();
        let user = fixture.user("ghost@example.com");
        let err = fixture
            .repositories
            .favorites
            .insert(user.id, 999, None)
            .expect_err("dangling property");
        assert_eq!(err, RepositoryError::NotFound);
    }
}
