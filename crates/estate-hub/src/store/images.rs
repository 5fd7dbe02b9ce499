use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::Database;
use crate::domain::{ImageId, ImageUpdate, NewPropertyImage, PropertyId, PropertyImage};
use crate::repository::{ImageRepository, RepositoryError, RepositoryResult};

pub struct SqliteImages {
    db: Arc<Database>,
}

impl SqliteImages {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ImageRepository for SqliteImages {
    fn insert(&self, image: NewPropertyImage) -> RepositoryResult<PropertyImage> {
        let now = Utc::now();
        self.db.write(|conn| {
            let next_order: i32 = conn.query_row(
                "SELECT COALESCE(MAX(display_order) + 1, 0) FROM property_images
                 WHERE property_id = ?1",
                [image.property_id],
                |row| row.get(0),
            )?;

            if image.is_primary {
                conn.execute(
                    "UPDATE property_images SET is_primary = 0 WHERE property_id = ?1",
                    [image.property_id],
                )?;
            }

            conn.execute(
                "INSERT INTO property_images
                    (property_id, image_url, caption, is_primary, display_order, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    image.property_id,
                    image.image_url,
                    image.caption,
                    image.is_primary,
                    next_order,
                    now,
                ],
            )?;

            Ok(select_one(conn, conn.last_insert_rowid())?)
        })
    }

    fn for_property(&self, property_id: PropertyId) -> RepositoryResult<Vec<PropertyImage>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, property_id, image_url, caption, is_primary, display_order, uploaded_at
                 FROM property_images WHERE property_id = ?1
                 ORDER BY display_order ASC",
            )?;
            let images = stmt
                .query_map([property_id], row_to_image)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(images)
        })
    }

    fn set_primary(&self, property_id: PropertyId, image_id: ImageId) -> RepositoryResult<()> {
        self.db.write(|conn| {
            conn.execute(
                "UPDATE property_images SET is_primary = 0 WHERE property_id = ?1",
                [property_id],
            )?;
            let updated = conn.execute(
                "UPDATE property_images SET is_primary = 1 WHERE id = ?1 AND property_id = ?2",
                [image_id, property_id],
            )?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn update(
        &self,
        property_id: PropertyId,
        image_id: ImageId,
        update: ImageUpdate,
    ) -> RepositoryResult<PropertyImage> {
        self.db.write(|conn| {
            let current = conn
                .query_row(
                    "SELECT id FROM property_images WHERE id = ?1 AND property_id = ?2",
                    [image_id, property_id],
                    |row| row.get::<_, ImageId>(0),
                )
                .optional()?;
            if current.is_none() {
                return Err(RepositoryError::NotFound);
            }

            if let Some(url) = update.image_url.filter(|url| !url.trim().is_empty()) {
                conn.execute(
                    "UPDATE property_images SET image_url = ?2 WHERE id = ?1",
                    params![image_id, url],
                )?;
            }
            conn.execute(
                "UPDATE property_images SET caption = ?2 WHERE id = ?1",
                params![image_id, update.caption],
            )?;
            match update.is_primary {
                Some(true) => {
                    conn.execute(
                        "UPDATE property_images SET is_primary = (id = ?2) WHERE property_id = ?1",
                        [property_id, image_id],
                    )?;
                }
                Some(false) => {
                    conn.execute(
                        "UPDATE property_images SET is_primary = 0 WHERE id = ?1",
                        [image_id],
                    )?;
                }
                None => {}
            }
            Ok(select_one(conn, image_id)?)
        })
    }

    fn delete(&self, property_id: PropertyId, image_id: ImageId) -> RepositoryResult<bool> {
        self.db.write(|conn| {
            let was_primary: Option<bool> = conn
                .query_row(
                    "SELECT is_primary FROM property_images WHERE id = ?1 AND property_id = ?2",
                    [image_id, property_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(was_primary) = was_primary else {
                return Ok(false);
            };

            conn.execute("DELETE FROM property_images WHERE id = ?1", [image_id])?;
            let remaining = ordered_ids(conn, property_id)?;
            renumber(conn, property_id, &remaining)?;
            if let (true, Some(first)) = (was_primary, remaining.first()) {
                conn.execute(
                    "UPDATE property_images SET is_primary = 1 WHERE id = ?1",
                    [*first],
                )?;
            }
            Ok(true)
        })
    }

    fn reorder(&self, property_id: PropertyId, order: &[ImageId]) -> RepositoryResult<()> {
        self.db.write(|conn| {
            let mut current = ordered_ids(conn, property_id)?;
            let mut requested = order.to_vec();
            current.sort_unstable();
            requested.sort_unstable();
            if current != requested {
                return Err(RepositoryError::NotFound);
            }
            renumber(conn, property_id, order)?;
            Ok(())
        })
    }
}

fn select_one(conn: &Connection, id: ImageId) -> rusqlite::Result<PropertyImage> {
    conn.query_row(
        "SELECT id, property_id, image_url, caption, is_primary, display_order, uploaded_at
         FROM property_images WHERE id = ?1",
        [id],
        row_to_image,
    )
}

fn ordered_ids(conn: &Connection, property_id: PropertyId) -> rusqlite::Result<Vec<ImageId>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM property_images WHERE property_id = ?1 ORDER BY display_order ASC",
    )?;
    let ids = stmt
        .query_map([property_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Assigns display orders 0.. following `ids`. Orders are first parked on
/// negative values so `UNIQUE(property_id, display_order)` holds at every step.
fn renumber(conn: &Connection, property_id: PropertyId, ids: &[ImageId]) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE property_images SET display_order = -display_order - 1 WHERE property_id = ?1",
        [property_id],
    )?;
    let mut stmt = conn.prepare("UPDATE property_images SET display_order = ?2 WHERE id = ?1")?;
    for (position, id) in ids.iter().enumerate() {
        stmt.execute(params![id, position as i64])?;
    }
    Ok(())
}

fn row_to_image(row: &Row<'_>) -> rusqlite::Result<PropertyImage> {
    Ok(PropertyImage {
        id: row.get(0)?,
        property_id: row.get(1)?,
        image_url: row.get(2)?,
        caption: row.get(3)?,
        is_primary: row.get(4)?,
        display_order: row.get(5)?,
        uploaded_at: row.get(6)?,
    })
}
