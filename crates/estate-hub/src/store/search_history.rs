use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Row};

use super::rows::{count, optional_decimal, optional_decimal_text};
use super::Database;
use crate::domain::{NewSearchHistory, PropertyType, SearchHistory, SearchHistoryId, UserId};
use crate::repository::{RepositoryResult, SearchHistoryRepository};

const COLUMNS: &str = "id, user_id, search_keyword, search_city, search_state,
    search_property_type, search_listing_type, min_price, max_price, min_bedrooms, max_bedrooms,
    min_bathrooms, max_bathrooms, min_square_feet, max_square_feet, results_count, searched_at";

pub struct SqliteSearchHistory {
    db: Arc<Database>,
}

impl SqliteSearchHistory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl SearchHistoryRepository for SqliteSearchHistory {
    fn insert(&self, entry: NewSearchHistory) -> RepositoryResult<SearchHistory> {
        let now = Utc::now();
        self.db.read(|conn| {
            conn.execute(
                "INSERT INTO search_history (user_id, search_keyword, search_city, search_state,
                    search_property_type, search_listing_type, min_price, max_price,
                    min_bedrooms, max_bedrooms, min_bathrooms, max_bathrooms, min_square_feet,
                    max_square_feet, results_count, searched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    entry.user_id,
                    entry.search_keyword,
                    entry.search_city,
                    entry.search_state,
                    entry.search_property_type,
                    entry.search_listing_type,
                    optional_decimal_text(entry.min_price.as_ref()),
                    optional_decimal_text(entry.max_price.as_ref()),
                    entry.min_bedrooms,
                    entry.max_bedrooms,
                    entry.min_bathrooms,
                    entry.max_bathrooms,
                    optional_decimal_text(entry.min_square_feet.as_ref()),
                    optional_decimal_text(entry.max_square_feet.as_ref()),
                    entry.results_count,
                    now,
                ],
            )?;
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM search_history WHERE id = ?1"),
                [conn.last_insert_rowid()],
                row_to_entry,
            )
        })
    }

    fn for_user(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> RepositoryResult<Vec<SearchHistory>> {
        // LIMIT -1 is unbounded in SQLite
        let limit = limit.map(i64::from).unwrap_or(-1);
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM search_history WHERE user_id = ?1
                 ORDER BY searched_at DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], row_to_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn delete(&self, id: SearchHistoryId) -> RepositoryResult<bool> {
        self.db
            .read(|conn| conn.execute("DELETE FROM search_history WHERE id = ?1", [id]))
            .map(|affected| affected > 0)
    }

    fn clear_for_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.db
            .write(|conn| {
                Ok(conn.execute("DELETE FROM search_history WHERE user_id = ?1", [user_id])?)
            })
            .map(|affected| affected as u64)
    }

    fn count_for_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.db
            .read(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM search_history WHERE user_id = ?1",
                    [user_id],
                    |row| row.get::<_, i64>(0),
                )
            })
            .map(count)
    }

    fn top_cities(&self, limit: u32) -> RepositoryResult<Vec<(String, u64)>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT search_city, COUNT(*) AS hits FROM search_history
                 WHERE search_city IS NOT NULL AND search_city <> ''
                 GROUP BY search_city ORDER BY hits DESC, search_city ASC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([i64::from(limit)], |row| {
                    Ok((row.get::<_, String>(0)?, count(row.get(1)?)))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn top_property_types(&self, limit: u32) -> RepositoryResult<Vec<(PropertyType, u64)>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT search_property_type, COUNT(*) AS hits FROM search_history
                 WHERE search_property_type IS NOT NULL
                 GROUP BY search_property_type ORDER BY hits DESC, search_property_type ASC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([i64::from(limit)], |row| {
                    Ok((row.get::<_, PropertyType>(0)?, count(row.get(1)?)))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<SearchHistory> {
    Ok(SearchHistory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        search_keyword: row.get(2)?,
        search_city: row.get(3)?,
        search_state: row.get(4)?,
        search_property_type: row.get(5)?,
        search_listing_type: row.get(6)?,
        min_price: optional_decimal(row, 7)?,
        max_price: optional_decimal(row, 8)?,
        min_bedrooms: row.get(9)?,
        max_bedrooms: row.get(10)?,
        min_bathrooms: row.get(11)?,
        max_bathrooms: row.get(12)?,
        min_square_feet: optional_decimal(row, 13)?,
        max_square_feet: optional_decimal(row, 14)?,
        results_count: row.get(15)?,
        searched_at: row.get(16)?,
    })
}
