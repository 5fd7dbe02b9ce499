use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::rows::count;
use super::Database;
use crate::domain::{NewScheduleViewing, PropertyId, ScheduleViewing, ViewingId, ViewingStatus};
use crate::repository::{
    RepositoryError, RepositoryResult, ViewingRepository, ViewingScope, ViewingTransition,
};

const COLUMNS: &str = "v.id, v.user_id, v.property_id, v.viewing_date, v.viewing_time, v.status,
    v.notes, v.rejection_reason, v.created_at, v.confirmed_at, v.rejected_at, v.completed_at,
    v.cancelled_at";

pub struct SqliteViewings {
    db: Arc<Database>,
}

impl SqliteViewings {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ViewingRepository for SqliteViewings {
    fn insert(&self, viewing: NewScheduleViewing) -> RepositoryResult<ScheduleViewing> {
        let now = Utc::now();
        self.db.write(|conn| {
            if slot_taken(conn, viewing.property_id, viewing.viewing_date)? {
                return Err(RepositoryError::Conflict);
            }
            // the partial unique index rejects a concurrent writer that slipped past the check
            conn.execute(
                "INSERT INTO schedule_viewings
                    (user_id, property_id, viewing_date, viewing_time, status, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    viewing.user_id,
                    viewing.property_id,
                    viewing.viewing_date,
                    viewing.viewing_time,
                    ViewingStatus::Pending,
                    viewing.notes,
                    now,
                ],
            )?;
            Ok(select_one(conn, conn.last_insert_rowid())?)
        })
    }

    fn find(&self, id: ViewingId) -> RepositoryResult<Option<ScheduleViewing>> {
        self.db.read(|conn| select_one(conn, id).optional())
    }

    fn has_active_on(&self, property_id: PropertyId, date: NaiveDate) -> RepositoryResult<bool> {
        self.db.read(|conn| slot_taken(conn, property_id, date))
    }

    fn transition(
        &self,
        id: ViewingId,
        transition: &ViewingTransition,
    ) -> RepositoryResult<Option<ScheduleViewing>> {
        let stamp_column = match transition.to {
            ViewingStatus::Confirmed => "confirmed_at",
            ViewingStatus::Rejected => "rejected_at",
            ViewingStatus::Completed => "completed_at",
            ViewingStatus::Cancelled => "cancelled_at",
            ViewingStatus::Pending => {
                return Err(RepositoryError::Unavailable(
                    "viewings cannot return to PENDING".to_string(),
                ))
            }
        };

        self.db.write(|conn| {
            let updated = conn.execute(
                &format!(
                    "UPDATE schedule_viewings
                     SET status = ?1, {stamp_column} = ?2,
                         rejection_reason = COALESCE(?3, rejection_reason)
                     WHERE id = ?4 AND status = ?5"
                ),
                params![
                    transition.to,
                    transition.at,
                    transition.rejection_reason,
                    id,
                    transition.from,
                ],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(Some(select_one(conn, id)?))
        })
    }

    fn list(
        &self,
        scope: ViewingScope,
        status: Option<ViewingStatus>,
    ) -> RepositoryResult<Vec<ScheduleViewing>> {
        let mut sql = format!("SELECT {COLUMNS} FROM schedule_viewings v");
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        match scope {
            ViewingScope::All => {}
            ViewingScope::User(user_id) => {
                clauses.push("v.user_id = ?");
                values.push(Value::Integer(user_id));
            }
            ViewingScope::Property(property_id) => {
                clauses.push("v.property_id = ?");
                values.push(Value::Integer(property_id));
            }
            ViewingScope::Owner(owner_id) => {
                sql.push_str(" JOIN properties p ON p.id = v.property_id");
                clauses.push("p.owner_id = ?");
                values.push(Value::Integer(owner_id));
            }
        }
        if let Some(status) = status {
            clauses.push("v.status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY v.viewing_date ASC, v.viewing_time ASC, v.id ASC");

        self.db.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), row_to_viewing)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn between(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<Vec<ScheduleViewing>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM schedule_viewings v
                 WHERE v.viewing_date BETWEEN ?1 AND ?2
                 ORDER BY v.viewing_date ASC, v.viewing_time ASC, v.id ASC"
            ))?;
            let rows = stmt
                .query_map(params![start, end], row_to_viewing)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn count_with_status(
        &self,
        property_id: PropertyId,
        status: ViewingStatus,
    ) -> RepositoryResult<u64> {
        self.db
            .read(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM schedule_viewings WHERE property_id = ?1 AND status = ?2",
                    params![property_id, status],
                    |row| row.get::<_, i64>(0),
                )
            })
            .map(count)
    }

    fn delete(&self, id: ViewingId) -> RepositoryResult<bool> {
        self.db
            .read(|conn| conn.execute("DELETE FROM schedule_viewings WHERE id = ?1", [id]))
            .map(|affected| affected > 0)
    }
}

fn slot_taken(conn: &Connection, property_id: PropertyId, date: NaiveDate) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM schedule_viewings
            WHERE property_id = ?1 AND viewing_date = ?2 AND status IN ('PENDING', 'CONFIRMED')
         )",
        params![property_id, date],
        |row| row.get(0),
    )
}

fn select_one(conn: &Connection, id: ViewingId) -> rusqlite::Result<ScheduleViewing> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM schedule_viewings v WHERE v.id = ?1"),
        [id],
        row_to_viewing,
    )
}

fn row_to_viewing(row: &Row<'_>) -> rusqlite::Result<ScheduleViewing> {
    Ok(ScheduleViewing {
        id: row.get(0)?,
        user_id: row.get(1)?,
        property_id: row.get(2)?,
        viewing_date: row.get(3)?,
        viewing_time: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        rejection_reason: row.get(7)?,
        created_at: row.get(8)?,
        confirmed_at: row.get(9)?,
        rejected_at: row.get(10)?,
        completed_at: row.get(11)?,
        cancelled_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};

    use crate::domain::{NewScheduleViewing, ViewingStatus};
    use crate::repository::{RepositoryError, ViewingScope, ViewingTransition};
    use crate::testing::Fixture;

    fn request(user_id: i64, property_id: i64, date: NaiveDate) -> NewScheduleViewing {
        NewScheduleViewing {
            user_id,
            property_id,
            viewing_date: date,
            viewing_time: NaiveTime::from_hms_opt(10, 30, 0).expect("time"),
            notes: None,
        }
    }

    #[test]
    fn active_slot_is_exclusive_until_released() {
        let fixture = Fixture::new();
        let user = fixture.user("viewer@example.com");
        let property = fixture.property("Barn", "Tulsa");
        let date = NaiveDate::from_ymd_opt(2031, 5, 1).expect("date");
        let viewings = &fixture.repositories.viewings;

        let first = viewings.insert(request(user.id, property.id, date)).expect("first");
        assert!(viewings.has_active_on(property.id, date).expect("check"));
        assert_eq!(
            viewings.insert(request(user.id, property.id, date)),
            Err(RepositoryError::Conflict)
        );

        let cancelled = viewings
            .transition(
                first.id,
                &ViewingTransition {
                    from: ViewingStatus::Pending,
                    to: ViewingStatus::Cancelled,
                    at: Utc::now(),
                    rejection_reason: None,
                },
            )
            .expect("transition")
            .expect("applied");
        assert!(cancelled.cancelled_at.is_some());
        assert!(viewings.insert(request(user.id, property.id, date)).is_ok());
    }

    #[test]
    fn transition_is_guarded_by_expected_status() {
        let fixture = Fixture::new();
        let user = fixture.user("guard@example.com");
        let property = fixture.property("Mill", "Omaha");
        let date = NaiveDate::from_ymd_opt(2031, 6, 2).expect("date");
        let viewing = fixture
            .repositories
            .viewings
            .insert(request(user.id, property.id, date))
            .expect("insert");

        let stale = fixture
            .repositories
            .viewings
            .transition(
                viewing.id,
                &ViewingTransition {
                    from: ViewingStatus::Confirmed,
                    to: ViewingStatus::Completed,
                    at: Utc::now(),
                    rejection_reason: None,
                },
            )
            .expect("query");
        assert!(stale.is_none());
    }

    #[test]
    fn owner_scope_joins_through_property() {
        let fixture = Fixture::new();
        let owner = fixture.user("owner@example.com");
        let visitor = fixture.user("visitor@example.com");
        let owned = fixture.owned_property("Owned", "Nome", owner.id);
        let other = fixture.property("Other", "Nome");
        let date = NaiveDate::from_ymd_opt(2031, 7, 3).expect("date");
        let viewings = &fixture.repositories.viewings;
        viewings.insert(request(visitor.id, owned.id, date)).expect("owned");
        viewings.insert(request(visitor.id, other.id, date)).expect("other");

        let listed = viewings
            .list(ViewingScope::Owner(owner.id), None)
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].property_id, owned.id);

        let pending = viewings
            .list(ViewingScope::User(visitor.id), Some(ViewingStatus::Pending))
            .expect("list");
        assert_eq!(pending.len(), 2);
    }
}
