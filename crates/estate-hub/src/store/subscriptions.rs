use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use super::rows::{decimal, decimal_text};
use super::Database;
use crate::domain::{NewSubscription, PlanType, Subscription, UserId};
use crate::repository::{RepositoryError, RepositoryResult, SubscriptionRepository};

const COLUMNS: &str = "id, user_id, plan_type, start_date, end_date, price, active, auto_renew,
    payment_method, transaction_id, created_at, updated_at";

pub struct SqliteSubscriptions {
    db: Arc<Database>,
}

impl SqliteSubscriptions {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn query(&self, filter: &str, values: impl Params) -> RepositoryResult<Vec<Subscription>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM subscriptions WHERE {filter} ORDER BY end_date ASC, id ASC"
            ))?;
            let rows = stmt
                .query_map(values, row_to_subscription)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

impl SubscriptionRepository for SqliteSubscriptions {
    fn for_user(&self, user_id: UserId) -> RepositoryResult<Option<Subscription>> {
        self.db.read(|conn| by_user(conn, user_id).optional())
    }

    fn create(&self, subscription: NewSubscription) -> RepositoryResult<Subscription> {
        let now = Utc::now();
        self.db.write(|conn| {
            if let Some(existing) = by_user(conn, subscription.user_id).optional()? {
                if existing.active {
                    return Err(RepositoryError::Conflict);
                }
                conn.execute("DELETE FROM subscriptions WHERE id = ?1", [existing.id])?;
            }

            let plan = set_user_plan(conn, subscription.user_id, subscription.plan_type, now)?;

            conn.execute(
                "INSERT INTO subscriptions (user_id, plan_type, start_date, end_date, price,
                    active, auto_renew, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, 0, ?6, ?6)",
                params![
                    subscription.user_id,
                    plan,
                    subscription.start_date,
                    subscription.end_date,
                    decimal_text(&subscription.price),
                    now,
                ],
            )?;
            Ok(by_user(conn, subscription.user_id)?)
        })
    }

    fn save(
        &self,
        subscription: &Subscription,
        user_plan: Option<PlanType>,
    ) -> RepositoryResult<Subscription> {
        let now = Utc::now();
        self.db.write(|conn| {
            let updated = conn.execute(
                "UPDATE subscriptions
                 SET plan_type = ?1, start_date = ?2, end_date = ?3, price = ?4, active = ?5,
                     auto_renew = ?6, payment_method = ?7, transaction_id = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    subscription.plan_type,
                    subscription.start_date,
                    subscription.end_date,
                    decimal_text(&subscription.price),
                    subscription.active,
                    subscription.auto_renew,
                    subscription.payment_method,
                    subscription.transaction_id,
                    now,
                    subscription.id,
                ],
            )?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }
            if let Some(plan) = user_plan {
                set_user_plan(conn, subscription.user_id, plan, now)?;
            }
            Ok(by_user(conn, subscription.user_id)?)
        })
    }

    fn active(&self) -> RepositoryResult<Vec<Subscription>> {
        self.query("active = 1", [])
    }

    fn expired(&self, today: NaiveDate) -> RepositoryResult<Vec<Subscription>> {
        self.query(
            "active = 1 AND end_date IS NOT NULL AND end_date < ?1",
            [today],
        )
    }

    fn ending_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Subscription>> {
        self.query("end_date BETWEEN ?1 AND ?2", [start, end])
    }
}

/// Mirrors the plan onto the owning user; a missing user is `NotFound`.
fn set_user_plan(
    conn: &Connection,
    user_id: UserId,
    plan: PlanType,
    now: chrono::DateTime<Utc>,
) -> RepositoryResult<PlanType> {
    let updated = conn.execute(
        "UPDATE users SET subscription_type = ?1, updated_at = ?2 WHERE id = ?3",
        params![plan, now, user_id],
    )?;
    if updated == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(plan)
}

fn by_user(conn: &Connection, user_id: UserId) -> rusqlite::Result<Subscription> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM subscriptions WHERE user_id = ?1"),
        [user_id],
        row_to_subscription,
    )
}

fn row_to_subscription(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        plan_type: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        price: decimal(row, 5)?,
        active: row.get(6)?,
        auto_renew: row.get(7)?,
        payment_method: row.get(8)?,
        transaction_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
