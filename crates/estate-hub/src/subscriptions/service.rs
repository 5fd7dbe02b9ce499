use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::plan;
use crate::clock::Clock;
use crate::domain::{NewSubscription, PlanType, Subscription, UserId};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{Repositories, RepositoryError, SubscriptionRepository, UserRepository};

pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 7;

/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub renewed: u32,
    pub deactivated: u32,
    pub failed: u32,
}

pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionService {
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            subscriptions: repositories.subscriptions.clone(),
            users: repositories.users.clone(),
            clock,
        }
    }

    /// Starts a plan today. A user with an active subscription must upgrade instead.
    pub fn create(&self, user_id: UserId, plan_type: PlanType) -> ServiceResult<Subscription> {
        if self.users.find(user_id)?.is_none() {
            return Err(ServiceError::not_found("user", user_id));
        }
        let today = self.clock.today();
        let created = self
            .subscriptions
            .create(NewSubscription {
                user_id,
                plan_type,
                start_date: today,
                end_date: plan::end_date(plan_type, today)?,
                price: plan::price(plan_type),
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => ServiceError::Conflict(
                    "user already has a subscription; use upgrade instead".to_string(),
                ),
                RepositoryError::NotFound => ServiceError::not_found("user", user_id),
                other => other.into(),
            })?;
        tracing::info!(user_id, plan = %plan_type, "subscription created");
        Ok(created)
    }

    /// Moves to a strictly higher plan; downgrades go through cancel and create.
    pub fn upgrade(&self, user_id: UserId, new_plan: PlanType) -> ServiceResult<Subscription> {
        let mut subscription = self.get(user_id)?;
        if !subscription.active {
            return Err(ServiceError::InvalidState(format!(
                "subscription for user {user_id} is cancelled; create a new one instead"
            )));
        }
        if new_plan.rank() <= subscription.plan_type.rank() {
            return Err(ServiceError::InvalidArgument(format!(
                "can only upgrade to a higher plan than {}, got {new_plan}",
                subscription.plan_type
            )));
        }

        let previous = subscription.plan_type;
        subscription.plan_type = new_plan;
        subscription.price = plan::price(new_plan);
        subscription.end_date = plan::end_date(new_plan, self.clock.today())?;
        let saved = self.subscriptions.save(&subscription, Some(new_plan))?;
        tracing::info!(user_id, from = %previous, to = %new_plan, "subscription upgraded");
        Ok(saved)
    }

    pub fn cancel(&self, user_id: UserId) -> ServiceResult<Subscription> {
        let mut subscription = self.get(user_id)?;
        subscription.active = false;
        subscription.auto_renew = false;
        let saved = self
            .subscriptions
            .save(&subscription, Some(PlanType::Free))?;
        tracing::info!(user_id, "subscription cancelled");
        Ok(saved)
    }

    /// Restarts the current plan's term today; the active and auto-renew flags are left alone.
    pub fn renew(&self, user_id: UserId) -> ServiceResult<Subscription> {
        let subscription = self.get(user_id)?;
        let renewed = self.restart_term(subscription)?;
        tracing::info!(user_id, end_date = ?renewed.end_date, "subscription renewed");
        Ok(renewed)
    }

    pub fn toggle_auto_renew(&self, user_id: UserId) -> ServiceResult<Subscription> {
        let mut subscription = self.get(user_id)?;
        subscription.auto_renew = !subscription.auto_renew;
        Ok(self.subscriptions.save(&subscription, None)?)
    }

    pub fn get(&self, user_id: UserId) -> ServiceResult<Subscription> {
        self.subscriptions.for_user(user_id)?.ok_or_else(|| {
            ServiceError::NotFound(format!("no subscription found for user: {user_id}"))
        })
    }

    /// Active and not yet past its end date.
    pub fn is_active(&self, user_id: UserId) -> ServiceResult<bool> {
        let today = self.clock.today();
        Ok(self
            .subscriptions
            .for_user(user_id)?
            .is_some_and(|subscription| subscription.active && !subscription.is_expired(today)))
    }

    pub fn active(&self) -> ServiceResult<Vec<Subscription>> {
        Ok(self.subscriptions.active()?)
    }

    /// Subscriptions whose end date falls between today and `days` from now, inclusive.
    pub fn expiring_within(&self, days: u32) -> ServiceResult<Vec<Subscription>> {
        let today = self.clock.today();
        let until = today
            .checked_add_days(chrono::Days::new(u64::from(days)))
            .ok_or_else(|| ServiceError::InvalidArgument(format!("{days} days is out of range")))?;
        Ok(self.subscriptions.ending_between(today, until)?)
    }

    /// Renews auto-renewing subscriptions past their end date and deactivates
    /// the rest, resetting their users to FREE. Each row is handled on its own;
    /// one failure does not stop the sweep.
    pub fn process_expired(&self) -> ServiceResult<SweepReport> {
        let mut report = SweepReport::default();
        for subscription in self.subscriptions.expired(self.clock.today())? {
            let user_id = subscription.user_id;
            let auto_renew = subscription.auto_renew;
            let outcome = if auto_renew {
                self.restart_term(subscription)
            } else {
                self.deactivate(subscription)
            };
            match outcome {
                Ok(_) if auto_renew => report.renewed += 1,
                Ok(_) => report.deactivated += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(user_id, error = %err, "failed to process expired subscription");
                }
            }
        }
        tracing::info!(
            renewed = report.renewed,
            deactivated = report.deactivated,
            failed = report.failed,
            "expired subscriptions processed"
        );
        Ok(report)
    }

    fn restart_term(&self, mut subscription: Subscription) -> ServiceResult<Subscription> {
        let today = self.clock.today();
        subscription.start_date = today;
        subscription.end_date = plan::end_date(subscription.plan_type, today)?;
        Ok(self.subscriptions.save(&subscription, None)?)
    }

    fn deactivate(&self, mut subscription: Subscription) -> ServiceResult<Subscription> {
        subscription.active = false;
        Ok(self
            .subscriptions
            .save(&subscription, Some(PlanType::Free))?)
    }
}
