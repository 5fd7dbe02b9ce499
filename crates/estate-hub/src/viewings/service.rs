use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};

use super::state::ViewingAction;
use crate::clock::Clock;
use crate::domain::{
    NewScheduleViewing, PropertyId, ScheduleViewing, UserId, ViewingId, ViewingStatus,
};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{
    PropertyRepository, Repositories, RepositoryError, UserRepository, ViewingRepository,
    ViewingScope, ViewingTransition,
};

/// Booking request as submitted by a prospective buyer or renter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingRequest {
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub viewing_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    pub viewing_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Accepts `HH:MM` as well as `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|err| format!("failed to parse '{raw}' as HH:MM[:SS] ({err})"))
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw).map_err(serde::de::Error::custom)
}

/// Booking and lifecycle of property viewings.
pub struct ViewingService {
    viewings: Arc<dyn ViewingRepository>,
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    clock: Arc<dyn Clock>,
}

impl ViewingService {
    pub fn new(repositories: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            viewings: repositories.viewings.clone(),
            users: repositories.users.clone(),
            properties: repositories.properties.clone(),
            clock,
        }
    }

    /// Books a PENDING viewing; a property holds at most one active viewing per date.
    pub fn schedule(&self, request: ViewingRequest) -> ServiceResult<ScheduleViewing> {
        if self.users.find(request.user_id)?.is_none() {
            return Err(ServiceError::not_found("user", request.user_id));
        }
        if self.properties.find(request.property_id)?.is_none() {
            return Err(ServiceError::not_found("property", request.property_id));
        }
        let today = self.clock.today();
        if request.viewing_date <= today {
            return Err(ServiceError::InvalidArgument(format!(
                "viewing date must be in the future, got {}",
                request.viewing_date
            )));
        }
        if self
            .viewings
            .has_active_on(request.property_id, request.viewing_date)?
        {
            return Err(slot_taken(request.viewing_date));
        }

        let viewing = self
            .viewings
            .insert(NewScheduleViewing {
                user_id: request.user_id,
                property_id: request.property_id,
                viewing_date: request.viewing_date,
                viewing_time: request.viewing_time,
                notes: request.notes,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => slot_taken(request.viewing_date),
                other => other.into(),
            })?;
        tracing::info!(
            viewing_id = viewing.id,
            property_id = viewing.property_id,
            date = %viewing.viewing_date,
            "viewing scheduled"
        );
        Ok(viewing)
    }

    pub fn confirm(&self, id: ViewingId) -> ServiceResult<ScheduleViewing> {
        self.advance(id, ViewingAction::Confirm, None)
    }

    pub fn reject(&self, id: ViewingId, reason: Option<String>) -> ServiceResult<ScheduleViewing> {
        self.advance(id, ViewingAction::Reject, reason)
    }

    pub fn complete(&self, id: ViewingId) -> ServiceResult<ScheduleViewing> {
        self.advance(id, ViewingAction::Complete, None)
    }

    pub fn cancel(&self, id: ViewingId) -> ServiceResult<ScheduleViewing> {
        self.advance(id, ViewingAction::Cancel, None)
    }

    /// Validates against the current status, then applies the change only if
    /// that status still holds. Losing a race reads as an illegal transition.
    fn advance(
        &self,
        id: ViewingId,
        action: ViewingAction,
        rejection_reason: Option<String>,
    ) -> ServiceResult<ScheduleViewing> {
        let current = self.get(id)?;
        let to = action
            .apply(current.status)
            .map_err(|err| ServiceError::InvalidState(err.to_string()))?;
        let transition = ViewingTransition {
            from: current.status,
            to,
            at: self.clock.now(),
            rejection_reason,
        };

        match self.viewings.transition(id, &transition)? {
            Some(viewing) => {
                tracing::info!(viewing_id = id, from = %transition.from, to = %to, "viewing updated");
                Ok(viewing)
            }
            None => {
                let latest = self.get(id)?;
                Err(ServiceError::InvalidState(format!(
                    "cannot {action} a viewing that is {}",
                    latest.status
                )))
            }
        }
    }

    pub fn get(&self, id: ViewingId) -> ServiceResult<ScheduleViewing> {
        self.viewings
            .find(id)?
            .ok_or_else(|| ServiceError::not_found("viewing", id))
    }

    pub fn delete(&self, id: ViewingId) -> ServiceResult<()> {
        if !self.viewings.delete(id)? {
            return Err(ServiceError::not_found("viewing", id));
        }
        tracing::info!(viewing_id = id, "viewing deleted");
        Ok(())
    }

    pub fn for_user(
        &self,
        user_id: UserId,
        status: Option<ViewingStatus>,
    ) -> ServiceResult<Vec<ScheduleViewing>> {
        Ok(self.viewings.list(ViewingScope::User(user_id), status)?)
    }

    pub fn for_property(
        &self,
        property_id: PropertyId,
        status: Option<ViewingStatus>,
    ) -> ServiceResult<Vec<ScheduleViewing>> {
        Ok(self.viewings.list(ViewingScope::Property(property_id), status)?)
    }

    /// Viewings across every property owned by `owner_id`.
    pub fn for_owner(
        &self,
        owner_id: UserId,
        status: Option<ViewingStatus>,
    ) -> ServiceResult<Vec<ScheduleViewing>> {
        Ok(self.viewings.list(ViewingScope::Owner(owner_id), status)?)
    }

    pub fn with_status(&self, status: ViewingStatus) -> ServiceResult<Vec<ScheduleViewing>> {
        Ok(self.viewings.list(ViewingScope::All, Some(status))?)
    }

    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> ServiceResult<Vec<ScheduleViewing>> {
        if start > end {
            return Err(ServiceError::InvalidArgument(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(self.viewings.between(start, end)?)
    }

    pub fn confirmed_count(&self, property_id: PropertyId) -> ServiceResult<u64> {
        Ok(self
            .viewings
            .count_with_status(property_id, ViewingStatus::Confirmed)?)
    }
}

fn slot_taken(date: NaiveDate) -> ServiceError {
    ServiceError::Conflict(format!(
        "the property already has a viewing scheduled on {date}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::{Property, User};
    use crate::testing::Fixture;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).expect("date")
    }

    fn day(offset: i64) -> NaiveDate {
        today() + chrono::Duration::days(offset)
    }

    struct Setup {
        fixture: Fixture,
        service: ViewingService,
        user: User,
        property: Property,
    }

    fn setup() -> Setup {
        let fixture = Fixture::new();
        let service = ViewingService::new(&fixture.repositories, Arc::new(FixedClock::on(today())));
        let user = fixture.user("viewer@example.com");
        let property = fixture.property("Cottage", "Salem");
        Setup {
            fixture,
            service,
            user,
            property,
        }
    }

    fn request(user: &User, property: &Property, date: NaiveDate) -> ViewingRequest {
        ViewingRequest {
            user_id: user.id,
            property_id: property.id,
            viewing_date: date,
            viewing_time: NaiveTime::from_hms_opt(10, 30, 0).expect("time"),
            notes: None,
        }
    }

    #[test]
    fn confirm_is_single_shot() {
        let s = setup();
        let viewing = s
            .service
            .schedule(request(&s.user, &s.property, day(3)))
            .expect("schedule");
        assert_eq!(viewing.status, ViewingStatus::Pending);

        let confirmed = s.service.confirm(viewing.id).expect("confirm");
        assert_eq!(confirmed.status, ViewingStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());
        assert!(matches!(
            s.service.confirm(viewing.id),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn cancel_confirmed_but_not_completed() {
        let s = setup();
        let first = s
            .service
            .schedule(request(&s.user, &s.property, day(1)))
            .expect("schedule");
        s.service.confirm(first.id).expect("confirm");
        let cancelled = s.service.cancel(first.id).expect("cancel confirmed");
        assert_eq!(cancelled.status, ViewingStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        let second = s
            .service
            .schedule(request(&s.user, &s.property, day(2)))
            .expect("schedule");
        s.service.confirm(second.id).expect("confirm");
        s.service.complete(second.id).expect("complete");
        assert!(matches!(
            s.service.cancel(second.id),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn one_active_viewing_per_property_and_date() {
        let s = setup();
        let other = s.fixture.user("second@example.com");
        let first = s
            .service
            .schedule(request(&s.user, &s.property, day(5)))
            .expect("schedule");
        assert!(matches!(
            s.service.schedule(request(&other, &s.property, day(5))),
            Err(ServiceError::Conflict(_))
        ));

        let rejected = s
            .service
            .reject(first.id, Some("owner unavailable".into()))
            .expect("reject");
        assert_eq!(rejected.rejection_reason.as_deref(), Some("owner unavailable"));
        s.service
            .schedule(request(&other, &s.property, day(5)))
            .expect("slot free after rejection");
    }

    #[test]
    fn past_and_same_day_dates_are_rejected() {
        let s = setup();
        for date in [day(-1), day(0)] {
            assert!(matches!(
                s.service.schedule(request(&s.user, &s.property, date)),
                Err(ServiceError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn unknown_user_or_property_is_not_found() {
        let s = setup();
        let mut missing_user = request(&s.user, &s.property, day(1));
        missing_user.user_id = 999;
        assert!(matches!(
            s.service.schedule(missing_user),
            Err(ServiceError::NotFound(_))
        ));
        let mut missing_property = request(&s.user, &s.property, day(1));
        missing_property.property_id = 999;
        assert!(matches!(
            s.service.schedule(missing_property),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn owner_queries_follow_property_ownership() {
        let s = setup();
        let owner = s.fixture.user("owner@example.com");
        let owned = s.fixture.owned_property("Barn", "Salem", owner.id);
        let booked = s
            .service
            .schedule(request(&s.user, &owned, day(4)))
            .expect("schedule");
        s.service
            .schedule(request(&s.user, &s.property, day(4)))
            .expect("schedule unowned");
        s.service.confirm(booked.id).expect("confirm");

        let owned_viewings = s.service.for_owner(owner.id, None).expect("owner list");
        assert_eq!(owned_viewings.len(), 1);
        assert_eq!(owned_viewings[0].id, booked.id);
        assert_eq!(s.service.confirmed_count(owned.id).expect("count"), 1);
        assert_eq!(s.service.confirmed_count(s.property.id).expect("count"), 0);
        assert_eq!(
            s.service
                .for_user(s.user.id, Some(ViewingStatus::Pending))
                .expect("pending")
                .len(),
            1
        );
    }

    #[test]
    fn date_range_must_be_ordered() {
        let s = setup();
        assert!(matches!(
            s.service.between(day(3), day(1)),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn time_accepts_short_and_long_forms() {
        assert_eq!(
            parse_time("09:15").expect("short"),
            NaiveTime::from_hms_opt(9, 15, 0).expect("time")
        );
        assert_eq!(
            parse_time("09:15:30").expect("long"),
            NaiveTime::from_hms_opt(9, 15, 30).expect("time")
        );
        assert!(parse_time("quarter past nine").is_err());
    }
}
