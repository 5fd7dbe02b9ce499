//! File-backed scenarios: state survives a reopen and the expiry sweep runs
//! against it the way the `subscriptions sweep` command does.

use std::sync::Arc;

use chrono::NaiveDate;

use estate_hub::clock::FixedClock;
use estate_hub::directory::DirectoryService;
use estate_hub::domain::{NewUser, PlanType, Role, UserType};
use estate_hub::repository::Repositories;
use estate_hub::store::Database;
use estate_hub::subscriptions::SubscriptionService;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn member(email: &str) -> NewUser {
    NewUser {
        first_name: "Sam".to_string(),
        last_name: "Member".to_string(),
        email: email.to_string(),
        password: "secret".to_string(),
        phone: None,
        user_type: UserType::Customer,
        role: Role::User,
        company: None,
        license_number: None,
        bio: None,
        profile_image_url: None,
    }
}

fn repositories(path: &std::path::Path) -> Repositories {
    Repositories::sqlite(Arc::new(Database::open(path).expect("database opens")))
}

#[test]
fn expiry_sweep_runs_against_reopened_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("estate-hub.db");

    let (lapsing, renewing) = {
        let repositories = repositories(&path);
        let directory = DirectoryService::new(&repositories);
        let subscriptions =
            SubscriptionService::new(&repositories, Arc::new(FixedClock::on(date(2025, 6, 1))));

        let lapsing = directory.register(member("lapsing@example.com")).expect("register");
        let renewing = directory.register(member("renewing@example.com")).expect("register");
        subscriptions.create(lapsing.id, PlanType::Basic).expect("create");
        subscriptions.create(renewing.id, PlanType::Premium).expect("create");

        for (user, wanted) in [(lapsing.id, false), (renewing.id, true)] {
            if subscriptions.get(user).expect("get").auto_renew != wanted {
                subscriptions.toggle_auto_renew(user).expect("toggle");
            }
        }
        (lapsing.id, renewing.id)
    };

    let repositories = repositories(&path);
    let directory = DirectoryService::new(&repositories);
    let subscriptions =
        SubscriptionService::new(&repositories, Arc::new(FixedClock::on(date(2025, 7, 15))));

    let report = subscriptions.process_expired().expect("sweep");
    assert_eq!(report.renewed, 1);
    assert_eq!(report.deactivated, 1);
    assert_eq!(report.failed, 0);

    let lapsed = subscriptions.get(lapsing).expect("lapsed row");
    assert!(!lapsed.active);
    assert_eq!(
        directory.user(lapsing).expect("user").subscription_type,
        PlanType::Free
    );

    let renewed = subscriptions.get(renewing).expect("renewed row");
    assert!(renewed.active);
    assert_eq!(renewed.start_date, date(2025, 7, 15));
    assert_eq!(renewed.end_date, Some(date(2025, 8, 15)));
    assert_eq!(
        directory.user(renewing).expect("user").subscription_type,
        PlanType::Premium
    );

    let again = subscriptions.process_expired().expect("second sweep");
    assert_eq!((again.renewed, again.deactivated), (0, 0));
}

#[test]
fn reopening_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("reopen.db");
    {
        let directory = DirectoryService::new(&repositories(&path));
        directory.register(member("keep@example.com")).expect("register");
    }
    let directory = DirectoryService::new(&repositories(&path));
    let user = directory.user_by_email("keep@example.com").expect("persisted");
    assert_eq!(user.user_type, UserType::Customer);
}
