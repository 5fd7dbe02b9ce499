//! Price list and billing terms per plan.

use bigdecimal::BigDecimal;
use chrono::{Months, NaiveDate};

use crate::domain::PlanType;
use crate::error::ServiceError;

/// Monthly price for BASIC and PREMIUM, yearly for ENTERPRISE.
pub fn price(plan: PlanType) -> BigDecimal {
    let cents: i64 = match plan {
        PlanType::Free => 0,
        PlanType::Basic => 999,
        PlanType::Premium => 1999,
        PlanType::Enterprise => 4999,
    };
    BigDecimal::new(cents.into(), 2)
}

/// Length of one billing term; `None` means the plan never expires.
pub const fn term(plan: PlanType) -> Option<Months> {
    match plan {
        PlanType::Free => None,
        PlanType::Basic | PlanType::Premium => Some(Months::new(1)),
        PlanType::Enterprise => Some(Months::new(12)),
    }
}

pub fn end_date(plan: PlanType, start: NaiveDate) -> Result<Option<NaiveDate>, ServiceError> {
    match term(plan) {
        None => Ok(None),
        Some(months) => start
            .checked_add_months(months)
            .map(Some)
            .ok_or_else(|| {
                ServiceError::InvalidArgument(format!("{plan} term starting {start} is out of range"))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn prices_match_the_price_list() {
        assert_eq!(price(PlanType::Free), BigDecimal::from(0));
        assert_eq!(price(PlanType::Basic), BigDecimal::from_str("9.99").expect("decimal"));
        assert_eq!(price(PlanType::Premium), BigDecimal::from_str("19.99").expect("decimal"));
        assert_eq!(
            price(PlanType::Enterprise),
            BigDecimal::from_str("49.99").expect("decimal")
        );
    }

    #[test]
    fn terms_are_monthly_or_yearly() {
        let start = date(2025, 1, 31);
        assert_eq!(end_date(PlanType::Free, start), Ok(None));
        assert_eq!(end_date(PlanType::Basic, start), Ok(Some(date(2025, 2, 28))));
        assert_eq!(end_date(PlanType::Premium, date(2025, 3, 15)), Ok(Some(date(2025, 4, 15))));
        assert_eq!(end_date(PlanType::Enterprise, start), Ok(Some(date(2026, 1, 31))));
    }
}
