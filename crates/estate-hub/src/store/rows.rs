//! Column conversions shared by the table modules.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::domain::{ListingType, PlanType, PropertyType, Role, UserType, ViewingStatus};

macro_rules! text_column {
    ($($name:ty),+ $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|err| FromSqlError::Other(Box::new(err)))
                }
            }
        )+
    };
}

text_column!(UserType, Role, PlanType, PropertyType, ListingType, ViewingStatus);

pub(crate) fn decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<BigDecimal> {
    let text: String = row.get(idx)?;
    parse_decimal(idx, &text)
}

pub(crate) fn optional_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<BigDecimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|value| parse_decimal(idx, &value)).transpose()
}

fn parse_decimal(idx: usize, text: &str) -> rusqlite::Result<BigDecimal> {
    BigDecimal::from_str(text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(crate) fn decimal_text(value: &BigDecimal) -> String {
    value.to_string()
}

pub(crate) fn optional_decimal_text(value: Option<&BigDecimal>) -> Option<String> {
    value.map(decimal_text)
}

/// Converts a `COUNT(*)` result; negative counts cannot occur.
pub(crate) fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn enums_round_trip_through_text_columns() {
        let conn = Connection::open_in_memory().expect("open");
        let stored: String = conn
            .query_row("SELECT ?1", [ListingType::ForRent], |row| row.get(0))
            .expect("select");
        assert_eq!(stored, "FOR_RENT");

        let status: ViewingStatus = conn
            .query_row("SELECT 'CONFIRMED'", [], |row| row.get(0))
            .expect("select");
        assert_eq!(status, ViewingStatus::Confirmed);

        let bad = conn.query_row("SELECT 'BOGUS'", [], |row| row.get::<_, PlanType>(0));
        assert!(bad.is_err());
    }

    #[test]
    fn decimals_keep_their_scale() {
        let conn = Connection::open_in_memory().expect("open");
        let price = BigDecimal::from_str("19.99").expect("decimal");
        let read = conn
            .query_row("SELECT ?1, NULL", [decimal_text(&price)], |row| {
                Ok((decimal(row, 0)?, optional_decimal(row, 1)?))
            })
            .expect("select");
        assert_eq!(read, (price, None));
    }
}
