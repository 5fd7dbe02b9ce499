//! Storage-neutral description of a property query.
//!
//! The search engine builds a [`SearchPlan`] from caller filters; the store
//! translates each [`Predicate`] into SQL. Only the columns and sort keys
//! enumerated here can ever reach a query.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::page::{PageError, PageRequest, SortDirection};

/// Property attributes a predicate or sort may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    Description,
    Address,
    City,
    State,
    Price,
    Bedrooms,
    Bathrooms,
    SquareFeet,
    YearBuilt,
    PropertyType,
    ListingType,
    BuilderGroup,
    Available,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Decimal(BigDecimal),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(Column, Scalar),
    /// Case-insensitive substring match.
    Contains(Column, String),
    AtLeast(Column, Scalar),
    AtMost(Column, Scalar),
    /// Case-insensitive substring match against any of the columns.
    AnyContains(Vec<Column>, String),
}

/// Allow-listed sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Price,
    SquareFeet,
    Bedrooms,
    Bathrooms,
    YearBuilt,
    Title,
    City,
}

impl SortKey {
    pub const fn column(self) -> Column {
        match self {
            SortKey::CreatedAt => Column::CreatedAt,
            SortKey::UpdatedAt => Column::UpdatedAt,
            SortKey::Price => Column::Price,
            SortKey::SquareFeet => Column::SquareFeet,
            SortKey::Bedrooms => Column::Bedrooms,
            SortKey::Bathrooms => Column::Bathrooms,
            SortKey::YearBuilt => Column::YearBuilt,
            SortKey::Title => Column::Title,
            SortKey::City => Column::City,
        }
    }
}

impl FromStr for SortKey {
    type Err = PageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = match value.trim() {
            "createdAt" | "created_at" => SortKey::CreatedAt,
            "updatedAt" | "updated_at" => SortKey::UpdatedAt,
            "price" => SortKey::Price,
            "squareFeet" | "square_feet" => SortKey::SquareFeet,
            "bedrooms" => SortKey::Bedrooms,
            "bathrooms" => SortKey::Bathrooms,
            "yearBuilt" | "year_built" => SortKey::YearBuilt,
            "title" => SortKey::Title,
            "city" => SortKey::City,
            other => return Err(PageError::SortField(other.to_string())),
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// Conjunction of predicates plus ordering and paging.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub predicates: Vec<Predicate>,
    pub sort: Sort,
    pub page: PageRequest,
}
