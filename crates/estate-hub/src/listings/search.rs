use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::plan::{Column, Predicate, Scalar, SearchPlan, Sort, SortKey};
use crate::domain::{BuilderGroupId, ListingType, NewSearchHistory, PropertyType, UserId};
use crate::error::ServiceError;
use crate::page::{PageRequest, SortDirection};

/// Sparse filter set accepted by both the JSON body and the query-string search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub keyword: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub min_bedrooms: Option<i32>,
    pub max_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub max_bathrooms: Option<i32>,
    pub min_square_feet: Option<BigDecimal>,
    pub max_square_feet: Option<BigDecimal>,
    pub builder_group_id: Option<BuilderGroupId>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl SearchRequest {
    /// Trimmed keyword, if one was supplied and is non-blank.
    pub fn keyword(&self) -> Option<&str> {
        non_blank(self.keyword.as_deref())
    }

    /// Translates the request into a query plan.
    ///
    /// A keyword switches to keyword-only mode: the structured filters are
    /// ignored rather than combined. Either way only available listings match.
    pub fn plan(&self) -> Result<SearchPlan, ServiceError> {
        let sort = self.sort()?;
        let page = PageRequest::from_parts(self.page, self.size)?;

        let mut predicates = vec![Predicate::Equals(Column::Available, Scalar::Flag(true))];
        match self.keyword() {
            Some(keyword) => predicates.push(Predicate::AnyContains(
                vec![
                    Column::Title,
                    Column::Description,
                    Column::City,
                    Column::Address,
                ],
                keyword.to_string(),
            )),
            None => predicates.extend(self.structured_predicates()),
        }

        Ok(SearchPlan {
            predicates,
            sort,
            page,
        })
    }

    fn sort(&self) -> Result<Sort, ServiceError> {
        let key = match non_blank(self.sort_by.as_deref()) {
            Some(field) => field.parse::<SortKey>()?,
            None => SortKey::CreatedAt,
        };
        let direction = match non_blank(self.sort_direction.as_deref()) {
            Some(direction) => direction.parse::<SortDirection>()?,
            None => SortDirection::Desc,
        };
        Ok(Sort { key, direction })
    }

    fn structured_predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(city) = non_blank(self.city.as_deref()) {
            predicates.push(Predicate::Contains(Column::City, city.to_string()));
        }
        if let Some(state) = non_blank(self.state.as_deref()) {
            predicates.push(Predicate::Contains(Column::State, state.to_string()));
        }
        if let Some(property_type) = self.property_type {
            predicates.push(Predicate::Equals(
                Column::PropertyType,
                Scalar::Text(property_type.as_str().to_string()),
            ));
        }
        if let Some(listing_type) = self.listing_type {
            predicates.push(Predicate::Equals(
                Column::ListingType,
                Scalar::Text(listing_type.as_str().to_string()),
            ));
        }
        if let Some(group) = self.builder_group_id {
            predicates.push(Predicate::Equals(
                Column::BuilderGroup,
                Scalar::Integer(group),
            ));
        }

        push_range(
            &mut predicates,
            Column::Price,
            self.min_price.clone().map(Scalar::Decimal),
            self.max_price.clone().map(Scalar::Decimal),
        );
        push_range(
            &mut predicates,
            Column::Bedrooms,
            self.min_bedrooms.map(|v| Scalar::Integer(v.into())),
            self.max_bedrooms.map(|v| Scalar::Integer(v.into())),
        );
        push_range(
            &mut predicates,
            Column::Bathrooms,
            self.min_bathrooms.map(|v| Scalar::Integer(v.into())),
            self.max_bathrooms.map(|v| Scalar::Integer(v.into())),
        );
        push_range(
            &mut predicates,
            Column::SquareFeet,
            self.min_square_feet.clone().map(Scalar::Decimal),
            self.max_square_feet.clone().map(Scalar::Decimal),
        );

        predicates
    }

    /// History record describing this search for `user_id`.
    pub fn history_entry(&self, user_id: UserId, results_count: u64) -> NewSearchHistory {
        NewSearchHistory {
            user_id,
            search_keyword: self.keyword().map(str::to_string),
            search_city: non_blank(self.city.as_deref()).map(str::to_string),
            search_state: non_blank(self.state.as_deref()).map(str::to_string),
            search_property_type: self.property_type,
            search_listing_type: self.listing_type,
            min_price: self.min_price.clone(),
            max_price: self.max_price.clone(),
            min_bedrooms: self.min_bedrooms,
            max_bedrooms: self.max_bedrooms,
            min_bathrooms: self.min_bathrooms,
            max_bathrooms: self.max_bathrooms,
            min_square_feet: self.min_square_feet.clone(),
            max_square_feet: self.max_square_feet.clone(),
            results_count: i64::try_from(results_count).unwrap_or(i64::MAX),
        }
    }
}

fn push_range(
    predicates: &mut Vec<Predicate>,
    column: Column,
    min: Option<Scalar>,
    max: Option<Scalar>,
) {
    if let Some(min) = min {
        predicates.push(Predicate::AtLeast(column, min));
    }
    if let Some(max) = max {
        predicates.push(Predicate::AtMost(column, max));
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
