use std::sync::Arc;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::rows::{count, decimal, decimal_text, optional_decimal, optional_decimal_text};
use super::Database;
use crate::domain::{NewProperty, Property, PropertyId, PropertyUpdate, UserId};
use crate::listings::plan::{Column, Predicate, Scalar, SearchPlan};
use crate::page::PageRequest;
use crate::repository::{PropertyRepository, RepositoryResult};

const COLUMNS: &str = "id, title, description, price, address, city, state, zip_code,
    property_type, listing_type, bedrooms, bathrooms, square_feet, year_built, available,
    owner_id, builder_group_id, created_at, updated_at";

pub struct SqliteProperties {
    db: Arc<Database>,
}

impl SqliteProperties {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl PropertyRepository for SqliteProperties {
    fn insert(&self, property: NewProperty) -> RepositoryResult<Property> {
        let now = Utc::now();
        self.db.read(|conn| {
            conn.execute(
                "INSERT INTO properties (title, description, price, address, city, state,
                    zip_code, property_type, listing_type, bedrooms, bathrooms, square_feet,
                    year_built, available, owner_id, builder_group_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?17)",
                params![
                    property.title,
                    property.description,
                    decimal_text(&property.price),
                    property.address,
                    property.city,
                    property.state,
                    property.zip_code,
                    property.property_type,
                    property.listing_type,
                    property.bedrooms,
                    property.bathrooms,
                    optional_decimal_text(property.square_feet.as_ref()),
                    property.year_built,
                    property.available,
                    property.owner_id,
                    property.builder_group_id,
                    now,
                ],
            )?;
            select_one(conn, conn.last_insert_rowid())
        })
    }

    fn find(&self, id: PropertyId) -> RepositoryResult<Option<Property>> {
        self.db.read(|conn| select_one(conn, id).optional())
    }

    fn update(&self, id: PropertyId, update: PropertyUpdate) -> RepositoryResult<Option<Property>> {
        let now = Utc::now();
        self.db.read(|conn| {
            let affected = conn.execute(
                "UPDATE properties SET title = ?2, description = ?3, price = ?4, address = ?5,
                    city = ?6, state = ?7, zip_code = ?8, property_type = ?9, listing_type = ?10,
                    bedrooms = ?11, bathrooms = ?12, square_feet = ?13, year_built = ?14,
                    available = ?15, updated_at = ?16
                 WHERE id = ?1",
                params![
                    id,
                    update.title,
                    update.description,
                    decimal_text(&update.price),
                    update.address,
                    update.city,
                    update.state,
                    update.zip_code,
                    update.property_type,
                    update.listing_type,
                    update.bedrooms,
                    update.bathrooms,
                    optional_decimal_text(update.square_feet.as_ref()),
                    update.year_built,
                    update.available,
                    now,
                ],
            )?;
            if affected == 0 {
                return Ok(None);
            }
            select_one(conn, id).map(Some)
        })
    }

    fn delete(&self, id: PropertyId) -> RepositoryResult<bool> {
        self.db.write(|conn| {
            let affected = conn.execute("DELETE FROM properties WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    fn search(&self, plan: &SearchPlan) -> RepositoryResult<(Vec<Property>, u64)> {
        let filter = SqlFilter::render(&plan.predicates);
        let order = format!(
            "{expr} {dir}, id {dir}",
            expr = column_sql(plan.sort.key.column()),
            dir = plan.sort.direction.as_sql(),
        );

        self.db.read(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM properties WHERE {}", filter.clause),
                params_from_iter(filter.params.iter()),
                |row| row.get(0),
            )?;

            let mut page_params = filter.params.clone();
            page_params.push(Value::Integer(i64::from(plan.page.size())));
            page_params.push(Value::Integer(offset(plan.page)));

            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM properties WHERE {} ORDER BY {order} LIMIT ? OFFSET ?",
                filter.clause
            ))?;
            let rows = stmt
                .query_map(params_from_iter(page_params.iter()), row_to_property)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok((rows, count(total)))
        })
    }

    fn by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> RepositoryResult<(Vec<Property>, u64)> {
        self.db.read(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM properties WHERE owner_id = ?1",
                [owner_id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM properties WHERE owner_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(
                    params![owner_id, i64::from(page.size()), offset(page)],
                    row_to_property,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok((rows, count(total)))
        })
    }

    fn available(&self) -> RepositoryResult<Vec<Property>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM properties WHERE available = 1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([], row_to_property)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn available_cities(&self) -> RepositoryResult<Vec<String>> {
        self.distinct_available("city")
    }

    fn available_states(&self) -> RepositoryResult<Vec<String>> {
        self.distinct_available("state")
    }

    fn count_available(&self) -> RepositoryResult<u64> {
        let total: i64 = self.db.read(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM properties WHERE available = 1",
                [],
                |row| row.get(0),
            )
        })?;
        Ok(count(total))
    }

    fn average_price_in(&self, city: &str) -> RepositoryResult<Option<BigDecimal>> {
        // summed in decimal; SQLite AVG would go through floating point
        let prices = self.db.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT price FROM properties
                 WHERE available = 1 AND unicode_lower(city) = unicode_lower(?1)",
            )?;
            let prices = stmt
                .query_map([city], |row| decimal(row, 0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(prices)
        })?;
        if prices.is_empty() {
            return Ok(None);
        }
        let listings = BigDecimal::from(prices.len() as u64);
        let total: BigDecimal = prices.into_iter().sum();
        Ok(Some((total / listings).with_scale_round(2, RoundingMode::HalfUp)))
    }
}

impl SqliteProperties {
    fn distinct_available(&self, column: &'static str) -> RepositoryResult<Vec<String>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT {column} FROM properties WHERE available = 1 ORDER BY {column}"
            ))?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(values)
        })
    }
}

fn select_one(conn: &Connection, id: PropertyId) -> rusqlite::Result<Property> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM properties WHERE id = ?1"),
        [id],
        row_to_property,
    )
}

fn offset(page: PageRequest) -> i64 {
    i64::try_from(page.offset()).unwrap_or(i64::MAX)
}

/// SQL expression used for comparisons and ordering.
fn column_sql(column: Column) -> &'static str {
    match column {
        Column::Title => "title",
        Column::Description => "description",
        Column::Address => "address",
        Column::City => "city",
        Column::State => "state",
        Column::Price => "CAST(price AS REAL)",
        Column::Bedrooms => "bedrooms",
        Column::Bathrooms => "bathrooms",
        Column::SquareFeet => "CAST(square_feet AS REAL)",
        Column::YearBuilt => "year_built",
        Column::PropertyType => "property_type",
        Column::ListingType => "listing_type",
        Column::BuilderGroup => "builder_group_id",
        Column::Available => "available",
        Column::CreatedAt => "created_at",
        Column::UpdatedAt => "updated_at",
    }
}

/// WHERE clause rendered from a predicate conjunction, with positional parameters.
struct SqlFilter {
    clause: String,
    params: Vec<Value>,
}

impl SqlFilter {
    fn render(predicates: &[Predicate]) -> Self {
        let mut clauses = Vec::with_capacity(predicates.len());
        let mut params = Vec::new();

        for predicate in predicates {
            let clause = match predicate {
                Predicate::Equals(column, scalar) => {
                    format!("{} = {}", column_sql(*column), bind(scalar, &mut params))
                }
                Predicate::AtLeast(column, scalar) => {
                    format!("{} >= {}", column_sql(*column), bind(scalar, &mut params))
                }
                Predicate::AtMost(column, scalar) => {
                    format!("{} <= {}", column_sql(*column), bind(scalar, &mut params))
                }
                Predicate::Contains(column, needle) => contains(*column, needle, &mut params),
                Predicate::AnyContains(columns, needle) => {
                    let parts: Vec<String> = columns
                        .iter()
                        .map(|column| contains(*column, needle, &mut params))
                        .collect();
                    format!("({})", parts.join(" OR "))
                }
            };
            clauses.push(clause);
        }

        let clause = if clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            clauses.join(" AND ")
        };
        Self { clause, params }
    }
}

fn bind(scalar: &Scalar, params: &mut Vec<Value>) -> &'static str {
    match scalar {
        Scalar::Text(text) => {
            params.push(Value::Text(text.clone()));
            "?"
        }
        Scalar::Integer(value) => {
            params.push(Value::Integer(*value));
            "?"
        }
        Scalar::Flag(flag) => {
            params.push(Value::Integer(i64::from(*flag)));
            "?"
        }
        Scalar::Decimal(value) => {
            params.push(Value::Text(decimal_text(value)));
            "CAST(? AS REAL)"
        }
    }
}

fn contains(column: Column, needle: &str, params: &mut Vec<Value>) -> String {
    params.push(Value::Text(needle.to_lowercase()));
    // raw column; decimal casts would defeat the text match
    let raw = match column {
        Column::Price => "price",
        Column::SquareFeet => "square_feet",
        other => column_sql(other),
    };
    format!("instr(unicode_lower(COALESCE({raw}, '')), ?) > 0")
}

pub(crate) fn row_to_property(row: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: decimal(row, 3)?,
        address: row.get(4)?,
        city: row.get(5)?,
        state: row.get(6)?,
        zip_code: row.get(7)?,
        property_type: row.get(8)?,
        listing_type: row.get(9)?,
        bedrooms: row.get(10)?,
        bathrooms: row.get(11)?,
        square_feet: optional_decimal(row, 12)?,
        year_built: row.get(13)?,
        available: row.get(14)?,
        owner_id: row.get(15)?,
        builder_group_id: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}
