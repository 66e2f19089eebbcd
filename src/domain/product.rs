use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub rate: BigDecimal,
    pub count: i32,
}

/// Catalog fields supplied on create and on update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub title: String,
    pub price: BigDecimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub price: BigDecimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
}
