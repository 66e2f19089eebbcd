use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem};
use crate::domain::errors::DomainError;
use crate::domain::product::{Product, Rating};
use crate::domain::sale::{Sale, SaleItem};
use crate::domain::user::{Address, Geolocation, User};
use crate::schema::{cart_items, carts, products, sale_items, sales, sales_outbox, users};

// ── Sales ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = sales)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SaleRow {
    pub id: Uuid,
    pub number: i64,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub is_cancelled: bool,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `number` is left to the table's sequence.
#[derive(Debug, Insertable)]
#[diesel(table_name = sales)]
pub struct NewSaleRow {
    pub id: Uuid,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub is_cancelled: bool,
    pub total_amount: BigDecimal,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = sales)]
pub struct SaleChangeset {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub is_cancelled: bool,
    pub total_amount: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = sale_items)]
#[diesel(belongs_to(SaleRow, foreign_key = sale_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SaleItemRow {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_title: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub discount_percent: BigDecimal,
    pub discount_value: BigDecimal,
    pub gross_amount: BigDecimal,
    pub net_amount: BigDecimal,
    pub is_cancelled: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sale_items)]
pub struct NewSaleItemRow {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_title: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub discount_percent: BigDecimal,
    pub discount_value: BigDecimal,
    pub gross_amount: BigDecimal,
    pub net_amount: BigDecimal,
    pub is_cancelled: bool,
}

impl NewSaleItemRow {
    pub fn from_item(sale_id: Uuid, position: usize, item: &SaleItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            sale_id,
            position: position as i32,
            product_id: item.product_id,
            product_title: item.product_title.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.clone(),
            discount_percent: item.discount_percent.clone(),
            discount_value: item.discount_value.clone(),
            gross_amount: item.gross_amount.clone(),
            net_amount: item.net_amount.clone(),
            is_cancelled: item.is_cancelled,
        }
    }
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            product_id: row.product_id,
            product_title: row.product_title,
            quantity: row.quantity,
            unit_price: row.unit_price,
            discount_percent: row.discount_percent,
            discount_value: row.discount_value,
            gross_amount: row.gross_amount,
            net_amount: row.net_amount,
            is_cancelled: row.is_cancelled,
        }
    }
}

impl SaleRow {
    /// `items` must already be in position order.
    pub fn into_sale(self, items: Vec<SaleItemRow>) -> Sale {
        Sale {
            id: self.id,
            number: self.number,
            date: self.sale_date,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            branch_id: self.branch_id,
            branch_name: self.branch_name,
            is_cancelled: self.is_cancelled,
            total_amount: self.total_amount,
            items: items.into_iter().map(SaleItem::from).collect(),
        }
    }
}

// ── Outbox ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = sales_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sales_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}

// ── Products ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub title: String,
    pub price: BigDecimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating_rate: BigDecimal,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset {
    pub title: String,
    pub price: BigDecimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating_rate: BigDecimal,
    pub rating_count: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    #[diesel(embed)]
    pub fields: ProductChangeset,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            title: row.title,
            price: row.price,
            description: row.description,
            category: row.category,
            image: row.image,
            rating: Rating {
                rate: row.rating_rate,
                count: row.rating_count,
            },
            created_at: row.created_at,
        }
    }
}

// ── Users ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub address_city: Option<String>,
    pub address_street: Option<String>,
    pub address_number: Option<i32>,
    pub address_zipcode: Option<String>,
    pub address_lat: Option<BigDecimal>,
    pub address_long: Option<BigDecimal>,
}

/// A `None` address clears the stored one on update.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct UserChangeset {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub role: String,
    pub address_city: Option<String>,
    pub address_street: Option<String>,
    pub address_number: Option<i32>,
    pub address_zipcode: Option<String>,
    pub address_lat: Option<BigDecimal>,
    pub address_long: Option<BigDecimal>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    #[diesel(embed)]
    pub fields: UserChangeset,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let address = match (
            row.address_city,
            row.address_street,
            row.address_number,
            row.address_zipcode,
            row.address_lat,
            row.address_long,
        ) {
            (Some(city), Some(street), Some(number), Some(zipcode), Some(lat), Some(long)) => {
                Some(Address {
                    city,
                    street,
                    number,
                    zipcode,
                    geolocation: Geolocation { lat, long },
                })
            }
            _ => None,
        };
        Ok(User {
            id: row.id,
            status: row.status.parse()?,
            role: row.role.parse()?,
            username: row.username,
            email: row.email,
            phone: row.phone,
            first_name: row.first_name,
            last_name: row.last_name,
            address,
            created_at: row.created_at,
        })
    }
}

// ── Carts ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = cart_items)]
#[diesel(primary_key(cart_id, product_id))]
#[diesel(belongs_to(CartRow, foreign_key = cart_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub quantity: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub quantity: i32,
}

impl CartRow {
    /// `items` must already be in position order.
    pub fn into_cart(self, items: Vec<CartItemRow>) -> Cart {
        Cart {
            id: self.id,
            user_id: self.user_id,
            date: self.cart_date,
            items: items
                .into_iter()
                .map(|row| CartItem {
                    product_id: row.product_id,
                    quantity: row.quantity,
                })
                .collect(),
        }
    }
}
