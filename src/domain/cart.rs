use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One product line of a cart. Carts hold no prices; pricing happens when
/// a sale is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart fields supplied on create and on update. Items replace the stored
/// ones wholesale.
#[derive(Debug, Clone)]
pub struct CartInput {
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

impl CartInput {
    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|i| i.product_id).collect()
    }
}
