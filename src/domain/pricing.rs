//! Sale pricing: quantity-tiered discounts, line amounts and order totals.
//!
//! Everything here is pure. Callers fetch the catalog products and the
//! customer beforehand and persist the result afterwards.

use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use super::sale::{total_of, Sale, SaleItem};
use super::user::UserStatus;

/// Largest quantity of a single product allowed on one sale.
pub const MAX_ITEM_QUANTITY: i32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Quantity above limit for product {product_id}")]
    QuantityExceeded { product_id: Uuid },
    #[error("Product with id {product_id} not found")]
    ProductNotFound { product_id: Uuid },
    #[error("Product with id {product_id} has invalid price: {price}")]
    InvalidPrice { product_id: Uuid, price: String },
    #[error("User with id {customer_id} not found")]
    CustomerNotFound { customer_id: Uuid },
    #[error("User with id {customer_id} is not active. Current status: {status}")]
    CustomerInactive {
        customer_id: Uuid,
        status: UserStatus,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub is_cancelled: bool,
}

/// A sale as requested by the client, before any price is known.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub items: Vec<DraftItem>,
}

impl SaleDraft {
    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|i| i.product_id).collect()
    }
}

/// Current catalog data for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub title: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedSale {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub items: Vec<SaleItem>,
    pub total_amount: BigDecimal,
}

/// Result of [`cancel_sale`].
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// The flag was just set; the caller must persist and notify.
    Cancelled(Sale),
    /// Nothing changed.
    AlreadyCancelled(Sale),
}

impl CancelOutcome {
    pub fn sale(&self) -> &Sale {
        match self {
            CancelOutcome::Cancelled(sale) | CancelOutcome::AlreadyCancelled(sale) => sale,
        }
    }

    pub fn into_sale(self) -> Sale {
        match self {
            CancelOutcome::Cancelled(sale) | CancelOutcome::AlreadyCancelled(sale) => sale,
        }
    }
}

/// Discount percentage for a quantity, or `None` above the per-item cap.
pub fn discount_percent(quantity: i32) -> Option<u32> {
    match quantity {
        q if q > MAX_ITEM_QUANTITY => None,
        10..=20 => Some(20),
        4..=9 => Some(10),
        _ => Some(0),
    }
}

/// Computes the amounts of one line from its unit price and discount tier.
pub fn price_item(
    product: &CatalogProduct,
    quantity: i32,
    discount_percent: u32,
    is_cancelled: bool,
) -> SaleItem {
    let percent = BigDecimal::from(discount_percent);
    let gross_amount = BigDecimal::from(quantity) * &product.price;
    // x / 100 as an exact multiplication by 0.01
    let discount_value = &gross_amount * &percent * BigDecimal::new(1.into(), 2);
    let net_amount = &gross_amount - &discount_value;

    SaleItem {
        product_id: product.id,
        product_title: product.title.clone(),
        quantity,
        unit_price: product.price.clone(),
        discount_percent: percent,
        discount_value,
        gross_amount,
        net_amount,
        is_cancelled,
    }
}

/// Prices a draft against the catalog data and the customer returned by the
/// caller's lookups.
///
/// Quantities are checked for every item first, then every item is resolved
/// against `catalog`, then the customer is checked. The first failure
/// aborts the whole operation.
pub fn price_sale(
    draft: SaleDraft,
    catalog: &[CatalogProduct],
    customer: Option<&CustomerRecord>,
) -> Result<PricedSale, PricingError> {
    let mut tiers = Vec::with_capacity(draft.items.len());
    for item in &draft.items {
        let percent = discount_percent(item.quantity).ok_or(PricingError::QuantityExceeded {
            product_id: item.product_id,
        })?;
        tiers.push(percent);
    }

    let zero = BigDecimal::from(0);
    let mut items = Vec::with_capacity(draft.items.len());
    for (item, percent) in draft.items.iter().zip(tiers) {
        let product = catalog
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or(PricingError::ProductNotFound {
                product_id: item.product_id,
            })?;
        if product.price < zero {
            return Err(PricingError::InvalidPrice {
                product_id: product.id,
                price: product.price.to_string(),
            });
        }
        items.push(price_item(product, item.quantity, percent, item.is_cancelled));
    }

    let customer = customer.ok_or(PricingError::CustomerNotFound {
        customer_id: draft.customer_id,
    })?;
    if customer.status != UserStatus::Active {
        return Err(PricingError::CustomerInactive {
            customer_id: customer.id,
            status: customer.status,
        });
    }

    let total_amount = total_of(&items);
    Ok(PricedSale {
        customer_id: draft.customer_id,
        customer_name: customer.name.clone(),
        branch_id: draft.branch_id,
        branch_name: draft.branch_name,
        items,
        total_amount,
    })
}

/// Flags the whole sale as cancelled. The order total is kept as is.
pub fn cancel_sale(mut sale: Sale) -> CancelOutcome {
    if sale.is_cancelled {
        return CancelOutcome::AlreadyCancelled(sale);
    }
    sale.is_cancelled = true;
    CancelOutcome::Cancelled(sale)
}
