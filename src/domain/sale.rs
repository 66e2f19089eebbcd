use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A priced line of a sale. Amounts are captured at sale time and never
/// follow later catalog price changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleItem {
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

#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub id: Uuid,
    pub number: i64,
    pub date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub is_cancelled: bool,
    pub total_amount: BigDecimal,
    pub items: Vec<SaleItem>,
}

impl Sale {
    pub fn recalculate_total(&mut self) {
        self.total_amount = total_of(&self.items);
    }
}

/// A priced sale that has not been stored yet; the repository assigns the
/// id and the sequential number.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub total_amount: BigDecimal,
    pub items: Vec<SaleItem>,
}

/// Sum of the net amounts of the items that are not cancelled.
pub fn total_of(items: &[SaleItem]) -> BigDecimal {
    items
        .iter()
        .filter(|i| !i.is_cancelled)
        .fold(BigDecimal::from(0), |acc, i| acc + &i.net_amount)
}

#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(net: &str, cancelled: bool) -> SaleItem {
        let net = BigDecimal::from_str(net).unwrap();
        SaleItem {
            product_id: Uuid::new_v4(),
            product_title: "Beer".to_string(),
            quantity: 1,
            unit_price: net.clone(),
            discount_percent: BigDecimal::from(0),
            discount_value: BigDecimal::from(0),
            gross_amount: net.clone(),
            net_amount: net,
            is_cancelled: cancelled,
        }
    }

    #[test]
    fn total_skips_cancelled_items() {
        let items = vec![item("45.00", false), item("40.00", false), item("99.99", true)];
        assert_eq!(total_of(&items), BigDecimal::from_str("85.00").unwrap());
    }

    #[test]
    fn total_of_no_items_is_zero() {
        assert_eq!(total_of(&[]), BigDecimal::from(0));
    }

    #[test]
    fn recalculate_total_overwrites_stale_amount() {
        let mut sale = Sale {
            id: Uuid::new_v4(),
            number: 1,
            date: Utc::now(),
            customer_id: Uuid::new_v4(),
            customer_name: "Jane Doe".to_string(),
            branch_id: Uuid::new_v4(),
            branch_name: "Downtown".to_string(),
            is_cancelled: false,
            total_amount: BigDecimal::from(1000),
            items: vec![item("10.50", false), item("2.00", true)],
        };
        sale.recalculate_total();
        assert_eq!(sale.total_amount, BigDecimal::from_str("10.50").unwrap());
    }
}
