//! Field-level request rules. Every rule is checked and all violations are
//! reported together.

use std::collections::HashSet;

use bigdecimal::BigDecimal;

use super::cart::CartInput;
use super::errors::DomainError;
use super::pricing::SaleDraft;
use super::product::ProductInput;
use super::user::{Address, UserInput};

#[derive(Debug, Default)]
struct Violations(Vec<String>);

impl Violations {
    fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0.push(format!("{}: {}", field, message));
        }
    }

    fn text(&mut self, value: &str, field: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len == 0 && min > 0 {
            self.0.push(format!("{}: is required", field));
        } else if len < min {
            self.0.push(format!("{}: must be at least {} characters", field, min));
        } else if len > max {
            self.0.push(format!("{}: cannot exceed {} characters", field, max));
        }
    }

    fn into_result(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidInput(self.0.join("; ")))
        }
    }
}

/// Quantities above the per-item cap pass here on purpose: the pricing
/// engine rejects them with the offending product id.
pub fn validate_sale_draft(draft: &SaleDraft) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.check(!draft.customer_id.is_nil(), "customer_id", "Customer ID is required");
    v.check(!draft.branch_id.is_nil(), "branch_id", "Branch ID is required");
    v.text(&draft.branch_name, "branch_name", 1, 200);
    v.check(!draft.items.is_empty(), "items", "At least one item is required");

    let distinct: HashSet<_> = draft.items.iter().map(|i| i.product_id).collect();
    v.check(
        distinct.len() == draft.items.len(),
        "items",
        "Duplicate products are not allowed",
    );

    for (idx, item) in draft.items.iter().enumerate() {
        v.check(
            !item.product_id.is_nil(),
            &format!("items[{}].product_id", idx),
            "Product ID is required",
        );
        v.check(
            item.quantity > 0,
            &format!("items[{}].quantity", idx),
            "Quantity must be greater than zero",
        );
    }
    v.into_result()
}

pub fn validate_cart(input: &CartInput) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.check(!input.user_id.is_nil(), "user_id", "User ID is required");
    v.check(!input.items.is_empty(), "items", "Cart must contain at least one product");

    let distinct: HashSet<_> = input.items.iter().map(|i| i.product_id).collect();
    v.check(
        distinct.len() == input.items.len(),
        "items",
        "Duplicate products are not allowed",
    );

    for (idx, item) in input.items.iter().enumerate() {
        v.check(
            !item.product_id.is_nil(),
            &format!("items[{}].product_id", idx),
            "Product ID is required",
        );
        v.check(
            item.quantity > 0,
            &format!("items[{}].quantity", idx),
            "Quantity must be greater than 0",
        );
    }
    v.into_result()
}

pub fn validate_product(input: &ProductInput) -> Result<(), DomainError> {
    let zero = BigDecimal::from(0);
    let mut v = Violations::default();
    v.text(&input.title, "title", 1, 100);
    v.check(input.price >= zero, "price", "Price cannot be negative");
    v.text(&input.description, "description", 1, 1000);
    v.text(&input.category, "category", 1, 100);
    v.text(&input.image, "image", 1, 500);
    v.check(
        input.rating.rate >= zero && input.rating.rate <= BigDecimal::from(5),
        "rating.rate",
        "Rate must be between 0 and 5",
    );
    v.check(input.rating.count >= 0, "rating.count", "Count cannot be negative");
    v.into_result()
}

pub fn validate_user(input: &UserInput) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.text(&input.username, "username", 3, 50);
    v.text(&input.email, "email", 1, 100);
    v.check(is_email(&input.email), "email", "Invalid email address");
    v.check(is_phone(&input.phone), "phone", "Phone must have 7 to 20 digits");
    v.text(&input.first_name, "first_name", 1, 100);
    v.text(&input.last_name, "last_name", 0, 100);
    if let Some(address) = &input.address {
        check_address(&mut v, address);
    }
    v.into_result()
}

fn check_address(v: &mut Violations, address: &Address) {
    v.text(&address.city, "address.city", 2, 100);
    v.text(&address.street, "address.street", 2, 200);
    v.check(address.number > 0, "address.number", "Number must be greater than 0");
    v.check(
        address.zipcode.len() == 8 && address.zipcode.chars().all(|c| c.is_ascii_digit()),
        "address.zipcode",
        "ZipCode must be in the format 99999999",
    );
    let geo = &address.geolocation;
    v.check(
        within(&geo.lat, 90),
        "address.geolocation.lat",
        "Latitude must be between -90 and 90",
    );
    v.check(
        within(&geo.long, 180),
        "address.geolocation.long",
        "Longitude must be between -180 and 180",
    );
}

fn within(value: &BigDecimal, bound: i32) -> bool {
    *value >= BigDecimal::from(-bound) && *value <= BigDecimal::from(bound)
}

fn is_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        _ => false,
    }
}

fn is_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (7..=20).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::cart::CartItem;
    use crate::domain::pricing::DraftItem;
    use crate::domain::product::Rating;
    use crate::domain::user::{Geolocation, UserRole, UserStatus};

    fn message(err: DomainError) -> String {
        match err {
            DomainError::InvalidInput(msg) => msg,
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    fn draft(items: Vec<DraftItem>) -> SaleDraft {
        SaleDraft {
            customer_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            branch_name: "Downtown".to_string(),
            items,
        }
    }

    fn line(quantity: i32) -> DraftItem {
        DraftItem {
            product_id: Uuid::new_v4(),
            quantity,
            is_cancelled: false,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(validate_sale_draft(&draft(vec![line(1), line(20)])).is_ok());
    }

    #[test]
    fn quantity_above_cap_is_left_to_pricing() {
        assert!(validate_sale_draft(&draft(vec![line(21)])).is_ok());
    }

    #[test]
    fn draft_collects_every_violation() {
        let mut d = draft(vec![]);
        d.customer_id = Uuid::nil();
        d.branch_name = " ".to_string();
        let msg = message(validate_sale_draft(&d).unwrap_err());
        assert!(msg.contains("customer_id"));
        assert!(msg.contains("branch_name: is required"));
        assert!(msg.contains("At least one item is required"));
    }

    #[test]
    fn duplicate_products_and_zero_quantities_are_rejected() {
        let item = line(0);
        let msg = message(validate_sale_draft(&draft(vec![item.clone(), item])).unwrap_err());
        assert!(msg.contains("Duplicate products"));
        assert!(msg.contains("items[0].quantity"));
    }

    fn product_input() -> ProductInput {
        ProductInput {
            title: "Skol 350ml".to_string(),
            price: BigDecimal::from(3),
            description: "Pilsen lager".to_string(),
            category: "beer".to_string(),
            image: "https://img.example.com/skol.png".to_string(),
            rating: Rating {
                rate: BigDecimal::from(4),
                count: 120,
            },
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(validate_product(&product_input()).is_ok());
    }

    #[test]
    fn product_rules_cover_price_rating_and_lengths() {
        let mut p = product_input();
        p.price = BigDecimal::from(-1);
        p.rating.rate = BigDecimal::from(6);
        p.title = "x".repeat(101);
        let msg = message(validate_product(&p).unwrap_err());
        assert!(msg.contains("price"));
        assert!(msg.contains("rating.rate"));
        assert!(msg.contains("title: cannot exceed 100"));
    }

    fn user_input() -> UserInput {
        UserInput {
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            phone: "+5511987654321".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            status: UserStatus::Active,
            role: UserRole::Customer,
            address: None,
        }
    }

    #[test]
    fn valid_user_passes() {
        assert!(validate_user(&user_input()).is_ok());
    }

    #[test]
    fn malformed_email_and_phone_are_rejected() {
        for email in ["jdoe", "jdoe@", "@example.com", "j@doe@example.com", "jdoe@example", "j doe@x.com"] {
            let mut u = user_input();
            u.email = email.to_string();
            assert!(validate_user(&u).is_err(), "email {:?}", email);
        }
        let mut u = user_input();
        u.phone = "12-34".to_string();
        assert!(message(validate_user(&u).unwrap_err()).contains("phone"));
    }

    #[test]
    fn short_username_is_rejected() {
        let mut u = user_input();
        u.username = "jd".to_string();
        assert!(message(validate_user(&u).unwrap_err()).contains("at least 3"));
    }

    fn address() -> Address {
        Address {
            city: "Sao Paulo".to_string(),
            street: "Avenida Paulista".to_string(),
            number: 1578,
            zipcode: "01310200".to_string(),
            geolocation: Geolocation {
                lat: "-23.561414".parse().unwrap(),
                long: "-46.655881".parse().unwrap(),
            },
        }
    }

    #[test]
    fn user_with_address_passes() {
        let mut u = user_input();
        u.address = Some(address());
        assert!(validate_user(&u).is_ok());
    }

    #[test]
    fn address_rules_cover_zipcode_number_and_coordinates() {
        let mut a = address();
        a.city = "S".to_string();
        a.number = 0;
        a.zipcode = "01310-200".to_string();
        a.geolocation.lat = BigDecimal::from(91);
        a.geolocation.long = BigDecimal::from(-181);
        let mut u = user_input();
        u.address = Some(a);

        let msg = message(validate_user(&u).unwrap_err());
        for field in [
            "address.city",
            "address.number",
            "address.zipcode",
            "address.geolocation.lat",
            "address.geolocation.long",
        ] {
            assert!(msg.contains(field), "{} missing from {}", field, msg);
        }
    }

    #[test]
    fn coordinate_bounds_are_inclusive() {
        let mut a = address();
        a.geolocation.lat = BigDecimal::from(-90);
        a.geolocation.long = BigDecimal::from(180);
        let mut u = user_input();
        u.address = Some(a);
        assert!(validate_user(&u).is_ok());
    }

    #[test]
    fn cart_rules_collect_every_violation() {
        let product_id = Uuid::new_v4();
        let cart = CartInput {
            user_id: Uuid::nil(),
            date: Utc::now(),
            items: vec![
                CartItem { product_id, quantity: 2 },
                CartItem { product_id, quantity: 0 },
            ],
        };
        let msg = message(validate_cart(&cart).unwrap_err());
        assert!(msg.contains("user_id"));
        assert!(msg.contains("Duplicate products"));
        assert!(msg.contains("items[1].quantity"));

        let empty = CartInput { user_id: Uuid::new_v4(), date: Utc::now(), items: vec![] };
        assert!(message(validate_cart(&empty).unwrap_err()).contains("at least one product"));
    }
}
