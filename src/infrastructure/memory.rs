//! In-memory repositories for service and HTTP tests. Listing honours the
//! same criteria as the Diesel repositories.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::{Cart, CartInput};
use crate::domain::criteria::{ListQuery, OrderBy};
use crate::domain::errors::DomainError;
use crate::domain::events::DomainEvent;
use crate::domain::ports::{CartRepository, ProductRepository, SaleRepository, UserRepository};
use crate::domain::product::{Product, ProductInput};
use crate::domain::sale::{ListResult, NewSale, Sale};
use crate::domain::user::{User, UserInput};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, DomainError> {
    m.lock()
        .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
}

/// Applies `order` left to right, the first clause being the primary key.
fn sort_with<T>(items: &mut [T], order: &[OrderBy], cmp: impl Fn(&T, &T, &str) -> Option<Ordering>) {
    items.sort_by(|a, b| {
        order
            .iter()
            .filter_map(|o| {
                cmp(a, b, &o.field).map(|ord| if o.descending { ord.reverse() } else { ord })
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn page<T>(query: &ListQuery, items: Vec<T>) -> ListResult<T> {
    let total = items.len() as i64;
    ListResult {
        items: query.page_of(items),
        total,
    }
}

// ── Sales ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SaleStore {
    sales: Vec<Sale>,
    last_number: i64,
    outbox: Vec<DomainEvent>,
}

#[derive(Debug, Default)]
pub struct InMemorySaleRepository {
    store: Mutex<SaleStore>,
}

impl InMemorySaleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded alongside sale writes, oldest first.
    pub fn outbox(&self) -> Vec<DomainEvent> {
        self.store
            .lock()
            .map(|s| s.outbox.clone())
            .unwrap_or_default()
    }
}

impl SaleRepository for InMemorySaleRepository {
    fn create(&self, new: NewSale) -> Result<Sale, DomainError> {
        let mut store = lock(&self.store)?;
        store.last_number += 1;
        let sale = Sale {
            id: Uuid::new_v4(),
            number: store.last_number,
            date: new.date,
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            branch_id: new.branch_id,
            branch_name: new.branch_name,
            is_cancelled: false,
            total_amount: new.total_amount,
            items: new.items,
        };
        store.outbox.push(DomainEvent::sale_created(&sale));
        store.sales.push(sale.clone());
        Ok(sale)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, DomainError> {
        Ok(lock(&self.store)?.sales.iter().find(|s| s.id == id).cloned())
    }

    fn update(&self, sale: &Sale, events: &[DomainEvent]) -> Result<Sale, DomainError> {
        let mut store = lock(&self.store)?;
        let slot = store
            .sales
            .iter_mut()
            .find(|s| s.id == sale.id)
            .ok_or(DomainError::NotFound("Sale"))?;
        *slot = sale.clone();
        store.outbox.extend_from_slice(events);
        Ok(sale.clone())
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<Sale>, DomainError> {
        let store = lock(&self.store)?;
        let max_number = query.max::<i64>("number");
        let min_total = query.min_decimal("total_amount");
        let max_total = query.max_decimal("total_amount");
        let branch = query.search("branch_name");
        let customer = query.search("customer_name");

        let mut items: Vec<Sale> = store
            .sales
            .iter()
            .filter(|s| max_number.map_or(true, |max| s.number <= max))
            .filter(|s| min_total.as_ref().map_or(true, |min| &s.total_amount >= min))
            .filter(|s| max_total.as_ref().map_or(true, |max| &s.total_amount <= max))
            .filter(|s| branch.as_ref().map_or(true, |p| p.matches(&s.branch_name)))
            .filter(|s| customer.as_ref().map_or(true, |p| p.matches(&s.customer_name)))
            .cloned()
            .collect();

        let default_order = [OrderBy {
            field: "date".to_string(),
            descending: true,
        }];
        let order = if query.order.is_empty() {
            &default_order[..]
        } else {
            &query.order[..]
        };
        sort_with(&mut items, order, |a, b, field| match field {
            "number" => Some(a.number.cmp(&b.number)),
            "date" => Some(a.date.cmp(&b.date)),
            "total" => a.total_amount.partial_cmp(&b.total_amount),
            _ => None,
        });
        Ok(page(query, items))
    }
}

// ── Products ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: Mutex<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(products: &[Product], query: &ListQuery) -> Vec<Product> {
        let min_price = query.min_decimal("price");
        let max_price = query.max_decimal("price");
        let title = query.search("title");
        let category = query.search("category");

        let mut items: Vec<Product> = products
            .iter()
            .filter(|p| min_price.as_ref().map_or(true, |min| &p.price >= min))
            .filter(|p| max_price.as_ref().map_or(true, |max| &p.price <= max))
            .filter(|p| title.as_ref().map_or(true, |t| t.matches(&p.title)))
            .filter(|p| category.as_ref().map_or(true, |c| c.matches(&p.category)))
            .cloned()
            .collect();
        sort_products(&mut items, &query.order);
        items
    }
}

fn sort_products(items: &mut [Product], order: &[OrderBy]) {
    sort_with(items, order, |a, b, field| match field {
        "title" => Some(a.title.cmp(&b.title)),
        "price" => a.price.partial_cmp(&b.price),
        "category" => Some(a.category.cmp(&b.category)),
        _ => None,
    });
}

impl ProductRepository for InMemoryProductRepository {
    fn create(&self, input: ProductInput) -> Result<Product, DomainError> {
        let product = Product {
            id: Uuid::new_v4(),
            title: input.title,
            price: input.price,
            description: input.description,
            category: input.category,
            image: input.image,
            rating: input.rating,
            created_at: Utc::now(),
        };
        lock(&self.products)?.push(product.clone());
        Ok(product)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(lock(&self.products)?.iter().find(|p| p.id == id).cloned())
    }

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        Ok(lock(&self.products)?
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn update(&self, id: Uuid, input: ProductInput) -> Result<Option<Product>, DomainError> {
        let mut products = lock(&self.products)?;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        product.title = input.title;
        product.price = input.price;
        product.description = input.description;
        product.category = input.category;
        product.image = input.image;
        product.rating = input.rating;
        Ok(Some(product.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut products = lock(&self.products)?;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<Product>, DomainError> {
        let products = lock(&self.products)?;
        Ok(page(query, Self::filtered(&products, query)))
    }

    fn list_by_category(
        &self,
        category: &str,
        query: &ListQuery,
    ) -> Result<ListResult<Product>, DomainError> {
        let products = lock(&self.products)?;
        let items: Vec<Product> = Self::filtered(&products, query)
            .into_iter()
            .filter(|p| p.category == category)
            .collect();
        Ok(page(query, items))
    }

    fn categories(&self) -> Result<Vec<String>, DomainError> {
        let mut categories: Vec<String> = lock(&self.products)?
            .iter()
            .map(|p| p.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}

// ── Users ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Mirrors the unique index on `users.email`.
fn ensure_email_free(users: &[User], email: &str, except: Option<Uuid>) -> Result<(), DomainError> {
    if users.iter().any(|u| u.email == email && Some(u.id) != except) {
        return Err(DomainError::InvalidInput(format!(
            "email: {} is already in use",
            email
        )));
    }
    Ok(())
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, input: UserInput) -> Result<User, DomainError> {
        let mut users = lock(&self.users)?;
        ensure_email_free(&users, &input.email, None)?;
        let user = User {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email,
            phone: input.phone,
            first_name: input.first_name,
            last_name: input.last_name,
            status: input.status,
            role: input.role,
            address: input.address,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(lock(&self.users)?.iter().find(|u| u.id == id).cloned())
    }

    fn update(&self, id: Uuid, input: UserInput) -> Result<Option<User>, DomainError> {
        let mut users = lock(&self.users)?;
        if !users.iter().any(|u| u.id == id) {
            return Ok(None);
        }
        ensure_email_free(&users, &input.email, Some(id))?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.username = input.username;
        user.email = input.email;
        user.phone = input.phone;
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.status = input.status;
        user.role = input.role;
        user.address = input.address;
        Ok(Some(user.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut users = lock(&self.users)?;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<User>, DomainError> {
        let mut items = lock(&self.users)?.clone();
        sort_with(&mut items, &query.order, |a, b, field| match field {
            "username" => Some(a.username.cmp(&b.username)),
            "email" => Some(a.email.cmp(&b.email)),
            _ => None,
        });
        Ok(page(query, items))
    }
}

// ── Carts ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    carts: Mutex<Vec<Cart>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartRepository for InMemoryCartRepository {
    fn create(&self, input: CartInput) -> Result<Cart, DomainError> {
        let cart = Cart {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            date: input.date,
            items: input.items,
        };
        lock(&self.carts)?.push(cart.clone());
        Ok(cart)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Cart>, DomainError> {
        Ok(lock(&self.carts)?.iter().find(|c| c.id == id).cloned())
    }

    fn update(&self, id: Uuid, input: CartInput) -> Result<Option<Cart>, DomainError> {
        let mut carts = lock(&self.carts)?;
        let Some(cart) = carts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        cart.user_id = input.user_id;
        cart.date = input.date;
        cart.items = input.items;
        Ok(Some(cart.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut carts = lock(&self.carts)?;
        let before = carts.len();
        carts.retain(|c| c.id != id);
        Ok(carts.len() != before)
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<Cart>, DomainError> {
        let min_date = query.min::<DateTime<Utc>>("date");
        let max_date = query.max::<DateTime<Utc>>("date");

        let mut items: Vec<Cart> = lock(&self.carts)?
            .iter()
            .filter(|c| min_date.map_or(true, |min| c.date >= min))
            .filter(|c| max_date.map_or(true, |max| c.date <= max))
            .cloned()
            .collect();

        let default_order = [OrderBy {
            field: "date".to_string(),
            descending: true,
        }];
        let order = if query.order.is_empty() {
            &default_order[..]
        } else {
            &query.order[..]
        };
        sort_with(&mut items, order, |a, b, field| match field {
            "date" => Some(a.date.cmp(&b.date)),
            "user_id" => Some(a.user_id.cmp(&b.user_id)),
            "id" => Some(a.id.cmp(&b.id)),
            _ => None,
        });
        Ok(page(query, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{UserRole, UserStatus};

    fn user(email: &str) -> UserInput {
        UserInput {
            username: "jane".to_string(),
            email: email.to_string(),
            phone: "+551133334444".to_string(),
            first_name: "Jane".to_string(),
            last_name: String::new(),
            status: UserStatus::Active,
            role: UserRole::Customer,
            address: None,
        }
    }

    #[test]
    fn emails_are_unique() {
        let repo = InMemoryUserRepository::new();
        let jane = repo.create(user("jane@example.com")).unwrap();
        let joe = repo.create(user("joe@example.com")).unwrap();

        assert!(matches!(
            repo.create(user("jane@example.com")),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            repo.update(joe.id, user("jane@example.com")),
            Err(DomainError::InvalidInput(_))
        ));
        // Keeping one's own email is fine.
        assert!(repo.update(jane.id, user("jane@example.com")).unwrap().is_some());
    }

    #[test]
    fn updating_a_missing_sale_is_not_found() {
        let repo = InMemorySaleRepository::new();
        let sale = Sale {
            id: Uuid::new_v4(),
            number: 1,
            date: Utc::now(),
            customer_id: Uuid::new_v4(),
            customer_name: "Jane".to_string(),
            branch_id: Uuid::new_v4(),
            branch_name: "Downtown".to_string(),
            is_cancelled: false,
            total_amount: 0.into(),
            items: Vec::new(),
        };
        assert!(matches!(repo.update(&sale, &[]), Err(DomainError::NotFound("Sale"))));
        assert!(repo.outbox().is_empty());
    }
}
