use uuid::Uuid;

use super::cart::{Cart, CartInput};
use super::criteria::ListQuery;
use super::errors::DomainError;
use super::events::DomainEvent;
use super::product::{Product, ProductInput};
use super::sale::{ListResult, NewSale, Sale};
use super::user::{User, UserInput};

pub trait SaleRepository: Send + Sync + 'static {
    /// Stores a priced sale, assigning its id and sequential number, and
    /// records a `SaleCreated` event with it.
    fn create(&self, sale: NewSale) -> Result<Sale, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, DomainError>;
    /// Replaces the stored header and items of `sale` and records `events`
    /// atomically with the change.
    fn update(&self, sale: &Sale, events: &[DomainEvent]) -> Result<Sale, DomainError>;
    fn list(&self, query: &ListQuery) -> Result<ListResult<Sale>, DomainError>;
}

pub trait ProductRepository: Send + Sync + 'static {
    fn create(&self, input: ProductInput) -> Result<Product, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    fn update(&self, id: Uuid, input: ProductInput) -> Result<Option<Product>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn list(&self, query: &ListQuery) -> Result<ListResult<Product>, DomainError>;
    fn list_by_category(
        &self,
        category: &str,
        query: &ListQuery,
    ) -> Result<ListResult<Product>, DomainError>;
    fn categories(&self) -> Result<Vec<String>, DomainError>;
}

pub trait UserRepository: Send + Sync + 'static {
    fn create(&self, input: UserInput) -> Result<User, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    fn update(&self, id: Uuid, input: UserInput) -> Result<Option<User>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn list(&self, query: &ListQuery) -> Result<ListResult<User>, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn create(&self, input: CartInput) -> Result<Cart, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Cart>, DomainError>;
    /// Replaces the cart's owner, date and items.
    fn update(&self, id: Uuid, input: CartInput) -> Result<Option<Cart>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn list(&self, query: &ListQuery) -> Result<ListResult<Cart>, DomainError>;
}
