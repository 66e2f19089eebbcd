use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::cart::{Cart, CartInput};
use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, ProductRepository, UserRepository};
use crate::domain::sale::ListResult;
use crate::domain::validation::validate_cart;

pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
}

impl CartService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            carts,
            products,
            users,
        }
    }

    pub fn create_cart(&self, input: CartInput) -> Result<Cart, DomainError> {
        self.check(&input)?;
        let cart = self.carts.create(input)?;
        log::info!("Cart {} created for user {}", cart.id, cart.user_id);
        Ok(cart)
    }

    pub fn get_cart(&self, id: Uuid) -> Result<Option<Cart>, DomainError> {
        self.carts.find_by_id(id)
    }

    pub fn update_cart(&self, id: Uuid, input: CartInput) -> Result<Cart, DomainError> {
        self.check(&input)?;
        let cart = self
            .carts
            .update(id, input)?
            .ok_or(DomainError::NotFound("Cart"))?;
        log::info!("Cart {} updated", cart.id);
        Ok(cart)
    }

    pub fn delete_cart(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.carts.delete(id)? {
            return Err(DomainError::NotFound("Cart"));
        }
        log::info!("Cart {} deleted", id);
        Ok(())
    }

    pub fn list_carts(&self, query: &ListQuery) -> Result<ListResult<Cart>, DomainError> {
        self.carts.list(query)
    }

    /// Field rules first, then the owner and every product must exist.
    fn check(&self, input: &CartInput) -> Result<(), DomainError> {
        validate_cart(input)?;

        if self.users.find_by_id(input.user_id)?.is_none() {
            log::warn!("Cart rejected: user {} not found", input.user_id);
            return Err(DomainError::InvalidInput(format!(
                "user_id: user {} not found",
                input.user_id
            )));
        }

        let ids = input.product_ids();
        let known: HashSet<Uuid> = self
            .products
            .find_by_ids(&ids)?
            .into_iter()
            .map(|p| p.id)
            .collect();
        if let Some(missing) = ids.iter().find(|id| !known.contains(id)) {
            log::warn!("Cart rejected: product {} not found", missing);
            return Err(DomainError::InvalidInput(format!(
                "items: product {} not found",
                missing
            )));
        }
        Ok(())
    }
}
