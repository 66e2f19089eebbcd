use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::events::{DomainEvent, EventDispatcher};
use crate::domain::ports::{ProductRepository, SaleRepository, UserRepository};
use crate::domain::pricing::{
    cancel_sale, price_sale, CancelOutcome, CatalogProduct, CustomerRecord, PricedSale, SaleDraft,
};
use crate::domain::sale::{ListResult, NewSale, Sale};
use crate::domain::validation::validate_sale_draft;

pub struct SaleService {
    sales: Arc<dyn SaleRepository>,
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    events: Arc<EventDispatcher>,
}

impl SaleService {
    pub fn new(
        sales: Arc<dyn SaleRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            sales,
            products,
            users,
            events,
        }
    }

    pub fn create_sale(&self, draft: SaleDraft) -> Result<Sale, DomainError> {
        let priced = self.price(draft)?;
        let sale = self.sales.create(NewSale {
            date: Utc::now(),
            customer_id: priced.customer_id,
            customer_name: priced.customer_name,
            branch_id: priced.branch_id,
            branch_name: priced.branch_name,
            total_amount: priced.total_amount,
            items: priced.items,
        })?;

        log::info!(
            "Sale {} (#{}) created, total {}",
            sale.id,
            sale.number,
            sale.total_amount
        );
        self.events.dispatch(&DomainEvent::sale_created(&sale));
        Ok(sale)
    }

    pub fn get_sale(&self, id: Uuid) -> Result<Option<Sale>, DomainError> {
        self.sales.find_by_id(id)
    }

    /// Reprices an existing sale from a new draft. Items flagged as
    /// cancelled in the draft but not in the stored sale raise a
    /// `SaleItemCancelled` event each.
    pub fn update_sale(&self, id: Uuid, draft: SaleDraft) -> Result<Sale, DomainError> {
        let existing = self.sales.find_by_id(id)?.ok_or(DomainError::NotFound("Sale"))?;
        if existing.is_cancelled {
            return Err(DomainError::InvalidInput(format!(
                "Sale {} is cancelled and cannot be modified",
                id
            )));
        }

        let priced = self.price(draft)?;
        let newly_cancelled: Vec<Uuid> = priced
            .items
            .iter()
            .filter(|item| item.is_cancelled)
            .filter(|item| {
                !existing
                    .items
                    .iter()
                    .any(|old| old.product_id == item.product_id && old.is_cancelled)
            })
            .map(|item| item.product_id)
            .collect();

        let sale = Sale {
            customer_id: priced.customer_id,
            customer_name: priced.customer_name,
            branch_id: priced.branch_id,
            branch_name: priced.branch_name,
            total_amount: priced.total_amount,
            items: priced.items,
            ..existing
        };

        let mut events = vec![DomainEvent::sale_modified(&sale)];
        events.extend(
            newly_cancelled
                .into_iter()
                .map(|product_id| DomainEvent::SaleItemCancelled {
                    sale_id: sale.id,
                    product_id,
                }),
        );

        let sale = self.sales.update(&sale, &events)?;
        log::info!("Sale {} updated, total {}", sale.id, sale.total_amount);
        self.events.dispatch_all(&events);
        Ok(sale)
    }

    /// Cancels a sale. Cancelling an already cancelled sale succeeds without
    /// touching storage or raising events.
    pub fn cancel_sale(&self, id: Uuid) -> Result<Sale, DomainError> {
        let sale = self.sales.find_by_id(id)?.ok_or(DomainError::NotFound("Sale"))?;

        match cancel_sale(sale) {
            CancelOutcome::AlreadyCancelled(sale) => {
                log::debug!("Sale {} already cancelled", sale.id);
                Ok(sale)
            }
            CancelOutcome::Cancelled(sale) => {
                let events = [DomainEvent::sale_cancelled(&sale)];
                let sale = self.sales.update(&sale, &events)?;
                log::info!("Sale {} cancelled", sale.id);
                self.events.dispatch_all(&events);
                Ok(sale)
            }
        }
    }

    pub fn list_sales(&self, query: &ListQuery) -> Result<ListResult<Sale>, DomainError> {
        self.sales.list(query)
    }

    /// Validates the draft, fetches the catalog entries and the customer it
    /// refers to, and runs the pricing engine over them.
    fn price(&self, draft: SaleDraft) -> Result<PricedSale, DomainError> {
        validate_sale_draft(&draft)?;

        let catalog: Vec<CatalogProduct> = self
            .products
            .find_by_ids(&draft.product_ids())?
            .into_iter()
            .map(|p| CatalogProduct {
                id: p.id,
                title: p.title,
                price: p.price,
            })
            .collect();
        let customer = self
            .users
            .find_by_id(draft.customer_id)?
            .map(|u| CustomerRecord {
                id: u.id,
                name: u.display_name(),
                status: u.status,
            });

        price_sale(draft, &catalog, customer.as_ref()).map_err(|e| {
            log::warn!("Sale rejected: {}", e);
            DomainError::from(e)
        })
    }
}
