use std::sync::Arc;

use uuid::Uuid;

use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{Product, ProductInput};
use crate::domain::sale::ListResult;
use crate::domain::validation::validate_product;

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    pub fn create_product(&self, input: ProductInput) -> Result<Product, DomainError> {
        validate_product(&input)?;
        let product = self.repo.create(input)?;
        log::info!("Product {} created", product.id);
        Ok(product)
    }

    pub fn get_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        self.repo.find_by_id(id)
    }

    /// Catalog changes never touch existing sales, which keep the price and
    /// title captured when they were priced.
    pub fn update_product(&self, id: Uuid, input: ProductInput) -> Result<Product, DomainError> {
        validate_product(&input)?;
        self.repo
            .update(id, input)?
            .ok_or(DomainError::NotFound("Product"))
    }

    pub fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            return Err(DomainError::NotFound("Product"));
        }
        log::info!("Product {} deleted", id);
        Ok(())
    }

    pub fn list_products(&self, query: &ListQuery) -> Result<ListResult<Product>, DomainError> {
        self.repo.list(query)
    }

    pub fn list_by_category(
        &self,
        category: &str,
        query: &ListQuery,
    ) -> Result<ListResult<Product>, DomainError> {
        self.repo.list_by_category(category, query)
    }

    pub fn categories(&self) -> Result<Vec<String>, DomainError> {
        self.repo.categories()
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::product::Rating;
    use crate::infrastructure::memory::InMemoryProductRepository;

    fn input(title: &str, category: &str, price: i32) -> ProductInput {
        ProductInput {
            title: title.to_string(),
            price: BigDecimal::from(price),
            description: "desc".to_string(),
            category: category.to_string(),
            image: "https://img.example.com/p.png".to_string(),
            rating: Rating {
                rate: BigDecimal::from(3),
                count: 1,
            },
        }
    }

    fn service() -> ProductService {
        ProductService::new(Arc::new(InMemoryProductRepository::new()))
    }

    #[test]
    fn invalid_product_is_not_stored() {
        let s = service();
        assert!(matches!(
            s.create_product(input("", "beer", 1)),
            Err(DomainError::InvalidInput(_))
        ));
        assert_eq!(s.list_products(&ListQuery::default()).unwrap().total, 0);
    }

    #[test]
    fn update_and_delete_of_unknown_product_are_not_found() {
        let s = service();
        let id = Uuid::new_v4();
        assert!(matches!(
            s.update_product(id, input("Beer", "beer", 1)),
            Err(DomainError::NotFound("Product"))
        ));
        assert!(matches!(s.delete_product(id), Err(DomainError::NotFound("Product"))));
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let s = service();
        for (title, category) in [("Skol", "beer"), ("Malbec", "wine"), ("Brahma", "beer")] {
            s.create_product(input(title, category, 5)).unwrap();
        }
        assert_eq!(s.categories().unwrap(), vec!["beer", "wine"]);
    }

    #[test]
    fn list_filters_by_title_and_price() {
        let s = service();
        s.create_product(input("Skol Pilsen", "beer", 4)).unwrap();
        s.create_product(input("Skol Beats", "beer", 9)).unwrap();
        s.create_product(input("Brahma", "beer", 5)).unwrap();

        let query = ListQuery::default()
            .with_filter("title", "Skol*")
            .with_filter("_max_price", "5");
        let result = s.list_products(&query).unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].title, "Skol Pilsen");
    }

    #[test]
    fn list_by_category_pages_in_requested_order() {
        let s = service();
        for (title, price) in [("B", 3), ("A", 1), ("C", 2)] {
            s.create_product(input(title, "beer", price)).unwrap();
        }
        s.create_product(input("D", "wine", 1)).unwrap();

        let mut query = ListQuery::paged(1, 2);
        query.order = crate::domain::criteria::parse_order("price desc");
        let result = s.list_by_category("beer", &query).unwrap();

        assert_eq!(result.total, 3);
        let titles: Vec<_> = result.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "C"]);
    }
}
