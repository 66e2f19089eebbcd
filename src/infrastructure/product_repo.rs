use chrono::Utc;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{Product, ProductInput};
use crate::domain::sale::ListResult;
use crate::schema::products;

use super::models::{NewProductRow, ProductChangeset, ProductRow};

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<ProductInput> for ProductChangeset {
    fn from(input: ProductInput) -> Self {
        ProductChangeset {
            title: input.title,
            price: input.price,
            description: input.description,
            category: input.category,
            image: input.image,
            rating_rate: input.rating.rate,
            rating_count: input.rating.count,
        }
    }
}

fn apply_filters<'a, ST: 'a>(
    mut q: products::BoxedQuery<'a, Pg, ST>,
    query: &ListQuery,
) -> products::BoxedQuery<'a, Pg, ST> {
    if let Some(min) = query.min_decimal("price") {
        q = q.filter(products::price.ge(min));
    }
    if let Some(max) = query.max_decimal("price") {
        q = q.filter(products::price.le(max));
    }
    if let Some(pattern) = query.search("title") {
        q = q.filter(products::title.like(pattern.to_like()));
    }
    if let Some(pattern) = query.search("category") {
        q = q.filter(products::category.like(pattern.to_like()));
    }
    q
}

fn load_page(
    conn: &mut PgConnection,
    category: Option<&str>,
    query: &ListQuery,
) -> QueryResult<ListResult<Product>> {
    let mut count = apply_filters(products::table.select(count_star()).into_boxed(), query);
    let mut rows = apply_filters(
        products::table.select(ProductRow::as_select()).into_boxed(),
        query,
    );
    if let Some(category) = category {
        count = count.filter(products::category.eq(category.to_string()));
        rows = rows.filter(products::category.eq(category.to_string()));
    }

    for order in &query.order {
        rows = match (order.field.as_str(), order.descending) {
            ("title", false) => rows.then_order_by(products::title.asc()),
            ("title", true) => rows.then_order_by(products::title.desc()),
            ("price", false) => rows.then_order_by(products::price.asc()),
            ("price", true) => rows.then_order_by(products::price.desc()),
            ("category", false) => rows.then_order_by(products::category.asc()),
            ("category", true) => rows.then_order_by(products::category.desc()),
            _ => rows,
        };
    }
    // Stable paging when no order (or an unknown field) was requested.
    rows = rows.then_order_by(products::created_at.asc());

    let total: i64 = count.get_result(conn)?;
    let items = rows
        .limit(query.size)
        .offset(query.offset())
        .load(conn)?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ListResult { items, total })
}

impl ProductRepository for DieselProductRepository {
    fn create(&self, input: ProductInput) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                fields: input.into(),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get()?;

        let rows = products::table
            .filter(products::id.eq_any(ids))
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn update(&self, id: Uuid, input: ProductInput) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(products::table.find(id))
            .set((
                &ProductChangeset::from(input),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(load_page(&mut conn, None, query)?)
    }

    fn list_by_category(
        &self,
        category: &str,
        query: &ListQuery,
    ) -> Result<ListResult<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(load_page(&mut conn, Some(category), query)?)
    }

    fn categories(&self) -> Result<Vec<String>, DomainError> {
        let mut conn = self.pool.get()?;

        let categories = products::table
            .select(products::category)
            .distinct()
            .order(products::category.asc())
            .load(&mut conn)?;
        Ok(categories)
    }
}
