use chrono::Utc;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::events::DomainEvent;
use crate::domain::ports::SaleRepository;
use crate::domain::sale::{ListResult, NewSale, Sale};
use crate::schema::{sale_items, sales, sales_outbox};

use super::models::{
    NewOutboxEventRow, NewSaleItemRow, NewSaleRow, SaleChangeset, SaleItemRow, SaleRow,
};

/// Topic routing key for CDC consumers of the outbox.
const AGGREGATE_TYPE: &str = "Sale";

pub struct DieselSaleRepository {
    pool: DbPool,
}

impl DieselSaleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn outbox_row(event: &DomainEvent) -> NewOutboxEventRow {
    NewOutboxEventRow {
        id: Uuid::new_v4(),
        aggregate_type: AGGREGATE_TYPE.to_string(),
        aggregate_id: event.aggregate_id().to_string(),
        event_type: event.kind().to_string(),
        payload: event.payload(),
    }
}

fn insert_items(conn: &mut PgConnection, sale: &Sale) -> QueryResult<usize> {
    let rows: Vec<NewSaleItemRow> = sale
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| NewSaleItemRow::from_item(sale.id, position, item))
        .collect();
    diesel::insert_into(sale_items::table)
        .values(&rows)
        .execute(conn)
}

fn insert_events(conn: &mut PgConnection, events: &[DomainEvent]) -> QueryResult<usize> {
    if events.is_empty() {
        return Ok(0);
    }
    let rows: Vec<NewOutboxEventRow> = events.iter().map(outbox_row).collect();
    diesel::insert_into(sales_outbox::table)
        .values(&rows)
        .execute(conn)
}

/// Loads the items of every sale in `rows` with one query and attaches
/// them in position order.
fn with_items(conn: &mut PgConnection, rows: Vec<SaleRow>) -> QueryResult<Vec<Sale>> {
    let items = SaleItemRow::belonging_to(&rows)
        .select(SaleItemRow::as_select())
        .order(sale_items::position.asc())
        .load(conn)?;
    Ok(items
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(items, row)| row.into_sale(items))
        .collect())
}

fn apply_filters<'a, ST: 'a>(
    mut q: sales::BoxedQuery<'a, Pg, ST>,
    query: &ListQuery,
) -> sales::BoxedQuery<'a, Pg, ST> {
    if let Some(max) = query.max::<i64>("number") {
        q = q.filter(sales::number.le(max));
    }
    if let Some(min) = query.min_decimal("total_amount") {
        q = q.filter(sales::total_amount.ge(min));
    }
    if let Some(max) = query.max_decimal("total_amount") {
        q = q.filter(sales::total_amount.le(max));
    }
    if let Some(pattern) = query.search("branch_name") {
        q = q.filter(sales::branch_name.like(pattern.to_like()));
    }
    if let Some(pattern) = query.search("customer_name") {
        q = q.filter(sales::customer_name.like(pattern.to_like()));
    }
    q
}

impl SaleRepository for DieselSaleRepository {
    fn create(&self, new: NewSale) -> Result<Sale, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the header; the number comes from the sequence.
            let row = diesel::insert_into(sales::table)
                .values(&NewSaleRow {
                    id: Uuid::new_v4(),
                    sale_date: new.date,
                    customer_id: new.customer_id,
                    customer_name: new.customer_name,
                    branch_id: new.branch_id,
                    branch_name: new.branch_name,
                    is_cancelled: false,
                    total_amount: new.total_amount,
                })
                .returning(SaleRow::as_returning())
                .get_result(conn)?;

            let mut sale = row.into_sale(Vec::new());
            sale.items = new.items;

            // 2. Insert the items
            insert_items(conn, &sale)?;

            // 3. Outbox event in the same transaction
            insert_events(conn, &[DomainEvent::sale_created(&sale)])?;

            Ok(sale)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = sales::table
            .filter(sales::id.eq(id))
            .select(SaleRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(with_items(&mut conn, vec![row])?.pop())
    }

    fn update(&self, sale: &Sale, events: &[DomainEvent]) -> Result<Sale, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(sales::table.find(sale.id))
                .set(&SaleChangeset {
                    customer_id: sale.customer_id,
                    customer_name: sale.customer_name.clone(),
                    branch_id: sale.branch_id,
                    branch_name: sale.branch_name.clone(),
                    is_cancelled: sale.is_cancelled,
                    total_amount: sale.total_amount.clone(),
                    updated_at: Utc::now(),
                })
                .execute(conn)?;
            if updated == 0 {
                return Err(DomainError::NotFound("Sale"));
            }

            diesel::delete(sale_items::table.filter(sale_items::sale_id.eq(sale.id)))
                .execute(conn)?;
            insert_items(conn, sale)?;
            insert_events(conn, events)?;

            Ok(sale.clone())
        })
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<Sale>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = apply_filters(sales::table.select(count_star()).into_boxed(), query)
                .get_result(conn)?;

            let mut rows = apply_filters(
                sales::table.select(SaleRow::as_select()).into_boxed(),
                query,
            );
            if query.order.is_empty() {
                rows = rows.then_order_by(sales::sale_date.desc());
            }
            for order in &query.order {
                rows = match (order.field.as_str(), order.descending) {
                    ("number", false) => rows.then_order_by(sales::number.asc()),
                    ("number", true) => rows.then_order_by(sales::number.desc()),
                    ("date", false) => rows.then_order_by(sales::sale_date.asc()),
                    ("date", true) => rows.then_order_by(sales::sale_date.desc()),
                    ("total", false) => rows.then_order_by(sales::total_amount.asc()),
                    ("total", true) => rows.then_order_by(sales::total_amount.desc()),
                    _ => rows,
                };
            }

            let rows = rows.limit(query.size).offset(query.offset()).load(conn)?;
            Ok(ListResult {
                items: with_items(conn, rows)?,
                total,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselSaleRepository;
    use crate::domain::criteria::{parse_order, ListQuery};
    use crate::domain::events::DomainEvent;
    use crate::domain::ports::SaleRepository;
    use crate::domain::pricing::{price_item, CatalogProduct};
    use crate::domain::sale::{total_of, NewSale};
    use crate::infrastructure::models::OutboxEventRow;
    use crate::infrastructure::test_db::setup_db;
    use crate::schema::sales_outbox;

    fn new_sale(branch: &str, lines: &[(&str, i32, u32)]) -> NewSale {
        let items: Vec<_> = lines
            .iter()
            .map(|&(price, quantity, pct)| {
                let product = CatalogProduct {
                    id: Uuid::new_v4(),
                    title: "Skol 350ml".to_string(),
                    price: BigDecimal::from_str(price).expect("valid decimal"),
                };
                price_item(&product, quantity, pct, false)
            })
            .collect();
        NewSale {
            date: Utc::now(),
            customer_id: Uuid::new_v4(),
            customer_name: "Jane Doe".to_string(),
            branch_id: Uuid::new_v4(),
            branch_name: branch.to_string(),
            total_amount: total_of(&items),
            items,
        }
    }

    #[tokio::test]
    async fn create_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSaleRepository::new(pool);

        let created = repo
            .create(new_sale("Downtown", &[("10.00", 5, 10), ("2.50", 1, 0)]))
            .expect("create failed");

        let found = repo
            .find_by_id(created.id)
            .expect("find failed")
            .expect("sale should exist");

        assert_eq!(found.number, created.number);
        assert_eq!(found.items.len(), 2);
        assert_eq!(found.items[0].net_amount, BigDecimal::from(45));
        assert_eq!(found.items[1].unit_price, BigDecimal::from_str("2.50").unwrap());
        assert_eq!(found.total_amount, BigDecimal::from_str("47.50").unwrap());
    }

    #[tokio::test]
    async fn longest_display_name_fits() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSaleRepository::new(pool);

        let mut sale = new_sale("Downtown", &[("1.00", 1, 0)]);
        sale.customer_name = format!("{} {}", "a".repeat(100), "b".repeat(100));
        let created = repo.create(sale).expect("create failed");

        assert_eq!(created.customer_name.chars().count(), 201);
    }

    #[tokio::test]
    async fn numbers_are_sequential() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSaleRepository::new(pool);

        let first = repo.create(new_sale("A", &[("1.00", 1, 0)])).expect("create failed");
        let second = repo.create(new_sale("B", &[("1.00", 1, 0)])).expect("create failed");

        assert_eq!(second.number, first.number + 1);
    }

    #[tokio::test]
    async fn writes_go_to_the_outbox_in_the_same_transaction() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSaleRepository::new(pool.clone());

        let mut sale = repo
            .create(new_sale("Downtown", &[("4.50", 2, 0)]))
            .expect("create failed");
        sale.is_cancelled = true;
        repo.update(&sale, &[DomainEvent::sale_cancelled(&sale)])
            .expect("update failed");

        let mut conn = pool.get().expect("Failed to get connection");
        let events: Vec<OutboxEventRow> = sales_outbox::table
            .filter(sales_outbox::aggregate_id.eq(sale.id.to_string()))
            .order(sales_outbox::created_at.asc())
            .select(OutboxEventRow::as_select())
            .load(&mut conn)
            .expect("query failed");

        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["SaleCreated", "SaleCancelled"]);
        assert!(events.iter().all(|e| e.aggregate_type == "Sale"));
        assert_eq!(events[1].payload["is_cancelled"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn update_replaces_items() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSaleRepository::new(pool);

        let mut sale = repo
            .create(new_sale("Downtown", &[("10.00", 5, 10), ("5.00", 10, 20)]))
            .expect("create failed");
        sale.items.truncate(1);
        sale.recalculate_total();
        repo.update(&sale, &[]).expect("update failed");

        let found = repo.find_by_id(sale.id).expect("find failed").expect("exists");
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.total_amount, BigDecimal::from(45));
    }

    #[tokio::test]
    async fn list_filters_orders_and_paginates() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSaleRepository::new(pool);

        for (branch, price) in [("Downtown", "1.00"), ("Uptown", "2.00"), ("Downtown East", "3.00")] {
            repo.create(new_sale(branch, &[(price, 1, 0)])).expect("create failed");
        }

        let mut query = ListQuery::paged(1, 1).with_filter("branch_name", "Down*");
        query.order = parse_order("total desc");
        let page = repo.list(&query).expect("list failed");

        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].branch_name, "Downtown East");
    }
}
