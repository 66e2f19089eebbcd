use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartInput};
use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::domain::sale::ListResult;
use crate::schema::{cart_items, carts};

use super::models::{CartItemRow, CartRow, NewCartItemRow, NewCartRow};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn insert_items(conn: &mut PgConnection, cart_id: Uuid, input: &CartInput) -> QueryResult<usize> {
    let rows: Vec<NewCartItemRow> = input
        .items
        .iter()
        .enumerate()
        .map(|(position, item)| NewCartItemRow {
            cart_id,
            product_id: item.product_id,
            position: position as i32,
            quantity: item.quantity,
        })
        .collect();
    diesel::insert_into(cart_items::table)
        .values(&rows)
        .execute(conn)
}

fn with_items(conn: &mut PgConnection, rows: Vec<CartRow>) -> QueryResult<Vec<Cart>> {
    let items = CartItemRow::belonging_to(&rows)
        .select(CartItemRow::as_select())
        .order(cart_items::position.asc())
        .load(conn)?;
    Ok(items
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(items, row)| row.into_cart(items))
        .collect())
}

fn apply_filters<'a, ST: 'a>(
    mut q: carts::BoxedQuery<'a, Pg, ST>,
    query: &ListQuery,
) -> carts::BoxedQuery<'a, Pg, ST> {
    if let Some(min) = query.min::<DateTime<Utc>>("date") {
        q = q.filter(carts::cart_date.ge(min));
    }
    if let Some(max) = query.max::<DateTime<Utc>>("date") {
        q = q.filter(carts::cart_date.le(max));
    }
    q
}

impl CartRepository for DieselCartRepository {
    fn create(&self, input: CartInput) -> Result<Cart, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::insert_into(carts::table)
                .values(&NewCartRow {
                    id: Uuid::new_v4(),
                    user_id: input.user_id,
                    cart_date: input.date,
                })
                .returning(CartRow::as_returning())
                .get_result(conn)?;

            insert_items(conn, row.id, &input)?;

            let mut cart = row.into_cart(Vec::new());
            cart.items = input.items;
            Ok(cart)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Cart>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = carts::table
            .find(id)
            .select(CartRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(with_items(&mut conn, vec![row])?.pop())
    }

    fn update(&self, id: Uuid, input: CartInput) -> Result<Option<Cart>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::update(carts::table.find(id))
                .set((
                    carts::user_id.eq(input.user_id),
                    carts::cart_date.eq(input.date),
                    carts::updated_at.eq(Utc::now()),
                ))
                .returning(CartRow::as_returning())
                .get_result(conn)
                .optional()?;
            let Some(row) = row else {
                return Ok(None);
            };

            diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(id))).execute(conn)?;
            insert_items(conn, id, &input)?;

            let mut cart = row.into_cart(Vec::new());
            cart.items = input.items;
            Ok(Some(cart))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        // Items go with the cart (ON DELETE CASCADE).
        let deleted = diesel::delete(carts::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<Cart>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = apply_filters(carts::table.select(count_star()).into_boxed(), query)
                .get_result(conn)?;

            let mut rows = apply_filters(
                carts::table.select(CartRow::as_select()).into_boxed(),
                query,
            );
            if query.order.is_empty() {
                rows = rows.then_order_by(carts::cart_date.desc());
            }
            for order in &query.order {
                rows = match (order.field.as_str(), order.descending) {
                    ("date", false) => rows.then_order_by(carts::cart_date.asc()),
                    ("date", true) => rows.then_order_by(carts::cart_date.desc()),
                    ("user_id", false) => rows.then_order_by(carts::user_id.asc()),
                    ("user_id", true) => rows.then_order_by(carts::user_id.desc()),
                    ("id", false) => rows.then_order_by(carts::id.asc()),
                    ("id", true) => rows.then_order_by(carts::id.desc()),
                    _ => rows,
                };
            }
            rows = rows.then_order_by(carts::created_at.asc());

            let rows = rows.limit(query.size).offset(query.offset()).load(conn)?;
            Ok(ListResult {
                items: with_items(conn, rows)?,
                total,
            })
        })
    }
}
