use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::criteria::ListQuery;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::sale::ListResult;
use crate::domain::user::{User, UserInput};
use crate::schema::users;

use super::models::{NewUserRow, UserChangeset, UserRow};

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<UserInput> for UserChangeset {
    fn from(input: UserInput) -> Self {
        let (city, street, number, zipcode, lat, long) = match input.address {
            Some(a) => (
                Some(a.city),
                Some(a.street),
                Some(a.number),
                Some(a.zipcode),
                Some(a.geolocation.lat),
                Some(a.geolocation.long),
            ),
            None => (None, None, None, None, None, None),
        };
        UserChangeset {
            username: input.username,
            email: input.email,
            phone: input.phone,
            first_name: input.first_name,
            last_name: input.last_name,
            status: input.status.as_str().to_string(),
            role: input.role.as_str().to_string(),
            address_city: city,
            address_street: street,
            address_number: number,
            address_zipcode: zipcode,
            address_lat: lat,
            address_long: long,
        }
    }
}

impl UserRepository for DieselUserRepository {
    fn create(&self, input: UserInput) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: Uuid::new_v4(),
                fields: input.into(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)?;
        row.try_into()
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn update(&self, id: Uuid, input: UserInput) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        diesel::update(users::table.find(id))
            .set((&UserChangeset::from(input), users::updated_at.eq(Utc::now())))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(users::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn list(&self, query: &ListQuery) -> Result<ListResult<User>, DomainError> {
        let mut conn = self.pool.get()?;

        let total: i64 = users::table.select(count_star()).get_result(&mut conn)?;

        let mut rows = users::table.select(UserRow::as_select()).into_boxed();
        for order in &query.order {
            rows = match (order.field.as_str(), order.descending) {
                ("username", false) => rows.then_order_by(users::username.asc()),
                ("username", true) => rows.then_order_by(users::username.desc()),
                ("email", false) => rows.then_order_by(users::email.asc()),
                ("email", true) => rows.then_order_by(users::email.desc()),
                _ => rows,
            };
        }
        rows = rows.then_order_by(users::created_at.asc());

        let items = rows
            .limit(query.size)
            .offset(query.offset())
            .load(&mut conn)?
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListResult { items, total })
    }
}
