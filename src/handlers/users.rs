use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::user::{Address, Geolocation, User, UserInput, UserRole, UserStatus};
use crate::errors::AppError;
use crate::AppState;

use super::{list_query, parse_decimal, total_pages};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeolocationDto {
    /// Latitude as a decimal string, -90 to 90
    pub lat: String,
    /// Longitude as a decimal string, -180 to 180
    pub long: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressDto {
    pub city: String,
    pub street: String,
    pub number: i32,
    /// Eight digits, e.g. "01310200"
    pub zipcode: String,
    pub geolocation: GeolocationDto,
}

impl AddressDto {
    fn into_address(self) -> Result<Address, AppError> {
        Ok(Address {
            geolocation: Geolocation {
                lat: parse_decimal("address.geolocation.lat", &self.geolocation.lat)?,
                long: parse_decimal("address.geolocation.long", &self.geolocation.long)?,
            },
            city: self.city,
            street: self.street,
            number: self.number,
            zipcode: self.zipcode,
        })
    }
}

impl From<Address> for AddressDto {
    fn from(a: Address) -> Self {
        AddressDto {
            city: a.city,
            street: a.street,
            number: a.number,
            zipcode: a.zipcode,
            geolocation: GeolocationDto {
                lat: a.geolocation.lat.to_string(),
                long: a.geolocation.long.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Defaults to `Active`.
    pub status: Option<UserStatus>,
    /// Defaults to `Customer`.
    pub role: Option<UserRole>,
    /// Omit to register without an address, or to clear it on update.
    pub address: Option<AddressDto>,
}

impl UserRequest {
    fn into_input(self) -> Result<UserInput, AppError> {
        Ok(UserInput {
            address: self.address.map(AddressDto::into_address).transpose()?,
            username: self.username,
            email: self.email,
            phone: self.phone,
            first_name: self.first_name,
            last_name: self.last_name,
            status: self.status.unwrap_or(UserStatus::Active),
            role: self.role.unwrap_or(UserRole::Customer),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub role: UserRole,
    pub address: Option<AddressDto>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            username: u.username,
            email: u.email,
            phone: u.phone,
            first_name: u.first_name,
            last_name: u.last_name,
            status: u.status,
            role: u.role,
            address: u.address.map(AddressDto::from),
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub total_items: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid request or email already in use"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner().into_input()?;

    let user = web::block(move || state.users.create_user(input)).await??;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let user = web::block(move || state.users.get_user(id)).await??;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::from(user))),
        None => Err(AppError::NotFound(format!("User with id {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("_page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("_size" = Option<i64>, Query, description = "Items per page (default 10, at most 100)"),
        ("_order" = Option<String>, Query, description = "Fields: username, email"),
    ),
    responses(
        (status = 200, description = "Paginated list of users", body = UserListResponse),
        (status = 400, description = "Invalid paging parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn list_users(
    state: web::Data<AppState>,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let query = list_query(params)?;
    let (page, size) = (query.page, query.size);

    let result = web::block(move || state.users.list_users(&query)).await??;

    Ok(HttpResponse::Ok().json(UserListResponse {
        total_pages: total_pages(result.total, size),
        total_items: result.total,
        current_page: page,
        items: result.items.into_iter().map(UserResponse::from).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User UUID"),
    ),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = body.into_inner().into_input()?;

    let user = web::block(move || state.users.update_user(id, input)).await??;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || state.users.delete_user(id)).await??;

    Ok(HttpResponse::NoContent().finish())
}
