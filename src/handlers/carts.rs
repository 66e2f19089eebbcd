use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartInput, CartItem};
use crate::errors::AppError;
use crate::AppState;

use super::{list_query, total_pages};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItemDto {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartRequest {
    pub user_id: Uuid,
    /// RFC 3339 timestamp; defaults to now.
    pub date: Option<DateTime<Utc>>,
    pub items: Vec<CartItemDto>,
}

impl From<CartRequest> for CartInput {
    fn from(req: CartRequest) -> Self {
        CartInput {
            user_id: req.user_id,
            date: req.date.unwrap_or_else(Utc::now),
            items: req
                .items
                .into_iter()
                .map(|i| CartItem {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: String,
    pub items: Vec<CartItemDto>,
}

impl From<Cart> for CartResponse {
    fn from(c: Cart) -> Self {
        CartResponse {
            id: c.id,
            user_id: c.user_id,
            date: c.date.to_rfc3339(),
            items: c
                .items
                .into_iter()
                .map(|i| CartItemDto {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartListResponse {
    pub items: Vec<CartResponse>,
    pub total_items: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

#[utoipa::path(
    post,
    path = "/api/carts",
    request_body = CartRequest,
    responses(
        (status = 201, description = "Cart created", body = CartResponse),
        (status = 400, description = "Invalid request, unknown user or unknown product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn create_cart(
    state: web::Data<AppState>,
    body: web::Json<CartRequest>,
) -> Result<HttpResponse, AppError> {
    let input = CartInput::from(body.into_inner());

    let cart = web::block(move || state.carts.create_cart(input)).await??;

    Ok(HttpResponse::Created().json(CartResponse::from(cart)))
}

#[utoipa::path(
    get,
    path = "/api/carts/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
    ),
    responses(
        (status = 200, description = "Cart found", body = CartResponse),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let cart = web::block(move || state.carts.get_cart(id)).await??;

    match cart {
        Some(cart) => Ok(HttpResponse::Ok().json(CartResponse::from(cart))),
        None => Err(AppError::NotFound(format!("Cart with id {} not found", id))),
    }
}

/// Newest first unless `_order` says otherwise.
#[utoipa::path(
    get,
    path = "/api/carts",
    params(
        ("_page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("_size" = Option<i64>, Query, description = "Items per page (default 10, at most 100)"),
        ("_order" = Option<String>, Query, description = "Fields: date, user_id, id"),
        ("_min_date" = Option<String>, Query, description = "Earliest cart date, RFC 3339"),
        ("_max_date" = Option<String>, Query, description = "Latest cart date, RFC 3339"),
    ),
    responses(
        (status = 200, description = "Paginated list of carts", body = CartListResponse),
        (status = 400, description = "Invalid paging parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn list_carts(
    state: web::Data<AppState>,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let query = list_query(params)?;
    let (page, size) = (query.page, query.size);

    let result = web::block(move || state.carts.list_carts(&query)).await??;

    Ok(HttpResponse::Ok().json(CartListResponse {
        total_pages: total_pages(result.total, size),
        total_items: result.total,
        current_page: page,
        items: result.items.into_iter().map(CartResponse::from).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/carts/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
    ),
    request_body = CartRequest,
    responses(
        (status = 200, description = "Cart replaced", body = CartResponse),
        (status = 400, description = "Invalid request, unknown user or unknown product"),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn update_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CartRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = CartInput::from(body.into_inner());

    let cart = web::block(move || state.carts.update_cart(id, input)).await??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

#[utoipa::path(
    delete,
    path = "/api/carts/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
    ),
    responses(
        (status = 204, description = "Cart deleted"),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn delete_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || state.carts.delete_cart(id)).await??;

    Ok(HttpResponse::NoContent().finish())
}
