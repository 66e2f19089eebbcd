use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::pricing::{DraftItem, SaleDraft};
use crate::domain::sale::{Sale, SaleItem};
use crate::errors::AppError;
use crate::AppState;

use super::{list_query, total_pages};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaleItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Marks a single line as cancelled; it stays on the sale but no longer
    /// counts towards the total.
    #[serde(default)]
    pub is_cancelled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaleRequest {
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub items: Vec<SaleItemRequest>,
}

impl From<SaleRequest> for SaleDraft {
    fn from(req: SaleRequest) -> Self {
        SaleDraft {
            customer_id: req.customer_id,
            branch_id: req.branch_id,
            branch_name: req.branch_name,
            items: req
                .items
                .into_iter()
                .map(|i| DraftItem {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    is_cancelled: i.is_cancelled,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleItemResponse {
    pub product_id: Uuid,
    pub product_title: String,
    pub quantity: i32,
    /// Decimal amounts are strings to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub discount_percent: String,
    pub discount_value: String,
    pub gross_amount: String,
    pub net_amount: String,
    pub is_cancelled: bool,
}

impl From<SaleItem> for SaleItemResponse {
    fn from(item: SaleItem) -> Self {
        SaleItemResponse {
            product_id: item.product_id,
            product_title: item.product_title,
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            discount_percent: item.discount_percent.to_string(),
            discount_value: item.discount_value.to_string(),
            gross_amount: item.gross_amount.to_string(),
            net_amount: item.net_amount.to_string(),
            is_cancelled: item.is_cancelled,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleResponse {
    pub id: Uuid,
    pub number: i64,
    pub date: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub is_cancelled: bool,
    pub total_amount: String,
    pub items: Vec<SaleItemResponse>,
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        SaleResponse {
            id: sale.id,
            number: sale.number,
            date: sale.date.to_rfc3339(),
            customer_id: sale.customer_id,
            customer_name: sale.customer_name,
            branch_id: sale.branch_id,
            branch_name: sale.branch_name,
            is_cancelled: sale.is_cancelled,
            total_amount: sale.total_amount.to_string(),
            items: sale.items.into_iter().map(SaleItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleListResponse {
    pub items: Vec<SaleResponse>,
    pub total_items: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelSaleResponse {
    pub id: Uuid,
    pub is_cancelled: bool,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/sales
///
/// Prices the requested items against the current catalog and stores the
/// sale. The sale and its `SaleCreated` outbox entry are committed together.
#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = SaleRequest,
    responses(
        (status = 201, description = "Sale created", body = SaleResponse),
        (status = 400, description = "Invalid request or pricing rejected"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sales"
)]
pub async fn create_sale(
    state: web::Data<AppState>,
    body: web::Json<SaleRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = SaleDraft::from(body.into_inner());

    let sale = web::block(move || state.sales.create_sale(draft)).await??;

    Ok(HttpResponse::Created().json(SaleResponse::from(sale)))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    params(
        ("id" = Uuid, Path, description = "Sale UUID"),
    ),
    responses(
        (status = 200, description = "Sale found", body = SaleResponse),
        (status = 404, description = "Sale not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sales"
)]
pub async fn get_sale(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let sale = web::block(move || state.sales.get_sale(id)).await??;

    match sale {
        Some(sale) => Ok(HttpResponse::Ok().json(SaleResponse::from(sale))),
        None => Err(AppError::NotFound(format!("Sale with id {} not found", id))),
    }
}

/// GET /api/sales
///
/// Paginated, filterable list of sales, newest first unless `_order` says
/// otherwise.
#[utoipa::path(
    get,
    path = "/api/sales",
    params(
        ("_page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("_size" = Option<i64>, Query, description = "Items per page (default 10, at most 100)"),
        ("_order" = Option<String>, Query, description = "e.g. \"date desc, number\"; fields: number, date, total"),
        ("_max_number" = Option<i64>, Query, description = "Highest sale number"),
        ("_min_total_amount" = Option<String>, Query, description = "Lowest total"),
        ("_max_total_amount" = Option<String>, Query, description = "Highest total"),
        ("branch_name" = Option<String>, Query, description = "Branch name; `*` at either end for partial matches"),
        ("customer_name" = Option<String>, Query, description = "Customer name; `*` at either end for partial matches"),
    ),
    responses(
        (status = 200, description = "Paginated list of sales", body = SaleListResponse),
        (status = 400, description = "Invalid paging parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sales"
)]
pub async fn list_sales(
    state: web::Data<AppState>,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let query = list_query(params)?;
    let (page, size) = (query.page, query.size);

    let result = web::block(move || state.sales.list_sales(&query)).await??;

    Ok(HttpResponse::Ok().json(SaleListResponse {
        items: result.items.into_iter().map(SaleResponse::from).collect(),
        total_items: result.total,
        current_page: page,
        total_pages: total_pages(result.total, size),
    }))
}

/// PUT /api/sales/{id}
///
/// Replaces the customer, branch and items of a sale and prices it again.
/// Lines newly flagged as cancelled raise a `SaleItemCancelled` event each.
#[utoipa::path(
    put,
    path = "/api/sales/{id}",
    params(
        ("id" = Uuid, Path, description = "Sale UUID"),
    ),
    request_body = SaleRequest,
    responses(
        (status = 200, description = "Sale updated", body = SaleResponse),
        (status = 400, description = "Invalid request, pricing rejected or sale cancelled"),
        (status = 404, description = "Sale not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sales"
)]
pub async fn update_sale(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SaleRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let draft = SaleDraft::from(body.into_inner());

    let sale = web::block(move || state.sales.update_sale(id, draft)).await??;

    Ok(HttpResponse::Ok().json(SaleResponse::from(sale)))
}

/// DELETE /api/sales/{id}
///
/// Cancels the sale. Sales are never removed; cancelling twice succeeds.
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    params(
        ("id" = Uuid, Path, description = "Sale UUID"),
    ),
    responses(
        (status = 200, description = "Sale cancelled", body = CancelSaleResponse),
        (status = 404, description = "Sale not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sales"
)]
pub async fn cancel_sale(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let sale = web::block(move || state.sales.cancel_sale(id)).await??;

    Ok(HttpResponse::Ok().json(CancelSaleResponse {
        id: sale.id,
        is_cancelled: sale.is_cancelled,
    }))
}
