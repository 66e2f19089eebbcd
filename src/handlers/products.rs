use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::product::{Product, ProductInput, Rating};
use crate::domain::sale::ListResult;
use crate::errors::AppError;
use crate::AppState;

use super::{list_query, parse_decimal, total_pages};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RatingDto {
    /// Average rating as a decimal string, 0 to 5
    pub rate: String,
    pub count: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub title: String,
    /// Decimal price as a string, e.g. "9.99"
    pub price: String,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Option<RatingDto>,
}

impl ProductRequest {
    fn into_input(self) -> Result<ProductInput, AppError> {
        let rating = match self.rating {
            Some(r) => Rating {
                rate: parse_decimal("rating.rate", &r.rate)?,
                count: r.count,
            },
            None => Rating {
                rate: BigDecimal::from(0),
                count: 0,
            },
        };
        Ok(ProductInput {
            price: parse_decimal("price", &self.price)?,
            title: self.title,
            description: self.description,
            category: self.category,
            image: self.image,
            rating,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub title: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: RatingDto,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            title: p.title,
            price: p.price.to_string(),
            description: p.description,
            category: p.category,
            image: p.image,
            rating: RatingDto {
                rate: p.rating.rate.to_string(),
                count: p.rating.count,
            },
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub items: Vec<ProductResponse>,
    pub total_items: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

impl ProductListResponse {
    fn new(result: ListResult<Product>, page: i64, size: i64) -> Self {
        ProductListResponse {
            total_pages: total_pages(result.total, size),
            total_items: result.total,
            current_page: page,
            items: result.items.into_iter().map(ProductResponse::from).collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner().into_input()?;

    let product = web::block(move || state.products.create_product(input)).await??;

    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let product = web::block(move || state.products.get_product(id)).await??;

    match product {
        Some(product) => Ok(HttpResponse::Ok().json(ProductResponse::from(product))),
        None => Err(AppError::NotFound(format!("Product with id {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("_page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("_size" = Option<i64>, Query, description = "Items per page (default 10, at most 100)"),
        ("_order" = Option<String>, Query, description = "e.g. \"price desc, title\"; fields: title, price, category"),
        ("_min_price" = Option<String>, Query, description = "Lowest price"),
        ("_max_price" = Option<String>, Query, description = "Highest price"),
        ("title" = Option<String>, Query, description = "Title; `*` at either end for partial matches"),
        ("category" = Option<String>, Query, description = "Category; `*` at either end for partial matches"),
    ),
    responses(
        (status = 200, description = "Paginated list of products", body = ProductListResponse),
        (status = 400, description = "Invalid paging parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let query = list_query(params)?;
    let (page, size) = (query.page, query.size);

    let result = web::block(move || state.products.list_products(&query)).await??;

    Ok(HttpResponse::Ok().json(ProductListResponse::new(result, page, size)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = body.into_inner().into_input()?;

    let product = web::block(move || state.products.update_product(id, input)).await??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || state.products.delete_product(id)).await??;

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/products/categories",
    responses(
        (status = 200, description = "Distinct categories, sorted", body = Vec<String>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = web::block(move || state.products.categories()).await??;

    Ok(HttpResponse::Ok().json(categories))
}

#[utoipa::path(
    get,
    path = "/api/products/category/{category}",
    params(
        ("category" = String, Path, description = "Exact category name"),
        ("_page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("_size" = Option<i64>, Query, description = "Items per page (default 10, at most 100)"),
        ("_order" = Option<String>, Query, description = "Fields: title, price, category"),
    ),
    responses(
        (status = 200, description = "Paginated products of the category", body = ProductListResponse),
        (status = 400, description = "Invalid paging parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_by_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let category = path.into_inner();
    let query = list_query(params)?;
    let (page, size) = (query.page, query.size);

    let result =
        web::block(move || state.products.list_by_category(&category, &query)).await??;

    Ok(HttpResponse::Ok().json(ProductListResponse::new(result, page, size)))
}
