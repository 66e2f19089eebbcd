pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::cart_service::CartService;
use application::product_service::ProductService;
use application::sale_service::SaleService;
use application::user_service::UserService;
use domain::errors::DomainError;
use domain::events::EventDispatcher;
use domain::ports::{CartRepository, ProductRepository, SaleRepository, UserRepository};
use infrastructure::cart_repo::DieselCartRepository;
use infrastructure::memory::{
    InMemoryCartRepository, InMemoryProductRepository, InMemorySaleRepository,
    InMemoryUserRepository,
};
use infrastructure::product_repo::DieselProductRepository;
use infrastructure::sale_repo::DieselSaleRepository;
use infrastructure::user_repo::DieselUserRepository;

pub use config::Settings;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("Failed to run migrations: {}", e)))?;
    log::info!("{} pending migration(s) applied", applied.len());
    Ok(())
}

/// The services every handler reaches through `web::Data<AppState>`.
pub struct AppState {
    pub sales: SaleService,
    pub products: ProductService,
    pub users: UserService,
    pub carts: CartService,
}

impl AppState {
    pub fn new(
        sales: Arc<dyn SaleRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        carts: Arc<dyn CartRepository>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            sales: SaleService::new(sales, products.clone(), users.clone(), events.clone()),
            carts: CartService::new(carts, products.clone(), users.clone()),
            products: ProductService::new(products),
            users: UserService::new(users, events),
        }
    }

    /// PostgreSQL-backed state with the logging event handlers.
    pub fn with_pool(pool: DbPool) -> Self {
        Self::new(
            Arc::new(DieselSaleRepository::new(pool.clone())),
            Arc::new(DieselProductRepository::new(pool.clone())),
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselCartRepository::new(pool)),
            Arc::new(EventDispatcher::with_logging()),
        )
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemorySaleRepository::new()),
            Arc::new(InMemoryProductRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryCartRepository::new()),
            Arc::new(EventDispatcher::with_logging()),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sales API",
        version = "0.1.0",
        description = "Sales with quantity-tiered discounts, plus the product catalog, users and shopping carts they refer to."
    ),
    tags(
        (name = "sales", description = "Sales and pricing"),
        (name = "products", description = "Product catalog"),
        (name = "users", description = "Customers and staff"),
        (name = "carts", description = "Shopping carts")
    ),
    paths(
        handlers::sales::create_sale,
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::update_sale,
        handlers::sales::cancel_sale,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::list_categories,
        handlers::products::list_by_category,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::carts::create_cart,
        handlers::carts::list_carts,
        handlers::carts::get_cart,
        handlers::carts::update_cart,
        handlers::carts::delete_cart,
    )
)]
pub struct ApiDoc;

/// Registers the `/api` routes. The literal product routes come before
/// `/{id}` so they are not parsed as ids.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use handlers::{carts, products, sales, users};

    cfg.configure(handlers::extractor_config)
        .service(
            web::scope("/api/sales")
                .route("", web::post().to(sales::create_sale))
                .route("", web::get().to(sales::list_sales))
                .route("/{id}", web::get().to(sales::get_sale))
                .route("/{id}", web::put().to(sales::update_sale))
                .route("/{id}", web::delete().to(sales::cancel_sale)),
        )
        .service(
            web::scope("/api/products")
                .route("", web::post().to(products::create_product))
                .route("", web::get().to(products::list_products))
                .route("/categories", web::get().to(products::list_categories))
                .route("/category/{category}", web::get().to(products::list_by_category))
                .route("/{id}", web::get().to(products::get_product))
                .route("/{id}", web::put().to(products::update_product))
                .route("/{id}", web::delete().to(products::delete_product)),
        )
        .service(
            web::scope("/api/users")
                .route("", web::post().to(users::create_user))
                .route("", web::get().to(users::list_users))
                .route("/{id}", web::get().to(users::get_user))
                .route("/{id}", web::put().to(users::update_user))
                .route("/{id}", web::delete().to(users::delete_user)),
        )
        .service(
            web::scope("/api/carts")
                .route("", web::post().to(carts::create_cart))
                .route("", web::get().to(carts::list_carts))
                .route("/{id}", web::get().to(carts::get_cart))
                .route("/{id}", web::put().to(carts::update_cart))
                .route("/{id}", web::delete().to(carts::delete_cart)),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
