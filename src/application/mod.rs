pub mod cart_service;
pub mod product_service;
pub mod sale_service;
pub mod user_service;
