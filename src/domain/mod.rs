pub mod cart;
pub mod criteria;
pub mod errors;
pub mod events;
pub mod ports;
pub mod pricing;
pub mod product;
pub mod sale;
pub mod user;
pub mod validation;
