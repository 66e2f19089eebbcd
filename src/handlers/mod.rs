pub mod carts;
pub mod products;
pub mod sales;
pub mod users;

use std::collections::HashMap;
use std::str::FromStr;

use actix_web::web;
use bigdecimal::BigDecimal;

use crate::domain::criteria::ListQuery;
use crate::errors::AppError;

/// Turns malformed JSON bodies and path segments into the API's own 400
/// body instead of actix's plain-text defaults.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    );
}

pub(crate) fn list_query(params: web::Query<HashMap<String, String>>) -> Result<ListQuery, AppError> {
    Ok(ListQuery::from_params(params.into_inner())?)
}

/// Decimal amounts travel as strings, e.g. "9.99".
pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("{}: '{}' is not a valid decimal", field, raw)))
}

/// Number of pages needed for `total` items at `size` per page.
pub(crate) fn total_pages(total: i64, size: i64) -> i64 {
    if size <= 0 {
        return 0;
    }
    total / size + i64::from(total % size != 0)
}
