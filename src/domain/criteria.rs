//! Paging, ordering and filtering parameters for list endpoints.
//!
//! A list request is a flat string map. Reserved keys start with `_`:
//! `_page`, `_size`, `_order`, plus `_min_<field>` / `_max_<field>` numeric
//! bounds. Any other key is a text search on the field of the same name,
//! where `*` at either end of the term selects the match mode.

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;

use super::errors::DomainError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Larger `_size` requests are served this many items per page.
pub const MAX_PAGE_SIZE: i64 = 100;

const PAGE_KEY: &str = "_page";
const SIZE_KEY: &str = "_size";
const ORDER_KEY: &str = "_order";
const MIN_PREFIX: &str = "_min_";
const MAX_PREFIX: &str = "_max_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Parses `"date desc, number"` into order clauses, lower-casing field
/// names. Anything but a literal `desc` direction means ascending.
pub fn parse_order(raw: &str) -> Vec<OrderBy> {
    raw.split(',')
        .filter_map(|part| {
            let mut segments = part.split_whitespace();
            let field = segments.next()?.to_lowercase();
            let descending = segments
                .next()
                .map(|d| d.eq_ignore_ascii_case("desc"))
                .unwrap_or(false);
            Some(OrderBy { field, descending })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPattern {
    Exact(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
}

impl SearchPattern {
    /// `*term*` → contains, `*term` → ends with, `term*` → starts with,
    /// anything else is an exact match. Blank terms yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        let term = raw.replace('*', "").trim().to_string();
        let pattern = match (raw.starts_with('*'), raw.ends_with('*')) {
            (true, true) => SearchPattern::Contains(term),
            (true, false) => SearchPattern::EndsWith(term),
            (false, true) => SearchPattern::StartsWith(term),
            (false, false) => SearchPattern::Exact(term),
        };
        Some(pattern)
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            SearchPattern::Exact(t) => value == t,
            SearchPattern::StartsWith(t) => value.starts_with(t.as_str()),
            SearchPattern::EndsWith(t) => value.ends_with(t.as_str()),
            SearchPattern::Contains(t) => value.contains(t.as_str()),
        }
    }

    /// SQL `LIKE` pattern, with the term's own wildcards escaped.
    pub fn to_like(&self) -> String {
        match self {
            SearchPattern::Exact(t) => escape_like(t),
            SearchPattern::StartsWith(t) => format!("{}%", escape_like(t)),
            SearchPattern::EndsWith(t) => format!("%{}", escape_like(t)),
            SearchPattern::Contains(t) => format!("%{}%", escape_like(t)),
        }
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: i64,
    pub size: i64,
    pub order: Vec<OrderBy>,
    filters: HashMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            order: Vec::new(),
            filters: HashMap::new(),
        }
    }
}

impl ListQuery {
    /// Builds a query from request parameters. Explicit non-positive
    /// `_page` / `_size` values are rejected; unparsable ones fall back to
    /// the defaults. `_size` is capped at [`MAX_PAGE_SIZE`], and a `_page`
    /// whose offset does not fit an `i64` is rejected.
    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self, DomainError> {
        let mut errors = Vec::new();
        let page = positive_param(&mut params, PAGE_KEY, 1, &mut errors);
        let size = positive_param(&mut params, SIZE_KEY, DEFAULT_PAGE_SIZE, &mut errors)
            .min(MAX_PAGE_SIZE);
        if (page - 1).checked_mul(size).is_none() {
            errors.push(format!("{}: is too large", PAGE_KEY));
        }
        if !errors.is_empty() {
            return Err(DomainError::InvalidInput(errors.join("; ")));
        }
        let order = params
            .remove(ORDER_KEY)
            .map(|o| parse_order(&o))
            .unwrap_or_default();

        Ok(Self {
            page,
            size,
            order,
            filters: params,
        })
    }

    pub fn paged(page: i64, size: i64) -> Self {
        Self {
            page: page.max(1),
            size: if size < 1 { DEFAULT_PAGE_SIZE } else { size.min(MAX_PAGE_SIZE) },
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        self.filters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn search(&self, field: &str) -> Option<SearchPattern> {
        self.filters.get(field).and_then(|v| SearchPattern::parse(v))
    }

    pub fn min<T: FromStr>(&self, field: &str) -> Option<T> {
        self.bound(MIN_PREFIX, field)
    }

    pub fn max<T: FromStr>(&self, field: &str) -> Option<T> {
        self.bound(MAX_PREFIX, field)
    }

    pub fn min_decimal(&self, field: &str) -> Option<BigDecimal> {
        self.min(field)
    }

    pub fn max_decimal(&self, field: &str) -> Option<BigDecimal> {
        self.max(field)
    }

    fn bound<T: FromStr>(&self, prefix: &str, field: &str) -> Option<T> {
        self.filters
            .get(&format!("{}{}", prefix, field))
            .and_then(|v| v.trim().parse().ok())
    }

    /// Slices an already filtered and ordered collection to this page.
    pub fn page_of<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(self.size).unwrap_or(0))
            .collect()
    }
}

fn positive_param(
    params: &mut HashMap<String, String>,
    key: &str,
    default: i64,
    errors: &mut Vec<String>,
) -> i64 {
    match params.remove(key).and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(v) if v > 0 => v,
        Some(_) => {
            errors.push(format!("{}: must be greater than 0", key));
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let q = ListQuery::from_params(HashMap::new()).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.size, DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);
        assert!(q.order.is_empty());
    }

    #[test]
    fn reads_page_size_and_order() {
        let q = ListQuery::from_params(params(&[
            ("_page", "3"),
            ("_size", "5"),
            ("_order", "Date desc, number"),
        ]))
        .unwrap();
        assert_eq!(q.offset(), 10);
        assert_eq!(
            q.order,
            vec![
                OrderBy { field: "date".to_string(), descending: true },
                OrderBy { field: "number".to_string(), descending: false },
            ]
        );
    }

    #[test]
    fn rejects_non_positive_paging() {
        let err = ListQuery::from_params(params(&[("_page", "0"), ("_size", "-1")])).unwrap_err();
        let DomainError::InvalidInput(msg) = err else {
            panic!("expected InvalidInput");
        };
        assert!(msg.contains("_page"));
        assert!(msg.contains("_size"));
    }

    #[test]
    fn size_is_capped() {
        let q = ListQuery::from_params(params(&[("_size", "9223372036854775807")])).unwrap();
        assert_eq!(q.size, MAX_PAGE_SIZE);
        assert_eq!(ListQuery::paged(1, 500).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn page_past_the_offset_range_is_rejected() {
        let err = ListQuery::from_params(params(&[("_page", "9223372036854775807")])).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(msg) if msg.contains("_page")));

        let q = ListQuery::from_params(params(&[("_page", "92233720368547758"), ("_size", "100")]))
            .unwrap();
        assert_eq!(q.offset(), 9_223_372_036_854_775_700);
        assert!(q.page_of(vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn ignores_unparsable_paging() {
        let q = ListQuery::from_params(params(&[("_page", "two")])).unwrap();
        assert_eq!(q.page, 1);
    }

    #[test]
    fn order_direction_is_case_insensitive_and_blank_parts_skipped() {
        let order = parse_order("total DESC,, title asc ,price");
        assert_eq!(order.len(), 3);
        assert!(order[0].descending);
        assert!(!order[1].descending);
        assert_eq!(order[2].field, "price");
    }

    #[test]
    fn wildcards_choose_the_match_mode() {
        assert_eq!(SearchPattern::parse("abc"), Some(SearchPattern::Exact("abc".into())));
        assert_eq!(SearchPattern::parse("abc*"), Some(SearchPattern::StartsWith("abc".into())));
        assert_eq!(SearchPattern::parse("*abc"), Some(SearchPattern::EndsWith("abc".into())));
        assert_eq!(SearchPattern::parse("*abc*"), Some(SearchPattern::Contains("abc".into())));
        assert_eq!(SearchPattern::parse("   "), None);
    }

    #[test]
    fn patterns_match_in_memory_and_render_as_like() {
        let p = SearchPattern::parse("*town").unwrap();
        assert!(p.matches("Downtown"));
        assert!(!p.matches("Uptown Mall"));
        assert_eq!(p.to_like(), "%town");
        assert_eq!(SearchPattern::Contains("50%".into()).to_like(), "%50\\%%");
    }

    #[test]
    fn numeric_bounds_use_prefixed_keys() {
        let q = ListQuery::from_params(params(&[
            ("_min_price", "10.5"),
            ("_max_price", "oops"),
            ("_max_number", "42"),
        ]))
        .unwrap();
        assert_eq!(q.min_decimal("price"), Some("10.5".parse().unwrap()));
        assert_eq!(q.max_decimal("price"), None);
        assert_eq!(q.max::<i64>("number"), Some(42));
    }

    #[test]
    fn search_reads_unreserved_keys() {
        let q = ListQuery::default().with_filter("branch_name", "Down*");
        assert_eq!(q.search("branch_name"), Some(SearchPattern::StartsWith("Down".into())));
        assert_eq!(q.search("customer_name"), None);
    }

    #[test]
    fn page_of_slices_the_requested_window() {
        let q = ListQuery::paged(2, 3);
        assert_eq!(q.page_of((1..=8).collect()), vec![4, 5, 6]);
        assert!(ListQuery::paged(4, 3).page_of((1..=8).collect::<Vec<_>>()).is_empty());
    }
}
