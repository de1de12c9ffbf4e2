//! Product catalog records: products, reviews, filters, and pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Price, ProductId, ReviewId};

/// A product as listed by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: u32,
}

impl Product {
    /// Whether the backend reports any units in stock.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: ReviewId,
    #[serde(default)]
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a review submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

/// Pagination descriptor returned alongside listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            total_items: 0,
            limit: 20,
        }
    }
}

impl Pagination {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Catalog filter set.
///
/// `None` and empty-string fields are omitted from the outgoing query so the
/// backend applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilters {
    pub query: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub min_rating: Option<f64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductFilters {
    /// Overwrite every field that is set in `patch`, keeping the rest.
    pub fn merge(&mut self, patch: Self) {
        let Self {
            query,
            category,
            min_price,
            max_price,
            min_rating,
            page,
            limit,
        } = patch;

        if query.is_some() {
            self.query = query;
        }
        if category.is_some() {
            self.category = category;
        }
        if min_price.is_some() {
            self.min_price = min_price;
        }
        if max_price.is_some() {
            self.max_price = max_price;
        }
        if min_rating.is_some() {
            self.min_rating = min_rating;
        }
        if page.is_some() {
            self.page = page;
        }
        if limit.is_some() {
            self.limit = limit;
        }
    }

    /// Query-string pairs for `GET /products`.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let text = |key: &'static str, value: Option<&String>| {
            value
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_owned()))
        };

        [
            text("query", self.query.as_ref()),
            text("category", self.category.as_ref()),
            self.min_price.map(|p| ("minPrice", p.amount().to_string())),
            self.max_price.map(|p| ("maxPrice", p.amount().to_string())),
            self.min_rating.map(|r| ("minRating", r.to_string())),
            self.page.map(|p| ("page", p.to_string())),
            self.limit.map(|l| ("limit", l.to_string())),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_query_omits_empty_fields() {
        let filters = ProductFilters {
            query: Some("   ".to_string()),
            category: Some("Electronics".to_string()),
            page: Some(1),
            ..ProductFilters::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![("category", "Electronics".to_string()), ("page", "1".to_string())]
        );
        assert!(ProductFilters::default().to_query().is_empty());
    }

    #[test]
    fn test_to_query_formats_prices_and_rating() {
        let filters = ProductFilters {
            min_price: Some(Price::from_cents(1000)),
            max_price: Some(Price::from_cents(25050)),
            min_rating: Some(4.5),
            ..ProductFilters::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("minPrice", "10.00".to_string()),
                ("maxPrice", "250.50".to_string()),
                ("minRating", "4.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut filters = ProductFilters {
            category: Some("Books".to_string()),
            page: Some(3),
            ..ProductFilters::default()
        };
        filters.merge(ProductFilters {
            page: Some(1),
            query: Some("rust".to_string()),
            ..ProductFilters::default()
        });
        assert_eq!(filters.category.as_deref(), Some("Books"));
        assert_eq!(filters.query.as_deref(), Some("rust"));
        assert_eq!(filters.page, Some(1));
    }

    #[test]
    fn test_product_defaults_optional_fields() {
        let product: Product =
            serde_json::from_str(r#"{"_id":"p1","name":"Lamp","price":12.5}"#).unwrap();
        assert_eq!(product.price, Price::from_cents(1250));
        assert!(!product.in_stock());
        assert!(product.images.is_empty());
    }
}
