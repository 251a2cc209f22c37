//! Book model and request payloads.
//!
//! `Book` mirrors a row of the `books` table. `in_stock` is never written by
//! callers: it always equals `stock_quantity > 0` (a generated column in
//! PostgreSQL, recomputed on write by the in-memory store).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Upper bound of the rating scale
pub const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Stored book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Option<Decimal>,
    pub page_count: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub stock_quantity: i32,
    /// Derived from `stock_quantity`
    pub in_stock: bool,
    pub rating: Decimal,
}

/// Stock status for a given quantity
pub fn in_stock(stock_quantity: i32) -> bool {
    stock_quantity > 0
}

/// Request body shared by create, full update and partial update.
///
/// Every field is optional on the wire; which ones matter depends on the
/// operation. An `inStock` key in the body is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub price: Option<Decimal>,
    pub page_count: Option<i32>,
    pub description: Option<String>,
    /// Only read on create
    pub category: Option<String>,
    /// Only read on create (defaults to 0)
    pub stock_quantity: Option<i32>,
    /// Only read on create (defaults to 0.0)
    pub rating: Option<Decimal>,
}

/// Column values handed to the store on insert.
///
/// Required columns stay optional so that the store's NOT NULL constraint is
/// what rejects a missing title, author or ISBN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub price: Option<Decimal>,
    pub page_count: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub stock_quantity: i32,
    pub rating: Decimal,
}

impl BookDraft {
    /// Draft for a new record, applying column defaults
    pub fn from_payload(payload: &BookPayload) -> Self {
        Self {
            title: payload.title.clone(),
            author: payload.author.clone(),
            isbn: payload.isbn.clone(),
            price: payload.price,
            page_count: payload.page_count,
            description: payload.description.clone(),
            category: payload.category.clone(),
            stock_quantity: payload.stock_quantity.unwrap_or(0),
            rating: payload.rating.unwrap_or(Decimal::ZERO),
        }
    }
}

/// The descriptive columns written by full and partial updates.
///
/// Category, stock and rating are not part of it: updates never write them,
/// so a concurrent stock change is never overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDetails {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub price: Option<Decimal>,
    pub page_count: Option<i32>,
    pub description: Option<String>,
}

impl BookDetails {
    pub fn from_payload(payload: &BookPayload) -> Self {
        Self {
            title: payload.title.clone(),
            author: payload.author.clone(),
            isbn: payload.isbn.clone(),
            price: payload.price,
            page_count: payload.page_count,
            description: payload.description.clone(),
        }
    }

    /// Copy the fields that are set onto `book`, leaving the others alone
    pub fn merge_into(&self, book: &mut Book) {
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(price) = self.price {
            book.price = Some(price);
        }
        if let Some(page_count) = self.page_count {
            book.page_count = Some(page_count);
        }
        if let Some(ref description) = self.description {
            book.description = Some(description.clone());
        }
    }
}

/// Predicate-based queries supported by the store
#[derive(Debug, Clone, PartialEq)]
pub enum BookFilter {
    /// Exact category match
    Category(String),
    /// Exact stock status match
    InStock(bool),
    /// `min <= price <= max`
    PriceRange { min: Decimal, max: Decimal },
    /// `rating >= min`
    MinRating(Decimal),
}

impl BookFilter {
    /// Evaluate the predicate against a record
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::Category(category) => book.category.as_deref() == Some(category.as_str()),
            BookFilter::InStock(flag) => book.in_stock == *flag,
            BookFilter::PriceRange { min, max } => {
                book.price.map_or(false, |p| *min <= p && p <= *max)
            }
            BookFilter::MinRating(min) => book.rating >= *min,
        }
    }
}

/// Free-text search query
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Matched case-insensitively against title, author and ISBN
    pub query: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CategoryQuery {
    pub category: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct StockStatusQuery {
    pub in_stock: bool,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeQuery {
    pub min_price: Decimal,
    pub max_price: Decimal,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct RatingQuery {
    pub min_rating: Decimal,
}

/// New stock level
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    /// Must not be negative
    pub quantity: i32,
}

/// Number of copies to take out of stock
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BuyQuery {
    /// At least 1
    pub quantity: i32,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SetRatingQuery {
    /// Between 0 and 5
    pub rating: Decimal,
}
