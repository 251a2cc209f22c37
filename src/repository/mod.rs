//! Repository layer for book storage

pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    error::AppResult,
    models::book::{Book, BookDetails, BookDraft, BookFilter},
};

pub use books::PgBookStore;
pub use memory::InMemoryBookStore;

/// Persistence contract for books.
///
/// Implementations own the table constraints: a store-assigned id, NOT NULL
/// title/author/isbn (reported as `AppError::Validation`), a unique ISBN
/// (reported as `AppError::Conflict`), and `in_stock` derived from the
/// stock quantity on every write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;

    /// All books ordered by id
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    /// Insert a new row, returning it with its assigned id
    async fn insert(&self, draft: &BookDraft) -> AppResult<Book>;

    /// Write all six descriptive columns, nulls included.
    /// Category, stock and rating are untouched. `None` if the id does not exist.
    async fn replace_details(&self, id: i64, details: &BookDetails) -> AppResult<Option<Book>>;

    /// Write only the descriptive columns that are set in `details`
    async fn merge_details(&self, id: i64, details: &BookDetails) -> AppResult<Option<Book>>;

    async fn set_stock(&self, id: i64, quantity: i32) -> AppResult<Option<Book>>;

    /// Atomically take `quantity` copies out of stock.
    /// `None` if the id does not exist or fewer copies are available.
    async fn withdraw_stock(&self, id: i64, quantity: i32) -> AppResult<Option<Book>>;

    async fn set_rating(&self, id: i64, rating: Decimal) -> AppResult<Option<Book>>;

    /// Returns false if nothing was deleted
    async fn delete(&self, id: i64) -> AppResult<bool>;

    /// Case-insensitive substring match on title, author or ISBN
    async fn search(&self, query: &str) -> AppResult<Vec<Book>>;

    async fn filter(&self, filter: &BookFilter) -> AppResult<Vec<Book>>;

    /// Distinct non-null categories, sorted
    async fn categories(&self) -> AppResult<Vec<String>>;
}

/// Main repository struct holding the book store handle
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    /// Create a new repository over the given store
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::new(Arc::new(PgBookStore::new(pool)))
    }

    /// Repository backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBookStore::new()))
    }
}
