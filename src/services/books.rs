//! Book inventory service

use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookDetails, BookDraft, BookFilter, BookPayload, MAX_RATING},
    repository::Repository,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check that the underlying store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        self.repository
            .books
            .find_by_isbn(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Create a book. Missing title/author/ISBN and duplicate ISBNs are
    /// rejected by the store.
    pub async fn create(&self, payload: &BookPayload) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .insert(&BookDraft::from_payload(payload))
            .await?;
        tracing::info!("Created book id={} isbn={}", book.id, book.isbn);
        Ok(book)
    }

    /// Replace title, author, ISBN, price, page count and description with the
    /// payload's values, absent ones included.
    pub async fn update(&self, id: i64, payload: &BookPayload) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .replace_details(id, &BookDetails::from_payload(payload))
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::debug!("Updated book id={}", id);
        Ok(book)
    }

    /// Same field set as `update`, but only fields present in the payload
    /// are written.
    pub async fn patch(&self, id: i64, payload: &BookPayload) -> AppResult<Book> {
        let details = BookDetails::from_payload(payload);
        if details == BookDetails::default() {
            return self.get_by_id(id).await;
        }
        let book = self
            .repository
            .books
            .merge_details(id, &details)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::debug!("Patched book id={}", id);
        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    /// Books whose title, author or ISBN contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }

    pub async fn filter_by_category(&self, category: &str) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .filter(&BookFilter::Category(category.to_string()))
            .await
    }

    pub async fn filter_by_stock(&self, in_stock: bool) -> AppResult<Vec<Book>> {
        self.repository.books.filter(&BookFilter::InStock(in_stock)).await
    }

    /// Inclusive on both ends; an inverted range matches nothing
    pub async fn filter_by_price(&self, min: Decimal, max: Decimal) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .filter(&BookFilter::PriceRange { min, max })
            .await
    }

    pub async fn filter_by_rating(&self, min_rating: Decimal) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .filter(&BookFilter::MinRating(min_rating))
            .await
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.repository.books.categories().await
    }

    /// Set the stock level; `in_stock` follows it.
    pub async fn set_stock(&self, id: i64, quantity: i32) -> AppResult<Book> {
        if quantity < 0 {
            return Err(AppError::Validation(
                "Stock quantity cannot be negative".to_string(),
            ));
        }
        let book = self
            .repository
            .books
            .set_stock(id, quantity)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Stock of book id={} set to {}", id, quantity);
        Ok(book)
    }

    /// Take `quantity` copies out of stock
    pub async fn buy(&self, id: i64, quantity: i32) -> AppResult<Book> {
        if quantity < 1 {
            return Err(AppError::Validation("Quantity must be at least 1".to_string()));
        }

        if let Some(book) = self.repository.books.withdraw_stock(id, quantity).await? {
            tracing::info!(
                "Sold {} cop(ies) of book id={}, {} left",
                quantity, id, book.stock_quantity
            );
            return Ok(book);
        }

        // Either the book is gone or there are not enough copies
        let existing = self.get_by_id(id).await?;
        Err(AppError::BusinessRule(format!(
            "Insufficient stock for book {}: requested {}, available {}",
            id, quantity, existing.stock_quantity
        )))
    }

    pub async fn set_rating(&self, id: i64, rating: Decimal) -> AppResult<Book> {
        if rating < Decimal::ZERO || rating > MAX_RATING {
            return Err(AppError::Validation(format!(
                "Rating must be between 0 and {}",
                MAX_RATING
            )));
        }
        self.repository
            .books
            .set_rating(id, rating)
            .await?
            .ok_or_else(|| not_found(id))
    }
}
