//! PostgreSQL book store

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{error::ErrorKind, Pool, Postgres};

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookDetails, BookDraft, BookFilter},
};

const BOOK_COLUMNS: &str = "id, title, author, isbn, price, page_count, description, \
                            category, stock_quantity, in_stock, rating";

/// Translate constraint violations raised by writes into domain errors
fn map_write_error(err: sqlx::Error) -> AppError {
    if let Some(db) = err.as_database_error() {
        match db.kind() {
            ErrorKind::UniqueViolation => {
                return AppError::Conflict("A book with this ISBN already exists".to_string());
            }
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                return AppError::Validation(db.message().to_string());
            }
            // numeric_value_out_of_range
            _ if db.code().as_deref() == Some("22003") => {
                return AppError::Validation(db.message().to_string());
            }
            _ => {}
        }
    }
    AppError::Database(err)
}

#[derive(Clone)]
pub struct PgBookStore {
    pool: Pool<Postgres>,
}

impl PgBookStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books ORDER BY id",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE isbn = $1",
            BOOK_COLUMNS
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(&self, draft: &BookDraft) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, isbn, price, page_count, description,
                               category, stock_quantity, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.isbn)
        .bind(draft.price)
        .bind(draft.page_count)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.stock_quantity)
        .bind(draft.rating)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn replace_details(&self, id: i64, details: &BookDetails) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, isbn = $4, price = $5, page_count = $6,
                description = $7
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(&details.title)
        .bind(&details.author)
        .bind(&details.isbn)
        .bind(details.price)
        .bind(details.page_count)
        .bind(&details.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn merge_details(&self, id: i64, details: &BookDetails) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                isbn = COALESCE($4, isbn),
                price = COALESCE($5, price),
                page_count = COALESCE($6, page_count),
                description = COALESCE($7, description)
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(&details.title)
        .bind(&details.author)
        .bind(&details.isbn)
        .bind(details.price)
        .bind(details.page_count)
        .bind(&details.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn set_stock(&self, id: i64, quantity: i32) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET stock_quantity = $2 WHERE id = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn withdraw_stock(&self, id: i64, quantity: i32) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET stock_quantity = stock_quantity - $2
            WHERE id = $1 AND stock_quantity >= $2
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn set_rating(&self, id: i64, rating: Decimal) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET rating = $2 WHERE id = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(rating)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Book>> {
        // strpos keeps '%' and '_' in the query literal
        let rows = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {} FROM books
            WHERE strpos(lower(title), lower($1)) > 0
               OR strpos(lower(author), lower($1)) > 0
               OR strpos(lower(isbn), lower($1)) > 0
            ORDER BY id
            "#,
            BOOK_COLUMNS
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn filter(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let select = format!("SELECT {} FROM books", BOOK_COLUMNS);

        let rows = match filter {
            BookFilter::Category(category) => {
                sqlx::query_as::<_, Book>(&format!("{} WHERE category = $1 ORDER BY id", select))
                    .bind(category.clone())
                    .fetch_all(&self.pool)
                    .await?
            }
            BookFilter::InStock(in_stock) => {
                sqlx::query_as::<_, Book>(&format!("{} WHERE in_stock = $1 ORDER BY id", select))
                    .bind(*in_stock)
                    .fetch_all(&self.pool)
                    .await?
            }
            BookFilter::PriceRange { min, max } => {
                sqlx::query_as::<_, Book>(&format!(
                    "{} WHERE price BETWEEN $1 AND $2 ORDER BY id",
                    select
                ))
                .bind(*min)
                .bind(*max)
                .fetch_all(&self.pool)
                .await?
            }
            BookFilter::MinRating(min) => {
                sqlx::query_as::<_, Book>(&format!("{} WHERE rating >= $1 ORDER BY id", select))
                    .bind(*min)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows)
    }

    async fn categories(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM books WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
