//! In-memory book store.
//!
//! Enforces the same constraints as the `books` table so that services and
//! routes behave identically against it.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{in_stock, Book, BookDetails, BookDraft, BookFilter, MAX_RATING},
};

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Book>,
}

impl Table {
    fn isbn_taken(&self, isbn: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except)
    }

    /// Build a row from a draft, checking column constraints
    fn to_row(&self, id: i64, draft: &BookDraft) -> AppResult<Book> {
        let title = required(&draft.title, "title")?;
        let author = required(&draft.author, "author")?;
        let isbn = required(&draft.isbn, "isbn")?;

        check_stock(draft.stock_quantity)?;
        check_rating(draft.rating)?;

        if self.isbn_taken(&isbn, Some(id)) {
            return Err(AppError::Conflict(
                "A book with this ISBN already exists".to_string(),
            ));
        }

        Ok(Book {
            id,
            title,
            author,
            isbn,
            price: draft.price,
            page_count: draft.page_count,
            description: draft.description.clone(),
            category: draft.category.clone(),
            stock_quantity: draft.stock_quantity,
            in_stock: in_stock(draft.stock_quantity),
            rating: draft.rating,
        })
    }

    /// Apply `change` to a copy of the stored row and keep it only if every
    /// constraint still holds. `None` if the id does not exist.
    fn write_row<F>(&mut self, id: i64, change: F) -> AppResult<Option<Book>>
    where
        F: FnOnce(&mut Book) -> AppResult<()>,
    {
        let Some(current) = self.rows.get(&id) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        change(&mut updated)?;

        if self.isbn_taken(&updated.isbn, Some(id)) {
            return Err(AppError::Conflict(
                "A book with this ISBN already exists".to_string(),
            ));
        }

        self.rows.insert(id, updated.clone());
        Ok(Some(updated))
    }
}

fn required(value: &Option<String>, column: &str) -> AppResult<String> {
    value.clone().ok_or_else(|| {
        AppError::Validation(format!(
            "null value in column \"{}\" violates not-null constraint",
            column
        ))
    })
}

fn check_stock(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::Validation(
            "stock_quantity violates check constraint".to_string(),
        ));
    }
    Ok(())
}

fn check_rating(rating: Decimal) -> AppResult<()> {
    if rating < Decimal::ZERO || rating > MAX_RATING {
        return Err(AppError::Validation(
            "rating violates check constraint".to_string(),
        ));
    }
    Ok(())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[derive(Default)]
pub struct InMemoryBookStore {
    table: RwLock<Table>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn insert(&self, draft: &BookDraft) -> AppResult<Book> {
        let mut table = self.table.write().await;
        let id = table.last_id + 1;
        let book = table.to_row(id, draft)?;
        // Ids are only consumed by successful inserts
        table.last_id = id;
        table.rows.insert(id, book.clone());
        Ok(book)
    }

    async fn replace_details(&self, id: i64, details: &BookDetails) -> AppResult<Option<Book>> {
        let mut table = self.table.write().await;
        table.write_row(id, |book| {
            book.title = required(&details.title, "title")?;
            book.author = required(&details.author, "author")?;
            book.isbn = required(&details.isbn, "isbn")?;
            book.price = details.price;
            book.page_count = details.page_count;
            book.description = details.description.clone();
            Ok(())
        })
    }

    async fn merge_details(&self, id: i64, details: &BookDetails) -> AppResult<Option<Book>> {
        let mut table = self.table.write().await;
        table.write_row(id, |book| {
            details.merge_into(book);
            Ok(())
        })
    }

    async fn set_stock(&self, id: i64, quantity: i32) -> AppResult<Option<Book>> {
        check_stock(quantity)?;
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|book| {
            book.stock_quantity = quantity;
            book.in_stock = in_stock(quantity);
            book.clone()
        }))
    }

    async fn withdraw_stock(&self, id: i64, quantity: i32) -> AppResult<Option<Book>> {
        let mut table = self.table.write().await;
        Ok(table
            .rows
            .get_mut(&id)
            .filter(|book| book.stock_quantity >= quantity)
            .map(|book| {
                book.stock_quantity -= quantity;
                book.in_stock = in_stock(book.stock_quantity);
                book.clone()
            }))
    }

    async fn set_rating(&self, id: i64, rating: Decimal) -> AppResult<Option<Book>> {
        check_rating(rating)?;
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|book| {
            book.rating = rating;
            book.clone()
        }))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Book>> {
        let needle = query.to_lowercase();
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|b| {
                contains_ignore_case(&b.title, &needle)
                    || contains_ignore_case(&b.author, &needle)
                    || contains_ignore_case(&b.isbn, &needle)
            })
            .cloned()
            .collect())
    }

    async fn filter(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn categories(&self) -> AppResult<Vec<String>> {
        let table = self.table.read().await;
        let categories: BTreeSet<String> = table
            .rows
            .values()
            .filter_map(|b| b.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, author: &str, isbn: &str) -> BookDraft {
        BookDraft {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            isbn: Some(isbn.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryBookStore::new();
        let first = store.insert(&draft("Dune", "Herbert", "111")).await.unwrap();
        let second = store.insert(&draft("Emma", "Austen", "222")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_failed_insert_does_not_consume_id() {
        let store = InMemoryBookStore::new();
        store.insert(&draft("Dune", "Herbert", "111")).await.unwrap();
        assert!(store.insert(&draft("Copy", "Nobody", "111")).await.is_err());
        let next = store.insert(&draft("Emma", "Austen", "222")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_not_null_columns() {
        let store = InMemoryBookStore::new();
        let mut missing_author = draft("Dune", "Herbert", "111");
        missing_author.author = None;

        let err = store.insert(&missing_author).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("author")));
        assert!(store.list().await.unwrap().is_empty());
    }

    fn details(title: &str, author: &str, isbn: &str) -> BookDetails {
        BookDetails {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            isbn: Some(isbn.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_replace_may_keep_own_isbn_but_not_take_another() {
        let store = InMemoryBookStore::new();
        let dune = store.insert(&draft("Dune", "Herbert", "111")).await.unwrap();
        store.insert(&draft("Emma", "Austen", "222")).await.unwrap();

        let renamed = store
            .replace_details(dune.id, &details("Dune (2nd ed.)", "Herbert", "111"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.title, "Dune (2nd ed.)");

        let err = store
            .merge_details(
                dune.id,
                &BookDetails {
                    isbn: Some("222".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.find_by_id(dune.id).await.unwrap().unwrap().isbn, "111");
    }

    #[tokio::test]
    async fn test_replace_leaves_inventory_columns() {
        let store = InMemoryBookStore::new();
        let mut d = draft("Dune", "Herbert", "111");
        d.category = Some("SF".to_string());
        d.stock_quantity = 3;
        d.rating = Decimal::new(4, 0);
        let dune = store.insert(&d).await.unwrap();
        store.withdraw_stock(dune.id, 3).await.unwrap();

        let replaced = store
            .replace_details(dune.id, &details("Dune", "Herbert", "111"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.category.as_deref(), Some("SF"));
        assert_eq!(replaced.stock_quantity, 0);
        assert!(!replaced.in_stock);
        assert_eq!(replaced.rating, Decimal::new(4, 0));
    }

    #[tokio::test]
    async fn test_replace_requires_title() {
        let store = InMemoryBookStore::new();
        let dune = store.insert(&draft("Dune", "Herbert", "111")).await.unwrap();
        let mut untitled = details("Dune", "Herbert", "111");
        untitled.title = None;

        let err = store.replace_details(dune.id, &untitled).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("title")));
        assert_eq!(store.find_by_id(dune.id).await.unwrap().unwrap(), dune);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = InMemoryBookStore::new();
        let replaced = store
            .replace_details(42, &details("Dune", "Herbert", "111"))
            .await
            .unwrap();
        assert!(replaced.is_none());
        let merged = store.merge_details(42, &BookDetails::default()).await.unwrap();
        assert!(merged.is_none());
    }

    #[tokio::test]
    async fn test_withdraw_stock_never_goes_negative() {
        let store = InMemoryBookStore::new();
        let mut d = draft("Dune", "Herbert", "111");
        d.stock_quantity = 2;
        let book = store.insert(&d).await.unwrap();

        assert!(store.withdraw_stock(book.id, 3).await.unwrap().is_none());
        let after = store.withdraw_stock(book.id, 2).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 0);
        assert!(!after.in_stock);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let store = InMemoryBookStore::new();
        store.insert(&draft("100% Pure", "Anon", "111")).await.unwrap();
        store.insert(&draft("Dune", "Herbert", "222")).await.unwrap();

        let hits = store.search("0%").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% Pure");
    }

    #[tokio::test]
    async fn test_categories_are_distinct_and_sorted() {
        let store = InMemoryBookStore::new();
        for (isbn, category) in [("1", Some("SF")), ("2", None), ("3", Some("Classic")), ("4", Some("SF"))] {
            let mut d = draft("T", "A", isbn);
            d.category = category.map(str::to_string);
            store.insert(&d).await.unwrap();
        }
        assert_eq!(store.categories().await.unwrap(), vec!["Classic", "SF"]);
    }
}
