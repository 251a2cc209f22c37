//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{
        Book, BookPayload, BuyQuery, CategoryQuery, PriceRangeQuery, RatingQuery, SearchQuery,
        SetRatingQuery, StockQuery, StockStatusQuery,
    },
    AppState,
};

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Missing title, author or ISBN", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<BookPayload>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace a book's descriptive fields
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Missing title, author or ISBN", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.update(id, &payload).await?;
    Ok(Json(book))
}

/// Update only the fields present in the body
#[utoipa::path(
    patch,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn patch_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.patch(id, &payload).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Search title, author and ISBN
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.search(&query.query).await?;
    Ok(Json(books))
}

/// Get a book by exact ISBN
#[utoipa::path(
    get,
    path = "/books/isbn/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "ISBN")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_by_isbn(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_isbn(&isbn).await?;
    Ok(Json(book))
}

#[utoipa::path(
    get,
    path = "/books/filter/category",
    tag = "books",
    params(CategoryQuery),
    responses(
        (status = 200, description = "Books in the category", body = Vec<Book>)
    )
)]
pub async fn filter_by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.filter_by_category(&query.category).await?;
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/books/filter/stock",
    tag = "books",
    params(StockStatusQuery),
    responses(
        (status = 200, description = "Books with the given stock status", body = Vec<Book>)
    )
)]
pub async fn filter_by_stock(
    State(state): State<AppState>,
    Query(query): Query<StockStatusQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.filter_by_stock(query.in_stock).await?;
    Ok(Json(books))
}

/// Books priced within `[minPrice, maxPrice]`
#[utoipa::path(
    get,
    path = "/books/filter/price",
    tag = "books",
    params(PriceRangeQuery),
    responses(
        (status = 200, description = "Books in the price range", body = Vec<Book>)
    )
)]
pub async fn filter_by_price(
    State(state): State<AppState>,
    Query(query): Query<PriceRangeQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state
        .services
        .books
        .filter_by_price(query.min_price, query.max_price)
        .await?;
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/books/filter/rating",
    tag = "books",
    params(RatingQuery),
    responses(
        (status = 200, description = "Books rated at least minRating", body = Vec<Book>)
    )
)]
pub async fn filter_by_rating(
    State(state): State<AppState>,
    Query(query): Query<RatingQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.filter_by_rating(query.min_rating).await?;
    Ok(Json(books))
}

/// Distinct categories in use
#[utoipa::path(
    get,
    path = "/books/categories",
    tag = "books",
    responses(
        (status = 200, description = "Category names", body = Vec<String>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let categories = state.services.books.categories().await?;
    Ok(Json(categories))
}

/// Set the stock level
#[utoipa::path(
    put,
    path = "/books/{id}/stock",
    tag = "inventory",
    params(("id" = i64, Path, description = "Book ID"), StockQuery),
    responses(
        (status = 200, description = "Stock updated", body = Book),
        (status = 400, description = "Negative quantity", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.set_stock(id, query.quantity).await?;
    Ok(Json(book))
}

/// Sell copies of a book
#[utoipa::path(
    post,
    path = "/books/{id}/buy",
    tag = "inventory",
    params(("id" = i64, Path, description = "Book ID"), BuyQuery),
    responses(
        (status = 200, description = "Purchase recorded", body = Book),
        (status = 400, description = "Quantity below 1", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Not enough copies in stock", body = crate::error::ErrorResponse)
    )
)]
pub async fn buy_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<BuyQuery>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.buy(id, query.quantity).await?;
    Ok(Json(book))
}

/// Set the rating (0 to 5)
#[utoipa::path(
    put,
    path = "/books/{id}/rating",
    tag = "inventory",
    params(("id" = i64, Path, description = "Book ID"), SetRatingQuery),
    responses(
        (status = 200, description = "Rating updated", body = Book),
        (status = 400, description = "Rating out of range", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_rating(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SetRatingQuery>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.set_rating(id, query.rating).await?;
    Ok(Json(book))
}
