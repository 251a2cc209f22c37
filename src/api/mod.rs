//! API handlers and routing for the book inventory REST endpoints

pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // Cross-origin requests are allowed from anywhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .patch(books::patch_book)
                .delete(books::delete_book),
        )
        // Search and filters
        .route("/books/search", get(books::search_books))
        .route("/books/isbn/:isbn", get(books::get_book_by_isbn))
        .route("/books/categories", get(books::list_categories))
        .route("/books/filter/category", get(books::filter_by_category))
        .route("/books/filter/stock", get(books::filter_by_stock))
        .route("/books/filter/price", get(books::filter_by_price))
        .route("/books/filter/rating", get(books::filter_by_rating))
        // Inventory
        .route("/books/:id/stock", put(books::update_stock))
        .route("/books/:id/buy", post(books::buy_book))
        .route("/books/:id/rating", put(books::update_rating))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
