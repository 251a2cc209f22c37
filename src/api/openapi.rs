//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Inventory API",
        version = "0.1.0",
        description = "Book inventory REST API"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::patch_book,
        books::delete_book,
        books::search_books,
        books::get_book_by_isbn,
        books::list_categories,
        books::filter_by_category,
        books::filter_by_stock,
        books::filter_by_price,
        books::filter_by_rating,
        // Inventory
        books::update_stock,
        books::buy_book,
        books::update_rating,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::BookPayload,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "inventory", description = "Stock and rating management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
