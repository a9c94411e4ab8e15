use axum::Router;

pub mod categories;
pub mod parts;
pub mod system;

/// Router for all catalog endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/categories", categories::router())
        .nest("/parts", parts::router())
}
