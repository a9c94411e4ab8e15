use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_parts).post(create_part))
        .route("/:serial", get(get_part).put(update_part).delete(delete_part))
}

pub async fn create_part(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PartRequest>,
) -> axum::response::Response {
    let (part, location) = match body.into_parts() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.parts.create(part, location).await {
        Ok(part) => (StatusCode::CREATED, Json(part)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

/// `GET /parts?t=QUERY`: all parts, or those matching the query.
pub async fn list_parts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::SearchParams>,
) -> axum::response::Response {
    match services.catalog.parts.list(params.t.as_deref()).await {
        Ok(parts) => Json(parts).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_part(
    Extension(services): Extension<Arc<AppServices>>,
    Path(serial): Path<String>,
) -> axum::response::Response {
    match services.catalog.parts.get(&serial).await {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_part(
    Extension(services): Extension<Arc<AppServices>>,
    Path(serial): Path<String>,
    Json(body): Json<dto::PartRequest>,
) -> axum::response::Response {
    let (part, location) = match body.into_parts() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.parts.update(&serial, part, location).await {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_part(
    Extension(services): Extension<Arc<AppServices>>,
    Path(serial): Path<String>,
) -> axum::response::Response {
    match services.catalog.parts.delete(&serial).await {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
