//! API handlers for eLibrary REST endpoints

pub mod books;
pub mod health;
pub mod transactions;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{error::AppError, AppState};

/// JSON body extractor that also runs the body's `validator` rules.
///
/// Malformed JSON, missing required fields and rule violations all become
/// `400 Bad Request` with the details in `message`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Path parameters; a segment that does not parse is a `400` with a JSON body
pub struct ValidatedPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(ValidatedPath(value))
    }
}

/// Query string parameters, rejected the same way as [`ValidatedPath`]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(ValidatedQuery(value))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books/", get(books::list_books).post(books::create_book))
        .route("/books/popular/", get(books::list_popular_books))
        .route("/books/search/", get(books::search_books))
        .route(
            "/books/:id/",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Users
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/highest_paying/", get(users::list_highest_paying_users))
        .route(
            "/users/:id/",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Transactions
        .route(
            "/transactions/",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route(
            "/transactions/:id/",
            get(transactions::get_transaction).put(transactions::settle_transaction),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
