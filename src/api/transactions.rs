//! Rental transaction endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{linked, transaction::CreateTransaction, Linked, ResourceRef, Transaction},
    AppState,
};

use super::{ValidatedJson, ValidatedPath};

pub async fn list_transactions(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Linked<Transaction>>>> {
    let transactions = state.services.transactions.list().await?;
    Ok(Json(linked(transactions)))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<Json<Linked<Transaction>>> {
    let transaction = state.services.transactions.get(id).await?;
    Ok(Json(transaction.into()))
}

/// Rent a book
pub async fn create_transaction(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTransaction>,
) -> AppResult<(StatusCode, Json<ResourceRef>)> {
    let transaction = state.services.transactions.rent(request).await?;
    Ok((StatusCode::CREATED, Json(ResourceRef::transaction(transaction.id))))
}

/// Return the rented copies.
///
/// Transactions cannot be edited; any request body, even `{}`, is refused
/// with 405.
pub async fn settle_transaction(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
    body: Bytes,
) -> AppResult<StatusCode> {
    if carries_body(&body) {
        return Err(AppError::MethodNotAllowed(
            "Transactions cannot be modified, only returned".to_string(),
        ));
    }

    state.services.transactions.settle(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn carries_body(body: &[u8]) -> bool {
    !body.iter().all(u8::is_ascii_whitespace)
}
