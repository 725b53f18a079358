//! User (member) endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        linked,
        user::{CreateUser, UpdateUser, UserQuery},
        Deleted, Linked, ResourceRef, Upserted, User,
    },
    AppState,
};

use super::{ValidatedJson, ValidatedPath, ValidatedQuery};

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<Linked<User>>>> {
    let users = state.services.users.list().await?;
    Ok(Json(linked(users)))
}

/// Members who paid the most rent first, up to `limit`
pub async fn list_highest_paying_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserQuery>,
) -> AppResult<Json<Vec<Linked<User>>>> {
    let users = state.services.users.highest_paying(&query).await?;
    Ok(Json(linked(users)))
}

pub async fn get_user(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<Json<Linked<User>>> {
    let user = state.services.users.get(id).await?;
    Ok(Json(user.into()))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(user): ValidatedJson<CreateUser>,
) -> AppResult<(StatusCode, Json<ResourceRef>)> {
    let created = state.services.users.create(user).await?;
    Ok((StatusCode::CREATED, Json(ResourceRef::user(created.id))))
}

/// Partial update; creates the member when the id does not exist
pub async fn update_user(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
    ValidatedJson(changes): ValidatedJson<UpdateUser>,
) -> AppResult<Response> {
    let response = match state.services.users.upsert(id, changes).await? {
        Upserted::Created(user) => {
            (StatusCode::CREATED, Json(ResourceRef::user(user.id))).into_response()
        }
        Upserted::Updated(_) => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

pub async fn delete_user(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<Json<Deleted>> {
    let id = state.services.users.delete(id).await?;
    Ok(Json(Deleted { id }))
}
