//! Book endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookQuery, CreateBook, UpdateBook},
        linked, Book, Deleted, Linked, ResourceRef, Upserted,
    },
    services::books::BookListing,
    AppState,
};

use super::{ValidatedJson, ValidatedPath, ValidatedQuery};

/// List books; `title` / `author` turn the listing into a search
pub async fn list_books(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<BookQuery>,
) -> AppResult<Json<Vec<Linked<Book>>>> {
    let books = state.services.books.list(BookListing::All, &query).await?;
    Ok(Json(linked(books)))
}

/// Most rented books first, up to `limit`
pub async fn list_popular_books(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<BookQuery>,
) -> AppResult<Json<Vec<Linked<Book>>>> {
    let books = state.services.books.list(BookListing::Popular, &query).await?;
    Ok(Json(linked(books)))
}

pub async fn search_books(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<BookQuery>,
) -> AppResult<Json<Vec<Linked<Book>>>> {
    let books = state.services.books.list(BookListing::Search, &query).await?;
    Ok(Json(linked(books)))
}

pub async fn get_book(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<Json<Linked<Book>>> {
    let book = state.services.books.get(id).await?;
    Ok(Json(book.into()))
}

pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(book): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<ResourceRef>)> {
    let created = state.services.books.create(book).await?;
    Ok((StatusCode::CREATED, Json(ResourceRef::book(created.id))))
}

/// Partial update; creates the book when the id does not exist
pub async fn update_book(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
    ValidatedJson(changes): ValidatedJson<UpdateBook>,
) -> AppResult<Response> {
    let response = match state.services.books.upsert(id, changes).await? {
        Upserted::Created(book) => {
            (StatusCode::CREATED, Json(ResourceRef::book(book.id))).into_response()
        }
        Upserted::Updated(_) => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

pub async fn delete_book(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<Json<Deleted>> {
    let id = state.services.books.delete(id).await?;
    Ok(Json(Deleted { id }))
}
