//! PostgreSQL store
//!
//! Expects the tables from `sql/schema.sql`.

mod books;
mod transactions;
mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use super::LibraryStore;
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{
        book::{CreateBook, UpdateBook},
        transaction::{NewRental, Settlement},
        user::{CreateUser, UpdateUser},
        Book, Transaction, User,
    },
};

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgRepository {
    pool: Pool<Postgres>,
}

impl PgRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create the connection pool described by `config`
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }
}

/// Map a unique-constraint violation to a conflict, anything else to a database error
fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict {
            message: message.to_string(),
            url: None,
        },
        other => AppError::Database(other),
    }
}

#[async_trait]
impl LibraryStore for PgRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn books_list(&self) -> AppResult<Vec<Book>> {
        self.list_books().await
    }

    async fn books_popular(&self, limit: i64) -> AppResult<Vec<Book>> {
        self.popular_books(limit).await
    }

    async fn books_search(
        &self,
        title: Option<String>,
        author: Option<String>,
    ) -> AppResult<Vec<Book>> {
        self.search_books(title.as_deref(), author.as_deref()).await
    }

    async fn books_get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        self.get_book(id).await
    }

    async fn books_get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.get_book_by_isbn(isbn).await
    }

    async fn books_create(&self, book: &CreateBook) -> AppResult<Book> {
        self.create_book(book).await
    }

    async fn books_update(&self, id: i32, changes: &UpdateBook) -> AppResult<Option<Book>> {
        self.update_book(id, changes).await
    }

    async fn books_delete(&self, id: i32) -> AppResult<bool> {
        self.delete_book(id).await
    }

    async fn users_list(&self) -> AppResult<Vec<User>> {
        self.list_users().await
    }

    async fn users_highest_paying(&self, limit: i64) -> AppResult<Vec<User>> {
        self.highest_paying_users(limit).await
    }

    async fn users_get_by_id(&self, id: i32) -> AppResult<Option<User>> {
        self.get_user(id).await
    }

    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.get_user_by_email(email).await
    }

    async fn users_create(&self, user: &CreateUser) -> AppResult<User> {
        self.create_user(user).await
    }

    async fn users_update(&self, id: i32, changes: &UpdateUser) -> AppResult<Option<User>> {
        self.update_user(id, changes).await
    }

    async fn users_delete(&self, id: i32) -> AppResult<bool> {
        self.delete_user(id).await
    }

    async fn transactions_list(&self) -> AppResult<Vec<Transaction>> {
        self.list_transactions().await
    }

    async fn transactions_get_by_id(&self, id: i32) -> AppResult<Option<Transaction>> {
        self.get_transaction(id).await
    }

    async fn transactions_open_for_member(&self, member: i32) -> AppResult<Vec<Transaction>> {
        self.open_transactions_for_member(member).await
    }

    async fn commit_rental(&self, rental: &NewRental) -> AppResult<Option<Transaction>> {
        self.insert_rental(rental).await
    }

    async fn settle_transaction(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Settlement> {
        self.close_transaction(id, returned_at).await
    }
}
