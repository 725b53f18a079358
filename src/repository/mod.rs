//! Repository layer for database operations
//!
//! Services talk to persistence through [`LibraryStore`]. Two backends exist:
//! [`postgres::PgRepository`] for deployments and [`memory::MemoryRepository`]
//! for tests and local runs.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    config::{DatabaseConfig, StorageBackend},
    error::AppResult,
    models::{
        book::{CreateBook, UpdateBook},
        transaction::{NewRental, Settlement},
        user::{CreateUser, UpdateUser},
        Book, Transaction, User,
    },
};

/// Shared handle to the configured store
pub type Repository = Arc<dyn LibraryStore>;

/// Persistence operations over books, members and rental transactions.
///
/// Methods that change more than one record (`commit_rental`,
/// `settle_transaction`) are atomic: either every record changes or none does.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> AppResult<()>;

    // Books
    async fn books_list(&self) -> AppResult<Vec<Book>>;
    /// Books ordered by number of transactions, most rented first
    async fn books_popular(&self, limit: i64) -> AppResult<Vec<Book>>;
    /// Case-insensitive substring match; every given term must match
    async fn books_search(
        &self,
        title: Option<String>,
        author: Option<String>,
    ) -> AppResult<Vec<Book>>;
    async fn books_get_by_id(&self, id: i32) -> AppResult<Option<Book>>;
    async fn books_get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;
    async fn books_create(&self, book: &CreateBook) -> AppResult<Book>;
    /// Returns `None` when no book has this id
    async fn books_update(&self, id: i32, changes: &UpdateBook) -> AppResult<Option<Book>>;
    /// Returns whether a book was deleted
    async fn books_delete(&self, id: i32) -> AppResult<bool>;

    // Users
    async fn users_list(&self) -> AppResult<Vec<User>>;
    /// Users ordered by total rent paid, highest first
    async fn users_highest_paying(&self, limit: i64) -> AppResult<Vec<User>>;
    async fn users_get_by_id(&self, id: i32) -> AppResult<Option<User>>;
    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn users_create(&self, user: &CreateUser) -> AppResult<User>;
    async fn users_update(&self, id: i32, changes: &UpdateUser) -> AppResult<Option<User>>;
    async fn users_delete(&self, id: i32) -> AppResult<bool>;

    // Transactions
    async fn transactions_list(&self) -> AppResult<Vec<Transaction>>;
    async fn transactions_get_by_id(&self, id: i32) -> AppResult<Option<Transaction>>;
    async fn transactions_open_for_member(&self, member: i32) -> AppResult<Vec<Transaction>>;
    /// Take the copies from stock and record the transaction.
    ///
    /// The stock decrement only applies while the book still holds at least
    /// `num_copies`; otherwise nothing is written and `None` is returned.
    async fn commit_rental(&self, rental: &NewRental) -> AppResult<Option<Transaction>>;
    /// Close an open transaction and give its copies back to the book
    async fn settle_transaction(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Settlement>;
}

/// Open the store selected by the configuration
pub async fn connect(config: &DatabaseConfig) -> AppResult<Repository> {
    match config.backend {
        StorageBackend::Postgres => {
            let repository = postgres::PgRepository::connect(config).await?;
            tracing::info!("Connected to database");
            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Ok(Arc::new(memory::MemoryRepository::new()))
        }
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
