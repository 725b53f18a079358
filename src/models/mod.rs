//! Data models for eLibrary

pub mod book;
pub mod transaction;
pub mod user;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use book::Book;
pub use transaction::Transaction;
pub use user::User;

pub const BOOKS_ENDPOINT: &str = "/api/v1/books";
pub const USERS_ENDPOINT: &str = "/api/v1/users";
pub const TRANSACTIONS_ENDPOINT: &str = "/api/v1/transactions";

/// Reference to a stored resource, returned by create and upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub url: String,
}

impl ResourceRef {
    pub fn book(id: i32) -> Self {
        Self::new(BOOKS_ENDPOINT, id)
    }

    pub fn user(id: i32) -> Self {
        Self::new(USERS_ENDPOINT, id)
    }

    pub fn transaction(id: i32) -> Self {
        Self::new(TRANSACTIONS_ENDPOINT, id)
    }

    fn new(endpoint: &str, id: i32) -> Self {
        Self {
            url: format!("{}/{}/", endpoint, id),
        }
    }
}

/// Stored record that knows its own endpoint
pub trait Resource {
    fn reference(&self) -> ResourceRef;
}

impl Resource for Book {
    fn reference(&self) -> ResourceRef {
        ResourceRef::book(self.id)
    }
}

impl Resource for User {
    fn reference(&self) -> ResourceRef {
        ResourceRef::user(self.id)
    }
}

impl Resource for Transaction {
    fn reference(&self) -> ResourceRef {
        ResourceRef::transaction(self.id)
    }
}

/// A record serialized with its own `url` next to its fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub record: T,
    pub url: String,
}

impl<T: Resource> From<T> for Linked<T> {
    fn from(record: T) -> Self {
        let url = record.reference().url;
        Self { record, url }
    }
}

/// Attach self links to a listing
pub fn linked<T: Resource>(records: Vec<T>) -> Vec<Linked<T>> {
    records.into_iter().map(Linked::from).collect()
}

/// Identifier of a deleted resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: i32,
}

/// Result of a create-or-update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted<T> {
    Created(T),
    Updated(T),
}
