//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PRICE: i32 = 30;
pub const DEFAULT_STOCK: i32 = 1;

/// Book in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    /// ISBN-10 or ISBN-13, unique across the catalog
    pub isbn: String,
    pub author: String,
    /// Rent charged per copy
    pub price: i32,
    /// Copies currently on the shelf
    pub stock: i32,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i32>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
}

impl CreateBook {
    pub fn price(&self) -> i32 {
        self.price.unwrap_or(DEFAULT_PRICE)
    }

    pub fn stock(&self) -> i32 {
        self.stock.unwrap_or(DEFAULT_STOCK)
    }
}

/// Partial update request; only provided fields are changed
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i32>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
}

impl UpdateBook {
    /// Merge the provided fields into an existing book
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(stock) = self.stock {
            book.stock = stock;
        }
    }

    /// Promote the update to a full create request (upsert on a missing id)
    pub fn into_create(self) -> AppResult<CreateBook> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push("title");
        }
        if self.isbn.is_none() {
            missing.push("isbn");
        }
        if self.author.is_none() {
            missing.push("author");
        }

        match (self.title, self.isbn, self.author) {
            (Some(title), Some(isbn), Some(author)) => Ok(CreateBook {
                title,
                isbn,
                author,
                price: self.price,
                stock: self.stock,
            }),
            _ => Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Query parameters accepted by the book listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    /// Row limit for the popular listing
    pub limit: Option<i64>,
}

impl BookQuery {
    pub fn has_search_terms(&self) -> bool {
        self.title.is_some() || self.author.is_some()
    }
}
