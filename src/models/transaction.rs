//! Rental transaction model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use sqlx::FromRow;
use validator::Validate;

pub const DEFAULT_NUM_COPIES: i32 = 1;

/// Rent transaction done by a member on a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i32,
    /// Renting member (users.id)
    pub member: i32,
    /// Rented book (books.id)
    pub book: i32,
    pub num_copies: i32,
    /// Amount charged: num_copies * book price at rental time
    pub rent: i32,
    pub date_rented: DateTime<Utc>,
    /// Unset while the copies are still out
    pub date_return: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn is_open(&self) -> bool {
        self.date_return.is_none()
    }
}

/// Create transaction (rent) request
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTransaction {
    pub member: i32,
    pub book: i32,
    /// Accepts `2` as well as `"2"`
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[validate(range(min = 1, message = "At least one copy must be rented"))]
    pub num_copies: Option<i32>,
}

impl CreateTransaction {
    pub fn num_copies(&self) -> i32 {
        self.num_copies.unwrap_or(DEFAULT_NUM_COPIES)
    }
}

/// An accepted rental, ready to be committed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRental {
    pub member: i32,
    pub book: i32,
    pub num_copies: i32,
    pub rent: i32,
    pub date_rented: DateTime<Utc>,
}

/// Outcome of closing a transaction in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Closed now; the book's stock has been credited
    Settled(Transaction),
    /// Was already closed; nothing changed
    AlreadySettled(Transaction),
    NotFound,
}
