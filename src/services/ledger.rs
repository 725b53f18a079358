//! Rental ledger
//!
//! Pure decision logic for renting and returning books: outstanding debt per
//! member, stock availability and rent amount. Nothing here touches the store;
//! [`TransactionsService`](super::transactions::TransactionsService) reads the
//! records, asks the ledger, then commits.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    error::{AppError, AppResult},
    models::{
        transaction::{NewRental, Settlement, Transaction},
        Book,
    },
};

/// Business rule violations raised by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Member owes {due} in open rentals (limit {max_allowed}); return books first")]
    Overdue { due: i64, max_allowed: i64 },

    #[error("Book is out of stock")]
    OutOfStock,

    #[error("Only {available} copies are in stock")]
    StockShortage { available: i32 },

    #[error("Transaction {id} has already been returned")]
    AlreadySettled { id: i32 },

    #[error("Returning {returned} copies would overflow the stock of book {book} ({stock})")]
    StockOverflow { book: i32, stock: i32, returned: i32 },
}

/// Sum of rent over the open transactions in `transactions`
pub fn outstanding_due<'a, I>(transactions: I) -> i64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|t| t.is_open())
        .map(|t| i64::from(t.rent))
        .sum()
}

/// Rent owed for `num_copies` copies at `price`, if it fits the rent column
pub fn rent_for(num_copies: i32, price: i32) -> Option<i32> {
    num_copies.checked_mul(price)
}

/// Checks that `num_copies` can be taken from `book` right now
pub fn check_stock(book: &Book, num_copies: i32) -> Result<(), LedgerError> {
    if book.stock <= 0 {
        Err(LedgerError::OutOfStock)
    } else if book.stock < num_copies {
        Err(LedgerError::StockShortage {
            available: book.stock,
        })
    } else {
        Ok(())
    }
}

/// Stock of `book` once `num_copies` copies come back
pub fn restocked(book: &Book, num_copies: i32) -> Result<i32, LedgerError> {
    book.stock
        .checked_add(num_copies)
        .ok_or(LedgerError::StockOverflow {
            book: book.id,
            stock: book.stock,
            returned: num_copies,
        })
}

/// Interpret the store's answer to a return request.
///
/// Returning twice is refused so the copies are credited to the book once.
pub fn settled(id: i32, outcome: Settlement) -> AppResult<Transaction> {
    match outcome {
        Settlement::Settled(transaction) => Ok(transaction),
        Settlement::AlreadySettled(transaction) => Err(LedgerError::AlreadySettled {
            id: transaction.id,
        }
        .into()),
        Settlement::NotFound => Err(AppError::NotFound(format!("Transaction {} not found", id))),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RentalPolicy {
    pub max_allowed_due: i64,
}

impl RentalPolicy {
    pub fn new(max_allowed_due: i64) -> Self {
        Self { max_allowed_due }
    }

    /// Members may keep renting until their open rent exceeds the limit
    pub fn check_due(&self, due: i64) -> Result<(), LedgerError> {
        if due > self.max_allowed_due {
            Err(LedgerError::Overdue {
                due,
                max_allowed: self.max_allowed_due,
            })
        } else {
            Ok(())
        }
    }

    /// Decide whether `member` may rent `num_copies` of `book`.
    ///
    /// Debt is checked before stock, so an overdue member is refused even when
    /// the book is unavailable.
    pub fn assess(
        &self,
        member: i32,
        due: i64,
        book: &Book,
        num_copies: i32,
        now: DateTime<Utc>,
    ) -> AppResult<NewRental> {
        if num_copies < 1 {
            return Err(AppError::Validation(
                "At least one copy must be rented".to_string(),
            ));
        }

        self.check_due(due)?;
        check_stock(book, num_copies)?;

        let rent = rent_for(num_copies, book.price).ok_or_else(|| {
            AppError::Validation(format!(
                "Rent for {} copies at {} is out of range",
                num_copies, book.price
            ))
        })?;

        Ok(NewRental {
            member,
            book: book.id,
            num_copies,
            rent,
            date_rented: now,
        })
    }
}
