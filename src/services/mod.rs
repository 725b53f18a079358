//! Business logic services

pub mod books;
pub mod ledger;
pub mod transactions;
pub mod users;

use crate::{config::LedgerConfig, error::{AppError, AppResult}, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub transactions: transactions::TransactionsService,
    repository: Repository,
}

impl Services {
    /// Create all services over the given store
    pub fn new(repository: Repository, ledger: &LedgerConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone(), ledger.default_result_limit),
            users: users::UsersService::new(repository.clone(), ledger.default_result_limit),
            transactions: transactions::TransactionsService::new(
                repository.clone(),
                ledger::RentalPolicy::new(ledger.max_allowed_due),
            ),
            repository,
        }
    }

    /// Check that the store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

/// Resolve an optional `limit` query parameter
pub(crate) fn result_limit(requested: Option<i64>, default: i64) -> AppResult<i64> {
    match requested {
        Some(limit) if limit < 1 => Err(AppError::Validation(
            "limit must be a positive integer".to_string(),
        )),
        Some(limit) => Ok(limit),
        None => Ok(default),
    }
}
