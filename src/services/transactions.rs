//! Rental transaction service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{transaction::CreateTransaction, Book, Transaction},
    repository::Repository,
};

use super::ledger::{self, RentalPolicy};

#[derive(Clone)]
pub struct TransactionsService {
    repository: Repository,
    policy: RentalPolicy,
}

impl TransactionsService {
    pub fn new(repository: Repository, policy: RentalPolicy) -> Self {
        Self { repository, policy }
    }

    pub async fn list(&self) -> AppResult<Vec<Transaction>> {
        self.repository.transactions_list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Transaction> {
        self.repository
            .transactions_get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
    }

    /// Rent copies of a book to a member
    pub async fn rent(&self, request: CreateTransaction) -> AppResult<Transaction> {
        let num_copies = request.num_copies();

        self.repository
            .users_get_by_id(request.member)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.member)))?;

        let open = self.repository.transactions_open_for_member(request.member).await?;
        let due = ledger::outstanding_due(&open);

        let book = self.find_book(request.book).await?;

        let rental = self
            .policy
            .assess(request.member, due, &book, num_copies, Utc::now())
            .map_err(|e| {
                if let AppError::BusinessRule(ref rule) = e {
                    tracing::warn!(
                        "Rental of book {} by user {} refused: {}",
                        request.book,
                        request.member,
                        rule
                    );
                }
                e
            })?;

        match self.repository.commit_rental(&rental).await? {
            Some(transaction) => {
                tracing::info!(
                    "User {} rented {} copies of book {} (transaction {}, rent {})",
                    transaction.member,
                    transaction.num_copies,
                    transaction.book,
                    transaction.id,
                    transaction.rent
                );
                Ok(transaction)
            }
            None => {
                // Another rental took the copies between our read and the commit
                let current = self.find_book(request.book).await?;
                ledger::check_stock(&current, num_copies)?;
                Err(AppError::Conflict {
                    message: "Stock changed while renting; please retry".to_string(),
                    url: None,
                })
            }
        }
    }

    /// Return the copies of a transaction and close it
    pub async fn settle(&self, id: i32) -> AppResult<Transaction> {
        let transaction = self
            .repository
            .settle_transaction(id, Utc::now())
            .await
            .and_then(|outcome| ledger::settled(id, outcome))
            .map_err(|e| {
                if let AppError::BusinessRule(ref rule) = e {
                    tracing::warn!("Return of transaction {} refused: {}", id, rule);
                }
                e
            })?;

        tracing::info!(
            "Transaction {} settled, {} copies of book {} back in stock",
            transaction.id,
            transaction.num_copies,
            transaction.book
        );
        Ok(transaction)
    }

    async fn find_book(&self, id: i32) -> AppResult<Book> {
        self.repository
            .books_get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }
}
