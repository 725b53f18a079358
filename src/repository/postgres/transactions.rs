//! Rental transaction queries

use chrono::{DateTime, Utc};

use super::PgRepository;
use crate::{
    error::AppResult,
    models::{
        transaction::{NewRental, Settlement},
        Book, Transaction,
    },
    services::ledger,
};

impl PgRepository {
    pub(super) async fn list_transactions(&self) -> AppResult<Vec<Transaction>> {
        let transactions =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(transactions)
    }

    pub(super) async fn get_transaction(&self, id: i32) -> AppResult<Option<Transaction>> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(transaction)
    }

    pub(super) async fn open_transactions_for_member(
        &self,
        member: i32,
    ) -> AppResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE member = $1 AND date_return IS NULL ORDER BY id",
        )
        .bind(member)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    pub(super) async fn insert_rental(&self, rental: &NewRental) -> AppResult<Option<Transaction>> {
        let mut tx = self.pool.begin().await?;

        // Conditional decrement: a concurrent rental that drained the stock
        // makes this match no row
        let taken = sqlx::query(
            "UPDATE books SET stock = stock - $1 WHERE id = $2 AND stock >= $1",
        )
        .bind(rental.num_copies)
        .bind(rental.book)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (member, book, num_copies, rent, date_rented)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(rental.member)
        .bind(rental.book)
        .bind(rental.num_copies)
        .bind(rental.rent)
        .bind(rental.date_rented)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(transaction))
    }

    pub(super) async fn close_transaction(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Settlement> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions SET date_return = $1
            WHERE id = $2 AND date_return IS NULL
            RETURNING *
            "#,
        )
        .bind(returned_at)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(transaction) = closed else {
            tx.rollback().await?;
            return Ok(match self.get_transaction(id).await? {
                Some(existing) => Settlement::AlreadySettled(existing),
                None => Settlement::NotFound,
            });
        };

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(transaction.book)
            .fetch_optional(&mut *tx)
            .await?;

        match book {
            Some(book) => {
                let stock = match ledger::restocked(&book, transaction.num_copies) {
                    Ok(stock) => stock,
                    Err(rule) => {
                        tx.rollback().await?;
                        return Err(rule.into());
                    }
                };

                sqlx::query("UPDATE books SET stock = $1 WHERE id = $2")
                    .bind(stock)
                    .bind(book.id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => tracing::warn!(
                "Book {} of transaction {} no longer exists; copies not restocked",
                transaction.book,
                transaction.id
            ),
        }

        tx.commit().await?;
        Ok(Settlement::Settled(transaction))
    }
}
