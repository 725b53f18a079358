//! In-process store
//!
//! Keeps every table in ordered maps behind a single `RwLock`; each write takes
//! the lock once, which makes multi-record operations atomic.

use std::{cmp::Reverse, collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::LibraryStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBook, UpdateBook},
        transaction::{NewRental, Settlement},
        user::{CreateUser, UpdateUser},
        Book, Transaction, User,
    },
    services::ledger,
};

#[derive(Default)]
struct Tables {
    books: BTreeMap<i32, Book>,
    users: BTreeMap<i32, User>,
    transactions: BTreeMap<i32, Transaction>,
    last_book_id: i32,
    last_user_id: i32,
    last_transaction_id: i32,
}

impl Tables {
    fn isbn_taken(&self, isbn: &str, except: Option<i32>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| u.email.as_deref() == Some(email) && Some(u.id) != except)
    }
}

fn duplicate(message: &str) -> AppError {
    AppError::Conflict {
        message: message.to_string(),
        url: None,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Store holding all records in memory
#[derive(Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LibraryStore for MemoryRepository {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn books_list(&self) -> AppResult<Vec<Book>> {
        Ok(self.tables.read().await.books.values().cloned().collect())
    }

    async fn books_popular(&self, limit: i64) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for t in tables.transactions.values() {
            *counts.entry(t.book).or_default() += 1;
        }

        let mut books: Vec<Book> = tables.books.values().cloned().collect();
        // Stable sort keeps id order among equally popular books
        books.sort_by_key(|b| Reverse(counts.get(&b.id).copied().unwrap_or(0)));
        books.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(books)
    }

    async fn books_search(
        &self,
        title: Option<String>,
        author: Option<String>,
    ) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|b| title.as_deref().map_or(true, |t| contains_ignore_case(&b.title, t)))
            .filter(|b| author.as_deref().map_or(true, |a| contains_ignore_case(&b.author, a)))
            .cloned()
            .collect())
    }

    async fn books_get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn books_get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn books_create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        if tables.isbn_taken(&book.isbn, None) {
            return Err(duplicate("A book with this ISBN already exists"));
        }

        tables.last_book_id += 1;
        let created = Book {
            id: tables.last_book_id,
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            author: book.author.clone(),
            price: book.price(),
            stock: book.stock(),
        };
        tables.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn books_update(&self, id: i32, changes: &UpdateBook) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        if let Some(ref isbn) = changes.isbn {
            if tables.isbn_taken(isbn, Some(id)) {
                return Err(duplicate("A book with this ISBN already exists"));
            }
        }

        Ok(tables.books.get_mut(&id).map(|book| {
            changes.apply_to(book);
            book.clone()
        }))
    }

    async fn books_delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.tables.write().await.books.remove(&id).is_some())
    }

    async fn users_list(&self) -> AppResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn users_highest_paying(&self, limit: i64) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut paid: BTreeMap<i32, i64> = BTreeMap::new();
        for t in tables.transactions.values() {
            *paid.entry(t.member).or_default() += i64::from(t.rent);
        }

        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| Reverse(paid.get(&u.id).copied().unwrap_or(0)));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }

    async fn users_get_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn users_create(&self, user: &CreateUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(ref email) = user.email {
            if tables.email_taken(email, None) {
                return Err(duplicate("A user with this email already exists"));
            }
        }

        tables.last_user_id += 1;
        let created = User {
            id: tables.last_user_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            contact: user.contact.clone(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn users_update(&self, id: i32, changes: &UpdateUser) -> AppResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = changes.new_email() {
            if tables.email_taken(email, Some(id)) {
                return Err(duplicate("A user with this email already exists"));
            }
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }

    async fn users_delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }

    async fn transactions_list(&self) -> AppResult<Vec<Transaction>> {
        Ok(self.tables.read().await.transactions.values().cloned().collect())
    }

    async fn transactions_get_by_id(&self, id: i32) -> AppResult<Option<Transaction>> {
        Ok(self.tables.read().await.transactions.get(&id).cloned())
    }

    async fn transactions_open_for_member(&self, member: i32) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .values()
            .filter(|t| t.member == member && t.is_open())
            .cloned()
            .collect())
    }

    async fn commit_rental(&self, rental: &NewRental) -> AppResult<Option<Transaction>> {
        let mut tables = self.tables.write().await;

        match tables.books.get_mut(&rental.book) {
            Some(book) if book.stock >= rental.num_copies => book.stock -= rental.num_copies,
            _ => return Ok(None),
        }

        tables.last_transaction_id += 1;
        let transaction = Transaction {
            id: tables.last_transaction_id,
            member: rental.member,
            book: rental.book,
            num_copies: rental.num_copies,
            rent: rental.rent,
            date_rented: rental.date_rented,
            date_return: None,
        };
        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(Some(transaction))
    }

    async fn settle_transaction(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Settlement> {
        let mut tables = self.tables.write().await;

        let mut transaction = match tables.transactions.get(&id) {
            None => return Ok(Settlement::NotFound),
            Some(t) if !t.is_open() => return Ok(Settlement::AlreadySettled(t.clone())),
            Some(t) => t.clone(),
        };

        // An overflowing restock leaves the transaction open
        match tables.books.get_mut(&transaction.book) {
            Some(book) => book.stock = ledger::restocked(book, transaction.num_copies)?,
            None => tracing::warn!(
                "Book {} of transaction {} no longer exists; copies not restocked",
                transaction.book,
                transaction.id
            ),
        }

        transaction.date_return = Some(returned_at);
        tables.transactions.insert(id, transaction.clone());
        Ok(Settlement::Settled(transaction))
    }
}
