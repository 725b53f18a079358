//! Book queries

use super::{unique_violation, PgRepository};
use crate::{
    error::AppResult,
    models::{
        book::{CreateBook, UpdateBook},
        Book,
    },
    repository::like_pattern,
};

const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

impl PgRepository {
    pub(super) async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    pub(super) async fn popular_books(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM books b
            LEFT JOIN transactions t ON t.book = b.id
            GROUP BY b.id
            ORDER BY COUNT(t.id) DESC, b.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub(super) async fn search_books(
        &self,
        title: Option<&str>,
        author: Option<&str>,
    ) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR author ILIKE $2)
            ORDER BY id
            "#,
        )
        .bind(title.map(like_pattern))
        .bind(author.map(like_pattern))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub(super) async fn get_book(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    pub(super) async fn get_book_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    pub(super) async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, isbn, author, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.author)
        .bind(book.price())
        .bind(book.stock())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_ISBN))
    }

    pub(super) async fn update_book(&self, id: i32, data: &UpdateBook) -> AppResult<Option<Book>> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.isbn, "isbn");
        add_field!(data.author, "author");
        add_field!(data.price, "price");
        add_field!(data.stock, "stock");

        if sets.is_empty() {
            return self.get_book(id).await;
        }

        let query = format!("UPDATE books SET {} WHERE id = ${} RETURNING *", sets.join(", "), idx);
        let mut builder = sqlx::query_as::<_, Book>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.isbn);
        bind_field!(data.author);
        bind_field!(data.price);
        bind_field!(data.stock);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_ISBN))
    }

    pub(super) async fn delete_book(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
