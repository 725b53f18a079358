//! Book catalog service

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookQuery, CreateBook, UpdateBook},
        Book, ResourceRef, Upserted,
    },
    repository::Repository,
};

use super::result_limit;

/// Which book listing a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookListing {
    /// Every book, or a search when title/author are given
    All,
    /// Most rented first
    Popular,
    /// Title and/or author substring match
    Search,
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    default_limit: i64,
}

fn duplicate_isbn(existing: &Book) -> AppError {
    let url = ResourceRef::book(existing.id).url;
    AppError::conflict(
        format!("Book with ISBN {} already exists at {}", existing.isbn, url),
        url,
    )
}

impl BooksService {
    pub fn new(repository: Repository, default_limit: i64) -> Self {
        Self {
            repository,
            default_limit,
        }
    }

    /// List books for the requested listing
    pub async fn list(&self, listing: BookListing, query: &BookQuery) -> AppResult<Vec<Book>> {
        match listing {
            BookListing::Popular => {
                let limit = result_limit(query.limit, self.default_limit)?;
                self.repository.books_popular(limit).await
            }
            BookListing::Search | BookListing::All if query.has_search_terms() => {
                self.repository
                    .books_search(query.title.clone(), query.author.clone())
                    .await
            }
            BookListing::Search => Err(AppError::Validation(
                "title or author is required to search".to_string(),
            )),
            BookListing::All => self.repository.books_list().await,
        }
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.repository
            .books_get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Create a new book; the ISBN must not be taken
    pub async fn create(&self, book: CreateBook) -> AppResult<Book> {
        if let Some(existing) = self.repository.books_get_by_isbn(&book.isbn).await? {
            return Err(duplicate_isbn(&existing));
        }

        let created = self.repository.books_create(&book).await?;
        tracing::info!("Created book {} (ISBN {})", created.id, created.isbn);
        Ok(created)
    }

    /// Update the given fields of a book, or create it when the id is unknown
    pub async fn upsert(&self, id: i32, changes: UpdateBook) -> AppResult<Upserted<Book>> {
        if let Some(ref isbn) = changes.isbn {
            if let Some(existing) = self.repository.books_get_by_isbn(isbn).await? {
                if existing.id != id {
                    return Err(duplicate_isbn(&existing));
                }
            }
        }

        if let Some(updated) = self.repository.books_update(id, &changes).await? {
            return Ok(Upserted::Updated(updated));
        }

        let created = self.repository.books_create(&changes.into_create()?).await?;
        tracing::info!("Book {} not found, created book {} instead", id, created.id);
        Ok(Upserted::Created(created))
    }

    /// Delete a book and return its id
    pub async fn delete(&self, id: i32) -> AppResult<i32> {
        if !self.repository.books_delete(id).await? {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        tracing::info!("Deleted book {}", id);
        Ok(id)
    }
}
