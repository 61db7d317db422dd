//! Book repository
//!
//! - Every statement binds positional parameters
//! - Update and delete are single conditional statements, so a row cannot
//!   vanish between a lookup and the mutation

use sqlx::PgPool;

use super::models::Book;

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("There is no book with an isbn '{isbn}'")]
    NotFound { isbn: String },
}

impl DbError {
    fn not_found(isbn: &str) -> Self {
        DbError::NotFound {
            isbn: isbn.to_owned(),
        }
    }
}

/// Book repository
pub struct BookRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All books in storage order.
    pub async fn list(&self) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books"))
            .fetch_all(self.pool)
            .await?;
        Ok(books)
    }

    pub async fn get(&self, isbn: &str) -> Result<Book, DbError> {
        sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE isbn = $1"))
            .bind(isbn)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(isbn))
    }

    pub async fn exists(&self, isbn: &str) -> Result<bool, DbError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Insert a book. A duplicate isbn surfaces as `DbError::Sqlx`.
    pub async fn create(&self, book: &Book) -> Result<Book, DbError> {
        let created = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COLUMNS}"
        ))
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(self.pool)
        .await?;
        Ok(created)
    }

    /// Overwrite every mutable field of the row keyed by `isbn`.
    ///
    /// `changes.isbn` is ignored; the key never changes.
    pub async fn update(&self, isbn: &str, changes: &Book) -> Result<Book, DbError> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET amazon_url = $1, author = $2, language = $3, pages = $4,
                publisher = $5, title = $6, year = $7
            WHERE isbn = $8
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&changes.amazon_url)
        .bind(&changes.author)
        .bind(&changes.language)
        .bind(changes.pages)
        .bind(&changes.publisher)
        .bind(&changes.title)
        .bind(changes.year)
        .bind(isbn)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(isbn))
    }

    pub async fn delete(&self, isbn: &str) -> Result<(), DbError> {
        let deleted: Option<(String,)> =
            sqlx::query_as("DELETE FROM books WHERE isbn = $1 RETURNING isbn")
                .bind(isbn)
                .fetch_optional(self.pool)
                .await?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(DbError::not_found(isbn)),
        }
    }
}
