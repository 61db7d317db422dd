use serde::{Deserialize, Serialize};

/// A row of the `books` table.
///
/// Field order matches the JSON shape served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Primary key
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// `{"book": ...}` envelope for single-book responses.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book: Book,
}

/// `{"books": [...]}` envelope for the list response.
#[derive(Debug, Serialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
