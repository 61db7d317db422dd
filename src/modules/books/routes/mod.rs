//! Book endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookstore_http::error::{self, AppError};
use serde_json::Value;
use sqlx::PgPool;

use super::models::{Book, BookResponse, BooksResponse, MessageResponse};
use super::repo::{BookRepo, DbError};
use super::validation::{validate_book, ValidationErrors};

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { .. } => AppError::not_found(e.to_string()),
            DbError::Sqlx(err) => AppError::Internal(anyhow::Error::new(err).context("books query failed")),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        let details = e.0.into_iter().map(Value::String).collect();
        AppError::validation(details, "book payload failed validation")
    }
}

/// Book routes, with the pool injected as router state.
pub fn router(pool: PgPool) -> Router {
    tracing::debug!(target: "bookstore.routes", "registering book routes");

    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .method_not_allowed_fallback(error::method_not_allowed)
        .with_state(pool)
}

fn parse_book(payload: Result<Json<Value>, JsonRejection>) -> Result<Book, AppError> {
    let Json(body) = payload?;
    Ok(validate_book(&body)?)
}

/// GET /books
async fn list_books(State(pool): State<PgPool>) -> Result<Json<BooksResponse>, AppError> {
    let books = BookRepo::new(&pool).list().await?;
    Ok(Json(BooksResponse { books }))
}

/// GET /books/{isbn}
async fn get_book(
    State(pool): State<PgPool>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = BookRepo::new(&pool).get(&isbn).await?;
    Ok(Json(BookResponse { book }))
}

/// POST /books
async fn create_book(
    State(pool): State<PgPool>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = parse_book(payload)?;
    let book = BookRepo::new(&pool).create(&book).await?;

    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

/// PUT /books/{isbn}
///
/// The path isbn is authoritative; an isbn in the body is validated but never
/// renames the row. A missing row wins over an invalid body.
async fn update_book(
    State(pool): State<PgPool>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let repo = BookRepo::new(&pool);

    let changes = match parse_book(payload) {
        Ok(changes) => changes,
        Err(err) => {
            if !repo.exists(&isbn).await? {
                return Err(DbError::NotFound { isbn }.into());
            }
            return Err(err);
        }
    };

    let book = repo.update(&isbn, &changes).await?;

    tracing::info!(isbn = %book.isbn, "book updated");
    Ok(Json(BookResponse { book }))
}

/// DELETE /books/{isbn}
async fn delete_book(
    State(pool): State<PgPool>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    BookRepo::new(&pool).delete(&isbn).await?;

    tracing::info!(%isbn, "book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted",
    }))
}
