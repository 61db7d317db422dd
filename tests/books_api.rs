//! HTTP tests for the books resource against a real `books_test` database.
//!
//! Run with: BOOKSTORE_ENV=test cargo test -p bookstore-app -- --ignored

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bookstore_kernel::settings::{Environment, Settings};
use bookstore_kernel::InitCtx;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

// Every test truncates the shared table.
static DB_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

const SEED_ISBN: &str = "123432122";

// =============================================================================
// Test Helpers
// =============================================================================

struct TestApp {
    router: Router,
    pool: PgPool,
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn row_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count
    }
}

fn seed_book() -> Value {
    json!({
        "isbn": SEED_ISBN,
        "amazon_url": "https://amazon.com/taco",
        "author": "Elie",
        "language": "English",
        "pages": 100,
        "publisher": "Nothing publishers",
        "title": "my first book",
        "year": 2008
    })
}

fn new_book() -> Value {
    json!({
        "isbn": "32794782",
        "amazon_url": "https://taco.com",
        "author": "mctest",
        "language": "english",
        "pages": 1000,
        "publisher": "yeah right",
        "title": "amazing times",
        "year": 2000
    })
}

/// Connect to the test database, reset the table and seed one row.
async fn setup() -> TestApp {
    let mut settings = Settings::load().expect("settings");
    settings.environment = Environment::Test;

    let pool = bookstore_db::connect(&settings)
        .await
        .expect("test database must be reachable");
    let registry = bookstore_app::registry();
    bookstore_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .expect("migrations");

    sqlx::query("DELETE FROM books").execute(&pool).await.unwrap();
    sqlx::query(
        "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
         VALUES ($1, 'https://amazon.com/taco', 'Elie', 'English', 100, 'Nothing publishers', 'my first book', 2008)",
    )
    .bind(SEED_ISBN)
    .execute(&pool)
    .await
    .unwrap();

    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };
    let router = bookstore_http::build_router(&registry, &ctx);

    TestApp { router, pool }
}

// =============================================================================
// GET /books
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn list_returns_seeded_book() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, body) = app.send("GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [seed_book()] }));
}

#[tokio::test]
#[ignore = "requires database"]
async fn list_is_empty_array_without_rows() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;
    sqlx::query("DELETE FROM books").execute(&app.pool).await.unwrap();

    let (status, body) = app.send("GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [] }));
}

// =============================================================================
// GET /books/{isbn}
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn get_returns_selected_book() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, body) = app.send("GET", &format!("/books/{SEED_ISBN}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": seed_book() }));
}

#[tokio::test]
#[ignore = "requires database"]
async fn get_unknown_isbn_is_404() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, body) = app.send("GET", "/books/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(
        body["error"]["message"],
        "There is no book with an isbn '9999'"
    );
}

// =============================================================================
// POST /books
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn create_echoes_book_and_is_readable() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, body) = app.send("POST", "/books", Some(new_book())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "book": new_book() }));

    let (status, body) = app.send("GET", "/books/32794782", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": new_book() }));
    assert_eq!(app.row_count().await, 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_with_missing_field_inserts_nothing() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let mut payload = new_book();
    payload.as_object_mut().unwrap().remove("amazon_url");

    let (status, body) = app.send("POST", "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(app.row_count().await, 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_duplicate_isbn_is_500() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, _) = app.send("POST", "/books", Some(seed_book())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.row_count().await, 1);
}

// =============================================================================
// PUT /books/{isbn}
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn update_overwrites_fields_and_keeps_path_isbn() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let mut expected = new_book();
    expected["isbn"] = json!(SEED_ISBN);

    let (status, body) = app
        .send("PUT", &format!("/books/{SEED_ISBN}"), Some(new_book()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": expected }));

    let (status, body) = app.send("GET", &format!("/books/{SEED_ISBN}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": expected }));

    let (status, _) = app.send("GET", "/books/32794782", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_with_missing_field_is_400_and_unchanged() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let mut payload = new_book();
    payload.as_object_mut().unwrap().remove("language");

    let (status, _) = app
        .send("PUT", &format!("/books/{SEED_ISBN}"), Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.send("GET", &format!("/books/{SEED_ISBN}"), None).await;
    assert_eq!(body, json!({ "book": seed_book() }));
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_unknown_isbn_is_404_without_side_effects() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, _) = app.send("PUT", "/books/999", Some(new_book())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Not found wins over an invalid body.
    let (status, _) = app.send("PUT", "/books/999", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.row_count().await, 1);
    let (_, body) = app.send("GET", "/books", None).await;
    assert_eq!(body, json!({ "books": [seed_book()] }));
}

#[tokio::test]
#[ignore = "requires database"]
async fn post_to_single_book_path_fails() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, body) = app.send("POST", "/books/999", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "method_not_allowed");
}

// =============================================================================
// DELETE /books/{isbn}
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn delete_removes_exactly_one_row() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;
    app.send("POST", "/books", Some(new_book())).await;
    assert_eq!(app.row_count().await, 2);

    let (status, body) = app
        .send("DELETE", &format!("/books/{SEED_ISBN}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));
    assert_eq!(app.row_count().await, 1);

    let (status, _) = app.send("GET", &format!("/books/{SEED_ISBN}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn delete_unknown_isbn_is_404() {
    let _guard = DB_LOCK.lock().await;
    let app = setup().await;

    let (status, _) = app.send("DELETE", "/books/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.row_count().await, 1);
}
