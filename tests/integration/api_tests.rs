//! API integration tests
//!
//! Each test starts the router on an ephemeral port with the in-memory store.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use elibrary_server::{api, repository::memory::MemoryRepository, AppConfig, AppState};

/// Start a fresh server and return its API base URL
async fn spawn_server(max_allowed_due: i64) -> String {
    let mut config = AppConfig::in_memory();
    config.ledger.max_allowed_due = max_allowed_due;

    let state = AppState::new(config, Arc::new(MemoryRepository::new()));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    format!("http://{}/api/v1", addr)
}

async fn post(client: &Client, url: String, body: Value) -> (StatusCode, Value) {
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get(client: &Client, url: String) -> (StatusCode, Value) {
    let response = client.get(url).send().await.expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn lean_in() -> Value {
    json!({
        "title": "Lean In",
        "isbn": "0385349949",
        "author": "Sheryl Sandberg",
        "stock": 5,
        "price": 30
    })
}

fn member() -> Value {
    json!({
        "email": "abc@example.com",
        "first_name": "First",
        "last_name": "Last",
        "contact": "1234567890"
    })
}

/// Id at the end of a `/api/v1/<kind>/<id>/` reference
fn id_of(reference: &Value) -> i64 {
    reference["url"]
        .as_str()
        .expect("No url in response")
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("No id in url")
}

#[tokio::test]
async fn test_health_check() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let (status, body) = get(&client, format!("{}/health", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&client, format!("{}/ready", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_book_crud() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let (status, created) = post(&client, format!("{}/books/", base), lean_in()).await;
    assert_eq!(status, StatusCode::CREATED);
    let url = created["url"].as_str().unwrap();
    assert!(url.starts_with("/api/v1/books/") && url.ends_with('/'));
    let id = id_of(&created);

    let (status, book) = get(&client, format!("{}/books/{}/", base, id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["title"], "Lean In");
    assert_eq!(book["stock"], 5);
    assert_eq!(book["url"], created["url"]);

    let (status, books) = get(&client, format!("{}/books/", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books.as_array().unwrap().len(), 1);
    assert_eq!(books[0]["url"], created["url"]);

    let response = client
        .put(format!("{}/books/{}/", base, id))
        .json(&json!({ "stock": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, book) = get(&client, format!("{}/books/{}/", base, id)).await;
    assert_eq!(book["stock"], 7);
    assert_eq!(book["author"], "Sheryl Sandberg");

    let response = client
        .delete(format!("{}/books/{}/", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], id);

    let (status, body) = get(&client, format!("{}/books/{}/", base, id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());

    let response = client
        .delete(format!("{}/books/{}/", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_book_validation() {
    let base = spawn_server(500).await;
    let client = Client::new();

    // Missing title
    let (status, body) = post(
        &client,
        format!("{}/books/", base),
        json!({ "stock": 5, "author": "Some Author", "isbn": "1385349947", "price": 30 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    // Negative stock
    let (status, _) = post(
        &client,
        format!("{}/books/", base),
        json!({ "title": "T", "author": "A", "isbn": "1385349947", "stock": -1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_isbn_conflict() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let (_, created) = post(&client, format!("{}/books/", base), lean_in()).await;

    let (status, body) = post(&client, format!("{}/books/", base), lean_in()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["url"], created["url"]);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains(created["url"].as_str().unwrap()));
}

#[tokio::test]
async fn test_put_creates_missing_book() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let response = client
        .put(format!("{}/books/42/", base))
        .json(&json!({ "title": "Dune", "isbn": "0441013597", "author": "Frank Herbert" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();

    let (status, book) = get(&client, format!("{}/books/{}/", base, id_of(&created))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["price"], 30);
    assert_eq!(book["stock"], 1);

    // Not enough fields to create
    let response = client
        .put(format!("{}/books/43/", base))
        .json(&json!({ "title": "Only a title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_crud_and_conflict() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let (status, created) = post(&client, format!("{}/users/", base), member()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = id_of(&created);

    let (status, body) = post(&client, format!("{}/users/", base), member()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["url"], created["url"]);

    let (status, _) = post(
        &client,
        format!("{}/users/", base),
        json!({ "email": "other@example.com", "contact": "1234567890" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = client
        .put(format!("{}/users/{}/", base, id))
        .json(&json!({ "last_name": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, user) = get(&client, format!("{}/users/{}/", base, id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["last_name"], Value::Null);
    assert_eq!(user["first_name"], "First");

    let response = client
        .delete(format!("{}/users/{}/", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rental_scenario() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let (_, book) = post(&client, format!("{}/books/", base), lean_in()).await;
    let book_id = id_of(&book);
    let (_, user) = post(&client, format!("{}/users/", base), member()).await;
    let member_id = id_of(&user);

    let (status, rented) = post(
        &client,
        format!("{}/transactions/", base),
        json!({ "book": book_id, "member": member_id, "num_copies": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let transaction_id = id_of(&rented);

    let (_, book) = get(&client, format!("{}/books/{}/", base, book_id)).await;
    assert_eq!(book["stock"], 3);

    let (status, transaction) =
        get(&client, format!("{}/transactions/{}/", base, transaction_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(transaction["rent"], 60);
    assert_eq!(transaction["num_copies"], 2);
    assert_eq!(transaction["date_return"], Value::Null);
    assert_eq!(transaction["url"], rented["url"]);

    // More than available
    let (status, body) = post(
        &client,
        format!("{}/transactions/", base),
        json!({ "book": book_id, "member": member_id, "num_copies": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "StockShortage");
    assert!(body["message"].as_str().unwrap().contains('3'));

    // Editing a transaction is not allowed, whatever the body holds
    for body in [json!({ "num_copies": 1 }), json!({})] {
        let response = client
            .put(format!("{}/transactions/{}/", base, transaction_id))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
    let (_, transaction) =
        get(&client, format!("{}/transactions/{}/", base, transaction_id)).await;
    assert_eq!(transaction["date_return"], Value::Null);

    // Settle
    let response = client
        .put(format!("{}/transactions/{}/", base, transaction_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, book) = get(&client, format!("{}/books/{}/", base, book_id)).await;
    assert_eq!(book["stock"], 5);

    let (_, transaction) =
        get(&client, format!("{}/transactions/{}/", base, transaction_id)).await;
    assert!(transaction["date_return"].is_string());

    // Settling again does not credit the stock twice
    let response = client
        .put(format!("{}/transactions/{}/", base, transaction_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let (_, book) = get(&client, format!("{}/books/{}/", base, book_id)).await;
    assert_eq!(book["stock"], 5);

    let response = client
        .put(format!("{}/transactions/999/", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (_, transactions) = get(&client, format!("{}/transactions/", base)).await;
    assert_eq!(transactions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_return_that_would_overflow_stock_is_refused() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let (_, book) = post(&client, format!("{}/books/", base), lean_in()).await;
    let book_id = id_of(&book);
    let (_, user) = post(&client, format!("{}/users/", base), member()).await;

    let (_, rented) = post(
        &client,
        format!("{}/transactions/", base),
        json!({ "book": book_id, "member": id_of(&user), "num_copies": 5 }),
    )
    .await;
    let transaction_id = id_of(&rented);

    let response = client
        .put(format!("{}/books/{}/", base, book_id))
        .json(&json!({ "stock": i32::MAX }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .put(format!("{}/transactions/{}/", base, transaction_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "StockOverflow");

    let (_, transaction) =
        get(&client, format!("{}/transactions/{}/", base, transaction_id)).await;
    assert_eq!(transaction["date_return"], Value::Null);
    let (_, book) = get(&client, format!("{}/books/{}/", base, book_id)).await;
    assert_eq!(book["stock"], i32::MAX);
}

#[tokio::test]
async fn test_out_of_stock_and_overdue() {
    let base = spawn_server(50).await;
    let client = Client::new();

    let (_, book) = post(
        &client,
        format!("{}/books/", base),
        json!({ "title": "Dune", "isbn": "0441013597", "author": "Frank Herbert", "stock": 2 }),
    )
    .await;
    let book_id = id_of(&book);
    let (_, first) = post(&client, format!("{}/users/", base), member()).await;
    let (_, second) = post(
        &client,
        format!("{}/users/", base),
        json!({ "first_name": "Second", "contact": "555" }),
    )
    .await;

    // 60 owed afterwards, above the limit of 50; copies requested as a string
    let (status, _) = post(
        &client,
        format!("{}/transactions/", base),
        json!({ "book": book_id, "member": id_of(&first), "num_copies": "2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(
        &client,
        format!("{}/transactions/", base),
        json!({ "book": book_id, "member": id_of(&second), "num_copies": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "OutOfStock");

    let (status, body) = post(
        &client,
        format!("{}/transactions/", base),
        json!({ "book": book_id, "member": id_of(&first), "num_copies": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Overdue");

    let (status, _) = post(
        &client,
        format!("{}/transactions/", base),
        json!({ "book": book_id, "member": id_of(&second), "num_copies": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_popular_search_and_highest_paying() {
    let base = spawn_server(500).await;
    let client = Client::new();

    let (_, lean) = post(&client, format!("{}/books/", base), lean_in()).await;
    let (_, dune) = post(
        &client,
        format!("{}/books/", base),
        json!({
            "title": "Dune",
            "isbn": "0441013597",
            "author": "Frank Herbert",
            "stock": 5,
            "price": 50
        }),
    )
    .await;
    let (_, first) = post(&client, format!("{}/users/", base), member()).await;
    let (_, second) = post(
        &client,
        format!("{}/users/", base),
        json!({ "first_name": "Second", "contact": "555" }),
    )
    .await;

    for (member, book) in [(&first, &dune), (&second, &dune), (&second, &lean)] {
        let (status, _) = post(
            &client,
            format!("{}/transactions/", base),
            json!({ "book": id_of(book), "member": id_of(member), "num_copies": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, popular) = get(&client, format!("{}/books/popular/?limit=1", base)).await;
    assert_eq!(status, StatusCode::OK);
    let popular = popular.as_array().unwrap();
    assert_eq!(popular.len(), 1);
    assert_eq!(popular[0]["title"], "Dune");

    let (status, found) = get(&client, format!("{}/books/search/?author=sandberg", base)).await;
    assert_eq!(status, StatusCode::OK);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], "Lean In");

    let (_, found) = get(&client, format!("{}/books/?title=DUNE", base)).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, _) = get(&client, format!("{}/books/search/", base)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // second paid 50 + 30, first paid 50
    let (status, users) = get(&client, format!("{}/users/highest_paying/?limit=2", base)).await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["first_name"], "Second");
}
