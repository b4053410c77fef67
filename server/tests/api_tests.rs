// tests/api_tests.rs

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::state::AppState;
use storefront::web::configure_app_routes;
use storefront_core::MemoryStore;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: None,
    db_max_connections: 1,
    run_migrations: false,
    jwt_secret: "api-tests-signing-secret".to_string(),
    access_token_ttl_secs: 300,
    refresh_token_ttl_secs: 86_400,
    log_format: storefront::config::LogFormat::Text,
  }
}

fn state() -> AppState {
  Lazy::force(&TRACING_INIT);
  AppState::new(Arc::new(MemoryStore::new()), test_config())
}

async fn app(
  state: AppState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
  test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await
}

async fn call<S>(app: &S, req: test::TestRequest) -> (StatusCode, Value)
where
  S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
  let resp = test::call_service(app, req.to_request()).await;
  let status = resp.status();
  let body = test::read_body(resp).await;
  let value = if body.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&body).unwrap()
  };
  (status, value)
}

fn bearer(token: &str) -> (header::HeaderName, String) {
  (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Registers and logs in `username`, returning its access and refresh tokens.
async fn sign_up<S>(app: &S, username: &str) -> (String, String)
where
  S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
  let (status, _) = call(
    app,
    test::TestRequest::post()
      .uri("/user/register/")
      .set_json(json!({ "username": username, "password": "correct-horse" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = call(
    app,
    test::TestRequest::post()
      .uri("/user/login/")
      .set_json(json!({ "username": username, "password": "correct-horse" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  (
    body["access"].as_str().unwrap().to_string(),
    body["refresh"].as_str().unwrap().to_string(),
  )
}

async fn create_product<S>(app: &S, access: &str, name: &str, price: &str, stock: i32) -> i64
where
  S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
  let (status, body) = call(
    app,
    test::TestRequest::post()
      .uri("/products/")
      .insert_header(bearer(access))
      .set_json(json!({ "name": name, "price": price, "stock_quantity": stock })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{}", body);
  body["id"].as_i64().unwrap()
}

#[actix_web::test]
async fn health_needs_no_auth() {
  let app = app(state()).await;
  let (status, body) = call(&app, test::TestRequest::get().uri("/health")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn protected_routes_require_a_bearer_token() {
  let app = app(state()).await;
  for uri in ["/orders/", "/api/orders/", "/products/", "/categories/"] {
    let (status, body) = call(&app, test::TestRequest::get().uri(uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    assert!(body["detail"].is_string());
  }
  let (status, _) = call(
    &app,
    test::TestRequest::get().uri("/orders/").insert_header(bearer("not-a-jwt")),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn order_lifecycle_over_http() {
  let app = app(state()).await;
  let (access, _) = sign_up(&app, "alice").await;
  let lamp = create_product(&app, &access, "Lamp", "29.99", 5).await;

  let (status, order) = call(
    &app,
    test::TestRequest::post()
      .uri("/orders/")
      .insert_header(bearer(&access))
      .set_json(json!({ "order_items": [{ "product": lamp, "quantity": 2 }] })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{}", order);
  assert_eq!(order["total_price"], "59.98");
  assert_eq!(order["order_status"], "pending");
  assert_eq!(order["order_items"][0]["quantity"], 2);
  assert_eq!(order["order_items"][0]["total_price"], "59.98");
  assert_eq!(order["order_items"][0]["product"]["stock_quantity"], 3);
  let order_id = order["id"].as_i64().unwrap();
  assert!(order["user"].is_i64());

  let (status, body) = call(
    &app,
    test::TestRequest::post()
      .uri("/api/orders/")
      .insert_header(bearer(&access))
      .set_json(json!({ "order_items": [{ "product": lamp, "quantity": 4 }] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], format!("Insufficient stock for #{}-Lamp", lamp));

  let (status, body) = call(
    &app,
    test::TestRequest::patch()
      .uri(&format!("/orders/{}/", order_id))
      .insert_header(bearer(&access))
      .set_json(json!({ "order_status": "shipped" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["order_status"], "shipped");

  let (status, body) = call(
    &app,
    test::TestRequest::put()
      .uri(&format!("/orders/{}/", order_id))
      .insert_header(bearer(&access))
      .set_json(json!({ "order_items": [{ "product": lamp, "quantity": 1 }] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "Order status not eligible for modification");

  let (status, list) = call(&app, test::TestRequest::get().uri("/orders/").insert_header(bearer(&access))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);

  let (status, _) = call(
    &app,
    test::TestRequest::delete()
      .uri(&format!("/orders/{}/", order_id))
      .insert_header(bearer(&access)),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = call(
    &app,
    test::TestRequest::get()
      .uri(&format!("/orders/{}/", order_id))
      .insert_header(bearer(&access)),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["detail"], "No Order matches the given query.");
}

#[actix_web::test]
async fn products_are_private_to_their_creator() {
  let app = app(state()).await;
  let (alice, _) = sign_up(&app, "alice").await;
  let (bob, _) = sign_up(&app, "bob").await;
  let lamp = create_product(&app, &alice, "Lamp", "10.00", 1).await;

  let (status, _) = call(
    &app,
    test::TestRequest::get()
      .uri(&format!("/products/{}/", lamp))
      .insert_header(bearer(&bob)),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(
    &app,
    test::TestRequest::get().uri("/products/999/").insert_header(bearer(&bob)),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = call(
    &app,
    test::TestRequest::patch()
      .uri(&format!("/products/{}/", lamp))
      .insert_header(bearer(&alice))
      .set_json(json!({ "price": "12.5" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["price"], "12.50");
  assert_eq!(body["name"], "Lamp");
}

#[actix_web::test]
async fn reviews_reject_out_of_range_ratings() {
  let app = app(state()).await;
  let (alice, _) = sign_up(&app, "alice").await;
  let lamp = create_product(&app, &alice, "Lamp", "10.00", 1).await;

  let (status, _) = call(
    &app,
    test::TestRequest::post()
      .uri(&format!("/products/{}/reviews/", lamp))
      .insert_header(bearer(&alice))
      .set_json(json!({ "text": "Too good", "rating": 6 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, review) = call(
    &app,
    test::TestRequest::post()
      .uri(&format!("/products/{}/reviews/", lamp))
      .insert_header(bearer(&alice))
      .set_json(json!({ "text": "Good", "rating": 4 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (bob, _) = sign_up(&app, "bob").await;
  let (status, _) = call(
    &app,
    test::TestRequest::delete()
      .uri(&format!("/products/{}/reviews/{}/", lamp, review["id"]))
      .insert_header(bearer(&bob)),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn account_endpoints_follow_the_token_lifecycle() {
  let app = app(state()).await;
  let (access, refresh) = sign_up(&app, "carol").await;

  let (status, _) = call(
    &app,
    test::TestRequest::post()
      .uri("/user/register/")
      .set_json(json!({ "username": "carol", "password": "another-pass" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = call(
    &app,
    test::TestRequest::post()
      .uri("/user/login/")
      .set_json(json!({ "username": "carol", "password": "wrong-horse" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], "Invalid credentials");

  let (status, _) = call(
    &app,
    test::TestRequest::post().uri("/user/login/").set_json(json!({ "username": "carol" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let logout = || {
    test::TestRequest::post()
      .uri("/user/logout/")
      .insert_header(bearer(&access))
      .set_json(json!({ "refresh_token": refresh }))
  };
  let (status, body) = call(&app, logout()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["detail"], "Logout successful");

  let (status, body) = call(&app, logout()).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "Invalid token");

  let (status, _) = call(
    &app,
    test::TestRequest::post()
      .uri("/user/logout/")
      .insert_header(bearer(&access))
      .set_json(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
  let app = app(state()).await;
  let (access, _) = sign_up(&app, "dave").await;
  let (status, body) = call(
    &app,
    test::TestRequest::post()
      .uri("/orders/")
      .insert_header(bearer(&access))
      .insert_header((header::CONTENT_TYPE, "application/json"))
      .set_payload("{\"order_items\": [{\"product\": \"x\"}]"),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["detail"].as_str().unwrap().starts_with("JSON parse error"));
}

#[actix_web::test]
async fn categories_nest_under_existing_parents() {
  let app = app(state()).await;
  let (access, _) = sign_up(&app, "erin").await;

  let (status, home) = call(
    &app,
    test::TestRequest::post()
      .uri("/categories/")
      .insert_header(bearer(&access))
      .set_json(json!({ "name": "Home" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = call(
    &app,
    test::TestRequest::post()
      .uri("/categories/")
      .insert_header(bearer(&access))
      .set_json(json!({ "name": "Lighting", "parent": home["id"] })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = call(
    &app,
    test::TestRequest::post()
      .uri("/categories/")
      .insert_header(bearer(&access))
      .set_json(json!({ "name": "Orphan", "parent": 404 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, list) = call(&app, test::TestRequest::get().uri("/api/categories/").insert_header(bearer(&access))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 2);
}
