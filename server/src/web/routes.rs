// storefront/src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{auth_handlers, category_handlers, order_handlers, product_handlers, review_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("JSON parse error - {}", err)).into()
}

fn resource_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .service(
      web::resource("/orders/")
        .route(web::get().to(order_handlers::list_orders_handler))
        .route(web::post().to(order_handlers::create_order_handler)),
    )
    .service(
      web::resource("/orders/{order_id}/")
        .route(web::get().to(order_handlers::get_order_handler))
        .route(web::put().to(order_handlers::update_order_handler))
        .route(web::patch().to(order_handlers::update_order_handler))
        .route(web::delete().to(order_handlers::delete_order_handler)),
    )
    .service(
      web::resource("/products/")
        .route(web::get().to(product_handlers::list_products_handler))
        .route(web::post().to(product_handlers::create_product_handler)),
    )
    .service(
      web::resource("/products/{product_id}/")
        .route(web::get().to(product_handlers::get_product_handler))
        .route(web::put().to(product_handlers::replace_product_handler))
        .route(web::patch().to(product_handlers::patch_product_handler))
        .route(web::delete().to(product_handlers::delete_product_handler)),
    )
    .service(
      web::resource("/products/{product_id}/reviews/")
        .route(web::get().to(review_handlers::list_reviews_handler))
        .route(web::post().to(review_handlers::create_review_handler)),
    )
    .service(
      web::resource("/products/{product_id}/reviews/{review_id}/")
        .route(web::get().to(review_handlers::get_review_handler))
        .route(web::put().to(review_handlers::replace_review_handler))
        .route(web::patch().to(review_handlers::patch_review_handler))
        .route(web::delete().to(review_handlers::delete_review_handler)),
    )
    .service(
      web::resource("/categories/")
        .route(web::get().to(category_handlers::list_categories_handler))
        .route(web::post().to(category_handlers::create_category_handler)),
    )
    .service(web::resource("/categories/{category_id}/").route(web::get().to(category_handlers::get_category_handler)))
    .service(
      web::scope("/user")
        .route("/register/", web::post().to(auth_handlers::register_handler))
        .route("/login/", web::post().to(auth_handlers::login_handler))
        .route("/logout/", web::post().to(auth_handlers::logout_handler)),
    );
}

/// Mounts every resource twice, under `/api` and at the root, plus `/health`.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .route("/health", web::get().to(health_check_handler))
    .service(web::scope("/api").configure(resource_routes))
    .configure(resource_routes);
}
