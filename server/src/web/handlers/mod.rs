// storefront/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod category_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod review_handlers;
