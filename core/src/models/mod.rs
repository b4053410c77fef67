// storefront-core/src/models/mod.rs

//! Contains data structures representing database entities and the payloads that create them.

pub mod audit;
pub mod order;
pub mod product;
pub mod user;

pub use audit::Audit;
pub use order::{LineRequest, NewOrder, Order, OrderDetail, OrderItem, OrderItemDetail, OrderPayload, OrderStatus};
pub use product::{
  NewCategory, NewProduct, NewReview, Product, ProductCategory, ProductPatch, ProductReview, ReviewPatch,
};
pub use user::{NewUser, Registration, User};
