// storefront-core/src/auth/mod.rs

//! Credential primitives: Argon2 password hashes and HS256 access/refresh tokens.

pub mod password;
pub mod tokens;

pub use password::{hash_password, verify_password};
pub use tokens::{Claims, TokenPair, TokenService, TokenType};
