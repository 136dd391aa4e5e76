pub mod auth;
pub mod database;
pub mod error;
pub mod jwt;

pub use auth::AuthService;
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{JwtService, TokenResponse};
