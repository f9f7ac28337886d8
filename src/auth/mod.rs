//! Credentials, bearer tokens and the request gates built on them.

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{authenticate, require_admin, Identity};
pub use password::PasswordHasher;
pub use token::{Claims, InvalidToken, TokenService, TOKEN_TTL_HOURS};
