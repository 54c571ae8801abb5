//! Authentication: Argon2id password hashing, HS256 session tokens, the
//! `AuthUser` extractor, and the register / login / me handlers.

pub mod extractor;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod users;

pub use extractor::AuthUser;
