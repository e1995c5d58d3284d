//! Credential primitives: password hashing and bearer token signing.

mod password;
mod token;

pub use password::{hash_password, verify_password, verify_password_or_dummy};
pub use token::{generate_secret, Claims, SessionIssuer};
