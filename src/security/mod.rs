// [rust] Security module organization - token and password handling
pub mod jwt; // [security] Access token signing and verification
pub mod password; // [security] Argon2id password hashing and policy

pub use jwt::*;
