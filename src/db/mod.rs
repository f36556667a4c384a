//! Persistence layer: user accounts and code-assist history.

pub mod models;
pub mod operations;

pub use models::{CodeSession, User};
pub use operations::DbOperations;
