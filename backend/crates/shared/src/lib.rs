//! Shared Kernel
//!
//! The smallest core shared by every backend crate:
//! - [`error::app_error::AppError`], rendered as the JSON error body of every response
//! - [`error::kind::ErrorKind`], the HTTP-status classification of failures
//! - PostgreSQL unique-violation detection (`sqlx` feature)

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
