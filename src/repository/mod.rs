//! sqlx queries, one module per table family. Functions take the pool (or
//! an open connection when they must join a caller's transaction) and
//! return `sqlx::Error` untouched.

pub mod addresses;
pub mod catalog;
pub mod consultations;
pub mod inquiries;
pub mod measurements;
pub mod orders;
pub mod users;
