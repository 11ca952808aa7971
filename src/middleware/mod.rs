pub mod permission;
pub mod visitor;

pub use permission::{require_admin, require_user, CurrentUser, AUTH_COOKIE};
pub use visitor::visitor_storage;
