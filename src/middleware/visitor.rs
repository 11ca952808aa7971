use std::path::Path;

use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::storage::FileStateStorage;

pub const VISITOR_COOKIE: &str = "visitor_id";

/// Identifies the browser that owns a cart and wishlist, issuing a new
/// id on first contact.
pub fn visitor_id(cookies: &Cookies, secure: bool) -> Uuid {
    if let Some(id) = cookies
        .get(VISITOR_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        return id;
    }

    let id = Uuid::new_v4();
    let cookie = Cookie::build((VISITOR_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .max_age(time::Duration::days(365))
        .build();
    cookies.add(cookie);
    id
}

pub fn visitor_storage(cookies: &Cookies, root: &Path, secure: bool) -> FileStateStorage {
    FileStateStorage::for_visitor(root, visitor_id(cookies, secure))
}
