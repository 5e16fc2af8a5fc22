//! Well-known session keys.

/// Id of the signed-in user.
pub const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";

/// One-shot message shown on the next rendered page.
pub const FLASH: &str = "flash";

/// Anti-forgery token bound to the session.
pub const CSRF_TOKEN: &str = "csrf_token";
