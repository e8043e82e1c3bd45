//! The log-in boundary: one shared account whose credentials come from the
//! environment, a private cookie marking the client as logged in, and a
//! guard that sends everyone else to the log-in page.

mod cookie;
mod log_in;
mod log_out;
mod middleware;

pub use cookie::{
    DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie, is_authenticated,
    set_auth_cookie,
};
pub use log_in::{get_auth_status, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard};
