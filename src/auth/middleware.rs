//! Authentication middleware that lets logged-in clients through and
//! redirects everyone else to the log-in page.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{AppState, auth::is_authenticated, config::Credentials, endpoints};

/// The state needed for logging in and the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The account credentials, `None` when they are not configured.
    pub credentials: Option<Credentials>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            credentials: state.credentials.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Whether `path` can be reached without logging in: the log-in page, the
/// auth API, static files and the favicon.
pub fn is_public_path(path: &str) -> bool {
    path == endpoints::FAVICON
        || endpoints::PUBLIC_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
}

/// Middleware function that checks for a valid authorization cookie.
///
/// Requests for public paths and requests carrying the auth cookie are run
/// normally, all others are redirected to the log-in page.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key` for decrypting and verifying the cookie contents.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::<Key>::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
        }
    };

    if !is_authenticated(&jar) {
        return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}
