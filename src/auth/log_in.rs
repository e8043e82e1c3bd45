//! This file defines the routes for displaying the log-in page, handling
//! log-in requests and reporting whether the client is logged in.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Error,
    auth::{
        AuthState, DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, is_authenticated,
        set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, base, card,
    },
};

/// Submits the form as JSON and goes to the dashboard on success.
const LOG_IN_SCRIPT: &str = r#"
document.addEventListener("DOMContentLoaded", () => {
    const form = document.getElementById("log-in-form");
    const error = document.getElementById("log-in-error");

    form.addEventListener("submit", async (event) => {
        event.preventDefault();
        const data = new FormData(form);
        const response = await fetch(form.dataset.endpoint, {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify({
                username: data.get("username"),
                password: data.get("password"),
                remember: data.get("remember") !== null,
            }),
        });

        if (response.ok) {
            window.location.href = "/";
            return;
        }

        const body = await response.json().catch(() => ({}));
        error.textContent = body.error || "Login gagal";
        error.hidden = false;
    });
});
"#;

fn log_in_form() -> Markup {
    html! {
        form
            id="log-in-form"
            data-endpoint=(endpoints::AUTH_API)
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    type="text"
                    name="username"
                    id="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus;
            }

            div
            {
                label for="password" class=(FORM_LABEL_STYLE) { "Password" }

                input
                    type="password"
                    name="password"
                    id="password"
                    placeholder="••••••••"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember"
                    id="remember"
                    class="rounded-xs";

                label
                    for="remember"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Ingat saya selama 30 hari"
                }
            }

            p id="log-in-error" class="text-red-500 text-base" hidden {}

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                "Masuk"
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let content = card("Masuk ke Keuangan", &log_in_form());
    let script = HeadElement::ScriptSource(PreEscaped(LOG_IN_SCRIPT.to_owned()));

    base("Login", &[script], &content).into_response()
}

/// The JSON body of a log-in request.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// User name entered during log-in.
    #[serde(default)]
    pub username: String,

    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,

    /// Whether to keep the client logged in for thirty days instead of one.
    #[serde(default)]
    pub remember: bool,
}

/// Handler for log-in requests via the POST method.
///
/// On success the auth cookie is set and `{"success": true}` is returned.
///
/// # Errors
///
/// - 400 if the body is not a valid log-in request.
/// - 500 if no credentials are configured.
/// - 401 if the user name or password is wrong.
pub async fn post_log_in(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Response {
    let Json(user_data) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!("Rejected log-in request: {rejection}");
            return Error::InvalidRequest.into_response();
        }
    };

    let Some(credentials) = &state.credentials else {
        tracing::error!("Log-in attempted but no credentials are configured");
        return Error::AuthNotConfigured.into_response();
    };

    if !credentials.matches(&user_data.username, &user_data.password) {
        tracing::warn!("Failed log-in attempt for user \"{}\"", user_data.username);
        return Error::InvalidCredentials.into_response();
    }

    let cookie_duration = if user_data.remember {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        DEFAULT_COOKIE_DURATION
    };

    (
        set_auth_cookie(jar, cookie_duration),
        Json(json!({ "success": true })),
    )
        .into_response()
}

/// Report whether the client holds a valid auth cookie.
pub async fn get_auth_status(jar: PrivateCookieJar) -> Json<serde_json::Value> {
    Json(json!({ "authenticated": is_authenticated(&jar) }))
}
