//! Defines functions for handling authentication with cookies.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

/// The name of the cookie that marks a client as logged in.
pub const COOKIE_AUTH: &str = "auth";
/// How long a log-in lasts by default.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::days(1);
/// How long a log-in lasts when the user asks to be remembered.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(30);

/// Add an auth cookie to the cookie jar, indicating that the client is logged in.
///
/// The cookie expires `duration` from now.
pub fn set_auth_cookie(jar: PrivateCookieJar, duration: Duration) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_AUTH, "true"))
            .max_age(duration)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_AUTH, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}

/// Whether `jar` holds an auth cookie this server issued.
///
/// Cookies that fail decryption never reach the jar, so a forged or
/// tampered cookie counts as absent.
pub fn is_authenticated(jar: &PrivateCookieJar) -> bool {
    jar.get(COOKIE_AUTH)
        .is_some_and(|cookie| cookie.value_trimmed() == "true")
}

#[cfg(test)]
mod cookie_tests {
    use axum::http::{HeaderMap, header::COOKIE};
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use super::{
        COOKIE_AUTH, DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie,
        is_authenticated, set_auth_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    #[test]
    fn can_set_cookie() {
        let jar = set_auth_cookie(get_jar(), DEFAULT_COOKIE_DURATION);

        let cookie = jar.get(COOKIE_AUTH).unwrap();

        assert_eq!(cookie.value(), "true");
        assert!(is_authenticated(&jar));
    }

    #[test]
    fn cookie_attributes() {
        let jar = set_auth_cookie(get_jar(), REMEMBER_ME_COOKIE_DURATION);

        let cookie = jar.get(COOKIE_AUTH).unwrap();

        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn empty_jar_is_not_authenticated() {
        assert!(!is_authenticated(&get_jar()));
    }

    #[test]
    fn plain_cookie_is_not_authenticated() {
        // A cookie the client made up cannot be decrypted with the server key.
        let forged = Cookie::new(COOKIE_AUTH, "true");
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, forged.encoded().to_string().parse().unwrap());

        let jar = PrivateCookieJar::from_headers(&headers, Key::from(&Sha512::digest(b"foobar")));

        assert!(!is_authenticated(&jar));
    }

    #[test]
    fn invalidate_auth_cookie_succeeds() {
        let jar = set_auth_cookie(get_jar(), DEFAULT_COOKIE_DURATION);

        let jar = invalidate_auth_cookie(jar);
        let cookie = jar.get(COOKIE_AUTH).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert!(!is_authenticated(&jar));
    }
}
