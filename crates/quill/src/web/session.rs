//! Login session and flash message cookies.
//!
//! The journal has a single configured user, so the session is a signed
//! marker cookie rather than server-side session state. Flash messages
//! ride the same jar: set on a redirect, shown once, then cleared.

use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};

use crate::config::Config;

/// Name of the signed login cookie.
pub(crate) const SESSION_COOKIE: &str = "quill_session";

/// Name of the signed flash message cookie.
pub(crate) const FLASH_COOKIE: &str = "quill_flash";

/// Value marking an authenticated session.
const SESSION_VALUE: &str = "logged-in";

/// Derive the cookie signing key.
///
/// With a configured secret the key is derived deterministically through
/// BLAKE3's extendable output, so sessions survive restarts. Without one
/// a random key is generated and all cookies are invalidated when the
/// process exits.
pub(crate) fn cookie_key(config: &Config) -> Key {
    match config.auth.secret.as_deref() {
        Some(secret) if !secret.is_empty() => {
            let mut bytes = [0u8; 64];
            let mut hasher = blake3::Hasher::new();
            hasher.update(secret.as_bytes());
            hasher.finalize_xof().fill(&mut bytes);
            Key::from(&bytes)
        }
        _ => Key::generate(),
    }
}

/// Check whether the jar carries a valid login session.
pub(crate) fn is_logged_in(jar: &SignedCookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|cookie| cookie.value() == SESSION_VALUE)
}

/// Mark the session as logged in.
pub(crate) fn log_in(jar: SignedCookieJar) -> SignedCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, SESSION_VALUE))
            .path("/")
            .http_only(true),
    )
}

/// Clear the login session.
pub(crate) fn log_out(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Queue a one-shot message for the next rendered page.
pub(crate) fn set_flash(jar: SignedCookieJar, message: &str) -> SignedCookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, message.to_owned()))
            .path("/")
            .http_only(true),
    )
}

/// Take the pending flash message, clearing it from the jar.
pub(crate) fn take_flash(jar: SignedCookieJar) -> (SignedCookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE) {
        Some(cookie) => {
            let message = cookie.value().to_owned();
            let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
            (jar, Some(message))
        }
        None => (jar, None),
    }
}
