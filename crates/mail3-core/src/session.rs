//! Cookie-based session handling.
//!
//! The login cookie carries `{address, jwt, uuid}` as percent-encoded JSON.
//! Gated server-rendered requests without a well-formed JWT are answered
//! with a 307 back to the home route.

use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::constants::{routes, COOKIE_KEY, COOKIE_MAX_AGE_DAYS};
use crate::models::LoginInfo;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Routes reachable without a session.
pub const PUBLIC_ROUTES: &[&str] = &[routes::HOME, routes::WHITE_LIST];

/// Cookie payloads written by older clients may lack `address` or `uuid`.
#[derive(Deserialize)]
struct CookieLogin {
    #[serde(default)]
    address: String,
    jwt: String,
    #[serde(default)]
    uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: &'static str,
}

impl Redirect {
    pub fn home() -> Self {
        Self {
            location: routes::HOME,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::TEMPORARY_REDIRECT
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        (
            self.status(),
            [
                (header::LOCATION, self.location),
                (header::CACHE_CONTROL, "no-cache, no-store"),
                (header::PRAGMA, "no-cache"),
            ],
        )
            .into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow(LoginInfo),
    Redirect(Redirect),
}

/// `Set-Cookie` value persisting `info` for 14 days from `now`.
pub fn login_cookie(info: &LoginInfo, now: DateTime<Utc>) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(info)?;
    let expires = now + Duration::days(COOKIE_MAX_AGE_DAYS);
    Ok(format!(
        "{}={}; Path=/; Expires={}",
        COOKIE_KEY,
        utf8_percent_encode(&json, NON_ALPHANUMERIC),
        expires.format(HTTP_DATE)
    ))
}

/// `Set-Cookie` value removing the login cookie.
pub fn logout_cookie() -> String {
    format!(
        "{}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        COOKIE_KEY
    )
}

/// Extract the login info from a `Cookie` header. Anything malformed is `None`.
pub fn parse_login_cookie(cookie_header: &str) -> Option<LoginInfo> {
    let raw = cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name.trim() == COOKIE_KEY).then_some(value.trim())
    })?;
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    let login: CookieLogin = serde_json::from_str(&decoded).ok()?;
    Some(LoginInfo {
        address: login.address,
        jwt: login.jwt,
        uuid: login.uuid,
    })
}

/// Three base64url segments whose header and payload are JSON objects.
/// The signature is not verified here.
pub fn is_well_formed_jwt(jwt: &str) -> bool {
    let segments: Vec<&str> = jwt.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return false;
    };
    if signature.is_empty() {
        return false;
    }
    [header, payload].iter().all(|segment| {
        URL_SAFE_NO_PAD
            .decode(segment.trim_end_matches('='))
            .ok()
            .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
            .is_some_and(|value| value.is_object())
    })
}

/// Decide whether a gated request may proceed.
pub fn gate(cookie_header: Option<&str>) -> GateDecision {
    match cookie_header.and_then(parse_login_cookie) {
        Some(login) if is_well_formed_jwt(&login.jwt) => GateDecision::Allow(login),
        Some(_) => {
            tracing::debug!("session: malformed jwt, redirecting");
            GateDecision::Redirect(Redirect::home())
        }
        None => {
            tracing::debug!("session: no login cookie, redirecting");
            GateDecision::Redirect(Redirect::home())
        }
    }
}

/// [`gate`] over every `Cookie` header of a request.
pub fn gate_headers(headers: &HeaderMap) -> GateDecision {
    let cookies: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    gate(Some(cookies.join("; ").as_str()).filter(|c| !c.is_empty()))
}

/// Client-side guard: where to send the user, if anywhere.
pub fn route_redirect(is_authenticated: bool, path: &str) -> Option<&'static str> {
    if is_authenticated || PUBLIC_ROUTES.contains(&path) {
        None
    } else {
        Some(routes::HOME)
    }
}

/// axum middleware enforcing [`gate`]. The [`LoginInfo`] is added to the
/// request extensions for downstream handlers.
pub async fn require_session(mut request: Request, next: Next) -> Response {
    match gate_headers(request.headers()) {
        GateDecision::Allow(login) => {
            request.extensions_mut().insert(login);
            next.run(request).await
        }
        GateDecision::Redirect(redirect) => redirect.into_response(),
    }
}
