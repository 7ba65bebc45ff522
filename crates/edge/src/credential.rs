use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::CookieJar;

/// Where a request's credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Cookie,
    BearerHeader,
}

/// Detect a credential in the auth cookie or an `Authorization: Bearer` header.
///
/// Only presence is reported; the value is never inspected. Empty values
/// count as absent.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<CredentialSource> {
    let jar = CookieJar::from_headers(headers);
    if jar
        .get(cookie_name)
        .is_some_and(|c| !c.value().trim().is_empty())
    {
        return Some(CredentialSource::Cookie);
    }

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim());

    match bearer {
        Some(token) if !token.is_empty() => Some(CredentialSource::BearerHeader),
        _ => None,
    }
}
