//! services/api/src/web/locale.rs
//!
//! Picks the response locale: `?locale=` first, then `Accept-Language`, then the
//! configured default.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use reviewiz_core::Locale;
use std::convert::Infallible;
use std::sync::Arc;

use crate::web::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale(pub Locale);

impl FromRequestParts<Arc<AppState>> for RequestLocale {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state.config.default_locale)))
    }
}

fn resolve(parts: &Parts, fallback: Locale) -> Locale {
    let from_query = parts.uri.query().and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.strip_prefix("locale="))
            .find_map(|tag| tag.parse::<Locale>().ok())
    });
    if let Some(locale) = from_query {
        return locale;
    }

    parts
        .headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|accept| {
            accept
                .split(',')
                .map(|entry| entry.split(';').next().unwrap_or_default())
                .find_map(|tag| tag.parse::<Locale>().ok())
        })
        .unwrap_or(fallback)
}
