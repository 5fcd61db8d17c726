/**
 * Newsletter Routes
 * Signup endpoint. A duplicate email is deliberately indistinguishable from a
 * first-time signup: the uniqueness rejection is swallowed into the same
 * redirect so the endpoint cannot be used to enumerate subscribers.
 */
use axum::{
    extract::Form,
    http::{header::REFERER, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};

use crate::db;
use crate::error::AppError;
use crate::intake::{self, NewsletterPayload};

/// Redirect target after signup: the referring page when one is present.
fn redirect_target(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "/".to_string())
}

/// POST /newsletter/signup
pub async fn signup(
    headers: HeaderMap,
    Form(payload): Form<NewsletterPayload>,
) -> Result<Response, AppError> {
    let pool = db::pool()?;

    if let Err(errors) = intake::validate_newsletter(&payload) {
        return Ok(errors.into_response_with(&payload));
    }

    // Ok(false) is a swallowed duplicate; the response is identical.
    let newly_subscribed =
        intake::subscribe(&pool, &payload.email, payload.name.as_deref(), None).await?;

    tracing::debug!(newly_subscribed, "newsletter signup processed");

    Ok(Redirect::to(&redirect_target(&headers)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_redirect_target_prefers_referer() {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("/blog"));
        assert_eq!(redirect_target(&headers), "/blog");
    }

    #[test]
    fn test_redirect_target_defaults_to_home() {
        assert_eq!(redirect_target(&HeaderMap::new()), "/");
    }
}
