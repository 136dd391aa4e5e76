use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::token::TokenVerifier;

/// The authenticated owner of the current request.
///
/// Inserted into request extensions by [`require_auth`]; handlers receive it
/// through the extractor and scope every storage operation with it. Owner
/// values arriving in request bodies are never trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(pub Uuid);

/// Middleware to require a valid bearer token.
///
/// A missing header, a malformed header and every verification failure all
/// produce the same response body, so a caller cannot tell which check
/// rejected the request. The specific reason goes to the log instead.
pub async fn require_auth<S>(
    State(state): State<S>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: AsRef<TokenVerifier>,
{
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => {
            tracing::debug!("Request rejected: missing or malformed Authorization header");
            return Err(unauthorized());
        }
    };

    let principal = match state.as_ref().verify_principal(token) {
        Ok(principal) => principal,
        Err(reason) => {
            tracing::debug!(%reason, "Request rejected: token verification failed");
            return Err(unauthorized());
        }
    };

    tracing::Span::current().record("user_id", principal.to_string());
    req.extensions_mut().insert(Principal(principal));

    Ok(next.run(req).await)
}

fn unauthorized() -> AppError {
    AppError::AuthError(anyhow::anyhow!("Invalid or expired credentials"))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().copied().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Principal missing from request extensions (auth middleware not applied)"
            ))
        })
    }
}
