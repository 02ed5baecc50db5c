use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::routes::auth::claims::Claims;
use crate::utils::jwt::SessionKeyProvider;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, PartialEq)]
pub struct AuthSession(pub Claims);

impl<S> FromRequestParts<S> for AuthSession
where
    S: SessionKeyProvider + Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(AUTH_COOKIE).ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = state.session_keys().verify(token.value()).map_err(|err| {
            debug!(?err, "rejected session token");
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthSession(claims))
    }
}
