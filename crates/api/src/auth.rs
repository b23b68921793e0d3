//! Bearer token authentication.
//!
//! Callers identify themselves with an `Authorization: Bearer <jwt>` header.
//! The token's signature, expiry, issuer and audience are checked before its
//! `sub` and permissions claims become the request's [`Principal`]. Requests
//! without the header run anonymously.

use std::collections::HashMap;
use std::sync::Arc;

use application::{ErrorEnvelope, Principal, RequestContext};
use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::AppState;
use crate::config::{AuthSettings, JwtKey};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const INVALID_TOKEN_MESSAGE: &str = "The bearer token is missing or invalid.";

/// Authentication failures. All of them are answered with 401.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token verification key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("authorization header is not a bearer token")]
    MalformedHeader,

    #[error("bearer token presented but no verification key is configured")]
    NotConfigured,

    #[error("bearer token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,

    #[serde(flatten)]
    other: HashMap<String, Value>,
}

/// Verifies access tokens and turns their claims into principals.
#[derive(Clone)]
pub struct Authenticator {
    key: DecodingKey,
    validation: Validation,
    permissions_claim: String,
}

impl Authenticator {
    /// Builds an authenticator, or `None` when no verification key is set.
    pub fn from_settings(settings: &AuthSettings) -> Result<Option<Self>, AuthError> {
        let Some(key) = &settings.key else {
            return Ok(None);
        };

        let (key, algorithm) = match key {
            JwtKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            JwtKey::RsaPublicKeyPem(pem) => (
                DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(AuthError::InvalidKey)?,
                Algorithm::RS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        let mut required = vec!["exp", "sub"];
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match &settings.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required);

        Ok(Some(Self {
            key,
            validation,
            permissions_claim: settings.permissions_claim.clone(),
        }))
    }

    /// Validates a token and returns the principal it describes.
    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?.claims;

        Ok(permissions(claims.other.get(&self.permissions_claim))
            .into_iter()
            .fold(Principal::new(claims.sub), Principal::with_permission))
    }
}

/// Reads a permissions claim given either as an array or as a
/// space-separated string.
fn permissions(claim: Option<&Value>) -> Vec<String> {
    match claim {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(list)) => list.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Returns the bearer token, `None` when no authorization header is sent.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(AuthError::MalformedHeader),
    }
}

/// The request context of the calling user.
///
/// Anonymous when no bearer token is sent. Requests are cancelled when the
/// server starts shutting down.
pub struct CurrentUser(pub RequestContext);

/// Rejection for a request whose credentials could not be verified.
#[derive(Debug)]
pub struct AuthRejection(pub AuthError);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "authentication failed");
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(ErrorEnvelope::unauthorized(INVALID_TOKEN_MESSAGE)),
        )
            .into_response()
    }
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        AuthRejection(err)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = match bearer_token(&parts.headers)? {
            Some(token) => {
                let authenticator = state
                    .authenticator
                    .as_ref()
                    .ok_or(AuthError::NotConfigured)?;
                RequestContext::for_principal(authenticator.authenticate(token)?)
            }
            None => RequestContext::anonymous(),
        };

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .unwrap_or_else(|| ctx.correlation_id());

        Ok(CurrentUser(
            ctx.with_cancellation(state.shutdown.child_token())
                .with_correlation_id(correlation_id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
    use serde_json::json;

    const SECRET: &str = "unit-test-secret";

    fn settings() -> AuthSettings {
        AuthSettings {
            key: Some(JwtKey::Secret(SECRET.to_string())),
            issuer: Some("https://issuer.test/".to_string()),
            audience: Some("exemplum-api".to_string()),
            ..AuthSettings::default()
        }
    }

    fn sign(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn claims(permissions: Value) -> Value {
        json!({
            "sub": "auth0|alice",
            "iss": "https://issuer.test/",
            "aud": "exemplum-api",
            "exp": get_current_timestamp() + 600,
            "permissions": permissions,
        })
    }

    #[test]
    fn valid_token_yields_principal_with_permissions() {
        let auth = Authenticator::from_settings(&settings()).unwrap().unwrap();

        let principal = auth
            .authenticate(&sign(claims(json!(["WriteTodo", "DeleteTodo"]))))
            .unwrap();

        assert_eq!(principal.user_id().as_str(), "auth0|alice");
        assert!(principal.has_permission("WriteTodo"));
        assert!(principal.has_permission("DeleteTodo"));
    }

    #[test]
    fn space_separated_permissions_are_accepted() {
        let auth = Authenticator::from_settings(&settings()).unwrap().unwrap();

        let principal = auth.authenticate(&sign(claims(json!("WriteTodo read")))).unwrap();
        assert_eq!(principal.permissions().count(), 2);
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let auth = Authenticator::from_settings(&settings()).unwrap().unwrap();
        let mut claims = claims(json!([]));
        claims["iss"] = json!("https://elsewhere.test/");

        assert!(matches!(auth.authenticate(&sign(claims)), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn missing_subject_is_rejected() {
        let auth = Authenticator::from_settings(&settings()).unwrap().unwrap();
        let mut claims = claims(json!([]));
        claims.as_object_mut().unwrap().remove("sub");

        assert!(auth.authenticate(&sign(claims)).is_err());
    }

    #[test]
    fn no_key_means_no_authenticator() {
        assert!(Authenticator::from_settings(&AuthSettings::default()).unwrap().is_none());
    }

    #[test]
    fn bearer_scheme_is_required() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).unwrap().is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic YWxpY2U6"));
        assert!(matches!(bearer_token(&headers), Err(AuthError::MalformedHeader)));
    }
}
