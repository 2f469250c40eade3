//! Identity resolution
//!
//! Sessions are HS256 JWTs issued at sign-in. A request carries its token
//! either as a bearer token or in one of the configured session cookies.
//! Anything that does not verify resolves to "no identity"; callers decide
//! whether that is an error.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use crate::config::settings::AuthConfig;
use crate::utils::errors::{PlanlyError, Result};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
        }
    }
}

/// Per-request caller context
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Option<Identity>,
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            identity,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self::new(Some(identity))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }

    /// The caller's identity, or `Unauthenticated`
    pub fn require_identity(&self) -> Result<&Identity> {
        self.identity.as_ref().ok_or(PlanlyError::Unauthenticated)
    }
}

pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(rename = "lineUserId", default, skip_serializing_if = "Option::is_none")]
    line_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    exp: i64,
}

/// Resolver verifying HS256 session tokens
#[derive(Clone)]
pub struct JwtSessionResolver {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_names: Vec<String>,
}

impl JwtSessionResolver {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.session_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            cookie_names: config.cookie_names.clone(),
        }
    }

    /// Issue a session token for `identity` valid for `ttl`
    pub fn issue_token(&self, identity: &Identity, ttl: Duration) -> Result<String> {
        let claims = SessionClaims {
            line_user_id: Some(identity.id.clone()),
            sub: Some(identity.id.clone()),
            name: identity.name.clone(),
            exp: (Utc::now() + ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify a token and extract the identity it names
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?.claims;

        let id = claims
            .line_user_id
            .or(claims.sub)
            .filter(|id| !id.trim().is_empty())
            .ok_or(PlanlyError::Unauthenticated)?;

        Ok(Identity { id, name: claims.name })
    }

    fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if bearer.is_some() {
            return bearer;
        }

        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| self.cookie_names.iter().any(|c| c == name))
            .map(|(_, value)| value.trim())
            .filter(|t| !t.is_empty())
    }
}

impl IdentityResolver for JwtSessionResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = self.token_from_headers(headers)?;
        match self.verify(token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "Session token rejected");
                None
            }
        }
    }
}
