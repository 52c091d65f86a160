//! Cookie-based user identity
//!
//! Every request carries an `auth` cookie holding an HS256 token with the
//! caller's user id. Requests without one get a freshly minted id and the
//! cookie is set on the response.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const AUTH_COOKIE: &str = "auth";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: String,
}

/// The caller's identity, inserted as a request extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    /// No cookie was presented; the id was minted for this request
    pub is_new: bool,
}

pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthKeys {
    /// If secret is None, generates a random key (WARNING: cookies won't survive restarts)
    pub fn new(secret: Option<&str>) -> Self {
        let secret = match secret {
            Some(s) => s.as_bytes().to_vec(),
            None => rand::random::<[u8; 32]>().to_vec(),
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
            validation,
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String> {
        let claims = Claims {
            user_id: user_id.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("failed to sign auth token")
    }

    /// Returns the user id carried by a valid token
    pub fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .context("auth token failed signature or structural validation")?;
        Ok(data.claims.user_id)
    }
}

/// Random url-safe user id
pub fn new_user_id() -> String {
    BASE64_URL_SAFE_NO_PAD.encode(rand::random::<[u8; 16]>())
}

fn auth_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub async fn auth_middleware(
    State(keys): State<Arc<AuthKeys>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = auth_cookie(request.headers()) {
        return match keys.verify(&token) {
            Ok(user_id) => {
                request.extensions_mut().insert(AuthUser {
                    id: user_id,
                    is_new: false,
                });
                next.run(request).await
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected auth cookie");
                StatusCode::UNAUTHORIZED.into_response()
            }
        };
    }

    let user_id = new_user_id();
    let cookie = match keys
        .issue(&user_id)
        .and_then(|token| {
            HeaderValue::from_str(&format!("{AUTH_COOKIE}={token}; Path=/"))
                .context("auth token is not a valid header value")
        }) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue auth cookie");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    request.extensions_mut().insert(AuthUser {
        id: user_id,
        is_new: true,
    });

    let mut response = next.run(request).await;
    response.headers_mut().append(SET_COOKIE, cookie);
    response
}
