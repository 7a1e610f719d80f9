//! HS256 bearer tokens and the `AuthUser` extractor.

use crate::error::ServiceError;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// Organization the user acts for.
    pub org: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, username: &str, organization: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            org: organization.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Signature and expiry are both checked.
    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("rejected bearer token: {e}");
                ServiceError::Unauthorized
            })
    }
}

/// The authenticated caller. Its organization comes from verified claims only.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub organization: String,
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ServiceError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or(ServiceError::Unauthorized)?;
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ServiceError::Unauthorized)?;
    let claims = issuer.verify(token.trim())?;
    Ok(AuthUser {
        username: claims.sub,
        organization: claims.org,
    })
}

impl FromRequest for AuthUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
