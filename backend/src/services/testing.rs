//! Helpers shared by handler tests.

use crate::services::auth::TokenIssuer;
use actix_web::http::header;

pub const SECRET: &str = "test-secret";

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, 60)
}

/// `Authorization` header for a user of `organization`.
pub fn bearer(organization: &str) -> (header::HeaderName, String) {
    let token = issuer()
        .issue(&format!("{organization}-user"), organization)
        .expect("token is issued");
    (header::AUTHORIZATION, format!("Bearer {token}"))
}
