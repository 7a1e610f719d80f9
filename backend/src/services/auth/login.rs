//! `POST /api/auth/login`: exchanges form credentials for a bearer token.

use crate::config::AuthSettings;
use crate::error::ServiceError;
use crate::services::auth::token::TokenIssuer;
use actix_web::{web, HttpResponse};
use common::requests::LoginResponse;
use log::{info, warn};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn process(
    accounts: web::Data<AuthSettings>,
    issuer: web::Data<TokenIssuer>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.into_inner();
    let Some(user) = accounts
        .users
        .iter()
        .find(|u| u.username == form.username && !u.disabled)
        .filter(|u| u.password == form.password)
    else {
        warn!("failed login for {:?}", form.username);
        return Err(ServiceError::Unauthorized);
    };

    let access_token = issuer.issue(&user.username, &user.organization)?;
    info!("{} logged in for {}", user.username, user.organization);
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        organization: user.organization.clone(),
    }))
}
