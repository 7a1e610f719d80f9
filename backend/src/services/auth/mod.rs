mod login;
pub mod token;

use actix_web::web::{post, scope};
use actix_web::Scope;

pub use token::{AuthUser, TokenIssuer};

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/login", post().to(login::process))
}
