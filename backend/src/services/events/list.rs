//! `GET /api/events`: the caller's events in creation order.

use crate::error::ServiceError;
use crate::services::auth::AuthUser;
use crate::store::EventRepository;
use actix_web::{web, HttpResponse};

pub async fn process(
    user: AuthUser,
    events: web::Data<dyn EventRepository>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(events.list_events(&user.organization)?))
}
