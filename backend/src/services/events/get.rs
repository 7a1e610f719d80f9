//! `GET /api/events/{event_id}`.

use crate::error::{OrNotFound, ServiceError};
use crate::services::auth::AuthUser;
use crate::store::EventRepository;
use actix_web::{web, HttpResponse};

/// An event of another organization is `403`, never `404`.
pub async fn process(
    user: AuthUser,
    events: web::Data<dyn EventRepository>,
    event_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let event = events
        .get_event(&user.organization, &event_id)
        .or_not_found("event")?;
    Ok(HttpResponse::Ok().json(event))
}
