//! `DELETE /api/events/{event_id}`.

use crate::error::{OrNotFound, ServiceError};
use crate::services::auth::AuthUser;
use crate::store::EventRepository;
use actix_web::{web, HttpResponse};
use common::requests::MessageResponse;
use log::info;

/// Replies with `{"message": "Мероприятие удалено"}`.
pub async fn process(
    user: AuthUser,
    events: web::Data<dyn EventRepository>,
    event_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    events
        .delete_event(&user.organization, &event_id)
        .or_not_found("event")?;
    info!("{} deleted event {}", user.username, event_id);
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Мероприятие удалено".to_string(),
    }))
}
