//! `PUT /api/events/{event_id}`: role colors survive by name.

use crate::error::{OrNotFound, ServiceError};
use crate::services::auth::AuthUser;
use crate::services::events::roles::assign_role_colors;
use crate::store::EventRepository;
use actix_web::{web, HttpResponse};
use common::model::event::Event;
use common::requests::EventUpdate;

/// Partial update inside one store transaction. Absent fields are kept.
pub async fn process(
    user: AuthUser,
    events: web::Data<dyn EventRepository>,
    event_id: web::Path<String>,
    payload: web::Json<EventUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let update = payload.into_inner();
    let name = match update.name.as_deref().map(str::trim) {
        Some("") => return Err(ServiceError::Validation("event name must not be empty".into())),
        other => other.map(str::to_string),
    };

    let event = events
        .update_event(&user.organization, &event_id, &mut |event: &mut Event| {
            if let Some(name) = &name {
                event.name = name.clone();
            }
            if let Some(description) = &update.description {
                event.description = Some(description.clone());
            }
            if let Some(roles) = &update.roles {
                event.roles = assign_role_colors(roles, &event.roles);
            }
        })
        .or_not_found("event")?;
    Ok(HttpResponse::Ok().json(event))
}
