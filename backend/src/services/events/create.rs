//! `POST /api/events`: creates an event for the caller's organization and
//! assigns palette colors to its roles.

use crate::error::ServiceError;
use crate::services::auth::AuthUser;
use crate::services::events::roles::assign_role_colors;
use crate::store::EventRepository;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::event::Event;
use common::requests::NewEvent;
use log::info;
use uuid::Uuid;

/// Responds `201 Created` with the stored event.
pub async fn process(
    user: AuthUser,
    events: web::Data<dyn EventRepository>,
    payload: web::Json<NewEvent>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("event name must not be empty".into()));
    }

    let event = Event {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        organization_id: user.organization.clone(),
        created_at: Utc::now().to_rfc3339(),
        description: payload.description,
        roles: assign_role_colors(&payload.roles.unwrap_or_default(), &[]),
    };
    events.put_event(&user.organization, &event)?;
    info!("{} created event {} ({})", user.username, event.id, event.name);
    Ok(HttpResponse::Created().json(event))
}
