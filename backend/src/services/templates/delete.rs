use crate::error::{OrNotFound, ServiceError};
use crate::services::auth::AuthUser;
use crate::storage::Storage;
use crate::store::TemplateRepository;
use actix_web::{web, HttpResponse};
use common::requests::MessageResponse;
use log::info;
use std::fs;

pub async fn process(
    user: AuthUser,
    templates: web::Data<dyn TemplateRepository>,
    storage: web::Data<Storage>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    templates.delete_template(&template_id).or_not_found("template")?;
    if let Some(path) = storage.find_template_file(&template_id)? {
        fs::remove_file(path)?;
    }
    info!("{} deleted template {}", user.username, template_id);
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Шаблон удален".to_string(),
    }))
}
