use crate::error::{OrNotFound, ServiceError};
use crate::services::auth::AuthUser;
use crate::storage::{write_atomic, Storage};
use crate::store::TemplateRepository;
use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ContentForm {
    pub content: String,
}

/// Replaces the stored markup. Jobs already planned keep their own snapshot.
pub async fn process(
    user: AuthUser,
    templates: web::Data<dyn TemplateRepository>,
    storage: web::Data<Storage>,
    template_id: web::Path<String>,
    form: web::Form<ContentForm>,
) -> Result<HttpResponse, ServiceError> {
    let template = templates.get_template(&template_id).or_not_found("template")?;
    let path = match storage.find_template_file(&template.id)? {
        Some(path) => path,
        None => storage.template_path(&template.id, template.template_type.default_extension()),
    };
    write_atomic(&path, form.content.as_bytes())?;
    info!("{} replaced content of template {}", user.username, template.id);
    Ok(HttpResponse::Ok().json(template))
}
