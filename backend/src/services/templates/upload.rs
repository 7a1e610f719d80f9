use crate::error::ServiceError;
use crate::services::auth::AuthUser;
use crate::services::multipart::read_form;
use crate::storage::{upload_extension, write_atomic, Storage};
use crate::store::TemplateRepository;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::model::template::{Template, TemplateType};
use log::{info, warn};
use std::fs;
use uuid::Uuid;

/// Multipart fields: `file`, `name` and `type` (`svg` or `html`).
pub async fn process(
    user: AuthUser,
    templates: web::Data<dyn TemplateRepository>,
    storage: web::Data<Storage>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let form = read_form(payload).await?;
    let name = form
        .field("name")
        .ok_or_else(|| ServiceError::Validation("template name is required".into()))?
        .to_string();
    let template_type: TemplateType = form
        .field("type")
        .ok_or_else(|| ServiceError::Validation("template type is required".into()))?
        .parse()
        .map_err(ServiceError::Validation)?;
    let file = form
        .file
        .ok_or_else(|| ServiceError::Validation("template file is required".into()))?;
    if std::str::from_utf8(&file.bytes).is_err() {
        return Err(ServiceError::Validation("template file must be UTF-8 text".into()));
    }

    let id = Uuid::new_v4().to_string();
    let extension = upload_extension(file.filename.as_deref(), template_type.default_extension());
    let path = storage.template_path(&id, &extension);
    write_atomic(&path, &file.bytes)?;

    let template = Template::new(id, name, template_type);
    if let Err(e) = templates.insert_template(&template) {
        if let Err(cleanup) = fs::remove_file(&path) {
            warn!("cannot remove orphaned template file {}: {}", path.display(), cleanup);
        }
        return Err(e.into());
    }
    info!(
        "{} uploaded {} template {} ({})",
        user.username, template.template_type, template.id, template.name
    );
    Ok(HttpResponse::Ok().json(template))
}
