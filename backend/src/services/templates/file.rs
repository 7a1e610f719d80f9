use crate::error::{OrNotFound, ServiceError};
use crate::storage::Storage;
use crate::store::TemplateRepository;
use actix_web::{web, HttpResponse};
use mime_guess::from_path;
use std::fs;

/// Raw template markup. Served without authentication so previews can embed it.
pub async fn process(
    templates: web::Data<dyn TemplateRepository>,
    storage: web::Data<Storage>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    templates.get_template(&template_id).or_not_found("template")?;
    let path = storage
        .find_template_file(&template_id)?
        .ok_or_else(|| ServiceError::not_found("template file"))?;
    let mime = from_path(&path).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .content_type(mime.as_ref())
        .body(fs::read(&path)?))
}
