use crate::error::ServiceError;
use crate::services::auth::AuthUser;
use crate::store::TemplateRepository;
use actix_web::{web, HttpResponse};

pub async fn process(
    _user: AuthUser,
    templates: web::Data<dyn TemplateRepository>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(templates.list_templates()?))
}
