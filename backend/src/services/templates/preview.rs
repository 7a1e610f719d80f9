//! Sample certificate for a template, rendered with placeholder data and
//! returned inline.

use crate::error::ServiceError;
use crate::services::auth::AuthUser;
use crate::services::certificates::render::{today, CertificateLayout, CertificateRenderer};
use crate::services::templates::load_markup;
use crate::storage::Storage;
use crate::store::TemplateRepository;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use common::model::participant::Participant;

const SAMPLE_EVENT: &str = "Пример мероприятия";

fn sample_participant() -> Participant {
    Participant {
        fio: "Иванов Иван Иванович".to_string(),
        email: "example@example.com".to_string(),
        role: "участник".to_string(),
        place: Some(1),
    }
}

pub async fn process(
    _user: AuthUser,
    templates: web::Data<dyn TemplateRepository>,
    storage: web::Data<Storage>,
    renderer: web::Data<dyn CertificateRenderer>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let (template, markup) = load_markup(templates.get_ref(), &storage, &template_id)?;
    let layout = CertificateLayout::compose(
        &sample_participant(),
        &markup,
        template.template_type,
        SAMPLE_EVENT,
        Some(&today()),
    );
    let renderer = renderer.into_inner();
    let pdf = tokio::task::spawn_blocking(move || renderer.render(&layout)).await??;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"preview_{}.pdf\"", template.id),
        ))
        .body(pdf))
}
