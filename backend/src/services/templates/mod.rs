//! # Template Service Module
//!
//! Endpoints under `/api/templates`. Metadata lives in the template
//! repository, markup on disk under `templates/{id}{ext}`.
//!
//! - `GET /`: list templates.
//! - `POST /upload`: multipart upload of a new template.
//! - `GET /{template_id}/file`: raw markup, unauthenticated.
//! - `GET /{template_id}/preview`: sample certificate PDF.
//! - `PUT /{template_id}`: replace the markup.
//! - `DELETE /{template_id}`: remove record and file.

mod delete;
mod file;
mod list;
mod preview;
pub mod seed;
mod update;
mod upload;

use crate::error::{OrNotFound, ServiceError};
use crate::storage::Storage;
use crate::store::TemplateRepository;
use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;
use common::model::template::Template;
use std::fs;

const API_PATH: &str = "/api/templates";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/upload", post().to(upload::process))
        .route("/{template_id}/file", get().to(file::process))
        .route("/{template_id}/preview", get().to(preview::process))
        .route("/{template_id}", put().to(update::process))
        .route("/{template_id}", delete().to(delete::process))
}

/// Template record and its current markup.
pub fn load_markup(
    templates: &dyn TemplateRepository,
    storage: &Storage,
    template_id: &str,
) -> Result<(Template, String), ServiceError> {
    let template = templates.get_template(template_id).or_not_found("template")?;
    let path = storage
        .find_template_file(template_id)?
        .ok_or_else(|| ServiceError::not_found("template file"))?;
    Ok((template, fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::configure_routes;
    use crate::services::certificates::pipeline::tests::FakeRenderer;
    use crate::services::certificates::render::CertificateRenderer;
    use crate::services::multipart::form;
    use crate::services::testing::{bearer, issuer};
    use crate::storage::Storage;
    use crate::store::{SqliteStore, TemplateRepository};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use common::model::template::{Template, TemplateType};
    use std::sync::Arc;

    fn app_config(storage: Storage) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg| {
            let store: Arc<dyn TemplateRepository> = Arc::new(SqliteStore::open_in_memory().unwrap());
            let renderer: Arc<dyn CertificateRenderer> = Arc::new(FakeRenderer::new());
            cfg.app_data(web::Data::new(issuer()))
                .app_data(web::Data::new(storage))
                .app_data(web::Data::from(store))
                .app_data(web::Data::from(renderer))
                .service(configure_routes());
        }
    }

    fn upload(name: &str, kind: &str, file: (&str, &str)) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/templates/upload")
            .insert_header(bearer("foundation"))
            .insert_header((header::CONTENT_TYPE, form::content_type()))
            .set_payload(form::body(&[("name", name), ("type", kind)], Some(file)))
    }

    #[actix_web::test]
    async fn upload_serve_replace_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let app = test::init_service(App::new().configure(app_config(storage))).await;

        let svg = "<svg><text>{fio}</text></svg>";
        let req = upload("Диплом", "svg", ("diploma.svg", svg)).to_request();
        let template: Template = test::call_and_read_body_json(&app, req).await;
        assert_eq!(template.name, "Диплом");
        assert_eq!(template.template_type, TemplateType::Svg);
        assert_eq!(
            template.file_url.as_deref(),
            Some(format!("/api/templates/{}/file", template.id).as_str())
        );

        let req = test::TestRequest::get()
            .uri("/api/templates")
            .insert_header(bearer("lyceum"))
            .to_request();
        let listed: Vec<Template> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed, vec![template.clone()]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/templates/{}/file", template.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/svg+xml");
        assert_eq!(test::read_body(resp).await, svg);

        let req = test::TestRequest::put()
            .uri(&format!("/api/templates/{}", template.id))
            .insert_header(bearer("foundation"))
            .set_form([("content", "<svg><text>{{ФИО}}</text></svg>")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/templates/{}/file", template.id))
            .to_request();
        assert_eq!(
            test::call_and_read_body(&app, req).await,
            "<svg><text>{{ФИО}}</text></svg>"
        );

        let req = test::TestRequest::delete()
            .uri(&format!("/api/templates/{}", template.id))
            .insert_header(bearer("foundation"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert_eq!(std::fs::read_dir(dir.path().join("templates")).unwrap().count(), 0);

        let req = test::TestRequest::get()
            .uri(&format!("/api/templates/{}/file", template.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn upload_rejects_bad_type_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().configure(app_config(Storage::open(dir.path()).unwrap()))).await;

        let req = upload("X", "pdf", ("x.pdf", "%PDF")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/templates/upload")
            .insert_header(bearer("foundation"))
            .insert_header((header::CONTENT_TYPE, form::content_type()))
            .set_payload(form::body(&[("name", "X"), ("type", "html")], None))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn preview_renders_sample_data() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().configure(app_config(Storage::open(dir.path()).unwrap()))).await;
        let req = upload("Сайт", "html", ("page.html", "<p>{fio}</p>\n<p>{place} место</p>")).to_request();
        let template: Template = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/templates/{}/preview", template.id))
            .insert_header(bearer("foundation"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Иванов Иван Иванович"));
        assert!(text.contains("1 место"));
    }
}
