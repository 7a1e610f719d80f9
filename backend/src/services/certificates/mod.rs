//! Certificate generation endpoints under `/api/certificates` and the
//! pipeline behind them.

pub mod archive;
mod download;
mod execute;
mod generate;
mod jobs;
pub mod mail;
pub mod markup;
pub mod pipeline;
pub mod placeholders;
pub mod render;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/certificates";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/generate", post().to(generate::process))
        .route("/jobs/{job_id}", get().to(jobs::status))
        .route("/jobs/{job_id}/retry", post().to(jobs::retry_failed))
        .route("/jobs/{job_id}/tasks/{index}/retry", post().to(jobs::retry_task))
        .route("/download/{archive}", get().to(download::archive))
        .route("/{certificate_id}/download", get().to(download::certificate))
}

#[cfg(test)]
mod tests {
    use super::configure_routes;
    use super::pipeline::tests::{FakeRenderer, RecordingMailer};
    use super::pipeline::Pipeline;
    use crate::job_controller::state::JobsState;
    use crate::services::testing::{bearer, issuer};
    use crate::storage::{write_atomic, Storage};
    use crate::store::{CertificateRepository, SqliteStore, TemplateRepository};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use common::jobs::JobStatus;
    use common::model::generation::{GenerationJob, TaskState};
    use common::model::template::{Template, TemplateType};
    use common::requests::GenerateResponse;
    use serde_json::json;
    use futures_util::future::join;
    use std::io::Cursor;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use zip::ZipArchive;

    struct Fixture {
        _dir: tempfile::TempDir,
        storage: Storage,
        store: SqliteStore,
        renderer: Arc<FakeRenderer>,
        mailer: Arc<RecordingMailer>,
        jobs: JobsState,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let storage = Storage::open(dir.path()).unwrap();
            let store = SqliteStore::open_in_memory().unwrap();
            let template = Template::new("tpl".into(), "Тест".into(), TemplateType::Html);
            store.insert_template(&template).unwrap();
            write_atomic(
                &storage.template_path("tpl", ".html"),
                "<h1>{fio}</h1>\n<p>{event}</p>".as_bytes(),
            )
            .unwrap();
            let (jobs, _rx) = JobsState::new();
            Self {
                _dir: dir,
                storage,
                store,
                renderer: Arc::new(FakeRenderer::new()),
                mailer: Arc::new(RecordingMailer::default()),
                jobs,
            }
        }

        fn configure(&self) -> impl FnOnce(&mut web::ServiceConfig) {
            let pipeline = Pipeline {
                storage: self.storage.clone(),
                renderer: self.renderer.clone(),
                mailer: self.mailer.clone(),
                certificates: Arc::new(self.store.clone()),
            };
            let templates: Arc<dyn TemplateRepository> = Arc::new(self.store.clone());
            let certificates: Arc<dyn CertificateRepository> = Arc::new(self.store.clone());
            let storage = self.storage.clone();
            let jobs = self.jobs.clone();
            move |cfg: &mut web::ServiceConfig| {
                cfg.app_data(web::Data::new(issuer()))
                    .app_data(web::Data::new(storage))
                    .app_data(web::Data::new(pipeline))
                    .app_data(web::Data::new(jobs))
                    .app_data(web::Data::from(templates))
                    .app_data(web::Data::from(certificates))
                    .service(configure_routes());
            }
        }
    }

    fn generate(org: &str, names: &[&str], send_email: bool) -> test::TestRequest {
        let participants: Vec<_> = names
            .iter()
            .map(|n| json!({"fio": n, "email": "x@example.org", "role": "участник", "place": null}))
            .collect();
        test::TestRequest::post()
            .uri("/api/certificates/generate")
            .insert_header(bearer(org))
            .set_json(json!({
                "template_id": "tpl",
                "participants": participants,
                "event_name": "Олимпиада",
                "issue_date": "01.01.2025",
                "send_email": send_email,
                "email_subject": "Сертификат",
                "email_body": "Здравствуйте, {fio}",
            }))
    }

    #[actix_web::test]
    async fn generate_then_download_archive_and_pdf() {
        let fx = Fixture::new();
        let app = test::init_service(App::new().configure(fx.configure())).await;

        let req = generate("foundation", &["Иванов", "Петров"], true).to_request();
        let resp: GenerateResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.certificate_ids.len(), 2);
        assert_eq!(resp.message, "Сгенерировано 2 сертификатов и отправлено 2 писем по email");
        assert_eq!(fx.mailer.sent.lock().unwrap().len(), 2);

        let req = test::TestRequest::get().uri(&resp.zip_url).to_request();
        let zip = test::call_service(&app, req).await;
        assert_eq!(zip.status(), StatusCode::OK);
        assert_eq!(zip.headers().get(header::CONTENT_TYPE).unwrap(), "application/zip");
        let bytes = test::read_body(zip).await;
        let archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(archive.len(), 2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/certificates/{}/download", resp.certificate_ids[0]))
            .to_request();
        let pdf = test::call_service(&app, req).await;
        assert_eq!(pdf.status(), StatusCode::OK);
        assert_eq!(pdf.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");

        let req = test::TestRequest::get()
            .uri(&format!("/api/certificates/jobs/{}", resp.job_id))
            .insert_header(bearer("foundation"))
            .to_request();
        let job: GenerationJob = test::call_and_read_body_json(&app, req).await;
        assert!(matches!(job.status, JobStatus::Completed(_)));
        assert_eq!(job.emails_sent, 2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/certificates/jobs/{}", resp.job_id))
            .insert_header(bearer("lyceum"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn failed_participant_is_retried_by_task_and_by_job() {
        let fx = Fixture::new();
        let app = test::init_service(App::new().configure(fx.configure())).await;
        fx.renderer.broken.lock().unwrap().insert("Петров".into());

        let req = generate("ft", &["Иванов", "Петров", "Сидоров"], false).to_request();
        let resp: GenerateResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.certificate_ids.len(), 2);
        assert!(resp.message.contains("ошибок: 1"));

        fx.renderer.broken.lock().unwrap().clear();
        let req = test::TestRequest::post()
            .uri(&format!("/api/certificates/jobs/{}/tasks/1/retry", resp.job_id))
            .insert_header(bearer("ft"))
            .to_request();
        let retried: GenerateResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(retried.job_id, resp.job_id);
        assert_eq!(retried.certificate_ids.len(), 3);
        assert!(retried.certificate_ids.starts_with(&resp.certificate_ids[..1]));

        let req = test::TestRequest::post()
            .uri(&format!("/api/certificates/jobs/{}/retry", resp.job_id))
            .insert_header(bearer("ft"))
            .to_request();
        let again: GenerateResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(again.certificate_ids, retried.certificate_ids);

        let record = fx.jobs.get(&resp.job_id).await.unwrap();
        assert!(record.job.tasks.iter().all(|t| t.state == TaskState::Rendered));

        let req = test::TestRequest::post()
            .uri(&format!("/api/certificates/jobs/{}/tasks/9/retry", resp.job_id))
            .insert_header(bearer("ft"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn concurrent_retries_send_a_failed_email_once() {
        let fx = Fixture::new();
        let app = test::init_service(App::new().configure(fx.configure())).await;
        fx.mailer.offline.store(true, Ordering::SeqCst);

        let req = generate("ft", &["Иванов"], true).to_request();
        let resp: GenerateResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.message.ends_with("и отправлено 0 писем по email"));

        fx.mailer.offline.store(false, Ordering::SeqCst);
        let retry = || {
            test::TestRequest::post()
                .uri(&format!("/api/certificates/jobs/{}/tasks/0/retry", resp.job_id))
                .insert_header(bearer("ft"))
                .to_request()
        };
        let (a, b) = join(
            test::call_service(&app, retry()),
            test::call_service(&app, retry()),
        )
        .await;

        let mut statuses = [a.status(), b.status()];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
        assert_eq!(fx.mailer.sent.lock().unwrap().len(), 1);

        let record = fx.jobs.get(&resp.job_id).await.unwrap();
        assert_eq!(record.job.emails_sent, 1);
        assert!(matches!(record.job.status, JobStatus::Completed(_)));
    }

    #[actix_web::test]
    async fn unknown_template_and_unsafe_archive_names_are_not_found() {
        let fx = Fixture::new();
        let app = test::init_service(App::new().configure(fx.configure())).await;

        let req = test::TestRequest::post()
            .uri("/api/certificates/generate")
            .insert_header(bearer("ft"))
            .set_json(json!({"template_id": "missing", "participants": [], "event_name": "E"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/certificates/download/..%2Fcertify.sqlite")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/certificates/download/certificates_nope.zip")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
