mod config;
mod error;
mod job_controller;
mod services;
mod storage;
mod store;

use crate::config::MailTransport;
use crate::error::ServiceError;
use crate::job_controller::state::JobsState;
use crate::services::auth::TokenIssuer;
use crate::services::certificates::mail::{LogMailer, Mailer, OutboxMailer};
use crate::services::certificates::pipeline::Pipeline;
use crate::services::certificates::render::{CertificateRenderer, GenPdfRenderer};
use crate::services::templates::seed::seed_base_templates;
use crate::storage::Storage;
use crate::store::{CertificateRepository, EventRepository, SqliteStore, TemplateRepository};
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let settings = config::load().map_err(|e| startup_error("configuration", e))?;

    let store = SqliteStore::open(&settings.database_path)
        .map_err(|e| startup_error("database", e))?;
    let storage = Storage::open(&settings.data_dir)?;
    let renderer: Arc<dyn CertificateRenderer> =
        Arc::new(GenPdfRenderer::load(&settings.render).map_err(|e| startup_error("fonts", e))?);
    let mailer: Arc<dyn Mailer> = match settings.mail.transport {
        MailTransport::Log => Arc::new(LogMailer),
        MailTransport::Outbox => Arc::new(OutboxMailer::new(
            &settings.mail.outbox_dir,
            settings.mail.from.clone(),
        )?),
    };

    let events: Arc<dyn EventRepository> = Arc::new(store.clone());
    let templates: Arc<dyn TemplateRepository> = Arc::new(store.clone());
    let certificates: Arc<dyn CertificateRepository> = Arc::new(store);

    seed_base_templates(templates.as_ref(), &storage)
        .map_err(|e| startup_error("base templates", e))?;

    let pipeline = Pipeline {
        storage: storage.clone(),
        renderer: renderer.clone(),
        mailer,
        certificates: certificates.clone(),
    };
    let issuer = TokenIssuer::new(&settings.auth.jwt_secret, settings.auth.token_ttl_minutes);

    let (jobs_state, rx) = JobsState::with_retention(settings.retained_jobs);
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let auth_settings = settings.auth.clone();
    info!("Server running at http://{}:{}", settings.host, settings.port);

    HttpServer::new(move || {
        let json_config = web::JsonConfig::default()
            .limit(MAX_BODY_BYTES)
            .error_handler(|err, _req| ServiceError::Validation(err.to_string()).into());
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(json_config)
            .app_data(web::FormConfig::default().limit(MAX_BODY_BYTES))
            .app_data(web::Data::from(events.clone()))
            .app_data(web::Data::from(templates.clone()))
            .app_data(web::Data::from(certificates.clone()))
            .app_data(web::Data::from(renderer.clone()))
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(auth_settings.clone()))
            .app_data(web::Data::new(issuer.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::auth::configure_routes())
            .service(services::events::configure_routes())
            .service(services::templates::configure_routes())
            .service(services::participants::configure_routes())
            .service(services::certificates::configure_routes())
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
