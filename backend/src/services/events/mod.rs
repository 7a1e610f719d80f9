//! Event endpoints under `/api/events`. Every route is scoped to the
//! caller's organization.

mod create;
mod delete;
mod get;
mod list;
pub mod roles;
mod update;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/events";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list::process))
        .route("/{event_id}", get().to(get::process))
        .route("/{event_id}", put().to(update::process))
        .route("/{event_id}", delete().to(delete::process))
}

#[cfg(test)]
mod tests {
    use super::configure_routes;
    use crate::services::testing::{bearer, issuer};
    use crate::store::{EventRepository, SqliteStore};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::model::event::Event;
    use serde_json::json;
    use std::sync::Arc;

    fn app_config(cfg: &mut web::ServiceConfig) {
        let store: Arc<dyn EventRepository> = Arc::new(SqliteStore::open_in_memory().unwrap());
        cfg.app_data(web::Data::new(issuer()))
            .app_data(web::Data::from(store))
            .service(configure_routes());
    }

    fn create(org: &str, body: serde_json::Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/events")
            .insert_header(bearer(org))
            .set_json(body)
    }

    fn get(org: &str, id: &str) -> test::TestRequest {
        test::TestRequest::get()
            .uri(&format!("/api/events/{id}"))
            .insert_header(bearer(org))
    }

    #[actix_web::test]
    async fn other_organization_gets_forbidden_not_missing() {
        let app = test::init_service(App::new().configure(app_config)).await;
        let resp = test::call_service(&app, create("foundation", json!({"name": "Олимпиада"})).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let event: Event = test::read_body_json(resp).await;
        assert_eq!(event.organization_id, "foundation");

        let resp = test::call_service(&app, get("lyceum", &event.id).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/events/{}", event.id))
            .insert_header(bearer("lyceum"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, get("lyceum", "does-not-exist").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "event not found");
    }

    #[actix_web::test]
    async fn roles_are_deduplicated_and_keep_colors_on_update() {
        let app = test::init_service(App::new().configure(app_config)).await;
        let body = json!({"name": "Хакатон", "roles": ["Winner", "Winner", "Jury"]});
        let event: Event = test::call_and_read_body_json(&app, create("ft", body).to_request()).await;
        assert_eq!(event.roles.len(), 2);
        assert_ne!(event.roles[0].color, event.roles[1].color);
        let jury_color = event.roles[1].color.clone();

        let req = test::TestRequest::put()
            .uri(&format!("/api/events/{}", event.id))
            .insert_header(bearer("ft"))
            .set_json(json!({"roles": ["Jury", "Mentor"], "description": "осень"}))
            .to_request();
        let updated: Event = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.name, "Хакатон");
        assert_eq!(updated.description.as_deref(), Some("осень"));
        assert_eq!(updated.roles[0].name, "Jury");
        assert_eq!(updated.roles[0].color, jury_color);
        assert_eq!(updated.id, event.id);
    }

    #[actix_web::test]
    async fn list_is_scoped_and_delete_removes() {
        let app = test::init_service(App::new().configure(app_config)).await;
        let mine: Event =
            test::call_and_read_body_json(&app, create("gymnasium", json!({"name": "A"})).to_request()).await;
        let _: Event =
            test::call_and_read_body_json(&app, create("university", json!({"name": "B"})).to_request()).await;

        let req = test::TestRequest::get()
            .uri("/api/events")
            .insert_header(bearer("gymnasium"))
            .to_request();
        let listed: Vec<Event> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed, vec![mine.clone()]);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/events/{}", mine.id))
            .insert_header(bearer("gymnasium"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let resp = test::call_service(&app, get("gymnasium", &mine.id).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn blank_name_and_missing_token_are_rejected() {
        let app = test::init_service(App::new().configure(app_config)).await;
        let resp = test::call_service(&app, create("ft", json!({"name": "   "})).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/events").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
