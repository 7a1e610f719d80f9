pub mod parse;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/participants";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/parse", post().to(parse::process))
}

#[cfg(test)]
mod tests {
    use super::configure_routes;
    use crate::services::multipart::form;
    use crate::services::testing::{bearer, issuer};
    use crate::store::{EventRepository, SqliteStore};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use common::model::event::{Event, EventRole};
    use common::model::participant::Participant;
    use std::sync::Arc;

    const CSV: &str = "fio,email,role\nA,a@b.com,Winner\nB,b@b.com,участник\n";

    fn event(org: &str) -> Event {
        Event {
            id: "ev-1".into(),
            name: "Олимпиада".into(),
            organization_id: org.into(),
            created_at: "2025-01-01T00:00:00Z".into(),
            description: None,
            roles: vec![EventRole {
                name: "winner".into(),
                color: "#FF6B6B".into(),
            }],
        }
    }

    fn app_config(cfg: &mut web::ServiceConfig) {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put_event("lyceum", &event("lyceum")).unwrap();
        let store: Arc<dyn EventRepository> = Arc::new(store);
        cfg.app_data(web::Data::new(issuer()))
            .app_data(web::Data::from(store))
            .service(configure_routes());
    }

    fn parse(org: &str, fields: &[(&str, &str)], filename: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/participants/parse")
            .insert_header(bearer(org))
            .insert_header((header::CONTENT_TYPE, form::content_type()))
            .set_payload(form::body(fields, Some((filename, CSV))))
    }

    #[actix_web::test]
    async fn filters_by_event_roles() {
        let app = test::init_service(App::new().configure(app_config)).await;

        let all: Vec<Participant> =
            test::call_and_read_body_json(&app, parse("lyceum", &[], "list.csv").to_request()).await;
        assert_eq!(all.len(), 2);

        let req = parse("lyceum", &[("event_id", "ev-1")], "list.csv").to_request();
        let filtered: Vec<Participant> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].fio, "A");
    }

    #[actix_web::test]
    async fn foreign_event_and_wrong_extension_are_refused() {
        let app = test::init_service(App::new().configure(app_config)).await;

        let req = parse("ft", &[("event_id", "ev-1")], "list.csv").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = parse("lyceum", &[], "list.xlsx").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
