// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        auth_handlers, dashboard_handlers, log_entry_handlers, mw_auth, notification_handlers,
        student_handlers, tutoring_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout));

    let student_routes = Router::new()
        .route("/estudiantes/", get(student_handlers::list_handler))
        .route("/estudiantes/{id}/", get(student_handlers::detail_handler))
        .route("/estudiantes/{id}/estado/", post(student_handlers::change_status_handler))
        .route(
            "/estudiantes/{id}/bitacora/nueva/",
            get(log_entry_handlers::new_form_handler).post(log_entry_handlers::create_handler),
        );

    let log_entry_routes = Router::new()
        .route(
            "/bitacora/{id}/editar/",
            get(log_entry_handlers::edit_form_handler).post(log_entry_handlers::update_handler),
        )
        .route(
            "/bitacora/{id}/borrar/",
            get(log_entry_handlers::confirm_delete_handler).post(log_entry_handlers::delete_handler),
        );

    let tutoring_routes = Router::new()
        .route("/tutorias/", get(tutoring_handlers::list_handler))
        .route(
            "/tutorias/nueva/",
            get(tutoring_handlers::new_form_handler).post(tutoring_handlers::create_handler),
        )
        .route(
            "/tutorias/{id}/editar/",
            get(tutoring_handlers::edit_form_handler).post(tutoring_handlers::update_handler),
        )
        .route(
            "/tutorias/{id}/borrar/",
            get(tutoring_handlers::confirm_delete_handler).post(tutoring_handlers::delete_handler),
        )
        .route(
            "/tutorias/{id}/asistencia/",
            get(tutoring_handlers::attendance_form_handler).post(tutoring_handlers::attendance_submit_handler),
        );

    let notification_routes = Router::new()
        .route("/notificaciones/", get(notification_handlers::list_handler))
        .route("/notificaciones/marcar-leidas/", post(notification_handlers::mark_read_handler))
        .route("/notificaciones/eliminar/", post(notification_handlers::delete_handler));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route("/", get(dashboard_handlers::dashboard_handler))
        .route("/dashboard/", get(dashboard_handlers::dashboard_handler))
        .route(
            "/estudiante/{id}/pdf/",
            get(student_handlers::pdf_handler).post(student_handlers::pdf_handler),
        )
        .route("/notificacion/{id}/leer/", get(notification_handlers::read_handler))
        .merge(student_routes)
        .merge(log_entry_routes)
        .merge(tutoring_routes)
        .merge(notification_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::log_entry::LogEntryInput,
        services::{auth_service, log_entry_service},
        test_support::Fixture,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use std::sync::Arc;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    fn app(fx: &Fixture) -> Router {
        let config = Config {
            database_url: "sqlite::memory:".into(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            pdf_engines: vec!["sat-motor-inexistente".into()],
            bootstrap_admin: None,
        };
        let state = AppState {
            db_pool: fx.pool.clone(),
            config: Arc::new(config),
        };
        create_router(state).layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
    }

    async fn add_account(fx: &Fixture, email: &str) {
        // custo baixo: só para os testes
        let hash = bcrypt::hash("secreto", 4).unwrap();
        auth_service::insert_account(&fx.pool, email, &hash, false).await.unwrap();
    }

    /// Faz login e devolve o cookie de sessão.
    async fn login(app: &Router, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(format!("email={}&password=secreto", urlencoding::encode(email))))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    async fn get(app: &Router, uri: &str, cookie: &str) -> Response {
        app.clone()
            .oneshot(Request::get(uri).header(header::COOKIE, cookie).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(app: &Router, uri: &str, cookie: &str, body: &str) -> Response {
        app.clone()
            .oneshot(
                Request::post(uri)
                    .header(header::COOKIE, cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn anonymous_requests_redirect_to_login() {
        let fx = Fixture::new().await;
        let response = app(&fx)
            .oneshot(Request::get("/estudiantes/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn wrong_password_rerenders_login() {
        let fx = Fixture::new().await;
        add_account(&fx, &fx.tutor_a.email).await;
        let response = app(&fx)
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=ana%40ubb.cl&password=otra"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("inválidos"));
    }

    #[tokio::test]
    async fn visibility_end_to_end() {
        let fx = Fixture::new().await;
        let s = fx.student("11.111.111-1", "Sepúlveda", Some(fx.tutor_a.id), "Riesgo Alto").await;
        for user in [&fx.tutor_a, &fx.tutor_b, &fx.coordinator] {
            add_account(&fx, &user.email).await;
        }
        let app = app(&fx);

        let tutor_b = login(&app, &fx.tutor_b.email).await;
        let list = body_text(get(&app, "/estudiantes/", &tutor_b).await).await;
        assert!(!list.contains("Sepúlveda"));
        let detail = get(&app, &format!("/estudiantes/{}/", s), &tutor_b).await;
        assert_eq!(detail.status(), StatusCode::NOT_FOUND);

        let coordinator = login(&app, &fx.coordinator.email).await;
        let list = body_text(get(&app, "/estudiantes/", &coordinator).await).await;
        assert!(list.contains("Sepúlveda"));

        let tutor_a = login(&app, &fx.tutor_a.email).await;
        let dashboard = get(&app, "/dashboard/", &tutor_a).await;
        assert_eq!(dashboard.status(), StatusCode::OK);
        let html = body_text(dashboard).await;
        assert!(html.contains("<strong>1</strong><br>Riesgo alto"));
    }

    #[tokio::test]
    async fn filter_selects_keep_choice_and_histogram_is_drawn() {
        let fx = Fixture::new().await;
        fx.student_in_year("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Alto", 2022).await;
        fx.student_in_year("22.222.222-2", "Pérez", Some(fx.tutor_a.id), "Riesgo Bajo", 2024).await;
        fx.student_in_year("33.333.333-3", "Araya", Some(fx.tutor_b.id), "Riesgo Bajo", 2024).await;
        add_account(&fx, &fx.coordinator.email).await;
        let app = app(&fx);
        let coordinator = login(&app, &fx.coordinator.email).await;

        let alto = fx.status_id("Riesgo Alto").await;
        let html = body_text(get(&app, &format!("/estudiantes/?estado={}", alto), &coordinator).await).await;
        assert!(html.contains(&format!("value=\"{}\" selected", alto)));
        assert!(html.contains("Soto"));
        assert!(!html.contains("Pérez"));

        let response = get(&app, &format!("/dashboard/?carrera_dashboard={}", fx.carrera_id), &coordinator).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(&format!("value=\"{}\" selected", fx.carrera_id)));
        assert!(html.contains("<td>2022</td>"));
        assert!(html.contains("<td>2024</td>"));
        // 2024 tem o dobro dos estudiantes de 2022
        assert!(html.contains("style=\"width: 50%\""));
        assert!(html.contains("style=\"width: 100%\""));
    }

    #[tokio::test]
    async fn log_entry_form_notifies_coordinators_and_nav_shows_it() {
        let fx = Fixture::new().await;
        let s = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Medio").await;
        add_account(&fx, &fx.tutor_a.email).await;
        add_account(&fx, &fx.coordinator.email).await;
        let app = app(&fx);

        let tutor = login(&app, &fx.tutor_a.email).await;
        let response = post_form(
            &app,
            &format!("/estudiantes/{}/bitacora/nueva/", s),
            &tutor,
            "fecha_registro=2024-04-02&observacion=No+rinde+certamen&alarma=",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let coordinator = login(&app, &fx.coordinator.email).await;
        let html = body_text(get(&app, "/notificaciones/", &coordinator).await).await;
        assert!(html.contains("📝 No rinde certamen"));
        assert!(html.contains("class=\"badge\">1<"));
    }

    #[tokio::test]
    async fn invalid_log_entry_date_rerenders_form() {
        let fx = Fixture::new().await;
        let s = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Medio").await;
        add_account(&fx, &fx.tutor_a.email).await;
        let app = app(&fx);

        let tutor = login(&app, &fx.tutor_a.email).await;
        let response = post_form(
            &app,
            &format!("/estudiantes/{}/bitacora/nueva/", s),
            &tutor,
            "fecha_registro=02%2F04%2F2024&observacion=x&alarma=",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Fecha inválida"));
        assert!(log_entry_service::entries_for_student(&fx.pool, s).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_mark_read_ignores_foreign_ids() {
        let fx = Fixture::new().await;
        let s = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Medio").await;
        log_entry_service::create_log_entry(
            &fx.pool,
            &fx.access_for(&fx.tutor_a),
            s,
            &LogEntryInput {
                observacion: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        add_account(&fx, &fx.coordinator.email).await;
        let app = app(&fx);

        let theirs = crate::services::notification_service::list_for_user(&fx.pool, fx.coordinator_2.id)
            .await
            .unwrap()[0]
            .id;
        let coordinator = login(&app, &fx.coordinator.email).await;
        let response = post_form(
            &app,
            "/notificaciones/marcar-leidas/",
            &coordinator,
            &format!("notificaciones%5B%5D={}", theirs),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let (unread, _) = crate::services::notification_service::unread_summary(&fx.pool, fx.coordinator_2.id)
            .await
            .unwrap();
        assert_eq!(unread, 1);

        let foreign = get(&app, &format!("/notificacion/{}/leer/", theirs), &coordinator).await;
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pdf_without_engine_is_plain_text_500() {
        let fx = Fixture::new().await;
        let s = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Medio").await;
        add_account(&fx, &fx.coordinator.email).await;
        let app = app(&fx);

        let coordinator = login(&app, &fx.coordinator.email).await;
        let response = get(&app, &format!("/estudiante/{}/pdf/", s), &coordinator).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
        assert!(body_text(response).await.contains("sat-motor-inexistente"));
    }

    #[tokio::test]
    async fn attendance_is_owner_only() {
        let fx = Fixture::new().await;
        let s = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Medio").await;
        add_account(&fx, &fx.tutor_a.email).await;
        add_account(&fx, &fx.tutor_b.email).await;
        let app = app(&fx);

        let tutor_a = login(&app, &fx.tutor_a.email).await;
        let response = post_form(
            &app,
            "/tutorias/nueva/",
            &tutor_a,
            "fecha=2024-05-10T10%3A00&tema_tutoria=Repaso&lugar=Sala+3&tipo_tutoria=1&clasificacion_tutoria=1",
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let session_id: i64 = sqlx::query_scalar("SELECT id FROM tutoria")
            .fetch_one(&fx.pool)
            .await
            .unwrap();

        let tutor_b = login(&app, &fx.tutor_b.email).await;
        let foreign = get(&app, &format!("/tutorias/{}/asistencia/", session_id), &tutor_b).await;
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

        let response = post_form(
            &app,
            &format!("/tutorias/{}/asistencia/", session_id),
            &tutor_a,
            &format!("asistencia_{}=Presente", s),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let html = body_text(get(&app, &format!("/tutorias/{}/asistencia/", session_id), &tutor_a).await).await;
        assert!(html.contains("value=\"Presente\" checked"));
    }
}
