// src/web/tutoring_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        access::Access,
        tutoring::{attendance_field, TutoringForm, TutoringRow, ATTENDANCE_STATES},
    },
    services::{catalog_service, tutoring_service},
    state::AppState,
    templates::{AttendancePage, ConfirmDeletePage, Nav, TutoringFormPage, TutoringListPage},
    web::page::{build_nav, redirect_error, redirect_success, render, FeedbackParams},
};
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use sqlx::SqlitePool;
use std::collections::HashMap;

const LIST_URL: &str = "/tutorias/";

async fn form_page(
    db_pool: &SqlitePool,
    nav: Nav,
    session_id: Option<i64>,
    form: TutoringForm,
    error_message: Option<String>,
) -> AppResult<TutoringFormPage> {
    Ok(TutoringFormPage {
        nav,
        session_id,
        fecha: form.fecha,
        tema_tutoria: form.tema_tutoria,
        lugar: form.lugar,
        tipo_tutoria: form.tipo_tutoria,
        clasificacion_tutoria: form.clasificacion_tutoria,
        types: catalog_service::list_session_types(db_pool).await?,
        classifications: catalog_service::list_session_classifications(db_pool).await?,
        error_message,
    })
}

fn form_from_session(session: &TutoringRow) -> TutoringForm {
    TutoringForm {
        fecha: session.fecha_input(),
        tema_tutoria: session.tema_text().to_string(),
        lugar: session.lugar.clone(),
        tipo_tutoria: session.tipo_id.to_string(),
        clasificacion_tutoria: session.clasificacion_id.to_string(),
    }
}

async fn invalid_form(
    db_pool: &SqlitePool,
    access: &Access,
    session_id: Option<i64>,
    form: TutoringForm,
    message: String,
) -> AppResult<Response> {
    tracing::warn!("Formulário de tutoria inválido: {}", message);
    let nav = build_nav(db_pool, access).await?;
    let page = form_page(db_pool, nav, session_id, form, Some(message)).await?;
    Ok((StatusCode::BAD_REQUEST, render(&page)?).into_response())
}

// GET /tutorias/
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    // Tutores veem as suas; sem perfil, nenhuma
    let sessions = tutoring_service::list_sessions(&state.db_pool, &access).await?;
    let template = TutoringListPage {
        nav: build_nav(&state.db_pool, &access).await?,
        sessions,
        can_create: access.profile.is_some(),
        owner_id: access.profile_id().unwrap_or_default(), // 0 nunca é dono
        success_message: params.success,
        error_message: params.error,
    };
    render(&template)
}

// GET /tutorias/nueva/
pub async fn new_form_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
) -> AppResult<Response> {
    if access.profile.is_none() {
        return Ok(redirect_error(LIST_URL, "Su cuenta no tiene un perfil SAT asociado.").into_response());
    }
    let nav = build_nav(&state.db_pool, &access).await?;
    let page = form_page(&state.db_pool, nav, None, TutoringForm::default(), None).await?;
    Ok(render(&page)?.into_response())
}

// POST /tutorias/nueva/
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Form(form): Form<TutoringForm>,
) -> AppResult<Response> {
    // O tutor da sessão é o perfil atual
    if access.profile.is_none() {
        return Ok(redirect_error(LIST_URL, "Su cuenta no tiene un perfil SAT asociado.").into_response());
    }
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => return invalid_form(&state.db_pool, &access, None, form, message).await,
    };

    match tutoring_service::create_session(&state.db_pool, &access, &input).await {
        Ok(_) => Ok(redirect_success(LIST_URL, "Tutoría registrada.").into_response()),
        Err(AppError::Validation(message)) => invalid_form(&state.db_pool, &access, None, form, message).await,
        Err(e) => Err(e),
    }
}

// GET /tutorias/{id}/editar/
pub async fn edit_form_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(session_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let session = tutoring_service::find_owned_session(&state.db_pool, &access, session_id).await?;
    let nav = build_nav(&state.db_pool, &access).await?;
    let page = form_page(&state.db_pool, nav, Some(session.id), form_from_session(&session), None).await?;
    render(&page)
}

// POST /tutorias/{id}/editar/
pub async fn update_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(session_id): Path<i64>,
    Form(form): Form<TutoringForm>,
) -> AppResult<Response> {
    // Só o tutor dono edita; os restantes recebem 404
    let session = tutoring_service::find_owned_session(&state.db_pool, &access, session_id).await?;
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => return invalid_form(&state.db_pool, &access, Some(session.id), form, message).await,
    };

    match tutoring_service::update_session(&state.db_pool, &access, session.id, &input).await {
        Ok(()) => Ok(redirect_success(LIST_URL, "Tutoría actualizada.").into_response()),
        Err(AppError::Validation(message)) => {
            invalid_form(&state.db_pool, &access, Some(session.id), form, message).await
        }
        Err(e) => Err(e),
    }
}

// GET /tutorias/{id}/borrar/
pub async fn confirm_delete_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(session_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let session = tutoring_service::find_owned_session(&state.db_pool, &access, session_id).await?;
    let page = ConfirmDeletePage {
        nav: build_nav(&state.db_pool, &access).await?,
        title: "Borrar tutoría".to_string(),
        message: format!(
            "¿Borrar la tutoría del {} en {}? También se borrará su asistencia.",
            session.fecha_display(),
            session.lugar
        ),
        action: format!("/tutorias/{}/borrar/", session.id),
        cancel_url: LIST_URL.to_string(),
    };
    render(&page)
}

// POST /tutorias/{id}/borrar/
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(session_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    tutoring_service::delete_session(&state.db_pool, &access, session_id).await?; // Apaga também a asistencia
    Ok(redirect_success(LIST_URL, "Tutoría eliminada."))
}

// GET /tutorias/{id}/asistencia/
pub async fn attendance_form_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(session_id): Path<i64>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let session = tutoring_service::find_owned_session(&state.db_pool, &access, session_id).await?;
    let rows = tutoring_service::attendance_sheet(&state.db_pool, &session).await?;
    let page = AttendancePage {
        nav: build_nav(&state.db_pool, &access).await?,
        session,
        rows,
        states: ATTENDANCE_STATES,
        success_message: params.success,
    };
    render(&page)
}

// POST /tutorias/{id}/asistencia/
// Campos `asistencia_<id estudiante>`; o nome varia por estudiante, daí os pares.
pub async fn attendance_submit_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(session_id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    // 1. Só o tutor dono regista asistencia
    let session = tutoring_service::find_owned_session(&state.db_pool, &access, session_id).await?;
    let submitted: HashMap<String, String> = fields.into_iter().collect();

    // 2. Estudiantes sem campo enviado ficam como estavam
    let written = tutoring_service::record_attendance(&state.db_pool, &session, |student_id| {
        submitted.get(&attendance_field(student_id)).cloned()
    })
    .await?;

    tracing::debug!("Asistencia: {} campos recebidos, {} gravados.", submitted.len(), written);
    Ok(redirect_success(
        &format!("/tutorias/{}/asistencia/", session.id),
        "Asistencia guardada.",
    ))
}
