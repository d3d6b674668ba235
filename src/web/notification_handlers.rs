// src/web/notification_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::access::Access,
    services::notification_service,
    state::AppState,
    templates::NotificationListPage,
    web::page::{build_nav, redirect_error, redirect_success, render, FeedbackParams},
};
use axum::{
    extract::{Form, Path, Query, State},
    response::{IntoResponse, Redirect},
    Extension,
};

const LIST_URL: &str = "/notificaciones/";

/// Ids marcados nas checkboxes `notificaciones[]`. Valores não numéricos são ignorados.
fn selected_ids(fields: &[(String, String)]) -> Vec<i64> {
    fields
        .iter()
        .filter(|(name, _)| name == "notificaciones[]" || name == "notificaciones")
        .filter_map(|(_, value)| value.trim().parse::<i64>().ok())
        .collect()
}

// GET /notificaciones/
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    // Sem perfil SAT não há destinatário: lista vazia
    let notifications = match access.profile_id() {
        Some(id) => notification_service::list_for_user(&state.db_pool, id).await?,
        None => Vec::new(),
    };
    let template = NotificationListPage {
        nav: build_nav(&state.db_pool, &access).await?,
        notifications,
        success_message: params.success,
        error_message: params.error,
    };
    render(&template)
}

// GET /notificacion/{id}/leer/
pub async fn read_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(notification_id): Path<i64>,
) -> AppResult<Redirect> {
    let user_id = access.profile_id().ok_or(AppError::NotFound)?;
    // Notificação de outro destinatário => 404
    let notification = notification_service::mark_read(&state.db_pool, user_id, notification_id).await?;
    // Vai para o estudiante relacionado, se houver
    Ok(match notification.estudiante_id {
        Some(student_id) => Redirect::to(&format!("/estudiantes/{}/", student_id)),
        None => Redirect::to(LIST_URL),
    })
}

// POST /notificaciones/marcar-leidas/
pub async fn mark_read_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Redirect> {
    let ids = selected_ids(&fields);
    if ids.is_empty() {
        return Ok(redirect_error(LIST_URL, "Seleccione al menos una notificación."));
    }
    // Ids de outros destinatários são ignorados pelo serviço
    let affected = match access.profile_id() {
        Some(user_id) => notification_service::mark_many_read(&state.db_pool, user_id, &ids).await?,
        None => 0,
    };
    Ok(redirect_success(
        LIST_URL,
        &format!("{} notificación(es) marcada(s) como leída(s).", affected),
    ))
}

// POST /notificaciones/eliminar/
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Redirect> {
    let ids = selected_ids(&fields);
    if ids.is_empty() {
        return Ok(redirect_error(LIST_URL, "Seleccione al menos una notificación."));
    }
    let affected = match access.profile_id() {
        Some(user_id) => notification_service::delete_many(&state.db_pool, user_id, &ids).await?,
        None => 0,
    };
    Ok(redirect_success(LIST_URL, &format!("{} notificación(es) eliminada(s).", affected)))
}
