// src/web/log_entry_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        access::Access,
        log_entry::{LogEntryForm, LogEntryRow},
    },
    services::{catalog_service, log_entry_service, student_service},
    state::AppState,
    templates::{ConfirmDeletePage, LogEntryFormPage, Nav},
    web::page::{build_nav, redirect_success, render}, // Menu, render e PRG
};
use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use sqlx::SqlitePool;

fn student_url(student_id: i64) -> String {
    format!("/estudiantes/{}/", student_id)
}

async fn form_page(
    db_pool: &SqlitePool,
    nav: Nav,
    student_id: i64,
    student_name: String,
    entry_id: Option<i64>,
    form: LogEntryForm,
    error_message: Option<String>,
) -> AppResult<LogEntryFormPage> {
    Ok(LogEntryFormPage {
        nav,
        student_id,
        student_name,
        entry_id,
        fecha_registro: form.fecha_registro,
        observacion: form.observacion,
        alarma: form.alarma,
        alarms: catalog_service::list_alarms(db_pool).await?,
        error_message,
    })
}

fn form_from_entry(entry: &LogEntryRow) -> LogEntryForm {
    LogEntryForm {
        fecha_registro: entry.fecha_input(),
        observacion: entry.observacion_text().to_string(),
        alarma: entry.alarma_id.map(|id| id.to_string()).unwrap_or_default(),
    }
}

/// Volta a mostrar o formulário com a mensagem de erro (400).
async fn invalid_form(
    db_pool: &SqlitePool,
    access: &Access,
    student_id: i64,
    student_name: String,
    entry_id: Option<i64>,
    form: LogEntryForm,
    message: String,
) -> AppResult<Response> {
    tracing::warn!("Formulário de bitácora inválido: {}", message);
    let nav = build_nav(db_pool, access).await?;
    let page = form_page(db_pool, nav, student_id, student_name, entry_id, form, Some(message)).await?;
    Ok((StatusCode::BAD_REQUEST, render(&page)?).into_response())
}

// GET /estudiantes/{id}/bitacora/nueva/
pub async fn new_form_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(student_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let student = student_service::find_visible_student(&state.db_pool, &access, student_id).await?;
    let nav = build_nav(&state.db_pool, &access).await?;
    let page = form_page(
        &state.db_pool,
        nav,
        student.id,
        student.full_name(),
        None,
        LogEntryForm::default(),
        None,
    )
    .await?;
    render(&page)
}

// POST /estudiantes/{id}/bitacora/nueva/
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(student_id): Path<i64>,
    Form(form): Form<LogEntryForm>,
) -> AppResult<Response> {
    // 1. O estudiante vem do caminho e tem de ser visível
    let student = student_service::find_visible_student(&state.db_pool, &access, student_id).await?;

    // 2. Valida data e alarma; se falhar, volta ao formulário com 400
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => {
            return invalid_form(&state.db_pool, &access, student.id, student.full_name(), None, form, message).await;
        }
    };

    // 3. Grava a bitácora e notifica os encargados
    match log_entry_service::create_log_entry(&state.db_pool, &access, student.id, &input).await {
        Ok(created) => {
            tracing::info!(
                "Bitácora {} criada ({} notificações).",
                created.id,
                created.notifications
            );
            Ok(redirect_success(&student_url(student.id), "Bitácora registrada.").into_response())
        }
        Err(AppError::Validation(message)) => {
            invalid_form(&state.db_pool, &access, student.id, student.full_name(), None, form, message).await
        }
        Err(e) => Err(e),
    }
}

// GET /bitacora/{id}/editar/
pub async fn edit_form_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(entry_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let entry = log_entry_service::find_visible_entry(&state.db_pool, &access, entry_id).await?;
    let nav = build_nav(&state.db_pool, &access).await?;
    let page = form_page(
        &state.db_pool,
        nav,
        entry.estudiante_id,
        entry.estudiante_nombre.clone(),
        Some(entry.id),
        form_from_entry(&entry),
        None,
    )
    .await?;
    render(&page)
}

// POST /bitacora/{id}/editar/
pub async fn update_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(entry_id): Path<i64>,
    Form(form): Form<LogEntryForm>,
) -> AppResult<Response> {
    // Bitácora de um estudiante fora do âmbito => 404
    let entry = log_entry_service::find_visible_entry(&state.db_pool, &access, entry_id).await?;

    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => {
            return invalid_form(
                &state.db_pool,
                &access,
                entry.estudiante_id,
                entry.estudiante_nombre,
                Some(entry.id),
                form,
                message,
            )
            .await;
        }
    };

    // Editar nunca gera notificações
    match log_entry_service::update_log_entry(&state.db_pool, &access, entry.id, &input).await {
        Ok(updated) => {
            Ok(redirect_success(&student_url(updated.estudiante_id), "Bitácora actualizada.").into_response())
        }
        Err(AppError::Validation(message)) => {
            invalid_form(
                &state.db_pool,
                &access,
                entry.estudiante_id,
                entry.estudiante_nombre,
                Some(entry.id),
                form,
                message,
            )
            .await
        }
        Err(e) => Err(e),
    }
}

// GET /bitacora/{id}/borrar/
pub async fn confirm_delete_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(entry_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let entry = log_entry_service::find_visible_entry(&state.db_pool, &access, entry_id).await?;
    let page = ConfirmDeletePage {
        nav: build_nav(&state.db_pool, &access).await?,
        title: "Borrar bitácora".to_string(),
        message: format!(
            "¿Borrar la bitácora del {} de {}?",
            entry.fecha_display(),
            entry.estudiante_nombre
        ),
        action: format!("/bitacora/{}/borrar/", entry.id),
        cancel_url: student_url(entry.estudiante_id),
    };
    render(&page)
}

// POST /bitacora/{id}/borrar/
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(entry_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let student_id = log_entry_service::delete_log_entry(&state.db_pool, &access, entry_id).await?; // Volta à ficha do estudiante
    Ok(redirect_success(&student_url(student_id), "Bitácora eliminada."))
}
