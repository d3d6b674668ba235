// src/web/student_handlers.rs
use crate::{
    error::AppResult,
    models::{
        access::Access,
        student::{StatusChangeForm, StudentListQuery},
    },
    services::{catalog_service, log_entry_service, report_service, student_service}, // Consultas já filtradas pelo Access
    state::AppState,
    templates::{StudentDetailPage, StudentListPage},
    web::page::{build_nav, redirect_success, render, FeedbackParams},
};
use axum::{
    extract::{Form, Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect},
    Extension,
};

// GET /estudiantes/
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Query(query): Query<StudentListQuery>,
) -> AppResult<impl IntoResponse> {
    // Filtros vazios da query string contam como ausentes
    let page = student_service::list_students(&state.db_pool, &access, &query.filter(), query.page()).await?;

    let template = StudentListPage {
        nav: build_nav(&state.db_pool, &access).await?,
        page,
        statuses: catalog_service::list_statuses(&state.db_pool).await?,
        careers: catalog_service::list_careers(&state.db_pool).await?,
        // Valores originais, para manter o formulário preenchido
        q: query.q.unwrap_or_default(),
        estado: query.estado.unwrap_or_default(),
        carrera: query.carrera.unwrap_or_default(),
        orden: query.orden.unwrap_or_default(),
    };
    render(&template)
}

// GET /estudiantes/{id}/
pub async fn detail_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(student_id): Path<i64>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    // Fora do âmbito do pedido => 404
    let student = student_service::find_visible_student(&state.db_pool, &access, student_id).await?;
    let history = student_service::status_history(&state.db_pool, student.id).await?;
    let entries = log_entry_service::entries_for_student(&state.db_pool, student.id).await?;

    let template = StudentDetailPage {
        nav: build_nav(&state.db_pool, &access).await?,
        student,
        history,
        entries,
        statuses: catalog_service::list_statuses(&state.db_pool).await?,
        can_change_status: access.sees_all(), // Só encargados e superutilizadores
        success_message: params.success,
        error_message: params.error,
    };
    render(&template)
}

// POST /estudiantes/{id}/estado/
pub async fn change_status_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(student_id): Path<i64>,
    Form(form): Form<StatusChangeForm>,
) -> AppResult<Redirect> {
    // Atualiza o estado e acrescenta o histórico na mesma transação
    student_service::change_status(&state.db_pool, &access, student_id, form.estado).await?;
    Ok(redirect_success(
        &format!("/estudiantes/{}/", student_id),
        "Estado actualizado correctamente.",
    ))
}

// GET|POST /estudiante/{id}/pdf/
pub async fn pdf_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(student_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Relatório PDF pedido para estudiante {}", student_id);
    let report =
        report_service::student_report(&state.db_pool, &access, &state.config.pdf_engines, student_id).await?;

    // Download como anexo
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ),
        ],
        report.bytes,
    ))
}
