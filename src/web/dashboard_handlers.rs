// src/web/dashboard_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{access::Access, dashboard::DashboardQuery},
    services::{catalog_service, dashboard_service},
    state::AppState,
    templates::DashboardPage,
    web::page::{build_nav, render},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension,
};

// GET / e GET /dashboard/
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = query.filter();
    let data = dashboard_service::build_dashboard(&state.db_pool, &access, &filter).await?;

    let chart_json = serde_json::to_string(&data.por_anio).map_err(|e| {
        tracing::error!("Falha ao serializar histograma: {}", e);
        AppError::InternalServerError
    })?;

    let template = DashboardPage {
        nav: build_nav(&state.db_pool, &access).await?,
        kpis: data.kpis,
        por_anio: data.por_anio,
        chart_json,
        bitacoras: data.bitacoras,
        filtered: data.filtered,
        careers: catalog_service::list_careers(&state.db_pool).await?,
        alarm_types: catalog_service::list_alarm_types(&state.db_pool).await?,
        carrera_dashboard: query.carrera_dashboard.unwrap_or_default(),
        fecha_desde: query.fecha_desde.unwrap_or_default(),
        fecha_hasta: query.fecha_hasta.unwrap_or_default(),
        tipo_alerta: query.tipo_alerta.unwrap_or_default(),
    };
    render(&template)
}
