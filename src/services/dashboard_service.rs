// src/services/dashboard_service.rs
use crate::{
    error::AppResult,
    models::{
        access::Access,
        dashboard::{DashboardData, DashboardFilter, RiskCounts, YearBucket, RECENT_ENTRIES_LIMIT},
        log_entry::LogEntryRow,
    },
    services::{log_entry_service::LOG_ENTRY_SELECT, student_service::push_scope},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Condições sobre a tabela `bitacora b`.
fn push_entry_conditions(qb: &mut QueryBuilder<'_, Sqlite>, filter: &DashboardFilter) {
    if let Some(desde) = filter.fecha_desde {
        qb.push(" AND date(b.fecha_registro) >= ").push_bind(desde);
    }
    if let Some(hasta) = filter.fecha_hasta {
        qb.push(" AND date(b.fecha_registro) <= ").push_bind(hasta);
    }
    if let Some(tipo_id) = filter.tipo_alarma_id {
        qb.push(" AND b.alarma_id IN (SELECT id FROM alarma WHERE tipo_id = ")
            .push_bind(tipo_id)
            .push(")");
    }
}

/// Estudiantes `e` visíveis que passam os filtros do painel.
fn push_student_conditions(qb: &mut QueryBuilder<'_, Sqlite>, access: &Access, filter: &DashboardFilter) {
    push_scope(qb, access.scope);
    if let Some(carrera_id) = filter.carrera_id {
        qb.push(" AND e.carrera_id = ").push_bind(carrera_id);
    }
    if filter.filters_entries() {
        qb.push(" AND EXISTS (SELECT 1 FROM bitacora b WHERE b.estudiante_id = e.id");
        push_entry_conditions(qb, filter);
        qb.push(")");
    }
}

async fn risk_counts(db_pool: &SqlitePool, access: &Access, filter: &DashboardFilter) -> AppResult<RiskCounts> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT s.nombre FROM estudiante e JOIN estado s ON s.id = e.estado_id WHERE 1 = 1",
    );
    push_student_conditions(&mut qb, access, filter);
    let names: Vec<String> = qb.build_query_scalar::<String>().fetch_all(db_pool).await?;
    Ok(RiskCounts::tally(names.iter().map(String::as_str)))
}

async fn students_per_year(
    db_pool: &SqlitePool,
    access: &Access,
    filter: &DashboardFilter,
) -> AppResult<Vec<YearBucket>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT e.anio_ingreso AS anio, COUNT(*) AS cantidad FROM estudiante e WHERE 1 = 1",
    );
    push_student_conditions(&mut qb, access, filter);
    qb.push(" GROUP BY e.anio_ingreso ORDER BY e.anio_ingreso ASC");
    Ok(qb.build_query_as::<YearBucket>().fetch_all(db_pool).await?)
}

async fn recent_entries(
    db_pool: &SqlitePool,
    access: &Access,
    filter: &DashboardFilter,
) -> AppResult<Vec<LogEntryRow>> {
    let mut qb = QueryBuilder::<Sqlite>::new(LOG_ENTRY_SELECT);
    qb.push(" WHERE 1 = 1");
    push_scope(&mut qb, access.scope);
    if let Some(carrera_id) = filter.carrera_id {
        qb.push(" AND e.carrera_id = ").push_bind(carrera_id);
    }
    push_entry_conditions(&mut qb, filter);
    qb.push(" ORDER BY b.fecha_registro DESC, b.id DESC");
    if !filter.is_active() {
        qb.push(" LIMIT ").push_bind(RECENT_ENTRIES_LIMIT);
    }
    Ok(qb.build_query_as::<LogEntryRow>().fetch_all(db_pool).await?)
}

pub async fn build_dashboard(
    db_pool: &SqlitePool,
    access: &Access,
    filter: &DashboardFilter,
) -> AppResult<DashboardData> {
    tracing::debug!("📊 Painel para {:?} com filtro {:?}", access.scope, filter);

    let kpis = risk_counts(db_pool, access, filter).await?;
    let por_anio = students_per_year(db_pool, access, filter).await?;
    let bitacoras = recent_entries(db_pool, access, filter).await?;

    Ok(DashboardData {
        kpis,
        por_anio,
        bitacoras,
        filtered: filter.is_active(),
    })
}
