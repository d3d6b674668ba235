// src/services/log_entry_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        access::Access,
        log_entry::{LogEntryInput, LogEntryRow},
    },
    services::{
        notification_service::{self, LogEntryCreated},
        student_service,
    },
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub(crate) const LOG_ENTRY_SELECT: &str = r#"
    SELECT b.id, b.fecha_registro, b.observacion, b.estudiante_id,
           (e.nombre || ' ' || e.apellido) AS estudiante_nombre,
           b.alarma_id, a.descripcion AS alarma_descripcion, ta.nombre AS tipo_alarma,
           b.autor_id, (u.nombre || ' ' || u.apellido) AS autor_nombre
    FROM bitacora b
    JOIN estudiante e ON e.id = b.estudiante_id
    LEFT JOIN alarma a ON a.id = b.alarma_id
    LEFT JOIN tipo_alarma ta ON ta.id = a.tipo_id
    LEFT JOIN usuario u ON u.id = b.autor_id
"#;

/// Resultado da criação: id da entrada e notificações geradas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedLogEntry {
    pub id: i64,
    pub notifications: usize,
}

async fn ensure_alarm_exists(db_pool: &SqlitePool, alarma_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = alarma_id {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM alarma WHERE id = ?1")
            .bind(id)
            .fetch_optional(db_pool)
            .await?;
        if found.is_none() {
            return Err(AppError::Validation("La alarma seleccionada no existe.".to_string()));
        }
    }
    Ok(())
}

/// Cria uma entrada para um estudiante visível. O autor é o perfil atual;
/// a propagação de notificações corre na mesma transação.
pub async fn create_log_entry(
    db_pool: &SqlitePool,
    access: &Access,
    student_id: i64,
    input: &LogEntryInput,
) -> AppResult<CreatedLogEntry> {
    // Validações antes de abrir a transação (o pool de testes tem uma só conexão)
    let student = student_service::find_visible_student(db_pool, access, student_id).await?;
    ensure_alarm_exists(db_pool, input.alarma_id).await?;

    let autor_id = access.profile_id(); // None para superutilizador sem perfil
    let fecha = input.fecha_registro.unwrap_or_else(|| Utc::now().naive_utc()); // Sem data => agora (UTC)
    tracing::info!("Nova bitácora para estudiante {} (autor {:?})", student.id, autor_id);

    let mut tx = db_pool.begin().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO bitacora (fecha_registro, observacion, estudiante_id, alarma_id, autor_id)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(fecha)
    .bind(&input.observacion)
    .bind(student.id)
    .bind(input.alarma_id)
    .bind(autor_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    // Mesma transação: ou ficam a bitácora e as notificações, ou nada
    let notifications = notification_service::notify_coordinators(
        &mut *tx,
        &LogEntryCreated {
            autor_id,
            estudiante_id: student.id,
            observacion: input.observacion.as_deref(),
        },
    )
    .await?;

    tx.commit().await?;
    Ok(CreatedLogEntry { id, notifications })
}

/// Entrada pelo id, apenas se o estudiante for visível.
pub async fn find_visible_entry(db_pool: &SqlitePool, access: &Access, entry_id: i64) -> AppResult<LogEntryRow> {
    let mut qb = QueryBuilder::<Sqlite>::new(LOG_ENTRY_SELECT);
    qb.push(" WHERE b.id = ").push_bind(entry_id);
    student_service::push_scope(&mut qb, access.scope);

    qb.build_query_as::<LogEntryRow>()
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::NotFound)
}

/// Atualiza data, observação e alarma. Estudiante e autor não mudam.
/// Sem data no formulário, mantém-se a data registada.
pub async fn update_log_entry(
    db_pool: &SqlitePool,
    access: &Access,
    entry_id: i64,
    input: &LogEntryInput,
) -> AppResult<LogEntryRow> {
    let current = find_visible_entry(db_pool, access, entry_id).await?;
    ensure_alarm_exists(db_pool, input.alarma_id).await?;

    let fecha = input.fecha_registro.unwrap_or(current.fecha_registro);
    sqlx::query("UPDATE bitacora SET fecha_registro = ?1, observacion = ?2, alarma_id = ?3 WHERE id = ?4")
        .bind(fecha)
        .bind(&input.observacion)
        .bind(input.alarma_id)
        .bind(current.id)
        .execute(db_pool)
        .await?;

    tracing::info!("Bitácora {} atualizada.", current.id);
    find_visible_entry(db_pool, access, entry_id).await
}

/// Apaga uma entrada visível; devolve o id do estudiante para o redirect.
pub async fn delete_log_entry(db_pool: &SqlitePool, access: &Access, entry_id: i64) -> AppResult<i64> {
    let current = find_visible_entry(db_pool, access, entry_id).await?;
    sqlx::query("DELETE FROM bitacora WHERE id = ?1")
        .bind(current.id)
        .execute(db_pool)
        .await?;
    tracing::info!("Bitácora {} apagada (estudiante {}).", current.id, current.estudiante_id);
    Ok(current.estudiante_id)
}

pub async fn entries_for_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<Vec<LogEntryRow>> {
    let rows = sqlx::query_as::<_, LogEntryRow>(&format!(
        "{LOG_ENTRY_SELECT} WHERE b.estudiante_id = ?1 ORDER BY b.fecha_registro DESC, b.id DESC"
    ))
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}
