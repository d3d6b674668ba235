// src/services/notification_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        notification::{notification_message, NotificationRow, NAV_NOTIFICATION_LIMIT},
        user::ROLE_COORDINATOR,
    },
    services::user_service,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const NOTIFICATION_SELECT: &str = r#"
    SELECT n.id, n.destinatario_id, n.actor_id,
           (a.nombre || ' ' || a.apellido) AS actor_nombre,
           n.mensaje, n.leida, n.fecha_creacion, n.estudiante_id,
           (e.nombre || ' ' || e.apellido) AS estudiante_nombre
    FROM notificacion n
    LEFT JOIN usuario a ON a.id = n.actor_id
    LEFT JOIN estudiante e ON e.id = n.estudiante_id
"#;

/// Dados de uma entrada de bitácora acabada de inserir.
#[derive(Debug, Clone)]
pub struct LogEntryCreated<'a> {
    pub autor_id: Option<i64>,
    pub estudiante_id: i64,
    pub observacion: Option<&'a str>,
}

/// Entrada criada por um Tutor -> uma notificação para cada Encargado de Carrera.
/// Difusão para todos os encargados, sem filtrar pela carrera do estudiante.
/// Corre na conexão (transação) de quem criou a entrada.
pub async fn notify_coordinators(
    conn: &mut SqliteConnection,
    event: &LogEntryCreated<'_>,
) -> AppResult<usize> {
    let autor_id = match event.autor_id {
        Some(id) => id,
        None => {
            tracing::debug!("Bitácora sem autor: nenhuma notificação.");
            return Ok(0);
        }
    };

    // Só bitácoras de tutores notificam
    let autor = match user_service::find_user_by_id(&mut *conn, autor_id).await? {
        Some(a) if a.is_tutor() => a,
        Some(a) => {
            tracing::debug!("Autor {} tem rol '{}': nenhuma notificação.", a.id, a.rol_nombre);
            return Ok(0);
        }
        None => return Ok(0),
    };

    let coordinators = user_service::find_users_by_role(&mut *conn, ROLE_COORDINATOR).await?;
    let mensaje = notification_message(event.observacion);

    // Uma linha por encargado
    for coordinator in &coordinators {
        sqlx::query(
            r#"
            INSERT INTO notificacion (destinatario_id, actor_id, mensaje, estudiante_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(coordinator.id)
        .bind(autor.id)
        .bind(&mensaje)
        .bind(event.estudiante_id)
        .execute(&mut *conn)
        .await?;
    }

    tracing::info!(
        "🔔 {} notificações criadas para a bitácora do estudiante {} (autor {}).",
        coordinators.len(),
        event.estudiante_id,
        autor.id
    );
    Ok(coordinators.len())
}

/// Todas as notificações do destinatário, mais recentes primeiro.
pub async fn list_for_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<Vec<NotificationRow>> {
    let rows = sqlx::query_as::<_, NotificationRow>(&format!(
        "{NOTIFICATION_SELECT} WHERE n.destinatario_id = ?1 ORDER BY n.fecha_creacion DESC, n.id DESC"
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// Contagem de não lidas + as mais recentes, para o menu de todas as páginas.
pub async fn unread_summary(db_pool: &SqlitePool, user_id: i64) -> AppResult<(i64, Vec<NotificationRow>)> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notificacion WHERE destinatario_id = ?1 AND leida = 0",
    )
    .bind(user_id)
    .fetch_one(db_pool)
    .await?;

    let latest = sqlx::query_as::<_, NotificationRow>(&format!(
        "{NOTIFICATION_SELECT} WHERE n.destinatario_id = ?1 AND n.leida = 0 \
         ORDER BY n.fecha_creacion DESC, n.id DESC LIMIT ?2"
    ))
    .bind(user_id)
    .bind(NAV_NOTIFICATION_LIMIT)
    .fetch_all(db_pool)
    .await?;

    Ok((count, latest))
}

/// Marca uma notificação como lida. Notificações de outro destinatário
/// são tratadas como inexistentes.
pub async fn mark_read(db_pool: &SqlitePool, user_id: i64, notification_id: i64) -> AppResult<NotificationRow> {
    let row = sqlx::query_as::<_, NotificationRow>(&format!(
        "{NOTIFICATION_SELECT} WHERE n.id = ?1 AND n.destinatario_id = ?2"
    ))
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    sqlx::query("UPDATE notificacion SET leida = 1 WHERE id = ?1")
        .bind(row.id)
        .execute(db_pool)
        .await?;

    Ok(NotificationRow { leida: true, ..row })
}

fn owned_ids_query<'a>(prefix: &str, user_id: i64, ids: &'a [i64]) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::<Sqlite>::new(prefix);
    qb.push(" WHERE destinatario_id = ").push_bind(user_id).push(" AND id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    qb
}

/// Marca como lidas as notificações indicadas que pertençam ao utilizador.
pub async fn mark_many_read(db_pool: &SqlitePool, user_id: i64, ids: &[i64]) -> AppResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut qb = owned_ids_query("UPDATE notificacion SET leida = 1", user_id, ids);
    let affected = qb.build().execute(db_pool).await?.rows_affected();
    tracing::debug!("{} notificações marcadas como lidas para {}", affected, user_id);
    Ok(affected)
}

/// Apaga as notificações indicadas que pertençam ao utilizador.
pub async fn delete_many(db_pool: &SqlitePool, user_id: i64, ids: &[i64]) -> AppResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut qb = owned_ids_query("DELETE FROM notificacion", user_id, ids);
    let affected = qb.build().execute(db_pool).await?.rows_affected();
    tracing::debug!("{} notificações apagadas para {}", affected, user_id);
    Ok(affected)
}
