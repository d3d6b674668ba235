// src/services/tutoring_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        access::{Access, Scope},
        tutoring::{AttendanceRow, TutoringInput, TutoringRow},
    },
};
use sqlx::SqlitePool;

const TUTORING_SELECT: &str = r#"
    SELECT t.id, t.fecha, t.tema_tutoria, t.lugar,
           t.tutor_id, (u.nombre || ' ' || u.apellido) AS tutor_nombre,
           t.tipo_id, tt.nombre AS tipo_nombre,
           t.clasificacion_id, ct.nombre AS clasificacion_nombre
    FROM tutoria t
    JOIN usuario u ON u.id = t.tutor_id
    JOIN tipo_tutoria tt ON tt.id = t.tipo_id
    JOIN clasificacion_tutoria ct ON ct.id = t.clasificacion_id
"#;

/// Tutores veem as suas sessões; encargados e superutilizadores veem todas.
pub async fn list_sessions(db_pool: &SqlitePool, access: &Access) -> AppResult<Vec<TutoringRow>> {
    let rows = match access.scope {
        // Sem perfil SAT: lista vazia, sem erro
        Scope::Nothing => Vec::new(),
        Scope::AssignedTo(tutor_id) => {
            sqlx::query_as::<_, TutoringRow>(&format!(
                "{TUTORING_SELECT} WHERE t.tutor_id = ?1 ORDER BY t.fecha DESC, t.id DESC"
            ))
            .bind(tutor_id)
            .fetch_all(db_pool)
            .await?
        }
        Scope::All => {
            sqlx::query_as::<_, TutoringRow>(&format!("{TUTORING_SELECT} ORDER BY t.fecha DESC, t.id DESC"))
                .fetch_all(db_pool)
                .await?
        }
    };
    Ok(rows)
}

async fn ensure_references(db_pool: &SqlitePool, input: &TutoringInput) -> AppResult<()> {
    let tipo: Option<i64> = sqlx::query_scalar("SELECT id FROM tipo_tutoria WHERE id = ?1")
        .bind(input.tipo_id)
        .fetch_optional(db_pool)
        .await?;
    if tipo.is_none() {
        return Err(AppError::Validation("Tipo de tutoría inválido.".to_string()));
    }
    let clasificacion: Option<i64> = sqlx::query_scalar("SELECT id FROM clasificacion_tutoria WHERE id = ?1")
        .bind(input.clasificacion_id)
        .fetch_optional(db_pool)
        .await?;
    if clasificacion.is_none() {
        return Err(AppError::Validation("Clasificación de tutoría inválida.".to_string()));
    }
    Ok(())
}

/// Cria uma sessão cujo tutor é o perfil atual.
pub async fn create_session(db_pool: &SqlitePool, access: &Access, input: &TutoringInput) -> AppResult<i64> {
    let tutor_id = access.profile_id().ok_or_else(|| {
        AppError::Validation("Su cuenta no tiene un perfil SAT asociado.".to_string())
    })?;
    ensure_references(db_pool, input).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO tutoria (fecha, tema_tutoria, lugar, tutor_id, tipo_id, clasificacion_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(input.fecha)
    .bind(&input.tema_tutoria)
    .bind(&input.lugar)
    .bind(tutor_id)
    .bind(input.tipo_id)
    .bind(input.clasificacion_id)
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    tracing::info!("Tutoria {} criada por {}.", id, tutor_id);
    Ok(id)
}

/// Sessão pelo id, apenas para o tutor que a criou.
pub async fn find_owned_session(db_pool: &SqlitePool, access: &Access, session_id: i64) -> AppResult<TutoringRow> {
    let tutor_id = access.profile_id().ok_or(AppError::NotFound)?;
    sqlx::query_as::<_, TutoringRow>(&format!("{TUTORING_SELECT} WHERE t.id = ?1 AND t.tutor_id = ?2"))
        .bind(session_id)
        .bind(tutor_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| {
            tracing::debug!("Tutoria {} não pertence a {}", session_id, tutor_id);
            AppError::NotFound
        })
}

pub async fn update_session(
    db_pool: &SqlitePool,
    access: &Access,
    session_id: i64,
    input: &TutoringInput,
) -> AppResult<()> {
    let session = find_owned_session(db_pool, access, session_id).await?;
    ensure_references(db_pool, input).await?;

    sqlx::query(
        r#"
        UPDATE tutoria
        SET fecha = ?1, tema_tutoria = ?2, lugar = ?3, tipo_id = ?4, clasificacion_id = ?5
        WHERE id = ?6
        "#,
    )
    .bind(input.fecha)
    .bind(&input.tema_tutoria)
    .bind(&input.lugar)
    .bind(input.tipo_id)
    .bind(input.clasificacion_id)
    .bind(session.id)
    .execute(db_pool)
    .await?;

    tracing::info!("Tutoria {} atualizada.", session.id);
    Ok(())
}

/// Apagar a sessão apaga também a asistencia registada.
pub async fn delete_session(db_pool: &SqlitePool, access: &Access, session_id: i64) -> AppResult<()> {
    let session = find_owned_session(db_pool, access, session_id).await?;
    sqlx::query("DELETE FROM tutoria WHERE id = ?1")
        .bind(session.id)
        .execute(db_pool)
        .await?;
    tracing::info!("Tutoria {} apagada.", session.id);
    Ok(())
}

/// Estudiantes do tutor da sessão, com o estado de asistencia atual.
pub async fn attendance_sheet(db_pool: &SqlitePool, session: &TutoringRow) -> AppResult<Vec<AttendanceRow>> {
    let rows = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT e.id AS estudiante_id, e.nombre, e.apellido, a.estado_asistencia
        FROM estudiante e
        LEFT JOIN asistencia a ON a.estudiante_id = e.id AND a.tutoria_id = ?1
        WHERE e.tutor_id = ?2
        ORDER BY e.apellido ASC, e.nombre ASC
        "#,
    )
    .bind(session.id)
    .bind(session.tutor_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// Grava a asistencia submetida. `submitted` devolve o estado enviado
/// para um estudiante, ou `None` se o campo não veio no formulário.
pub async fn record_attendance<F>(
    db_pool: &SqlitePool,
    session: &TutoringRow,
    submitted: F,
) -> AppResult<usize>
where
    F: Fn(i64) -> Option<String>,
{
    let eligible = attendance_sheet(db_pool, session).await?;

    let mut tx = db_pool.begin().await?;
    let mut written = 0;
    for student in &eligible {
        let Some(state) = submitted(student.estudiante_id) else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO asistencia (tutoria_id, estudiante_id, estado_asistencia)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (tutoria_id, estudiante_id)
            DO UPDATE SET estado_asistencia = excluded.estado_asistencia
            "#,
        )
        .bind(session.id)
        .bind(student.estudiante_id)
        .bind(&state)
        .execute(&mut *tx)
        .await?;
        written += 1;
    }
    tx.commit().await?;

    tracing::info!("Asistencia da tutoria {}: {} registos gravados.", session.id, written);
    Ok(written)
}
