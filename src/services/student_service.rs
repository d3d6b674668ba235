// src/services/student_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        access::{Access, Scope},
        student::{
            NewStudent, StatusHistoryRow, StudentFilter, StudentOrder, StudentPage, StudentRow,
            STUDENTS_PER_PAGE,
        },
    },
    services::user_service,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub(crate) const STUDENT_SELECT: &str = r#"
    SELECT e.id, e.rut, e.nombre, e.apellido, e.email, e.anio_ingreso,
           e.lugar_procedencia, e.grupo_familiar, e.beneficios_sociales,
           e.carrera_id, c.nombre AS carrera_nombre,
           e.estado_id, s.nombre AS estado_nombre,
           e.tutor_id, (t.nombre || ' ' || t.apellido) AS tutor_nombre,
           d.causa AS tipo_desercion
    FROM estudiante e
    JOIN carrera c ON c.id = e.carrera_id
    JOIN estado s ON s.id = e.estado_id
    LEFT JOIN usuario t ON t.id = e.tutor_id
    LEFT JOIN tipo_desercion d ON d.id = e.tipo_desercion_id
"#;

/// Acrescenta a restrição de visibilidade. Espera um `WHERE` já aberto.
pub(crate) fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: Scope) {
    match scope {
        Scope::All => {}
        Scope::AssignedTo(tutor_id) => {
            qb.push(" AND e.tutor_id = ").push_bind(tutor_id);
        }
        Scope::Nothing => {
            qb.push(" AND 0");
        }
    }
}

/// Padrão LIKE de substring literal: `%` e `_` do utilizador não são curingas.
fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &StudentFilter) {
    if let Some(q) = &filter.q {
        let like = like_pattern(q);
        qb.push(" AND (e.nombre LIKE ")
            .push_bind(like.clone())
            .push(" ESCAPE '\\' OR e.apellido LIKE ")
            .push_bind(like.clone())
            .push(" ESCAPE '\\' OR e.rut LIKE ")
            .push_bind(like)
            .push(" ESCAPE '\\')");
    }
    if let Some(estado_id) = filter.estado_id {
        qb.push(" AND e.estado_id = ").push_bind(estado_id);
    }
    if let Some(carrera_id) = filter.carrera_id {
        qb.push(" AND e.carrera_id = ").push_bind(carrera_id);
    }
}

/// Lista paginada dos estudiantes visíveis para o pedido.
pub async fn list_students(
    db_pool: &SqlitePool,
    access: &Access,
    filter: &StudentFilter,
    page: i64,
) -> AppResult<StudentPage> {
    tracing::debug!("Listando estudiantes ({:?}) com filtro {:?}", access.scope, filter);

    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM estudiante e WHERE 1 = 1");
    push_scope(&mut count_qb, access.scope);
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(db_pool).await?;

    let total_pages = ((total + STUDENTS_PER_PAGE - 1) / STUDENTS_PER_PAGE).max(1);
    let page = page.clamp(1, total_pages);

    let mut qb = QueryBuilder::<Sqlite>::new(STUDENT_SELECT);
    qb.push(" WHERE 1 = 1");
    push_scope(&mut qb, access.scope);
    push_filters(&mut qb, filter);
    match filter.order {
        StudentOrder::Surname => qb.push(" ORDER BY e.apellido ASC, e.nombre ASC, e.id ASC"),
        StudentOrder::Newest => qb.push(" ORDER BY e.id DESC"),
    };
    qb.push(" LIMIT ")
        .push_bind(STUDENTS_PER_PAGE)
        .push(" OFFSET ")
        .push_bind((page - 1) * STUDENTS_PER_PAGE);

    let students = qb.build_query_as::<StudentRow>().fetch_all(db_pool).await?;

    Ok(StudentPage {
        students,
        page,
        total_pages,
        total,
    })
}

/// Estudiante pelo id, apenas se visível; caso contrário `NotFound`.
pub async fn find_visible_student(
    db_pool: &SqlitePool,
    access: &Access,
    student_id: i64,
) -> AppResult<StudentRow> {
    let mut qb = QueryBuilder::<Sqlite>::new(STUDENT_SELECT);
    qb.push(" WHERE e.id = ").push_bind(student_id);
    push_scope(&mut qb, access.scope);

    qb.build_query_as::<StudentRow>()
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| {
            tracing::debug!("Estudiante {} inexistente ou não visível ({:?})", student_id, access.scope);
            AppError::NotFound
        })
}

/// Cria um estudiante e o primeiro registo do histórico de estado.
/// O tutor atribuído (se houver) tem de ter rol "Tutor".
pub async fn create_student(db_pool: &SqlitePool, new: &NewStudent) -> AppResult<i64> {
    tracing::info!("Criando estudiante {} ({})", new.rut, new.email);

    if let Some(tutor_id) = new.tutor_id {
        match user_service::find_user_by_id(db_pool, tutor_id).await? {
            Some(tutor) if tutor.is_tutor() => {}
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "El usuario {} no tiene el rol Tutor (rol: {}).",
                    other.full_name(),
                    other.rol_nombre
                )));
            }
            None => return Err(AppError::Validation(format!("Tutor {} inexistente.", tutor_id))),
        }
    }

    let mut tx = db_pool.begin().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO estudiante (
            rut, nombre, apellido, email, anio_ingreso, lugar_procedencia,
            grupo_familiar, beneficios_sociales, carrera_id, tutor_id, estado_id, tipo_desercion_id
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&new.rut)
    .bind(&new.nombre)
    .bind(&new.apellido)
    .bind(&new.email)
    .bind(new.anio_ingreso)
    .bind(&new.lugar_procedencia)
    .bind(&new.grupo_familiar)
    .bind(&new.beneficios_sociales)
    .bind(new.carrera_id)
    .bind(new.tutor_id)
    .bind(new.estado_id)
    .bind(new.tipo_desercion_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query("INSERT INTO historial_estado (estudiante_id, estado_id) VALUES (?1, ?2)")
        .bind(id)
        .bind(new.estado_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("✅ Estudiante {} criado com id {}.", new.rut, id);
    Ok(id)
}

/// Muda o estado atual e acrescenta uma linha ao histórico.
/// Reservado a quem vê todos os estudiantes (encargados / superutilizadores).
pub async fn change_status(
    db_pool: &SqlitePool,
    access: &Access,
    student_id: i64,
    estado_id: i64,
) -> AppResult<()> {
    if !access.sees_all() {
        tracing::warn!("Mudança de estado recusada para {:?}", access.scope);
        return Err(AppError::NotFound);
    }
    let student = find_visible_student(db_pool, access, student_id).await?;
    if student.estado_id == estado_id {
        tracing::debug!("Estudiante {} já está no estado {}", student_id, estado_id);
        return Ok(());
    }

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM estado WHERE id = ?1")
        .bind(estado_id)
        .fetch_optional(db_pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::Validation("Estado inexistente.".to_string()));
    }

    let mut tx = db_pool.begin().await?;
    sqlx::query("UPDATE estudiante SET estado_id = ?1 WHERE id = ?2")
        .bind(estado_id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO historial_estado (estudiante_id, estado_id) VALUES (?1, ?2)")
        .bind(student_id)
        .bind(estado_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Estado do estudiante {} alterado para {}", student_id, estado_id);
    Ok(())
}

pub async fn status_history(db_pool: &SqlitePool, student_id: i64) -> AppResult<Vec<StatusHistoryRow>> {
    let rows = sqlx::query_as::<_, StatusHistoryRow>(
        r#"
        SELECT h.id, s.nombre AS estado_nombre, h.fecha_asignacion
        FROM historial_estado h
        JOIN estado s ON s.id = h.estado_id
        WHERE h.estudiante_id = ?1
        ORDER BY h.fecha_asignacion DESC, h.id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn tutor_sees_only_assigned_students() {
        let fx = Fixture::new().await;
        let s_a = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Alto").await;
        let s_b = fx.student("22.222.222-2", "Pérez", Some(fx.tutor_b.id), "Riesgo Bajo").await;

        let access_a = fx.access_for(&fx.tutor_a);
        let page = list_students(&fx.pool, &access_a, &StudentFilter::default(), 1).await.unwrap();
        let ids: Vec<i64> = page.students.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![s_a]);

        assert!(find_visible_student(&fx.pool, &access_a, s_a).await.is_ok());
        assert!(matches!(
            find_visible_student(&fx.pool, &access_a, s_b).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn coordinator_and_superuser_see_everyone() {
        let fx = Fixture::new().await;
        fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Alto").await;
        fx.student("22.222.222-2", "Pérez", Some(fx.tutor_b.id), "Riesgo Bajo").await;
        fx.student("33.333.333-3", "Araya", None, "Riesgo Medio").await;

        for access in [fx.access_for(&fx.coordinator), fx.superuser_access()] {
            let page = list_students(&fx.pool, &access, &StudentFilter::default(), 1).await.unwrap();
            let surnames: Vec<&str> = page.students.iter().map(|s| s.apellido.as_str()).collect();
            assert_eq!(surnames, vec!["Araya", "Pérez", "Soto"]);
        }
    }

    #[tokio::test]
    async fn identity_without_profile_sees_nothing() {
        let fx = Fixture::new().await;
        let id = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Alto").await;

        let access = fx.anonymous_access();
        let page = list_students(&fx.pool, &access, &StudentFilter::default(), 1).await.unwrap();
        assert!(page.students.is_empty());
        assert_eq!(page.total, 0);
        assert!(find_visible_student(&fx.pool, &access, id).await.is_err());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Soto"), "%Soto%");
        assert_eq!(like_pattern("10%_a\\b"), "%10\\%\\_a\\\\b%");
    }

    #[tokio::test]
    async fn filters_search_and_order() {
        let fx = Fixture::new().await;
        let first = fx.student("11.111.111-1", "Soto", None, "Riesgo Alto").await;
        fx.student("22.222.222-2", "Pérez", None, "Riesgo Bajo").await;
        let last = fx.student("33.333.333-3", "Sotomayor", None, "Riesgo Alto").await;
        let access = fx.access_for(&fx.coordinator);

        let by_text = StudentFilter { q: Some("Soto".into()), ..Default::default() };
        let page = list_students(&fx.pool, &access, &by_text, 1).await.unwrap();
        assert_eq!(page.total, 2);

        let by_rut = StudentFilter { q: Some("22.222".into()), ..Default::default() };
        let page = list_students(&fx.pool, &access, &by_rut, 1).await.unwrap();
        assert_eq!(page.students[0].apellido, "Pérez");

        let alto = fx.status_id("Riesgo Alto").await;
        let by_status = StudentFilter { estado_id: Some(alto), ..Default::default() };
        let page = list_students(&fx.pool, &access, &by_status, 1).await.unwrap();
        assert_eq!(page.total, 2);

        // curingas do LIKE são procurados como texto
        for literal in ["%", "_", "S_to"] {
            let filter = StudentFilter { q: Some(literal.into()), ..Default::default() };
            let page = list_students(&fx.pool, &access, &filter, 1).await.unwrap();
            assert_eq!(page.total, 0, "q = {:?}", literal);
        }

        let newest = StudentFilter { order: StudentOrder::Newest, ..Default::default() };
        let page = list_students(&fx.pool, &access, &newest, 1).await.unwrap();
        assert_eq!(page.students.first().map(|s| s.id), Some(last));
        assert_eq!(page.students.last().map(|s| s.id), Some(first));
    }

    #[tokio::test]
    async fn pagination_is_ten_per_page_and_clamped() {
        let fx = Fixture::new().await;
        for i in 0..12 {
            fx.student(&format!("{:02}.000.000-0", i), &format!("Apellido{:02}", i), None, "Riesgo Bajo")
                .await;
        }
        let access = fx.access_for(&fx.coordinator);

        let page1 = list_students(&fx.pool, &access, &StudentFilter::default(), 1).await.unwrap();
        assert_eq!(page1.students.len(), 10);
        assert_eq!(page1.total_pages, 2);

        let page9 = list_students(&fx.pool, &access, &StudentFilter::default(), 9).await.unwrap();
        assert_eq!(page9.page, 2);
        assert_eq!(page9.students.len(), 2);
    }

    #[tokio::test]
    async fn tutor_must_hold_tutor_role() {
        let fx = Fixture::new().await;
        let estado_id = fx.status_id("Riesgo Bajo").await;
        let result = create_student(
            &fx.pool,
            &NewStudent {
                rut: "9.999.999-9".into(),
                nombre: "Luis".into(),
                apellido: "Mora".into(),
                email: "luis@alumnos.ubb.cl".into(),
                anio_ingreso: 2023,
                carrera_id: fx.carrera_id,
                tutor_id: Some(fx.coordinator.id),
                estado_id,
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn status_change_appends_history() {
        let fx = Fixture::new().await;
        let id = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Bajo").await;
        let alto = fx.status_id("Riesgo Alto").await;

        // tutor não pode mudar o estado
        let tutor = fx.access_for(&fx.tutor_a);
        assert!(change_status(&fx.pool, &tutor, id, alto).await.is_err());

        let coordinator = fx.access_for(&fx.coordinator);
        change_status(&fx.pool, &coordinator, id, alto).await.unwrap();

        let student = find_visible_student(&fx.pool, &coordinator, id).await.unwrap();
        assert_eq!(student.estado_nombre, "Riesgo Alto");

        let history = status_history(&fx.pool, id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].estado_nombre, "Riesgo Alto");
        assert_eq!(history[1].estado_nombre, "Riesgo Bajo");
    }

    #[tokio::test]
    async fn deleting_tutor_unassigns_students() {
        let fx = Fixture::new().await;
        let id = fx.student("11.111.111-1", "Soto", Some(fx.tutor_a.id), "Riesgo Bajo").await;

        sqlx::query("DELETE FROM usuario WHERE id = ?1")
            .bind(fx.tutor_a.id)
            .execute(&fx.pool)
            .await
            .unwrap();

        let student = find_visible_student(&fx.pool, &fx.superuser_access(), id).await.unwrap();
        assert_eq!(student.tutor_id, None);
        assert_eq!(student.tutor_nombre, None);
    }
}
