// src/services/catalog_service.rs
//! Tabelas de referência usadas pelos filtros e formulários.
use crate::{
    error::AppResult,
    models::catalog::{AlarmOption, CatalogItem},
};
use sqlx::SqlitePool;

async fn list_items(db_pool: &SqlitePool, sql: &str) -> AppResult<Vec<CatalogItem>> {
    Ok(sqlx::query_as::<_, CatalogItem>(sql).fetch_all(db_pool).await?)
}

pub async fn list_statuses(db_pool: &SqlitePool) -> AppResult<Vec<CatalogItem>> {
    list_items(db_pool, "SELECT id, nombre FROM estado ORDER BY id ASC").await
}

pub async fn list_careers(db_pool: &SqlitePool) -> AppResult<Vec<CatalogItem>> {
    list_items(db_pool, "SELECT id, nombre FROM carrera ORDER BY nombre ASC").await
}

pub async fn list_alarm_types(db_pool: &SqlitePool) -> AppResult<Vec<CatalogItem>> {
    list_items(db_pool, "SELECT id, nombre FROM tipo_alarma ORDER BY nombre ASC").await
}

pub async fn list_session_types(db_pool: &SqlitePool) -> AppResult<Vec<CatalogItem>> {
    list_items(db_pool, "SELECT id, nombre FROM tipo_tutoria ORDER BY nombre ASC").await
}

pub async fn list_session_classifications(db_pool: &SqlitePool) -> AppResult<Vec<CatalogItem>> {
    list_items(db_pool, "SELECT id, nombre FROM clasificacion_tutoria ORDER BY nombre ASC").await
}

pub async fn list_alarms(db_pool: &SqlitePool) -> AppResult<Vec<AlarmOption>> {
    let alarms = sqlx::query_as::<_, AlarmOption>(
        r#"
        SELECT a.id, a.descripcion, t.nombre AS tipo_nombre
        FROM alarma a
        JOIN tipo_alarma t ON t.id = a.tipo_id
        ORDER BY t.nombre ASC, a.id ASC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    Ok(alarms)
}

pub async fn find_status_id(db_pool: &SqlitePool, nombre: &str) -> AppResult<Option<i64>> {
    Ok(sqlx::query_scalar("SELECT id FROM estado WHERE nombre = ?1")
        .bind(nombre)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn create_career(
    db_pool: &SqlitePool,
    nombre: &str,
    encargado_id: Option<i64>,
) -> AppResult<i64> {
    let id = sqlx::query("INSERT INTO carrera (nombre, encargado_id) VALUES (?1, ?2)")
        .bind(nombre)
        .bind(encargado_id)
        .execute(db_pool)
        .await?
        .last_insert_rowid();
    tracing::info!("Carrera '{}' criada (id {}).", nombre, id);
    Ok(id)
}

pub async fn create_alarm_type(db_pool: &SqlitePool, nombre: &str) -> AppResult<i64> {
    Ok(sqlx::query("INSERT INTO tipo_alarma (nombre) VALUES (?1)")
        .bind(nombre)
        .execute(db_pool)
        .await?
        .last_insert_rowid())
}

pub async fn create_alarm(
    db_pool: &SqlitePool,
    tipo_id: i64,
    descripcion: Option<&str>,
) -> AppResult<i64> {
    Ok(sqlx::query("INSERT INTO alarma (descripcion, tipo_id) VALUES (?1, ?2)")
        .bind(descripcion)
        .bind(tipo_id)
        .execute(db_pool)
        .await?
        .last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reference_vocabulary_is_seeded() {
        let pool = crate::db::create_test_pool().await;
        let statuses: Vec<String> = list_statuses(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.nombre)
            .collect();
        assert_eq!(
            statuses,
            vec!["Fuera de Riesgo", "Riesgo Bajo", "Riesgo Medio", "Riesgo Alto"]
        );
        assert_eq!(list_session_types(&pool).await.unwrap().len(), 2);
        assert_eq!(list_session_classifications(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn alarm_type_in_use_cannot_be_deleted() {
        let pool = crate::db::create_test_pool().await;
        let tipo = create_alarm_type(&pool, "Académica").await.unwrap();
        create_alarm(&pool, tipo, Some("Reprobación")).await.unwrap();

        let deleted = sqlx::query("DELETE FROM tipo_alarma WHERE id = ?1")
            .bind(tipo)
            .execute(&pool)
            .await;
        assert!(deleted.is_err());

        let alarms = list_alarms(&pool).await.unwrap();
        assert_eq!(alarms[0].label(), "Académica - Reprobación");
    }
}
