// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, User},
};
use sqlx::{Executor, Sqlite, SqlitePool};

const USER_SELECT: &str = r#"
    SELECT u.id, u.rut, u.nombre, u.apellido, u.email,
           u.rol_id, r.nombre AS rol_nombre, u.carrera_id
    FROM usuario u
    JOIN rol r ON r.id = u.rol_id
"#;

/// Busca o perfil SAT associado a um email de login.
pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando perfil SAT por email: {}", email);
    let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.email = ?1"))
        .bind(email.trim())
        .fetch_optional(db_pool)
        .await?;

    if user.is_none() {
        tracing::debug!("Sem perfil SAT para '{}'.", email);
    }
    Ok(user)
}

pub async fn find_user_by_id<'e, E>(executor: E, user_id: i64) -> AppResult<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = ?1"))
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(user)
}

/// Todos os perfis com um dado rol (ex: "Encargado de Carrera").
pub async fn find_users_by_role<'e, E>(executor: E, role: &str) -> AppResult<Vec<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let users = sqlx::query_as::<_, User>(&format!(
        "{USER_SELECT} WHERE r.nombre = ?1 ORDER BY u.apellido ASC, u.id ASC"
    ))
    .bind(role)
    .fetch_all(executor)
    .await?;
    Ok(users)
}

/// Cria um perfil SAT. O rol tem de existir.
pub async fn create_user(db_pool: &SqlitePool, new_user: &NewUser<'_>) -> AppResult<i64> {
    tracing::info!("Criando perfil SAT: {}", new_user.email);

    let rol_id: Option<i64> = sqlx::query_scalar("SELECT id FROM rol WHERE nombre = ?1")
        .bind(new_user.rol)
        .fetch_optional(db_pool)
        .await?;
    let rol_id = rol_id.ok_or_else(|| AppError::Validation(format!("Rol inexistente: {}", new_user.rol)))?;

    let id = sqlx::query(
        r#"
        INSERT INTO usuario (rut, nombre, apellido, email, rol_id, carrera_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(new_user.rut)
    .bind(new_user.nombre)
    .bind(new_user.apellido)
    .bind(new_user.email)
    .bind(rol_id)
    .bind(new_user.carrera_id)
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    tracing::info!("✅ Perfil '{}' criado com id {}.", new_user.email, id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{ROLE_COORDINATOR, ROLE_TUTOR};

    #[tokio::test]
    async fn profiles_resolve_with_role_name() {
        let pool = crate::db::create_test_pool().await;
        let id = create_user(
            &pool,
            &NewUser {
                rut: "22222222-2",
                nombre: "Bastian",
                apellido: "Arriagada",
                email: "bastian@ubb.cl",
                rol: ROLE_TUTOR,
                carrera_id: None,
            },
        )
        .await
        .unwrap();

        let by_email = find_user_by_email(&pool, "bastian@ubb.cl").await.unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert!(by_email.is_tutor());
        assert!(find_user_by_email(&pool, "otro@ubb.cl").await.unwrap().is_none());
        assert!(find_users_by_role(&pool, ROLE_COORDINATOR).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let pool = crate::db::create_test_pool().await;
        let result = create_user(
            &pool,
            &NewUser {
                rut: "1-9",
                nombre: "X",
                apellido: "Y",
                email: "x@ubb.cl",
                rol: "Decano",
                carrera_id: None,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
