// src/services/auth_service.rs
use crate::{
    config::BootstrapAdmin,
    error::{AppError, AppResult},
    models::user::Account,
};
use sqlx::SqlitePool;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

pub async fn find_account_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT id, email, password_hash, is_superuser FROM cuenta WHERE email = ?1",
    )
    .bind(email.trim())
    .fetch_optional(db_pool)
    .await?;
    Ok(account)
}

pub async fn find_account_by_id(db_pool: &SqlitePool, account_id: i64) -> AppResult<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT id, email, password_hash, is_superuser FROM cuenta WHERE id = ?1",
    )
    .bind(account_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(account)
}

/// Insere uma identidade com um hash já calculado.
pub async fn insert_account(
    db_pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    is_superuser: bool,
) -> AppResult<i64> {
    let id = sqlx::query(
        "INSERT INTO cuenta (email, password_hash, is_superuser) VALUES (?1, ?2, ?3)",
    )
    .bind(email.trim())
    .bind(password_hash)
    .bind(is_superuser)
    .execute(db_pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Autentica por email + senha. Devolve `InvalidCredentials` sem distinguir
/// email inexistente de senha errada.
pub async fn authenticate(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<Account> {
    let account = match find_account_by_email(db_pool, email).await? {
        Some(a) => a,
        None => {
            tracing::warn!("Conta não encontrada: {}", email);
            return Err(AppError::InvalidCredentials);
        }
    };
    if verify_password(password, &account.password_hash).await? {
        Ok(account)
    } else {
        tracing::warn!("Senha incorreta para: {}", email);
        Err(AppError::InvalidCredentials)
    }
}

/// Cria a conta de superutilizador configurada, se ainda não existir.
pub async fn ensure_bootstrap_admin(db_pool: &SqlitePool, admin: &BootstrapAdmin) -> AppResult<()> {
    if find_account_by_email(db_pool, &admin.email).await?.is_some() {
        tracing::debug!("Conta de arranque '{}' já existe.", admin.email);
        return Ok(());
    }
    let hash = hash_password(&admin.password).await?;
    insert_account(db_pool, &admin.email, &hash, true).await?;
    tracing::info!("✅ Conta de superutilizador '{}' criada.", admin.email);
    Ok(())
}
