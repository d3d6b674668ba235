// src/services/access_service.rs
use crate::{
    error::AppResult,
    models::{access::Access, user::Account},
    services::user_service,
};
use sqlx::SqlitePool;

/// Resolve a capacidade do pedido a partir da conta autenticada.
/// A ausência de perfil não é um erro: resulta em `Scope::Nothing`
/// (ou `Scope::All` para superutilizadores).
pub async fn resolve_access(db_pool: &SqlitePool, account: &Account) -> AppResult<Access> {
    let profile = user_service::find_user_by_email(db_pool, &account.email).await?;
    let access = Access::resolve(account, profile);
    tracing::debug!(
        "Acesso resolvido para '{}': {:?} (superuser={})",
        account.email,
        access.scope,
        access.is_superuser
    );
    Ok(access)
}
