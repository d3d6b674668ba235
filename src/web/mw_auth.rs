// src/web/mw_auth.rs
use crate::{
    error::AppError,
    services::{access_service, auth_service}, // Conta e resolução do Access
    state::AppState,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session; // Sessão com o id da conta

pub const SESSION_ACCOUNT_KEY: &str = "account_id";

// Middleware que verifica a sessão e resolve o `Access` do pedido
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Tenta obter o id da conta guardado no login
    let account_id = match session.get::<i64>(SESSION_ACCOUNT_KEY).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            tracing::debug!("Autenticação MW: sem sessão. Redirecionando para /login");
            return Ok(Redirect::to("/login").into_response());
        }
        Err(e) => {
            tracing::error!("Autenticação MW: Erro ao ler sessão: {:?}", e);
            return Err(AppError::SessionError(format!("Erro ao verificar sessão: {}", e)));
        }
    };

    // Conta apagada entretanto: a sessão deixa de valer
    let Some(account) = auth_service::find_account_by_id(&state.db_pool, account_id).await? else {
        tracing::warn!("Autenticação MW: conta {} já não existe.", account_id);
        session
            .flush()
            .await
            .map_err(|e| AppError::SessionError(format!("Falha ao limpar sessão: {}", e)))?;
        return Ok(Redirect::to("/login").into_response());
    };

    // 2. Resolve o âmbito (All / AssignedTo / Nothing) uma vez por pedido
    let access = access_service::resolve_access(&state.db_pool, &account).await?;
    tracing::debug!("Autenticação MW: '{}' autenticado ({:?}).", access.email, access.scope);
    request.extensions_mut().insert(access); // Os handlers leem Extension<Access>

    Ok(next.run(request).await)
}
