// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::LoginForm,    // email + password
    services::auth_service,     // Verificação de credenciais
    state::AppState,
    templates::LoginPage,
    web::{mw_auth::SESSION_ACCOUNT_KEY, page::render},
};
use askama::Template; // Trait Template para render()
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use tower_sessions::Session;

// GET /login
pub async fn show_login_form(session: Session) -> impl IntoResponse {
    // Já existe uma conta na sessão? Vai direto para o painel
    if session.get::<i64>(SESSION_ACCOUNT_KEY).await.ok().flatten().is_some() {
        tracing::debug!("GET /login: já autenticado, redirecionando para /dashboard/");
        return Redirect::to("/dashboard/").into_response();
    }

    // Se não está autenticado, renderiza a página de login
    let template = LoginPage { error: None };
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Falha ao renderizar template de login: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error al cargar la página.").into_response()
        }
    }
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Tentativa de login para: {}", form.email);

    match auth_service::authenticate(&state.db_pool, &form.email, &form.password).await {
        Ok(account) => {
            // Novo id de sessão antes de guardar a conta
            session
                .cycle_id()
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
            session
                .insert(SESSION_ACCOUNT_KEY, account.id)
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;

            tracing::info!("✅ Login bem-sucedido para: {}", account.email);
            Ok(Redirect::to("/dashboard/").into_response())
        }
        Err(AppError::InvalidCredentials) => {
            // Mesma mensagem para email desconhecido e senha errada
            let template = LoginPage {
                error: Some("Correo o contraseña inválidos.".to_string()),
            };
            Ok((StatusCode::UNAUTHORIZED, render(&template)?).into_response())
        }
        Err(e) => { // Erro de BD ou bcrypt
            tracing::error!("Erro ao autenticar {}: {:?}", form.email, e);
            Err(e)
        }
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    // Só para o log; a sessão é apagada de qualquer forma
    let account_id: Option<i64> = session.get(SESSION_ACCOUNT_KEY).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    match account_id {
        Some(id) => tracing::info!("🚪 Conta {} desligada.", id),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }
    Ok(Redirect::to("/login"))
}
