// src/error.rs
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Configuração inválida: {0}")]
    Config(String),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Erro ao renderizar template: {0}")]
    TemplateError(#[from] askama::Error),

    // Entidade inexistente ou fora do alcance do utilizador atual
    #[error("Recurso não encontrado")]
    NotFound,

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Falha ao gerar PDF: {0}")]
    Pdf(String),

    #[error("Erro interno inesperado")]
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            AppError::NotFound => tracing::debug!("Recurso não encontrado"),
            AppError::Validation(msg) => tracing::warn!("Validação falhou: {}", msg),
            _ => tracing::error!("Erro processado: {:?}", self),
        }

        // O relatório PDF devolve um diagnóstico em texto simples
        if let AppError::Pdf(detail) = &self {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Error al generar el PDF: {}", detail),
            )
                .into_response();
        }

        let (status, user_message) = match &self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error al acceder a los datos.".to_string())
            }
            AppError::EnvVarError(_) | AppError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error de configuración.".to_string())
            }
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error al procesar credenciales.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Correo o contraseña inválidos.".to_string())
            }
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error en la gestión de su sesión.".to_string())
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Página no encontrada.".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Ocurrió un error inesperado.".to_string()),
        };

        let safe_message = user_message
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");

        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Error</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Error {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Volver</a></body></html>
         "#, status_code=status.as_u16(), message=safe_message))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
