// src/web/page.rs
//! Peças comuns às páginas: menu, render e mensagens de feedback.
use crate::{
    error::{AppError, AppResult},
    models::access::Access,
    services::notification_service,
    templates::Nav,
};
use askama::Template;
use axum::response::{Html, Redirect};
use serde::Deserialize;
use sqlx::SqlitePool;

/// `?success=` / `?error=` depois de um POST (Post/Redirect/Get).
#[derive(Deserialize, Debug, Default)]
pub struct FeedbackParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

pub async fn build_nav(db_pool: &SqlitePool, access: &Access) -> AppResult<Nav> {
    let (unread_count, latest) = match access.profile_id() {
        Some(id) => notification_service::unread_summary(db_pool, id).await?,
        None => (0, Vec::new()),
    };
    Ok(Nav {
        display_name: access.display_name(),
        is_tutor: access.profile.as_ref().is_some_and(|p| p.is_tutor()),
        sees_all: access.sees_all(),
        unread_count,
        latest,
    })
}

pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Falha ao renderizar template: {}", e);
        AppError::InternalServerError
    })
}

pub fn redirect_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?success={}", path, urlencoding::encode(message)))
}

pub fn redirect_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(message)))
}
