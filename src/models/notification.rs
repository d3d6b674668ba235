// src/models/notification.rs
use chrono::NaiveDateTime;
use sqlx::FromRow;

pub const NOTIFICATION_PREFIX: &str = "📝 ";
pub const EMPTY_OBSERVATION: &str = "Sin detalle";
pub const NAV_NOTIFICATION_LIMIT: i64 = 5;

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub destinatario_id: i64,
    pub actor_id: Option<i64>,
    pub actor_nombre: Option<String>,
    pub mensaje: String,
    pub leida: bool,
    pub fecha_creacion: NaiveDateTime,
    pub estudiante_id: Option<i64>,
    pub estudiante_nombre: Option<String>,
}

impl NotificationRow {
    pub fn fecha_display(&self) -> String {
        self.fecha_creacion.format("%d/%m/%Y %H:%M").to_string()
    }

    pub fn actor_text(&self) -> &str {
        self.actor_nombre.as_deref().unwrap_or("")
    }

    pub fn estudiante_text(&self) -> &str {
        self.estudiante_nombre.as_deref().unwrap_or("")
    }
}

/// Mensagem da notificação a partir da observação da bitácora.
pub fn notification_message(observacion: Option<&str>) -> String {
    let text = match observacion {
        Some(o) if !o.is_empty() => o,
        _ => EMPTY_OBSERVATION,
    };
    format!("{}{}", NOTIFICATION_PREFIX, text)
}
