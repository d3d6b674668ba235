// src/models/log_entry.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use sqlx::FromRow;

/// Entrada da bitácora com os nomes das relações.
#[derive(Debug, Clone, FromRow)]
pub struct LogEntryRow {
    pub id: i64,
    pub fecha_registro: NaiveDateTime,
    pub observacion: Option<String>,
    pub estudiante_id: i64,
    pub estudiante_nombre: String,
    pub alarma_id: Option<i64>,
    pub alarma_descripcion: Option<String>,
    pub tipo_alarma: Option<String>,
    pub autor_id: Option<i64>,
    pub autor_nombre: Option<String>,
}

impl LogEntryRow {
    pub fn fecha_display(&self) -> String {
        self.fecha_registro.format("%d/%m/%Y %H:%M").to_string()
    }

    pub fn fecha_input(&self) -> String {
        self.fecha_registro.format("%Y-%m-%d").to_string()
    }

    pub fn observacion_text(&self) -> &str {
        self.observacion.as_deref().unwrap_or("")
    }

    /// "Tipo - descripción", ou vazio sem alarma.
    pub fn alarma_text(&self) -> String {
        match (&self.tipo_alarma, &self.alarma_descripcion) {
            (Some(tipo), Some(desc)) => format!("{} - {}", tipo, desc),
            (Some(tipo), None) => tipo.clone(),
            _ => String::new(),
        }
    }

    pub fn autor_text(&self) -> &str {
        self.autor_nombre.as_deref().unwrap_or("Administrador")
    }
}

/// Campos editáveis de uma entrada. O estudiante e o autor não entram aqui:
/// são fixados na criação.
#[derive(Debug, Clone, Default)]
pub struct LogEntryInput {
    pub fecha_registro: Option<NaiveDateTime>,
    pub observacion: Option<String>,
    pub alarma_id: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogEntryForm {
    #[serde(default)]
    pub fecha_registro: String,
    #[serde(default)]
    pub observacion: String,
    #[serde(default)]
    pub alarma: String,
}

impl LogEntryForm {
    pub fn to_input(&self) -> Result<LogEntryInput, String> {
        let fecha_registro = parse_form_datetime(&self.fecha_registro)?;
        let observacion = Some(self.observacion.trim().to_string()).filter(|o| !o.is_empty());
        let alarma_id = match self.alarma.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i64>()
                    .map_err(|_| "Alarma inválida.".to_string())?,
            ),
        };
        Ok(LogEntryInput {
            fecha_registro,
            observacion,
            alarma_id,
        })
    }
}

/// Aceita "YYYY-MM-DD", "YYYY-MM-DDTHH:MM" e "YYYY-MM-DD HH:MM:SS".
/// Vazio devolve None (o serviço usa a hora atual).
pub fn parse_form_datetime(raw: &str) -> Result<Option<NaiveDateTime>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    for fmt in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Some(dt));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Some)
        .ok_or_else(|| format!("Fecha inválida: '{}'", raw))
}
