// src/models/tutoring.rs
use crate::models::log_entry::parse_form_datetime;
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct TutoringRow {
    pub id: i64,
    pub fecha: NaiveDateTime,
    pub tema_tutoria: Option<String>,
    pub lugar: String,
    pub tutor_id: i64,
    pub tutor_nombre: String,
    pub tipo_id: i64,
    pub tipo_nombre: String,
    pub clasificacion_id: i64,
    pub clasificacion_nombre: String,
}

impl TutoringRow {
    pub fn fecha_display(&self) -> String {
        self.fecha.format("%d/%m/%Y %H:%M").to_string()
    }

    pub fn fecha_input(&self) -> String {
        self.fecha.format("%Y-%m-%dT%H:%M").to_string()
    }

    pub fn tema_text(&self) -> &str {
        self.tema_tutoria.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct TutoringInput {
    pub fecha: NaiveDateTime,
    pub tema_tutoria: Option<String>,
    pub lugar: String,
    pub tipo_id: i64,
    pub clasificacion_id: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct TutoringForm {
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub tema_tutoria: String,
    #[serde(default)]
    pub lugar: String,
    #[serde(default)]
    pub tipo_tutoria: String,
    #[serde(default)]
    pub clasificacion_tutoria: String,
}

impl TutoringForm {
    pub fn to_input(&self) -> Result<TutoringInput, String> {
        let fecha = parse_form_datetime(&self.fecha)?
            .ok_or_else(|| "La fecha es obligatoria.".to_string())?;
        let lugar = self.lugar.trim().to_string();
        if lugar.is_empty() {
            return Err("El lugar es obligatorio.".to_string());
        }
        let tipo_id = self
            .tipo_tutoria
            .trim()
            .parse::<i64>()
            .map_err(|_| "Seleccione un tipo de tutoría.".to_string())?;
        let clasificacion_id = self
            .clasificacion_tutoria
            .trim()
            .parse::<i64>()
            .map_err(|_| "Seleccione una clasificación.".to_string())?;
        Ok(TutoringInput {
            fecha,
            tema_tutoria: Some(self.tema_tutoria.trim().to_string()).filter(|t| !t.is_empty()),
            lugar,
            tipo_id,
            clasificacion_id,
        })
    }
}

/// Estudiante elegível para a lista de asistencia + estado atual (se houver).
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRow {
    pub estudiante_id: i64,
    pub nombre: String,
    pub apellido: String,
    pub estado_asistencia: Option<String>,
}

impl AttendanceRow {
    pub fn field_name(&self) -> String {
        attendance_field(self.estudiante_id)
    }

    pub fn is_state(&self, state: &str) -> bool {
        self.estado_asistencia.as_deref() == Some(state)
    }
}

pub const ATTENDANCE_STATES: &[&str] = &["Presente", "Ausente", "Justificado"];

pub fn attendance_field(student_id: i64) -> String {
    format!("asistencia_{}", student_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutoring_form_requires_date_place_and_refs() {
        let ok = TutoringForm {
            fecha: "2024-05-10T10:00".into(),
            tema_tutoria: "Hábitos de estudio".into(),
            lugar: "Sala 3".into(),
            tipo_tutoria: "1".into(),
            clasificacion_tutoria: "2".into(),
        }
        .to_input()
        .unwrap();
        assert_eq!(ok.lugar, "Sala 3");
        assert_eq!(ok.clasificacion_id, 2);

        let missing_place = TutoringForm {
            fecha: "2024-05-10T10:00".into(),
            tipo_tutoria: "1".into(),
            clasificacion_tutoria: "2".into(),
            ..Default::default()
        };
        assert!(missing_place.to_input().is_err());

        let missing_date = TutoringForm {
            lugar: "Sala 3".into(),
            tipo_tutoria: "1".into(),
            clasificacion_tutoria: "2".into(),
            ..Default::default()
        };
        assert!(missing_date.to_input().is_err());
    }
}
