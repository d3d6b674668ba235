// src/models/student.rs
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::FromRow;

pub const STUDENTS_PER_PAGE: i64 = 10;

/// Estudiante com os nomes das relações (carrera, estado, tutor) já resolvidos.
#[derive(Debug, Clone, FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub rut: String,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub anio_ingreso: i64,
    pub lugar_procedencia: Option<String>,
    pub grupo_familiar: Option<String>,
    pub beneficios_sociales: Option<String>,
    pub carrera_id: i64,
    pub carrera_nombre: String,
    pub estado_id: i64,
    pub estado_nombre: String,
    pub tutor_id: Option<i64>,
    pub tutor_nombre: Option<String>,
    pub tipo_desercion: Option<String>,
}

impl StudentRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }

    pub fn tutor_text(&self) -> &str {
        self.tutor_nombre.as_deref().unwrap_or("Sin tutor")
    }
}

/// Dados para criar um estudiante (nível de serviço; não há formulário HTTP).
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub rut: String,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub anio_ingreso: i64,
    pub lugar_procedencia: Option<String>,
    pub grupo_familiar: Option<String>,
    pub beneficios_sociales: Option<String>,
    pub carrera_id: i64,
    pub tutor_id: Option<i64>,
    pub estado_id: i64,
    pub tipo_desercion_id: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct StatusHistoryRow {
    pub id: i64,
    pub estado_nombre: String,
    pub fecha_asignacion: NaiveDateTime,
}

impl StatusHistoryRow {
    pub fn fecha_display(&self) -> String {
        self.fecha_asignacion.format("%d/%m/%Y %H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudentOrder {
    #[default]
    Surname,
    Newest,
}

/// Filtros da listagem, já normalizados (strings vazias = ausente).
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub q: Option<String>,
    pub estado_id: Option<i64>,
    pub carrera_id: Option<i64>,
    pub order: StudentOrder,
}

/// Query string de GET /estudiantes/
/// Os campos chegam como texto: "?estado=" vazio não deve falhar a extração.
#[derive(Debug, Deserialize, Default)]
pub struct StudentListQuery {
    pub q: Option<String>,
    pub estado: Option<String>,
    pub carrera: Option<String>,
    pub orden: Option<String>,
    pub page: Option<String>,
}

impl StudentListQuery {
    pub fn filter(&self) -> StudentFilter {
        StudentFilter {
            q: non_blank(self.q.as_deref()),
            estado_id: parse_id(self.estado.as_deref()),
            carrera_id: parse_id(self.carrera.as_deref()),
            order: match self.orden.as_deref() {
                Some("recientes") => StudentOrder::Newest,
                _ => StudentOrder::Surname,
            },
        }
    }

    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

#[derive(Debug, Clone)]
pub struct StudentPage {
    pub students: Vec<StudentRow>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeForm {
    pub estado: i64,
}

pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

pub fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}
