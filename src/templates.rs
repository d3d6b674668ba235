// src/templates.rs
use askama::Template;
use crate::models::{
    catalog::{AlarmOption, CatalogItem},
    dashboard::{RiskCounts, YearBucket},
    log_entry::LogEntryRow,
    notification::NotificationRow,
    student::{StatusHistoryRow, StudentPage, StudentRow},
    tutoring::{AttendanceRow, TutoringRow},
};

/// Dados do menu comuns a todas as páginas autenticadas.
#[derive(Debug, Clone)]
pub struct Nav {
    pub display_name: String,
    pub is_tutor: bool,
    pub sees_all: bool,
    pub unread_count: i64,
    pub latest: Vec<NotificationRow>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub nav: Nav,
    pub kpis: RiskCounts,
    pub por_anio: Vec<YearBucket>,
    // [{anio, cantidad}] serializado para o gráfico
    pub chart_json: String,
    pub bitacoras: Vec<LogEntryRow>,
    pub filtered: bool,
    pub careers: Vec<CatalogItem>,
    pub alarm_types: Vec<CatalogItem>,
    pub carrera_dashboard: String,
    pub fecha_desde: String,
    pub fecha_hasta: String,
    pub tipo_alerta: String,
}

impl DashboardPage {
    pub fn is_career(&self, id: &i64) -> bool {
        self.carrera_dashboard == id.to_string()
    }

    pub fn is_alarm_type(&self, id: &i64) -> bool {
        self.tipo_alerta == id.to_string()
    }

    /// Largura da barra em percentagem do maior ano.
    pub fn bar_percent(&self, cantidad: &i64) -> i64 {
        let max = self.por_anio.iter().map(|y| y.cantidad).max().unwrap_or(0);
        if max <= 0 {
            return 0;
        }
        cantidad * 100 / max
    }
}

#[derive(Template)]
#[template(path = "student_list.html")]
pub struct StudentListPage {
    pub nav: Nav,
    pub page: StudentPage,
    pub statuses: Vec<CatalogItem>,
    pub careers: Vec<CatalogItem>,
    pub q: String,
    pub estado: String,
    pub carrera: String,
    pub orden: String,
}

impl StudentListPage {
    pub fn is_status(&self, id: &i64) -> bool {
        self.estado == id.to_string()
    }

    pub fn is_career(&self, id: &i64) -> bool {
        self.carrera == id.to_string()
    }

    /// Query string sem `page`, para os links de paginação.
    pub fn filter_query(&self) -> String {
        format!(
            "q={}&estado={}&carrera={}&orden={}",
            urlencoding::encode(&self.q),
            urlencoding::encode(&self.estado),
            urlencoding::encode(&self.carrera),
            urlencoding::encode(&self.orden)
        )
    }

    pub fn has_previous(&self) -> bool {
        self.page.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page.page < self.page.total_pages
    }

    pub fn previous_page(&self) -> i64 {
        self.page.page - 1
    }

    pub fn next_page(&self) -> i64 {
        self.page.page + 1
    }
}

#[derive(Template)]
#[template(path = "student_detail.html")]
pub struct StudentDetailPage {
    pub nav: Nav,
    pub student: StudentRow,
    pub history: Vec<StatusHistoryRow>,
    pub entries: Vec<LogEntryRow>,
    pub statuses: Vec<CatalogItem>,
    pub can_change_status: bool,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "log_entry_form.html")]
pub struct LogEntryFormPage {
    pub nav: Nav,
    pub student_id: i64,
    pub student_name: String,
    // None = nova entrada
    pub entry_id: Option<i64>,
    pub fecha_registro: String,
    pub observacion: String,
    pub alarma: String,
    pub alarms: Vec<AlarmOption>,
    pub error_message: Option<String>,
}

impl LogEntryFormPage {
    pub fn is_alarm(&self, id: &i64) -> bool {
        self.alarma == id.to_string()
    }

    pub fn action(&self) -> String {
        match self.entry_id {
            Some(id) => format!("/bitacora/{}/editar/", id),
            None => format!("/estudiantes/{}/bitacora/nueva/", self.student_id),
        }
    }
}

/// Página de confirmação genérica (bitácora, tutoria).
#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeletePage {
    pub nav: Nav,
    pub title: String,
    pub message: String,
    pub action: String,
    pub cancel_url: String,
}

#[derive(Template)]
#[template(path = "tutoring_list.html")]
pub struct TutoringListPage {
    pub nav: Nav,
    pub sessions: Vec<TutoringRow>,
    pub can_create: bool,
    // id do perfil atual, para mostrar as ações só nas sessões próprias
    pub owner_id: i64,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "tutoring_form.html")]
pub struct TutoringFormPage {
    pub nav: Nav,
    pub session_id: Option<i64>,
    pub fecha: String,
    pub tema_tutoria: String,
    pub lugar: String,
    pub tipo_tutoria: String,
    pub clasificacion_tutoria: String,
    pub types: Vec<CatalogItem>,
    pub classifications: Vec<CatalogItem>,
    pub error_message: Option<String>,
}

impl TutoringFormPage {
    pub fn is_type(&self, id: &i64) -> bool {
        self.tipo_tutoria == id.to_string()
    }

    pub fn is_classification(&self, id: &i64) -> bool {
        self.clasificacion_tutoria == id.to_string()
    }

    pub fn action(&self) -> String {
        match self.session_id {
            Some(id) => format!("/tutorias/{}/editar/", id),
            None => "/tutorias/nueva/".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "attendance_form.html")]
pub struct AttendancePage {
    pub nav: Nav,
    pub session: TutoringRow,
    pub rows: Vec<AttendanceRow>,
    pub states: &'static [&'static str],
    pub success_message: Option<String>,
}

#[derive(Template)]
#[template(path = "notification_list.html")]
pub struct NotificationListPage {
    pub nav: Nav,
    pub notifications: Vec<NotificationRow>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

/// HTML enviado ao motor de PDF.
#[derive(Template)]
#[template(path = "student_report.html")]
pub struct StudentReport<'a> {
    pub student: &'a StudentRow,
    pub history: &'a [StatusHistoryRow],
    pub entries: &'a [LogEntryRow],
    pub generated_at: String,
}
