// src/models/dashboard.rs
use crate::models::{
    log_entry::LogEntryRow,
    student::{non_blank, parse_id},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const RECENT_ENTRIES_LIMIT: i64 = 5;

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub carrera_dashboard: Option<String>,
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    pub tipo_alerta: Option<String>,
}

impl DashboardQuery {
    pub fn filter(&self) -> DashboardFilter {
        DashboardFilter {
            carrera_id: parse_id(self.carrera_dashboard.as_deref()),
            fecha_desde: parse_date(self.fecha_desde.as_deref()),
            fecha_hasta: parse_date(self.fecha_hasta.as_deref()),
            tipo_alarma_id: parse_id(self.tipo_alerta.as_deref()),
        }
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    non_blank(raw).and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub carrera_id: Option<i64>,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub tipo_alarma_id: Option<i64>,
}

impl DashboardFilter {
    pub fn is_active(&self) -> bool {
        self.carrera_id.is_some()
            || self.fecha_desde.is_some()
            || self.fecha_hasta.is_some()
            || self.tipo_alarma_id.is_some()
    }

    /// Filtros que restringem as entradas da bitácora (e não só os estudiantes).
    pub fn filters_entries(&self) -> bool {
        self.fecha_desde.is_some() || self.fecha_hasta.is_some() || self.tipo_alarma_id.is_some()
    }
}

/// Contadores por nível de risco. Cada bucket é independente:
/// o nome do estado é comparado por substring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub total: i64,
    pub alto: i64,
    pub medio: i64,
    pub bajo: i64,
}

impl RiskCounts {
    pub fn tally<'a, I>(status_names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts = RiskCounts::default();
        for name in status_names {
            counts.total += 1;
            if name.contains("Alto") {
                counts.alto += 1;
            }
            if name.contains("Medio") {
                counts.medio += 1;
            }
            if name.contains("Bajo") {
                counts.bajo += 1;
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct YearBucket {
    pub anio: i64,
    pub cantidad: i64,
}

#[derive(Debug, Clone)]
pub struct DashboardData {
    pub kpis: RiskCounts,
    pub por_anio: Vec<YearBucket>,
    pub bitacoras: Vec<LogEntryRow>,
    pub filtered: bool,
}
