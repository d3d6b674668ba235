// src/services/report_service.rs
//! Relatório PDF de um estudiante: HTML (askama) convertido por um programa externo.
use crate::{
    error::{AppError, AppResult},
    models::access::Access,
    services::{log_entry_service, student_service},
    templates::StudentReport,
};
use askama::Template;
use chrono::Local;
use sqlx::SqlitePool;
use std::{io::ErrorKind, process::Stdio};
use tokio::{io::AsyncWriteExt, process::Command};

pub struct PdfReport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Argumentos para ler HTML do stdin e escrever PDF no stdout.
fn engine_args(engine: &str) -> &'static [&'static str] {
    match engine.rsplit('/').next().unwrap_or(engine) {
        "wkhtmltopdf" => &["--quiet", "--encoding", "utf-8", "-", "-"],
        "weasyprint" => &["--encoding", "utf-8", "-", "-"],
        _ => &["-", "-"],
    }
}

enum EngineFailure {
    // programa não instalado: tenta o seguinte
    Missing,
    Failed(String),
}

async fn run_engine(engine: &str, html: &[u8]) -> Result<Vec<u8>, EngineFailure> {
    let mut child = Command::new(engine)
        .args(engine_args(engine))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => EngineFailure::Missing,
            _ => EngineFailure::Failed(format!("{}: {}", engine, e)),
        })?;

    // O stdin é escrito noutra task para o stdout não encher enquanto escrevemos
    if let Some(mut stdin) = child.stdin.take() {
        let input = html.to_vec();
        let engine_name = engine.to_string();
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&input).await {
                tracing::debug!("{}: stdin fechado antes do fim: {}", engine_name, e);
            }
        });
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| EngineFailure::Failed(format!("{}: {}", engine, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineFailure::Failed(format!(
            "{} terminó con {}: {}",
            engine,
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

/// Tenta cada motor por ordem. Um programa ausente passa ao seguinte;
/// um erro do próprio motor termina a tentativa.
pub async fn html_to_pdf(engines: &[String], html: &str) -> AppResult<Vec<u8>> {
    let mut missing = Vec::new();
    for engine in engines {
        match run_engine(engine, html.as_bytes()).await {
            Ok(pdf) => {
                tracing::info!("📄 PDF gerado com {} ({} bytes).", engine, pdf.len());
                return Ok(pdf);
            }
            Err(EngineFailure::Missing) => {
                tracing::warn!("Motor de PDF '{}' não encontrado.", engine);
                missing.push(engine.as_str());
            }
            Err(EngineFailure::Failed(detail)) => return Err(AppError::Pdf(detail)),
        }
    }
    Err(AppError::Pdf(format!(
        "ningún motor de PDF disponible (probados: {})",
        if missing.is_empty() { "ninguno".to_string() } else { missing.join(", ") }
    )))
}

pub fn render_report_html(report: &StudentReport<'_>) -> AppResult<String> {
    Ok(report.render()?)
}

/// Relatório de um estudiante visível para o pedido atual.
pub async fn student_report(
    db_pool: &SqlitePool,
    access: &Access,
    engines: &[String],
    student_id: i64,
) -> AppResult<PdfReport> {
    let student = student_service::find_visible_student(db_pool, access, student_id).await?;
    let history = student_service::status_history(db_pool, student.id).await?;
    let entries = log_entry_service::entries_for_student(db_pool, student.id).await?;

    let html = render_report_html(&StudentReport {
        student: &student,
        history: &history,
        entries: &entries,
        generated_at: Local::now().format("%d/%m/%Y %H:%M").to_string(),
    })?;

    let bytes = html_to_pdf(engines, &html).await?;
    Ok(PdfReport {
        filename: format!("reporte_{}.pdf", student.rut.replace(&['.', ' '][..], "")),
        bytes,
    })
}
