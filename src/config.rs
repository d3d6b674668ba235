// src/config.rs
use crate::error::AppResult;
use std::{env, net::SocketAddr};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PDF_ENGINES: &[&str] = &["wkhtmltopdf", "weasyprint"];

/// Conta de superutilizador criada no arranque (se ainda não existir).
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Configuração lida das variáveis de ambiente (e do `.env`, via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    // Programas externos HTML -> PDF, por ordem de preferência
    pub pdf_engines: Vec<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let bind_raw = env::var("SAT_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| {
            tracing::error!("SAT_BIND_ADDR inválido ('{}'): {}", bind_raw, e);
            crate::error::AppError::Config(format!("SAT_BIND_ADDR inválido: {}", bind_raw))
        })?;

        let pdf_engines = match env::var("SAT_PDF_ENGINES") {
            Ok(raw) => parse_engine_list(&raw),
            Err(_) => DEFAULT_PDF_ENGINES.iter().map(|s| s.to_string()).collect(),
        };

        let bootstrap_admin = match (env::var("SAT_ADMIN_EMAIL"), env::var("SAT_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email: email.trim().to_string(), password })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            pdf_engines,
            bootstrap_admin,
        })
    }
}

fn parse_engine_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_list_skips_blanks() {
        assert_eq!(
            parse_engine_list(" wkhtmltopdf , ,weasyprint,"),
            vec!["wkhtmltopdf".to_string(), "weasyprint".to_string()]
        );
        assert!(parse_engine_list("  ").is_empty());
    }
}
