// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod db;
mod error;
mod models;
mod services;
mod state;
mod templates;
mod web;

#[cfg(test)]
mod test_support;

// --- Imports ---
use crate::{config::Config, services::auth_service, state::AppState};
use axum::serve;
use std::{env, sync::Arc};
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| "sat=debug,tower_http=info,sqlx=warn,tower_sessions=info".into())
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando servidor SAT...");

    let config = Config::from_env().map_err(|e| {
        tracing::error!("❌ Configuração inválida: {}", e);
        anyhow::anyhow!("Falha ao ler configuração: {}", e)
    })?;
    tracing::info!("Motores de PDF configurados: {:?}", config.pdf_engines);

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        auth_service::ensure_bootstrap_admin(&db_pool, admin)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar superutilizador: {}", e))?;
    }

    // --- Configuração das Sessões ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Falha ao criar session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao migrar tabela de sessões: {}", e))?;

    let session_store_clone = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = session_store_clone
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Erro na task de limpeza de sessões: {:?}", e);
        }
    });
    tracing::info!("🧹 Tarefa de limpeza de sessões iniciada.");

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    tracing::info!("🔑 Camada de sessão configurada.");

    // --- Criação do Estado da Aplicação ---
    let bind_addr = config.bind_addr;
    let app_state = AppState {
        db_pool,
        config: Arc::new(config),
    };

    // --- Configuração do Endereço e Listener ---
    tracing::info!("📡 Servidor escutando em http://{}", bind_addr);
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", bind_addr, e);
            return Err(e.into());
        }
    };

    // --- Router e Camadas ---
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(session_layer),
    );
    tracing::info!("✅ Router e middlewares configurados.");

    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
