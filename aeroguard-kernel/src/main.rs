/**
 * AEROGUARD KERNEL - Point d'entrée principal du serveur AeroGuard
 *
 * RÔLE : Orchestration des modules : config, catalogue, générateur, recommandations, HTTP.
 * Bootstrap du système complet avec gestion d'erreurs et logging.
 *
 * ARCHITECTURE : API REST + snapshots synthétiques déterministes + service externe de recommandations.
 * UTILITÉ : Backend du dashboard de surveillance de la qualité de l'air des salles hospitalières.
 */

mod config;
mod health;
mod http;
mod recommender;

use crate::config::load_config;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::recommender::RecommendClient;

use aeroguard_sim::{Catalog, SnapshotGenerator};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aeroguard_kernel=info,aeroguard_sim=info")),
        )
        .init();

    let cfg = load_config().await;

    let catalog = Catalog::builtin();
    info!(
        facilities = catalog.facilities().len(),
        rooms = catalog.room_count(),
        "catalog loaded"
    );

    let generator = SnapshotGenerator::new(cfg.clock.utc_offset());
    info!(utc_offset = %generator.utc_offset(), "snapshot generator ready");

    let recommender = RecommendClient::new(cfg.recommender.clone())
        .context("Failed to build recommendation client")?;
    if !recommender.is_configured() {
        info!("recommendation service disabled");
    }

    // fabrique l'état unique pour Axum
    let app_state = AppState {
        catalog: Arc::new(catalog),
        generator,
        recommender: Arc::new(recommender),
        health_tracker: HealthTracker::new(),
    };

    // HTTP
    let app = http::build_router(app_state);

    let addr: SocketAddr = cfg
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", cfg.server.bind))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
