use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;
use service::auth::events::{EventPublisher, HttpEventPublisher, LogEventPublisher};
use service::auth::repo::seaorm::{SeaOrmAccountStore, SeaOrmCartProvisioner};
use service::auth::{AuthConfig, AuthService};

use crate::errors::StartupError;
use crate::routes::{self, auth::AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn build_events(cfg: &configs::EventsConfig) -> Result<Arc<dyn EventPublisher>, StartupError> {
    match &cfg.endpoint {
        Some(endpoint) => {
            let publisher = HttpEventPublisher::new(endpoint.clone(), Duration::from_secs(cfg.timeout_secs))
                .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
            info!(%endpoint, "domain events delivered over http");
            Ok(Arc::new(publisher))
        }
        None => {
            warn!("events.endpoint not set; domain events are only logged");
            Ok(Arc::new(LogEventPublisher))
        }
    }
}

/// Wire the SeaORM stores and the configured event sink into an [`AppState`].
pub fn build_state(cfg: &AppConfig, db: DatabaseConnection) -> Result<AppState, StartupError> {
    let accounts = Arc::new(SeaOrmAccountStore { db: db.clone() });
    let carts = Arc::new(SeaOrmCartProvisioner { db });
    let events = build_events(&cfg.events)?;
    let auth = AuthService::new(accounts, carts, events, AuthConfig::from(&cfg.jwt));
    Ok(AppState { auth: Arc::new(auth) })
}

pub fn build_app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Public entry: connect and migrate the database, then serve until Ctrl+C.
/// Configuration and logging are set up by the caller.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None).await?;
        info!("migrations applied");
    }

    let app = build_app(build_state(&cfg, db)?);

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting storefront auth server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
