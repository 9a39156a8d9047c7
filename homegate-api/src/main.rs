//! # Homegate API Server
//!
//! Registration, authentication, and admin-moderation backend:
//! email/password signup with confirmation, JWT login with refresh tokens,
//! password reset, and an approval workflow over pending applicant
//! profiles.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p homegate-api
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use homegate_api::app::{build_router, AppState};
use homegate_api::config::Config;
use homegate_shared::db::{migrations, pool};
use homegate_shared::notify::SmtpMailer;
use homegate_shared::service::{AccountLifecycleService, ModerationService};
use homegate_shared::store::PgAccountStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homegate_api=info,homegate_shared=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Homegate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis = redis::aio::ConnectionManager::new(redis_client).await?;

    let store = Arc::new(PgAccountStore::new(db.clone()));
    let mailer = Arc::new(SmtpMailer::new(&config.mailer_config())?);

    let accounts = AccountLifecycleService::new(
        store.clone(),
        mailer.clone(),
        config.jwt.secret.clone(),
    );
    let moderation = ModerationService::new(store, mailer);

    let bind_address = config.bind_address();
    let state = AppState::new(db, redis, accounts, moderation, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
