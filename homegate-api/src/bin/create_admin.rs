//! Admin bootstrap command
//!
//! Creates an admin account through the privileged registration path, which
//! bypasses the self-registration role whitelist. Reads the email and
//! password from stdin.
//!
//! ```bash
//! cargo run -p homegate-api --bin create-admin
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use homegate_api::config::Config;
use homegate_shared::db::pool;
use homegate_shared::models::account::AccountRole;
use homegate_shared::notify::SmtpMailer;
use homegate_shared::service::AccountLifecycleService;
use homegate_shared::store::PgAccountStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homegate_shared=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: 2,
        ..Default::default()
    })
    .await?;

    let store = Arc::new(PgAccountStore::new(db));
    let mailer = Arc::new(SmtpMailer::new(&config.mailer_config())?);
    let service = AccountLifecycleService::new(store, mailer, config.jwt.secret.clone());

    let email = prompt("Email")?;
    let password = prompt("Password")?;

    match service
        .register(&email, &password, AccountRole::Admin, true)
        .await
    {
        Ok(account) => {
            println!("Admin user created: {}", account.email);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
