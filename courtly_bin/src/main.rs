use std::sync::Arc;

use courtly_bin::{grant_admin, Engine};
use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    tracing::info!("Courtly scheduling engine version: {}", env!("CARGO_PKG_VERSION"));
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./courtly.sqlite3?mode=rwc".to_string());
    let pool = Arc::new(
        SqlitePool::connect(&database_url)
            .await
            .expect("Could not connect to database"),
    );

    dao_impl_sqlite::schema::init_schema(pool.as_ref())
        .await
        .expect("Failed to initialize the database schema");

    let engine = Engine::new(pool.clone());
    grant_admin(engine.permission_dao.as_ref(), "dev-user").await;

    tracing::info!("Scheduling engine ready");
}
