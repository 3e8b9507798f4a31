use std::sync::Arc;
use anyhow::{anyhow, Context};
use bb8_postgres::bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::NoTls;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;
use shelter_visits::config::{Config, Storage};
use shelter_visits::controller::{self, AppState};
use shelter_visits::repositories::memory_repo::InMemoryVisiterRepo;
use shelter_visits::repositories::postgres_repo::PostgresConnectionRepo;
use shelter_visits::repositories::VisiterRepo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    info!("Starting visit service in {} environment", config.environment);

    let visiter_repo = build_repo(&config).await?;
    controller::serve(AppState::new(visiter_repo), &config).await
}

async fn build_repo(config: &Config) -> anyhow::Result<Arc<dyn VisiterRepo>> {
    match config.storage {
        Storage::Memory => {
            info!("Using in-memory storage, reservations are lost on restart");
            Ok(Arc::new(InMemoryVisiterRepo::new()))
        }
        Storage::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow!("DATABASE_URL is required for postgres storage"))?;
            let manager = PostgresConnectionManager::new_from_stringlike(database_url, NoTls)
                .context("Invalid DATABASE_URL")?;
            let pool = Pool::builder()
                .max_size(config.pool_size)
                .build(manager)
                .await
                .context("Failed to build the postgres pool")?;
            info!("Postgres pool ready with up to {} connections", config.pool_size);

            let repo = PostgresConnectionRepo::new(pool);
            repo.migrate().await?;
            Ok(Arc::new(repo))
        }
    }
}
