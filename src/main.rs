use std::sync::Arc;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod movies;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "movie_collection=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::from_pool(config.clone(), pool.clone());

    if config.seed_movies {
        let store = movies::repo::PgMovieStore::new(pool);
        movies::seed::seed_movies(&store).await?;
    }

    app::serve(app::build_app(app_state), &config).await
}
