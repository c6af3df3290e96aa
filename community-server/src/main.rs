use actix_web::HttpServer;
use community_server::build_app;
use community_server::infrastructure::config::AppConfig;
use community_server::infrastructure::database::{create_pool, run_migrations};
use community_server::infrastructure::logging::init_logging;
use community_server::state::{AppState, Repositories};
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;

    let repos = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Repositories::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set - using in-memory store, data is lost on restart");
            Repositories::in_memory()
        }
    };
    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set - administrator endpoints are disabled");
    }

    let state = AppState::new(repos, &config);

    info!(host = %config.host, port = config.port, "HTTP server starting");

    HttpServer::new(move || build_app(state.clone()))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
