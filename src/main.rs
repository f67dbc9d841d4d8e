use moodify::config::Config;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodify=debug,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let pool = moodify::db::init_pool(&config.database_url).await?;

    let app = moodify::build_app(pool, config.jwt_secret.clone());

    let addr = config.addr()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
