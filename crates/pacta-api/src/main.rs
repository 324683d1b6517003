use pacta_api::setup;
use pacta_api::telemetry;
use pacta_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load .env if present, then configuration from the environment
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    telemetry::init_telemetry();

    // Initialize the application (database, services, routes)
    let (_state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    Ok(())
}
