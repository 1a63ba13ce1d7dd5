use nc_news::config::Config;
use nc_news::db;
use nc_news::tracing_setup::init_tracing;
use tracing::{error, info};

async fn run() -> db::Result<()> {
    let config = Config::load()?;
    let pool = db::init_pool(&config)?;
    let rocket = nc_news::rocket(pool)
        .launch()
        .await
        .map_err(|e| format!("server failed: {}", e))?;
    info!("shut down cleanly from {}", rocket.config().address);
    Ok(())
}

#[rocket::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
