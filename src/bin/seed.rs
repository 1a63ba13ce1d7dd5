//! Recreates the tables in `DATABASE_URL` and loads the bundled fixture set.

use nc_news::config::Config;
use nc_news::db::{self, data, seed};
use nc_news::tracing_setup::init_tracing;
use tracing::error;

fn run() -> db::Result<()> {
    let config = Config::load()?;
    let pool = db::init_pool(&config)?;
    let mut conn = pool.get()?;
    seed::seed(&mut conn, &data::test_data()?)
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        error!("seeding failed: {}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
