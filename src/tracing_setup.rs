//! Console logging for the binaries.
//!
//!   RUST_LOG=nc_news=debug nc-news   # fine-grained log control (default: info)

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Rocket installs its own logger on launch; whichever comes first wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}
