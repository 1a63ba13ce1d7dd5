use dotenv::dotenv;
use error_chain::bail;
use std::env;
use tracing::info;

use crate::db::{Result, ResultExt};

const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
}

impl Config {
    /// Reads `DATABASE_URL` (required) and `DATABASE_POOL_SIZE` from the
    /// environment, after loading a `.env` file if one is present.
    pub fn load() -> Result<Config> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL").chain_err(|| "DATABASE_URL must be set")?;
        let pool_size = match env::var("DATABASE_POOL_SIZE") {
            Ok(size) => parse_pool_size(&size)?,
            Err(_) => {
                info!("DATABASE_POOL_SIZE not set, using default: {}", DEFAULT_POOL_SIZE);
                DEFAULT_POOL_SIZE
            }
        };
        Ok(Config {
            database_url,
            pool_size,
        })
    }

    pub fn new<S: Into<String>>(database_url: S, pool_size: u32) -> Config {
        Config {
            database_url: database_url.into(),
            pool_size,
        }
    }
}

/// r2d2 refuses an empty pool, so zero is rejected here rather than at build.
fn parse_pool_size(raw: &str) -> Result<u32> {
    let size = raw
        .trim()
        .parse::<u32>()
        .chain_err(|| format!("invalid DATABASE_POOL_SIZE: {}", raw))?;
    if size == 0 {
        bail!("DATABASE_POOL_SIZE must be at least 1");
    }
    Ok(size)
}
