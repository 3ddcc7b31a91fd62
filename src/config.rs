use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub omdb_rps: u32,
    pub page_size: usize,
    pub environment: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_url: "sqlite://movies.db?mode=rwc".to_string(),
            omdb_api_key: String::new(),
            omdb_base_url: "http://www.omdbapi.com".to_string(),
            omdb_rps: 4,
            page_size: 10,
            environment: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let omdb_api_key = std::env::var("OMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let omdb_base_url = std::env::var("OMDB_BASE_URL").unwrap_or(defaults.omdb_base_url);

        let omdb_rps: u32 =
            std::env::var("OMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.omdb_rps);

        let page_size: usize = match std::env::var("PAGE_SIZE") {
            Ok(raw) => raw.parse().context("PAGE_SIZE")?,
            Err(_) => defaults.page_size,
        };
        anyhow::ensure!(page_size > 0, "PAGE_SIZE must be positive");

        let environment = std::env::var("APPLICATION_ENVIRONMENT").ok();

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            omdb_api_key,
            omdb_base_url,
            omdb_rps,
            page_size,
            environment,
        })
    }
}
