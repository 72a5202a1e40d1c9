// config.rs
use anyhow::Context;

use crate::service::ledger::DEFAULT_MIN_REIMBURSEMENT_POINTS;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000,http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub uploads_dir: String,
    pub min_reimbursement_points: i64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn init() -> anyhow::Result<Config> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?;
        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .context("JWT_MAXAGE must be set")?
            .parse::<i64>()
            .context("JWT_MAXAGE must be a number of minutes")?;

        let port = match std::env::var("PORT") {
            Ok(port) => port.parse::<u16>().context("PORT must be a valid port number")?,
            Err(_) => 8000,
        };

        let uploads_dir = std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let min_reimbursement_points = match std::env::var("MIN_REIMBURSEMENT_POINTS") {
            Ok(value) => value
                .parse::<i64>()
                .context("MIN_REIMBURSEMENT_POINTS must be a whole number")?,
            Err(_) => DEFAULT_MIN_REIMBURSEMENT_POINTS,
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string());

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            uploads_dir,
            min_reimbursement_points,
            cors_origins: parse_origins(&cors_origins),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
