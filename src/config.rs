use std::env;
use log::info;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub mongodb_uri: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| "SERVER_PORT must be a number")?;
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mongodb_uri = env::var("MONGODB_URI")
            .map_err(|_| "MONGODB_URI must be set")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set")?;
        if jwt_secret.len() < 16 {
            return Err("JWT_SECRET must be at least 16 characters".into());
        }

        info!("Configuration loaded, server will bind {}:{}", host, port);

        Ok(Config {
            host,
            port,
            log_level,
            mongodb_uri,
            jwt_secret,
        })
    }
}
