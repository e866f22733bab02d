//! Server configuration.
//!
//! All backing-service settings come from the environment, resolved once
//! at process start. A `.env` file is honored in development. Nothing is
//! hard-coded; missing optional values fall back to development defaults
//! with a warning.

/// Resolved configuration for the server process.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string.
    pub database_url: String,
    /// Port the HTTP server listens on.
    pub server_port: u16,
    /// Public origin used to build invite URLs (`<origin>/invite/<code>`).
    pub public_origin: String,
    /// Image host upload endpoint.
    pub image_host_endpoint: String,
    /// Image host API key.
    pub image_host_api_key: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            tracing::warn!("DATABASE_URL not set, using ./chatx.db");
            "sqlite:chatx.db?mode=rwc".to_string()
        });

        let server_port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let public_origin = std::env::var("PUBLIC_ORIGIN")
            .unwrap_or_else(|_| format!("http://localhost:{server_port}"));

        let image_host_endpoint = std::env::var("IMAGE_HOST_ENDPOINT")
            .unwrap_or_else(|_| "https://api.imgbb.com/1/upload".to_string());

        let image_host_api_key = std::env::var("IMAGE_HOST_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("IMAGE_HOST_API_KEY not set, image uploads will be rejected upstream");
            String::new()
        });

        Self {
            database_url,
            server_port,
            public_origin,
            image_host_endpoint,
            image_host_api_key,
        }
    }
}
