// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, DatabaseConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    UploadConfig,
};

// Compiled-in credentials, overridable but always present in the binary
pub const SECRET_KEY: &str = "hardcoded-secret-key-12345";
pub const DB_HOST: &str = "localhost";
pub const DB_USER: &str = "admin";
pub const DB_PASSWORD: &str = "admin123";

/// Prefix for environment overrides, e.g. `DEMO_SERVER__PORT=8081`
const ENV_PREFIX: &str = "DEMO";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.debug", true)?
            .set_default("server.secret_key", SECRET_KEY)?
            .set_default("database.path", "app.db")?
            .set_default("database.host", DB_HOST)?
            .set_default("database.user", DB_USER)?
            .set_default("database.password", DB_PASSWORD)?
            .set_default("database.seed", true)?
            .set_default("upload.dir", "/uploads")?
            .set_default("upload.create_dir", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.default_content_type", "text/html; charset=utf-8")?
            .set_default("http.server_name", "DevSecOps-Demo/0.1")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
