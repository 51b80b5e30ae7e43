use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use domain_image_search::ImageSearchConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub image_search: ImageSearchConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let image_search = ImageSearchConfig::from_env()?;

        if environment.is_production() && server.cors_allowed_origins.is_empty() {
            eyre::bail!("CORS_ALLOWED_ORIGIN must be set when APP_ENV=production");
        }

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            image_search,
        })
    }
}
