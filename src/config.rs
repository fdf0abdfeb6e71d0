// Configuration module for moviefreaks-server
// Handles XDG-compliant directory paths and TOML configuration file

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;

const APP_NAME: &str = "moviefreaks";
const CONFIG_FILENAME: &str = "config.toml";

/// Default upload endpoint of the media-hosting collaborator
const DEFAULT_UPLOAD_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerConfig,

    /// Directory paths (overrides XDG defaults)
    pub paths: PathsConfig,

    /// Media-hosting service credentials
    pub media: MediaFileConfig,

    /// Startup admin seed
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 3001)
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Override data directory (database location)
    pub data_dir: Option<PathBuf>,

    /// Override config directory
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaFileConfig {
    /// Media host account name (forms the upload URL path)
    pub cloud_name: Option<String>,

    /// Media host API key
    pub api_key: Option<String>,

    /// Media host API secret (used to sign upload requests)
    pub api_secret: Option<String>,

    /// Override the upload endpoint (useful for testing)
    pub upload_base_url: Option<String>,
}

/// Well-known admin identity created on startup if absent
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub admin_email: String,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@movie.com".to_string(),
            admin_username: "Admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }
}

/// Resolved media-host credentials; all three secrets are required
#[derive(Debug, Clone)]
pub struct MediaHostConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_base_url: String,
}

/// Application paths following XDG Base Directory Specification on Unix
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for configuration files (config.toml)
    /// XDG: $XDG_CONFIG_HOME/moviefreaks or ~/.config/moviefreaks
    pub config_dir: PathBuf,

    /// Directory for persistent data (database)
    /// XDG: $XDG_DATA_HOME/moviefreaks or ~/.local/share/moviefreaks
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Create application paths using XDG directories (or fallbacks)
    ///
    /// Priority order:
    /// 1. Environment variables (MOVIEFREAKS_CONFIG_DIR, MOVIEFREAKS_DATA_DIR)
    /// 2. Config file overrides
    /// 3. XDG directories
    /// 4. Current directory fallback
    pub fn new(config_overrides: &PathsConfig) -> Self {
        Self {
            config_dir: Self::resolve_config_dir(&config_overrides.config_dir),
            data_dir: Self::resolve_data_dir(&config_overrides.data_dir),
        }
    }

    fn resolve_config_dir(config_override: &Option<PathBuf>) -> PathBuf {
        if let Ok(path) = std::env::var("MOVIEFREAKS_CONFIG_DIR") {
            return PathBuf::from(path);
        }
        if let Some(ref path) = config_override {
            return path.clone();
        }
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn resolve_data_dir(config_override: &Option<PathBuf>) -> PathBuf {
        if let Ok(path) = std::env::var("MOVIEFREAKS_DATA_DIR") {
            return PathBuf::from(path);
        }
        if let Some(ref path) = config_override {
            return path.clone();
        }
        if let Some(dir) = dirs::data_dir() {
            return dir.join(APP_NAME);
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("moviefreaks.db")
    }

    /// Get the database URL for SQLite
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.database_path().display())
    }

    /// Ensure all directories exist
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.config_dir).await?;
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// Log the configured paths
    pub fn log_paths(&self) {
        tracing::info!("Configuration directory: {}", self.config_dir.display());
        tracing::info!("Data directory: {}", self.data_dir.display());
        tracing::debug!("Database path: {}", self.database_path().display());
    }
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application paths
    pub paths: AppPaths,

    /// Server port
    pub port: u16,

    /// Bind address
    pub bind_address: String,

    /// Media-hosting credentials
    pub media: MediaHostConfig,

    /// Admin seed identity
    pub seed: SeedConfig,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    ///
    /// Fails fast when the media-hosting credentials are missing; a server
    /// without them would accept uploads it cannot forward anywhere.
    pub fn load() -> Result<Self> {
        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_file)
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        if let Ok(path) = std::env::var("MOVIEFREAKS_CONFIG_DIR") {
            return PathBuf::from(path);
        }
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &std::path::Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Result<Self> {
        let paths = AppPaths::new(&config_file.paths);

        // Port: env > config > default. PORT is the legacy variable name.
        let port = Self::env_port().unwrap_or(config_file.server.port);

        let bind_address = std::env::var("MOVIEFREAKS_BIND_ADDRESS")
            .unwrap_or_else(|_| config_file.server.bind_address.clone());

        let media = Self::resolve_media(&config_file.media)?;

        Ok(Self {
            paths,
            port,
            bind_address,
            media,
            seed: config_file.seed,
        })
    }

    /// Resolve media-host credentials (env > config), failing with a
    /// diagnostic naming every missing secret
    fn resolve_media(file: &MediaFileConfig) -> Result<MediaHostConfig> {
        let cloud_name = std::env::var("CLOUDINARY_CLOUD_NAME")
            .ok()
            .or_else(|| file.cloud_name.clone());
        let api_key = std::env::var("CLOUDINARY_API_KEY")
            .ok()
            .or_else(|| file.api_key.clone());
        let api_secret = std::env::var("CLOUDINARY_API_SECRET")
            .ok()
            .or_else(|| file.api_secret.clone());

        let mut missing = Vec::new();
        if cloud_name.is_none() {
            missing.push("CLOUDINARY_CLOUD_NAME / [media].cloud_name");
        }
        if api_key.is_none() {
            missing.push("CLOUDINARY_API_KEY / [media].api_key");
        }
        if api_secret.is_none() {
            missing.push("CLOUDINARY_API_SECRET / [media].api_secret");
        }
        if !missing.is_empty() {
            bail!(
                "media-hosting credentials missing: {}. Uploads cannot work without them.",
                missing.join(", ")
            );
        }

        let upload_base_url = std::env::var("MEDIA_UPLOAD_BASE_URL")
            .ok()
            .or_else(|| file.upload_base_url.clone())
            .unwrap_or_else(|| DEFAULT_UPLOAD_BASE_URL.to_string());

        Ok(MediaHostConfig {
            cloud_name: cloud_name.unwrap_or_default(),
            api_key: api_key.unwrap_or_default(),
            api_secret: api_secret.unwrap_or_default(),
            upload_base_url,
        })
    }

    fn env_port() -> Option<u16> {
        std::env::var("MOVIEFREAKS_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
    }

    /// Get the database URL, with override from DATABASE_URL env var
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.paths.database_url())
    }

    /// Log configuration status
    pub fn log_config(&self) {
        self.paths.log_paths();
        tracing::info!("Server listening on {}:{}", self.bind_address, self.port);
        tracing::info!(
            "Media host: {} (account {})",
            self.media.upload_base_url,
            self.media.cloud_name
        );
        tracing::debug!("Admin seed identity: {}", self.seed.admin_email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_format() {
        let paths = AppPaths::new(&PathsConfig {
            data_dir: Some(PathBuf::from("/tmp/moviefreaks-test")),
            config_dir: None,
        });
        let url = paths.database_url();
        assert!(url.starts_with("sqlite:"));
        assert!(url.ends_with("?mode=rwc"));
        assert!(url.contains("moviefreaks.db"));
    }

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert!(config.media.cloud_name.is_none());
        assert_eq!(config.seed.admin_email, "admin@movie.com");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[server]
port = 9000
bind_address = "127.0.0.1"

[media]
cloud_name = "demo"
api_key = "key"
api_secret = "secret"

[paths]
data_dir = "/custom/data"

[seed]
admin_email = "root@example.com"
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.media.cloud_name, Some("demo".to_string()));
        assert_eq!(config.paths.data_dir, Some(PathBuf::from("/custom/data")));
        assert_eq!(config.seed.admin_email, "root@example.com");
        assert_eq!(config.seed.admin_password, "admin"); // default survives
    }

    #[test]
    fn test_partial_config_toml() {
        // Partial configs work (only specify what you need)
        let toml_str = r#"
[media]
cloud_name = "demo"
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 3001); // default
        assert_eq!(config.media.cloud_name, Some("demo".to_string()));
    }

    #[test]
    fn test_missing_media_credentials_fail_fast() {
        // No env credentials set in the test environment for these names
        if std::env::var("CLOUDINARY_CLOUD_NAME").is_ok() {
            return;
        }
        let err = AppConfig::resolve_media(&MediaFileConfig::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cloud_name"));
        assert!(msg.contains("api_secret"));
    }

    #[test]
    fn test_media_credentials_from_file() {
        if std::env::var("CLOUDINARY_CLOUD_NAME").is_ok() {
            return;
        }
        let media = AppConfig::resolve_media(&MediaFileConfig {
            cloud_name: Some("demo".into()),
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
            upload_base_url: None,
        })
        .unwrap();
        assert_eq!(media.cloud_name, "demo");
        assert_eq!(media.upload_base_url, DEFAULT_UPLOAD_BASE_URL);
    }
}
