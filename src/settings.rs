use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the environment variable pointing at a directory with an
/// overriding `Settings.toml`
pub const SECRETS_DIR_ENV: &str = "SMARTLAUNCH_SECRETS_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SmartLaunchSettings {
    pub application: ApplicationSettings,
    pub fhir: FhirSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FhirSettings {
    /// The single FHIR base URL allowed to launch this app
    pub authorized_fhir_url: String,
    pub client_id: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub duration_minutes: u64,
    /// When set, the OAuth `state` is HMAC-signed with this secret
    pub state_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for FhirSettings {
    fn default() -> Self {
        Self {
            authorized_fhir_url: String::new(),
            client_id: String::new(),
            redirect_url: String::new(),
            scopes: default_scopes(),
        }
    }
}

fn default_scopes() -> Vec<String> {
    ["launch", "openid", "fhirUser", "patient/*.read"]
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_minutes: 60,
            state_secret: None,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // Default to secure cookies
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SmartLaunchSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging);
        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `SMARTLAUNCH_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    fn load_base_settings() -> Result<Self> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ {SECRETS_DIR_ENV} set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse one settings file; sections and keys it omits keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        basic_toml::from_str(&toml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_fhir_env_overrides(&mut settings.fhir);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    fn apply_fhir_env_overrides(fhir_settings: &mut FhirSettings) {
        if let Ok(url) = std::env::var("AUTHORIZED_FHIR_URL") {
            fhir_settings.authorized_fhir_url = url;
        }
        if let Ok(client_id) = std::env::var("FHIR_CLIENT_ID") {
            fhir_settings.client_id = client_id;
        }
        if let Ok(redirect_url) = std::env::var("FHIR_REDIRECT_URL") {
            fhir_settings.redirect_url = redirect_url;
        }
        if let Ok(scopes) = std::env::var("FHIR_SCOPES") {
            let scopes = parse_scopes(&scopes);
            if !scopes.is_empty() {
                fhir_settings.scopes = scopes;
            }
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(value_str) = std::env::var("SESSION_DURATION_MINUTES") {
            if let Ok(value) = value_str.parse::<u64>() {
                session_settings.duration_minutes = value;
            }
        }
        if let Ok(secret) = std::env::var("STATE_SECRET") {
            if !secret.is_empty() {
                session_settings.state_secret = Some(secret);
            }
        }
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Initialise `env_logger` once; later calls are no-ops
    fn initialize_logging(logging: &LoggingSettings) {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(logging.level.as_str()),
        )
        .try_init();
    }

    /// Check that the settings describe a usable deployment
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or invalid value
    pub fn validate(&self) -> Result<()> {
        if self.fhir.authorized_fhir_url.is_empty() {
            bail!("authorized FHIR URL must be provided");
        }
        if self.fhir.client_id.is_empty() {
            bail!("FHIR client id must be provided");
        }
        if self.fhir.redirect_url.is_empty() {
            bail!("FHIR redirect URL must be provided");
        }
        if self.session.duration_minutes == 0 {
            bail!("session duration must be at least one minute");
        }
        Ok(())
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Session lifetime, saturating on absurdly large values
    #[must_use]
    pub fn session_duration(&self) -> chrono::Duration {
        let minutes = i64::try_from(self.session.duration_minutes).unwrap_or(i64::MAX);
        chrono::Duration::try_minutes(minutes).unwrap_or(chrono::Duration::MAX)
    }
}

/// Split a comma or whitespace separated scope list, keeping order
#[must_use]
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
