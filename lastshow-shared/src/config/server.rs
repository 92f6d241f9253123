use serde::{Deserialize, Serialize};
use std::{env, fmt, fs, path::PathBuf, str::FromStr};
use thiserror::Error;
use url::Url;

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported configuration format '{0}'. Use 'yaml' or 'json'.")]
    UnsupportedFormat(String),
    #[error("Invalid {name} value '{value}': {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Deployment profile; selects defaults such as the cookie `Secure` flag.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Dev,
    Test,
    Prod,
}

impl FromStr for Profile {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err("expected one of dev, test, prod"),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Prod => "prod",
        })
    }
}

/// Output format of the tracing subscriber.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err("expected text or json"),
        }
    }
}

/// `SameSite` attribute applied to the session cookie.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CookieSameSite {
    #[default]
    Lax,
    Strict,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the HTTP listener.
    pub port: u16,
    /// Header carrying the per-request correlation id.
    pub request_id_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            request_id_header: "x-request-id".to_string(),
        }
    }
}

/// Location of the remote obituary/auth API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Url,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8000/").expect("static URL is valid"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie holding the upstream bearer token.
    pub cookie_name: String,
    /// Cookie lifetime; matches the upstream token validity.
    pub max_age_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "access_token".to_string(),
            max_age_seconds: 30 * 60,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CookieConfig {
    /// Explicit `Secure` flag; when unset the profile decides.
    pub secure: Option<bool>,
    pub same_site: CookieSameSite,
    pub domain: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SecurityConfig {
    pub cookie: CookieConfig,
}

/// Paths the route guard knows about.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RoutesConfig {
    pub landing: String,
    pub login: String,
    pub register: String,
    pub dashboard: String,
    /// Form action that clears the session.
    pub logout: String,
    /// Prefixes the guard never inspects (assets, probes, metrics).
    pub bypass_prefixes: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            landing: "/".to_string(),
            login: "/login".to_string(),
            register: "/register".to_string(),
            dashboard: "/dashboard".to_string(),
            logout: "/logout".to_string(),
            bypass_prefixes: [
                "/static/",
                "/assets/",
                "/favicon.ico",
                "/healthz",
                "/readyz",
                "/metrics",
                "/openapi.json",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WebConfig {
    /// Directory holding the built presentation assets.
    pub static_dir: PathBuf,
    /// Document served for client-side routes.
    pub spa_index: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("web/dist"),
            spa_index: PathBuf::from("web/dist/index.html"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// The main configuration structure for the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub profile: Profile,
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
    pub routes: RoutesConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_for_profile(Profile::Dev)
    }
}

impl Config {
    /// Defaults for the given profile.
    #[must_use]
    pub fn default_for_profile(profile: Profile) -> Self {
        let logging = match profile {
            Profile::Dev => LoggingConfig::default(),
            Profile::Test => LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Text,
            },
            Profile::Prod => LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
            },
        };

        Self {
            profile,
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            security: SecurityConfig::default(),
            routes: RoutesConfig::default(),
            web: WebConfig::default(),
            logging,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// File values win over environment variables, which only fill in values
    /// still at their defaults. `port_override` wins over everything.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, an
    /// environment variable is malformed, or the result fails validation.
    pub fn load_config(
        config_path: Option<PathBuf>,
        port_override: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let env_profile = read_env("LASTSHOW_PROFILE")
            .map(|value| {
                value.parse::<Profile>().map_err(|reason| ConfigError::InvalidEnv {
                    name: "LASTSHOW_PROFILE",
                    value,
                    reason,
                })
            })
            .transpose()?;

        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default_for_profile(env_profile.unwrap_or_default()),
        };

        if let Some(profile) = env_profile {
            if config.profile == Profile::default() {
                config.profile = profile;
            }
        }

        config.apply_env_overrides()?;

        if let Some(port) = port_override {
            config.server.port = port;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let defaults = Self::default_for_profile(self.profile);

        if self.server.port == defaults.server.port {
            if let Some(port) = read_env("LASTSHOW_SERVER_PORT") {
                self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                    name: "LASTSHOW_SERVER_PORT",
                    value: port,
                    reason: "must be a valid number between 1 and 65535",
                })?;
            }
        }

        if self.api.base_url == defaults.api.base_url {
            if let Some(raw) = read_env("LASTSHOW_API_URL") {
                self.api.base_url = Url::parse(&raw).map_err(|_| ConfigError::InvalidEnv {
                    name: "LASTSHOW_API_URL",
                    value: raw,
                    reason: "must be an absolute URL",
                })?;
            }
        }

        if self.logging.level == defaults.logging.level {
            if let Some(level) = read_env("LASTSHOW_LOG_LEVEL") {
                self.logging.level = level;
            }
        }

        if self.logging.format == defaults.logging.format {
            if let Some(format) = read_env("LASTSHOW_LOG_FORMAT") {
                self.logging.format =
                    format.parse().map_err(|reason| ConfigError::InvalidEnv {
                        name: "LASTSHOW_LOG_FORMAT",
                        value: format,
                        reason,
                    })?;
            }
        }

        if self.web.static_dir == defaults.web.static_dir {
            if let Some(dir) = read_env("LASTSHOW_STATIC_DIR") {
                let dir = PathBuf::from(dir);
                self.web.spa_index = dir.join("index.html");
                self.web.static_dir = dir;
            }
        }

        if self.security.cookie.secure.is_none() {
            if let Some(raw) = read_env("LASTSHOW_COOKIE_SECURE") {
                self.security.cookie.secure =
                    Some(raw.parse().map_err(|_| ConfigError::InvalidEnv {
                        name: "LASTSHOW_COOKIE_SECURE",
                        value: raw,
                        reason: "must be true or false",
                    })?);
            }
        }

        Ok(())
    }

    /// Whether the session cookie carries the `Secure` attribute.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.security
            .cookie
            .secure
            .unwrap_or(self.profile == Profile::Prod)
    }

    /// Validate the configuration, collecting every problem found.
    ///
    /// # Errors
    /// Returns the list of validation messages when any check fails.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("Invalid server port. Must be greater than 0.".to_string());
        }

        if !matches!(self.api.base_url.scheme(), "http" | "https") {
            errors.push(format!(
                "API base URL must use http or https: {}",
                self.api.base_url
            ));
        }

        if self.session.cookie_name.trim().is_empty() {
            errors.push("Session cookie name must not be empty.".to_string());
        }

        if self.session.max_age_seconds == 0 {
            errors.push("Session max age must be greater than 0.".to_string());
        }

        for (label, path) in [
            ("landing", &self.routes.landing),
            ("login", &self.routes.login),
            ("register", &self.routes.register),
            ("dashboard", &self.routes.dashboard),
            ("logout", &self.routes.logout),
        ] {
            if !path.starts_with('/') {
                errors.push(format!("Route '{label}' must start with '/': {path}"));
            }
        }

        if self.routes.dashboard == self.routes.login
            || self.routes.dashboard == self.routes.register
        {
            errors.push("Dashboard route must differ from the login and register routes.".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 7] = [
        "LASTSHOW_PROFILE",
        "LASTSHOW_SERVER_PORT",
        "LASTSHOW_API_URL",
        "LASTSHOW_LOG_LEVEL",
        "LASTSHOW_LOG_FORMAT",
        "LASTSHOW_STATIC_DIR",
        "LASTSHOW_COOKIE_SECURE",
    ];

    fn cleanup_env_vars() {
        for name in ENV_VARS {
            unsafe {
                std::env::remove_var(name);
            }
        }
    }

    #[test]
    fn test_config_with_defaults() {
        let config = Config::default();

        assert_eq!(config.profile, Profile::Dev);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.api.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.session.cookie_name, "access_token");
        assert_eq!(config.session.max_age_seconds, 1800);
        assert_eq!(config.security.cookie.same_site, CookieSameSite::Lax);
        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.routes.dashboard, "/dashboard");
        assert_eq!(config.routes.logout, "/logout");
        assert!(!config.cookie_secure());
    }

    #[test]
    fn prod_profile_defaults_to_secure_cookies_and_json_logs() {
        let config = Config::default_for_profile(Profile::Prod);
        assert!(config.cookie_secure());
        assert_eq!(config.logging.format, LogFormat::Json);

        let mut overridden = config;
        overridden.security.cookie.secure = Some(false);
        assert!(!overridden.cookie_secure());
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        cleanup_env_vars();
        let config = Config::load_config(None, None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_config_with_environment_variables() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("LASTSHOW_PROFILE", "production");
            std::env::set_var("LASTSHOW_SERVER_PORT", "9090");
            std::env::set_var("LASTSHOW_API_URL", "https://api.example.com/v2/");
            std::env::set_var("LASTSHOW_LOG_LEVEL", "debug");
            std::env::set_var("LASTSHOW_STATIC_DIR", "/srv/web");
        }

        let config = Config::load_config(None, None).unwrap();

        assert_eq!(config.profile, Profile::Prod);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.api.base_url.as_str(), "https://api.example.com/v2/");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.web.static_dir, PathBuf::from("/srv/web"));
        assert_eq!(config.web.spa_index, PathBuf::from("/srv/web/index.html"));
        assert!(config.cookie_secure());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_load_config_port_override_precedence() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("LASTSHOW_SERVER_PORT", "5555");
        }

        let config = Config::load_config(None, Some(7777)).unwrap();
        assert_eq!(config.server.port, 7777);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_load_config_invalid_port_environment() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("LASTSHOW_SERVER_PORT", "invalid_port");
        }

        let error = Config::load_config(None, None).unwrap_err();
        assert!(error.to_string().contains("Invalid LASTSHOW_SERVER_PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_load_config_zero_port_validation() {
        cleanup_env_vars();
        let error = Config::load_config(None, Some(0)).unwrap_err();
        assert!(error.to_string().contains("Invalid server port"));
    }

    #[test]
    #[serial]
    fn test_load_config_from_yaml_file() -> Result<(), Box<dyn std::error::Error>> {
        cleanup_env_vars();
        let temp_dir = TempDir::new()?;
        let config_file = temp_dir.path().join("gateway.yaml");

        fs::write(
            &config_file,
            r#"
profile: test
server:
  port: 4000
api:
  base_url: "http://api.internal:8000/"
session:
  max_age_seconds: 600
security:
  cookie:
    secure: true
    same_site: strict
"#,
        )?;

        let config = Config::load_config(Some(config_file), None)?;

        assert_eq!(config.profile, Profile::Test);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.api.base_url.as_str(), "http://api.internal:8000/");
        assert_eq!(config.session.max_age_seconds, 600);
        assert_eq!(config.session.cookie_name, "access_token");
        assert_eq!(config.security.cookie.same_site, CookieSameSite::Strict);
        assert!(config.cookie_secure());
        assert_eq!(config.routes, RoutesConfig::default());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_load_config_from_json_file() -> Result<(), Box<dyn std::error::Error>> {
        cleanup_env_vars();
        let temp_dir = TempDir::new()?;
        let config_file = temp_dir.path().join("gateway.json");

        fs::write(
            &config_file,
            r#"{ "server": { "port": 5000 }, "logging": { "level": "warn", "format": "json" } }"#,
        )?;

        let config = Config::load_config(Some(config_file), None)?;

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Json);
        Ok(())
    }

    #[test]
    #[serial]
    fn test_environment_variable_precedence() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("priority.yaml");
        fs::write(
            &config_file,
            "server:\n  port: 1111\nlogging:\n  level: error\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var("LASTSHOW_SERVER_PORT", "2222");
            std::env::set_var("LASTSHOW_LOG_LEVEL", "trace");
            std::env::set_var("LASTSHOW_API_URL", "http://env-api:9000/");
        }

        let config = Config::load_config(Some(config_file), None).unwrap();

        assert_eq!(config.server.port, 1111);
        assert_eq!(config.logging.level, "error");
        assert_eq!(config.api.base_url.as_str(), "http://env-api:9000/");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_load_config_unsupported_format() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("gateway.toml");
        fs::write(&config_file, "port = 6000").unwrap();

        let error = Config::load_config(Some(config_file), None).unwrap_err();
        assert!(error.to_string().contains("Unsupported configuration format"));
    }

    #[test]
    #[serial]
    fn test_load_config_nonexistent_file() {
        cleanup_env_vars();
        let result = Config::load_config(Some(PathBuf::from("/nonexistent/gateway.yaml")), None);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    #[serial]
    fn test_load_config_malformed_yaml() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("bad.yaml");
        fs::write(&config_file, "server: [invalid yaml structure").unwrap();

        assert!(Config::load_config(Some(config_file), None).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_routes_and_session() {
        let mut config = Config::default();
        config.routes.login = "login".to_string();
        config.routes.dashboard = "/register".to_string();
        config.routes.logout = "sign-out".to_string();
        config.session.max_age_seconds = 0;

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Route 'login'")));
        assert!(errors.iter().any(|e| e.contains("Route 'logout'")));
        assert!(errors.iter().any(|e| e.contains("Dashboard route")));
        assert!(errors.iter().any(|e| e.contains("Session max age")));
    }

    #[test]
    fn test_validate_rejects_non_http_api_url() {
        let mut config = Config::default();
        config.api.base_url = Url::parse("ftp://files.example.com/").unwrap();

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("http or https")));
    }

    #[test]
    fn test_config_serialization_round_trips_through_yaml() {
        let config = Config::default_for_profile(Profile::Prod);
        let yaml = serde_yml::to_string(&config).unwrap();
        let parsed: Config = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
