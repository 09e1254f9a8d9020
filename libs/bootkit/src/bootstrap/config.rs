//! Host configuration
//!
//! Layered loading in the usual order: built-in defaults, then the YAML
//! file, then `VOICEMENU__`-prefixed environment variables. `server.home_dir`
//! is normalized to an absolute path (with `~` expansion) and created on
//! load; a relative `server.config_dir` resolves under the home directory.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use super::logging::{LoggingConfig, default_logging_config};
use super::paths;
use crate::container::DEFAULT_START_LEVEL;
use crate::seeder::PlatformDefaults;

// ================= Custom serde module for humantime durations =================
mod grace_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Main application configuration with strongly-typed sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Reserved media transport port range.
    #[serde(default)]
    pub media: MediaConfig,
    /// Platform feature toggles seeded process-wide before launch.
    #[serde(default)]
    pub platform: PlatformToggles,
    /// Module set loaded at launch.
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Logging configuration
    #[serde(default = "default_logging_config")]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            media: MediaConfig::default(),
            platform: PlatformToggles::default(),
            modules: ModulesConfig::default(),
            logging: default_logging_config(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub home_dir: PathBuf, // will be normalized to absolute path
    /// Directory configuration-backed modules resolve persisted settings
    /// from; relative paths resolve under `home_dir`.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Bounded wait for asynchronous module teardown on shutdown.
    #[serde(default = "default_grace_window", with = "grace_serde")]
    pub grace_window: Duration,
    /// Framework start level the container activates up to.
    #[serde(default = "default_start_level")]
    pub start_level: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: paths::default_home_dir().join(".voicemenu"),
            config_dir: default_config_dir(),
            grace_window: default_grace_window(),
            start_level: default_start_level(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_grace_window() -> Duration {
    Duration::from_secs(3)
}

fn default_start_level() -> u32 {
    DEFAULT_START_LEVEL
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    #[serde(default = "default_media_min_port")]
    pub min_port: u16,
    #[serde(default = "default_media_max_port")]
    pub max_port: u16,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            min_port: default_media_min_port(),
            max_port: default_media_max_port(),
        }
    }
}

fn default_media_min_port() -> u16 {
    10_000
}

fn default_media_max_port() -> u16 {
    20_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformToggles {
    /// Instructs configuration-backed modules not to persist writes.
    #[serde(default = "default_read_only_config")]
    pub read_only_config: bool,
    /// Platform audio backends that must not be activated.
    #[serde(default = "default_disabled_audio_backends")]
    pub disabled_audio_backends: Vec<String>,
}

impl Default for PlatformToggles {
    fn default() -> Self {
        Self {
            read_only_config: default_read_only_config(),
            disabled_audio_backends: default_disabled_audio_backends(),
        }
    }
}

fn default_read_only_config() -> bool {
    true
}

fn default_disabled_audio_backends() -> Vec<String> {
    vec![
        "coreaudio".to_owned(),
        "pulseaudio".to_owned(),
        "portaudio".to_owned(),
    ]
}

/// Module name lists; empty lists mean "use the host's built-in set".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    #[serde(default)]
    pub infrastructure: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl ServerConfig {
    fn normalize_dirs_inplace(&mut self) -> Result<()> {
        self.home_dir = paths::normalize_path(
            self.home_dir
                .to_str()
                .context("home directory configuration is not a valid path")?,
        )
        .context("home_dir normalization failed")?;
        std::fs::create_dir_all(&self.home_dir).context("Failed to create home_dir")?;

        if self.config_dir.is_relative() {
            self.config_dir = self.home_dir.join(&self.config_dir);
        }
        std::fs::create_dir_all(&self.config_dir).context("Failed to create config_dir")?;

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file →
    /// environment variables. Also normalizes `server.home_dir` and
    /// `server.config_dir` into absolute paths and creates the directories.
    ///
    /// # Errors
    /// Returns an error if configuration loading or directory resolution fails.
    pub fn load_layered(config_path: &PathBuf) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Yaml},
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(config_path))
            // Example: VOICEMENU__MEDIA__MIN_PORT=12000 maps to media.min_port
            .merge(Env::prefixed("VOICEMENU__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .context("Failed to extract config from figment")?;

        config
            .server
            .normalize_dirs_inplace()
            .context("Failed to resolve server directories")?;

        Ok(config)
    }

    /// Load configuration from file or create with default values.
    ///
    /// # Errors
    /// Returns an error if configuration loading or directory resolution fails.
    pub fn load_or_default(config_path: &Option<PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            ensure!(
                path.is_file(),
                "config file does not exist: {}",
                path.to_string_lossy()
            );
            Self::load_layered(path)
        } else {
            let mut c = Self::default();
            c.server
                .normalize_dirs_inplace()
                .context("Failed to resolve server directories (defaults)")?;
            Ok(c)
        }
    }

    /// Sanity checks beyond what serde enforces.
    ///
    /// # Errors
    /// Returns an error when the configured values are inconsistent.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.media.min_port < self.media.max_port,
            "media.min_port {} must be below media.max_port {}",
            self.media.min_port,
            self.media.max_port
        );
        ensure!(self.server.start_level >= 1, "server.start_level must be >= 1");
        Ok(())
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, verbose: u8) {
        // Set logging level based on verbose flags for "default" section.
        if let Some(default_section) = self.logging.get_mut("default") {
            default_section.console_level = match verbose {
                0 => default_section.console_level, // keep
                1 => Some(Level::DEBUG),
                _ => Some(Level::TRACE),
            };
        }
    }

    /// The process-wide defaults the seeder applies before launch.
    #[must_use]
    pub fn to_platform_defaults(&self) -> PlatformDefaults {
        PlatformDefaults {
            media_port_min: self.media.min_port,
            media_port_max: self.media.max_port,
            config_dir: self.server.config_dir.clone(),
            home_dir: self.server.home_dir.clone(),
            read_only_config: self.platform.read_only_config,
            disabled_audio_backends: self.platform.disabled_audio_backends.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;
    use temp_env::with_var;

    /// Helper: a normalized dir should be absolute and not start with '~'.
    fn is_normalized_path(p: &Path) -> bool {
        p.is_absolute() && !p.starts_with("~")
    }

    #[test]
    fn test_default_config_structure() {
        let config = AppConfig::default();

        assert_eq!(config.media.min_port, 10_000);
        assert_eq!(config.media.max_port, 20_000);
        assert_eq!(config.server.grace_window, Duration::from_secs(3));
        assert_eq!(config.server.start_level, DEFAULT_START_LEVEL);
        assert!(config.platform.read_only_config);
        assert_eq!(config.platform.disabled_audio_backends.len(), 3);

        assert!(config.logging.contains_key("default"));
        assert!(config.modules.infrastructure.is_empty());
        assert!(config.modules.extensions.is_empty());
    }

    #[test]
    fn test_load_layered_normalizes_dirs() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");

        let yaml = r#"
server:
  home_dir: "~/.test_voicemenu"
  grace_window: "5s"

media:
  min_port: 11000
  max_port: 12000

logging:
  default:
    console_level: debug
"#;
        fs::write(&cfg_path, yaml).unwrap();

        with_var("HOME", Some(tmp.path().to_str().unwrap()), || {
            let config = AppConfig::load_layered(&cfg_path).unwrap();

            assert!(is_normalized_path(&config.server.home_dir));
            assert!(config.server.home_dir.ends_with(".test_voicemenu"));
            // Relative config_dir resolves under home_dir.
            assert!(config.server.config_dir.starts_with(&config.server.home_dir));
            assert!(config.server.config_dir.is_dir());

            assert_eq!(config.server.grace_window, Duration::from_secs(5));
            assert_eq!(config.media.min_port, 11_000);
            assert_eq!(
                config.logging["default"].console_level,
                Some(Level::DEBUG)
            );
        });
    }

    #[test]
    fn test_minimal_yaml_config() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        let home = tmp.path().join("minimal_home");
        let home_str = home.to_string_lossy().replace('\\', "/");

        let yaml = format!(
            r#"
server:
  home_dir: "{home_str}"
"#
        );
        fs::write(&cfg_path, yaml).unwrap();

        let config = AppConfig::load_layered(&cfg_path).unwrap();

        assert!(is_normalized_path(&config.server.home_dir));
        assert_eq!(config.media.min_port, 10_000);
        assert_eq!(config.server.grace_window, Duration::from_secs(3));
        assert!(config.modules.extensions.is_empty());
    }

    #[test]
    fn test_env_overrides_yaml() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        let home = tmp.path().join("env_home");
        let home_str = home.to_string_lossy().replace('\\', "/");

        let yaml = format!(
            r#"
server:
  home_dir: "{home_str}"

media:
  min_port: 11000
"#
        );
        fs::write(&cfg_path, yaml).unwrap();

        with_var("VOICEMENU__MEDIA__MIN_PORT", Some("12345"), || {
            let config = AppConfig::load_layered(&cfg_path).unwrap();
            assert_eq!(config.media.min_port, 12_345);
        });
    }

    #[test]
    fn test_cli_verbose_levels_matrix() {
        for (verbose_level, expected_log_level) in [
            (0, Some(Level::INFO)), // unchanged from default
            (1, Some(Level::DEBUG)),
            (2, Some(Level::TRACE)),
            (3, Some(Level::TRACE)), // cap at trace
        ] {
            let mut config = AppConfig::default();
            config.apply_cli_overrides(verbose_level);

            assert_eq!(
                config.logging["default"].console_level,
                expected_log_level
            );
        }
    }

    #[test]
    fn test_validate_rejects_inverted_port_range() {
        let mut config = AppConfig::default();
        config.media.min_port = 20_000;
        config.media.max_port = 10_000;

        assert!(config.validate().is_err());
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_platform_defaults_mirror_config() {
        let mut config = AppConfig::default();
        config.media.min_port = 15_000;
        config.platform.read_only_config = false;

        let defaults = config.to_platform_defaults();
        assert_eq!(defaults.media_port_min, 15_000);
        assert!(!defaults.read_only_config);
        assert_eq!(defaults.config_dir, config.server.config_dir);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = AppConfig::load_or_default(&Some(PathBuf::from("/definitely/not/here.yaml")))
            .unwrap_err();
        assert!(err.to_string().contains("config file does not exist"));
    }
}
