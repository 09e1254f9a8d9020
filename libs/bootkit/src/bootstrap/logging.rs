//! Logging initialization for the host process.
//!
//! Levels come from the logging config: the "default" section is the
//! catch-all, any other key is a per-target override. Console output goes
//! to stderr through a non-blocking writer; the default section may add a
//! JSON file sink. `RUST_LOG`, when set, acts as a global upper bound.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Keep guards for the non-blocking writers so they are not dropped.
static CONSOLE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

// ================= Custom serde module for optional Level (supports "off") =================
mod optional_level_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::Level;

    #[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(level: &Option<Level>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match level {
            Some(l) => serializer.serialize_str(l.as_str()),
            None => serializer.serialize_str("off"),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Level>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "trace" => Ok(Some(Level::TRACE)),
            "debug" => Ok(Some(Level::DEBUG)),
            "info" => Ok(Some(Level::INFO)),
            "warn" => Ok(Some(Level::WARN)),
            "error" => Ok(Some(Level::ERROR)),
            "off" | "none" => Ok(None),
            _ => Err(serde::de::Error::custom(format!("invalid level: {s}"))),
        }
    }

    #[allow(clippy::unnecessary_wraps)]
    pub fn default() -> Option<Level> {
        Some(Level::INFO)
    }
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    #[serde(
        default = "optional_level_serde::default",
        with = "optional_level_serde"
    )]
    pub console_level: Option<Level>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(
        default = "optional_level_serde::default",
        with = "optional_level_serde"
    )]
    pub file_level: Option<Level>,
}

impl Section {
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref().filter(|s| !s.is_empty())
    }
}

/// Create a default logging configuration.
#[must_use]
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_owned(),
        Section {
            console_level: Some(Level::INFO),
            file: Some("logs/voicemenu.log".to_owned()),
            file_level: Some(Level::DEBUG),
        },
    );
    logging
}

fn build_console_targets(
    default_section: Option<&Section>,
    crate_sections: &[(&String, &Section)],
) -> Targets {
    let default_level = default_section
        .and_then(|s| s.console_level)
        .map_or(LevelFilter::INFO, LevelFilter::from_level);

    let mut targets = Targets::new().with_default(default_level);
    for (name, section) in crate_sections {
        if let Some(level) = section.console_level.map(LevelFilter::from_level) {
            targets = targets.with_target((*name).clone(), level);
        }
    }
    targets
}

fn build_file_targets(
    default_section: Option<&Section>,
    crate_sections: &[(&String, &Section)],
    has_file: bool,
) -> Targets {
    let default_level = if has_file {
        default_section
            .and_then(|s| s.file_level)
            .map_or(LevelFilter::INFO, LevelFilter::from_level)
    } else {
        LevelFilter::OFF
    };

    let mut targets = Targets::new().with_default(default_level);
    for (name, section) in crate_sections {
        if let Some(level) = section.file_level.map(LevelFilter::from_level) {
            targets = targets.with_target((*name).clone(), level);
        }
    }
    targets
}

fn create_file_writer(
    section: &Section,
    base_dir: &Path,
) -> Option<tracing_appender::non_blocking::NonBlocking> {
    let file = section.file()?;

    let p = Path::new(file);
    let log_path = if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    };

    let parent = log_path.parent().unwrap_or_else(|| Path::new("."));
    if let Err(e) = std::fs::create_dir_all(parent) {
        eprintln!(
            "Failed to create log directory '{}': {e}",
            parent.display()
        );
        return None;
    }

    let file_name = log_path.file_name()?;
    let appender = tracing_appender::rolling::never(parent, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    _ = FILE_GUARD.set(guard);
    Some(writer)
}

fn stderr_supports_ansi() -> bool {
    std::io::stderr().is_terminal()
}

/// Install the global subscriber. Safe to call more than once; later calls
/// keep the first subscriber.
pub fn init_logging(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` -> `tracing` *before* installing the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer init skipped: {e}");
    }

    let default_section = cfg.get("default");
    let crate_sections: Vec<(&String, &Section)> =
        cfg.iter().filter(|(k, _)| k.as_str() != "default").collect();

    let console_targets = build_console_targets(default_section, &crate_sections);
    let file_writer = default_section.and_then(|s| create_file_writer(s, base_dir));
    let file_targets = build_file_targets(default_section, &crate_sections, file_writer.is_some());

    // RUST_LOG acts as a global upper-bound if present; otherwise the
    // config targets drive levels.
    let env: Option<EnvFilter> = EnvFilter::try_from_default_env().ok();

    let (nb_stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    _ = CONSOLE_GUARD.set(guard);

    let console_layer = fmt::layer()
        .with_writer(nb_stderr)
        .with_ansi(stderr_supports_ansi())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets);

    let file_layer_opt = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(writer)
            .with_filter(file_targets)
    });

    let subscriber = Registry::default()
        .with(env)
        .with(console_layer)
        .with(file_layer_opt);

    _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_levels_parse_including_off() {
        let section: Section = serde_json::from_str(
            r#"{"console_level": "debug", "file": "logs/app.log", "file_level": "off"}"#,
        )
        .unwrap();

        assert_eq!(section.console_level, Some(Level::DEBUG));
        assert_eq!(section.file(), Some("logs/app.log"));
        assert_eq!(section.file_level, None);
    }

    #[test]
    fn invalid_level_is_rejected() {
        let result: Result<Section, _> =
            serde_json::from_str(r#"{"console_level": "loudest"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_file_means_no_file_sink() {
        let section: Section =
            serde_json::from_str(r#"{"console_level": "info", "file": ""}"#).unwrap();
        assert_eq!(section.file(), None);
    }

    #[test]
    fn default_config_has_catch_all_section() {
        let cfg = default_logging_config();
        let default = &cfg["default"];
        assert_eq!(default.console_level, Some(Level::INFO));
        assert_eq!(default.file(), Some("logs/voicemenu.log"));
    }
}
