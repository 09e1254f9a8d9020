//! Process-wide platform defaults, applied once before launch.
//!
//! The seeder is the Rust shape of the original property block: reserved
//! media port bounds for downstream transport modules, configuration and
//! home directory locations, the read-only-configuration flag, and the
//! disable list for unavailable platform audio backends. Seeding is pure
//! side-effecting setup with no ordering dependency on the launcher beyond
//! "runs first"; modules read the values through [`current`].

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::SeedError;

#[derive(Debug, Clone)]
pub struct PlatformDefaults {
    /// Lowest port downstream media transports may bind.
    pub media_port_min: u16,
    /// Highest port downstream media transports may bind.
    pub media_port_max: u16,
    /// Base path configuration-backed modules resolve persisted settings from.
    pub config_dir: PathBuf,
    /// Home directory of the host installation.
    pub home_dir: PathBuf,
    /// When set, configuration-backed modules must not persist writes.
    pub read_only_config: bool,
    /// Platform audio backends the container must not activate.
    pub disabled_audio_backends: Vec<String>,
}

impl Default for PlatformDefaults {
    fn default() -> Self {
        Self {
            media_port_min: 10_000,
            media_port_max: 20_000,
            config_dir: PathBuf::from("./config"),
            home_dir: PathBuf::from("./home"),
            read_only_config: true,
            disabled_audio_backends: vec![
                "coreaudio".to_owned(),
                "pulseaudio".to_owned(),
                "portaudio".to_owned(),
            ],
        }
    }
}

impl PlatformDefaults {
    /// # Errors
    /// Returns `SeedError::InvalidPortRange` when the media port bounds are
    /// inverted or empty.
    pub fn validate(&self) -> Result<(), SeedError> {
        if self.media_port_min >= self.media_port_max {
            return Err(SeedError::InvalidPortRange {
                min: self.media_port_min,
                max: self.media_port_max,
            });
        }
        Ok(())
    }
}

static SEEDED: OnceLock<PlatformDefaults> = OnceLock::new();

/// Apply the defaults process-wide. Set-once: a second seed keeps the first
/// values and only logs a warning.
pub fn seed(defaults: PlatformDefaults) -> &'static PlatformDefaults {
    let mut fresh = false;
    let seeded = SEEDED.get_or_init(|| {
        fresh = true;
        defaults
    });
    if fresh {
        tracing::info!(
            media_port_min = seeded.media_port_min,
            media_port_max = seeded.media_port_max,
            config_dir = %seeded.config_dir.display(),
            home_dir = %seeded.home_dir.display(),
            read_only_config = seeded.read_only_config,
            disabled_audio = ?seeded.disabled_audio_backends,
            "Seeded process defaults"
        );
    } else {
        tracing::warn!("Process defaults already seeded; keeping the first values");
    }
    seeded
}

/// The seeded defaults, if any.
#[must_use]
pub fn current() -> Option<&'static PlatformDefaults> {
    SEEDED.get()
}

/// The seeded defaults, or the built-in fallback when nothing was seeded.
#[must_use]
pub fn current_or_default() -> PlatformDefaults {
    SEEDED.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_inverted_port_range() {
        let defaults = PlatformDefaults {
            media_port_min: 20_000,
            media_port_max: 10_000,
            ..PlatformDefaults::default()
        };

        let err = defaults.validate().unwrap_err();
        assert!(matches!(
            err,
            SeedError::InvalidPortRange {
                min: 20_000,
                max: 10_000
            }
        ));
        assert!(PlatformDefaults::default().validate().is_ok());
    }

    #[test]
    fn seed_is_set_once_per_process() {
        let first = PlatformDefaults {
            media_port_min: 30_000,
            media_port_max: 31_000,
            ..PlatformDefaults::default()
        };
        let seeded = seed(first);
        assert_eq!(seeded.media_port_min, 30_000);

        // A second seed keeps the first values.
        let again = seed(PlatformDefaults::default());
        assert_eq!(again.media_port_min, 30_000);
        assert_eq!(current().unwrap().media_port_max, 31_000);
        assert_eq!(current_or_default().media_port_max, 31_000);
    }
}
