use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// Configuration for the form editor.
///
/// Structural rules (which types may own children, the nesting limit) are
/// fixed; this only holds the tunables of the editing experience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// How long a palette drag must hover over a field before dropping
    /// creates a child of that field.
    hover_arm_delay: Duration,

    /// Whether newly created fields get placeholder labels and options.
    pub seed_new_fields: bool,

    /// Whether to check the hierarchy for integrity problems whenever the
    /// field set is replaced wholesale.
    pub check_integrity_on_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hover_arm_delay: Duration::from_millis(default_hover_arm_delay_ms()),
            seed_new_fields: true,
            check_integrity_on_load: true,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The hover delay before a palette drag arms child creation.
    #[must_use]
    pub const fn hover_arm_delay(&self) -> Duration {
        self.hover_arm_delay
    }

    /// Sets the hover delay. A zero delay arms on the first hover callback.
    pub const fn set_hover_arm_delay(&mut self, delay: Duration) {
        self.hover_arm_delay = delay;
    }
}

const fn default_hover_arm_delay_ms() -> u64 {
    2000
}

const fn default_true() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// Hover delay in milliseconds.
        #[serde(default = "default_hover_arm_delay_ms")]
        hover_arm_delay_ms: u64,

        #[serde(default = "default_true")]
        seed_new_fields: bool,

        #[serde(default = "default_true")]
        check_integrity_on_load: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                hover_arm_delay_ms,
                seed_new_fields,
                check_integrity_on_load,
            } => Self {
                hover_arm_delay: Duration::from_millis(hover_arm_delay_ms),
                seed_new_fields,
                check_integrity_on_load,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        let Config {
            hover_arm_delay,
            seed_new_fields,
            check_integrity_on_load,
        } = config;

        Self::V1 {
            hover_arm_delay_ms: u64::try_from(hover_arm_delay.as_millis()).unwrap_or(u64::MAX),
            seed_new_fields,
            check_integrity_on_load,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nhover_arm_delay_ms = 1500\nseed_new_fields = false\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.hover_arm_delay(), Duration::from_millis(1500));
        assert!(!config.seed_new_fields);
        assert!(config.check_integrity_on_load);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nhover_arm_delay_ms = \"soon\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("formctl.toml");
        let mut config = Config::default();
        config.set_hover_arm_delay(Duration::from_millis(750));
        config.check_integrity_on_load = false;

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }
}
