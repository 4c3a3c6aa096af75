//! Configuration loading.
//!
//! [`ConfigLoader`] builds the final [`CompositorConfig`] in three passes:
//!
//! 1. The system file (`/etc/ivi-layermanager/config.toml`, or the path in
//!    `IVI_LM_SYSTEM_CONFIG`) and the file given on the command line are read.
//!    Missing files are not an error. Both are parsed as TOML values and merged
//!    recursively, the user file taking precedence.
//! 2. Environment overrides (`IVI_LM_*`) are applied on top.
//! 3. The result is validated.
//!
//! Command line flags are applied by the binary after this returns.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use toml::Value;

use crate::config::CompositorConfig;
use crate::error::{ConfigError, CoreError};

/// Default location of the system-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/ivi-layermanager/config.toml";

/// Environment variable overriding [`SYSTEM_CONFIG_PATH`].
pub const ENV_SYSTEM_CONFIG: &str = "IVI_LM_SYSTEM_CONFIG";
pub const ENV_DISPLAY_WIDTH: &str = "IVI_LM_DISPLAY_WIDTH";
pub const ENV_DISPLAY_HEIGHT: &str = "IVI_LM_DISPLAY_HEIGHT";
pub const ENV_DISPLAY_NAME: &str = "IVI_LM_DISPLAY_NAME";
pub const ENV_PLUGIN_PATH: &str = "IVI_LM_PLUGIN_PATH";
pub const ENV_LOG_LEVEL: &str = "IVI_LM_LOG_LEVEL";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["text", "json"];

/// `ConfigLoader` provides static methods to load and validate [`CompositorConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the configuration from the system file, `user_path` and the
    /// process environment.
    pub fn load(user_path: Option<&Path>) -> Result<CompositorConfig, CoreError> {
        let system_path = std::env::var_os(ENV_SYSTEM_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SYSTEM_CONFIG_PATH));
        Self::load_with(&system_path, user_path, |key| std::env::var(key).ok())
    }

    /// Same as [`ConfigLoader::load`] but with an explicit system path and
    /// environment lookup, so callers (and tests) control every input.
    pub fn load_with<F>(
        system_path: &Path,
        user_path: Option<&Path>,
        env: F,
    ) -> Result<CompositorConfig, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let system_value = Self::read_toml_value(system_path)?;
        let user_value = match user_path {
            Some(path) => Self::read_toml_value(path)?,
            None => None,
        };

        let mut config: CompositorConfig = match Self::merge_toml_values(system_value, user_value) {
            Some(value) => value.try_into().map_err(ConfigError::ParseError)?,
            None => CompositorConfig::default(),
        };

        Self::apply_env_overrides(&mut config, env)?;
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    fn read_toml_value(path: &Path) -> Result<Option<Value>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content.parse::<Value>()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::ReadError { path: path.to_path_buf(), source: e }),
        }
    }

    /// Merges two optional TOML values. `override_val` takes precedence.
    fn merge_toml_values(base: Option<Value>, override_val: Option<Value>) -> Option<Value> {
        match (base, override_val) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(Value::Table(mut base_table)), Some(Value::Table(override_table))) => {
                Self::merge_toml_tables(&mut base_table, &override_table);
                Some(Value::Table(base_table))
            }
            (_, Some(o)) => Some(o),
        }
    }

    /// Recursively merges `override_table` into `base_table`.
    fn merge_toml_tables(
        base_table: &mut toml::map::Map<String, Value>,
        override_table: &toml::map::Map<String, Value>,
    ) {
        for (key, override_item) in override_table {
            match base_table.get_mut(key) {
                Some(base_item) => {
                    if let (Value::Table(bt), Value::Table(ot)) = (&mut *base_item, override_item) {
                        Self::merge_toml_tables(bt, ot);
                    } else {
                        *base_item = override_item.clone();
                    }
                }
                None => {
                    base_table.insert(key.clone(), override_item.clone());
                }
            }
        }
    }

    fn apply_env_overrides<F>(config: &mut CompositorConfig, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u32 = |variable: &str, value: String| {
            value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvironment {
                variable: variable.to_string(),
                value,
            })
        };

        if let Some(value) = env(ENV_DISPLAY_WIDTH) {
            config.display.width = parse_u32(ENV_DISPLAY_WIDTH, value)?;
        }
        if let Some(value) = env(ENV_DISPLAY_HEIGHT) {
            config.display.height = parse_u32(ENV_DISPLAY_HEIGHT, value)?;
        }
        if let Some(value) = env(ENV_DISPLAY_NAME) {
            config.display.name = value;
        }
        if let Some(value) = env(ENV_PLUGIN_PATH) {
            config.plugins.directory = Some(PathBuf::from(value));
        }
        if let Some(value) = env(ENV_LOG_LEVEL) {
            config.logging.level = value;
        }
        Ok(())
    }

    /// Validates and normalizes a configuration.
    ///
    /// Log level and format are lower-cased; the display must have a non-zero
    /// size and every seeded layer an opacity in `[0.0, 1.0]`.
    pub fn validate_config(config: &mut CompositorConfig) -> Result<(), ConfigError> {
        config.logging.level = config.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Must be one of: {}",
                config.logging.level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        config.logging.format = config.logging.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log format '{}'. Must be one of: {}",
                config.logging.format,
                VALID_LOG_FORMATS.join(", ")
            )));
        }

        if config.display.width == 0 || config.display.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "Display size {}x{} must be non-zero",
                config.display.width, config.display.height
            )));
        }

        if config.health.watchdog_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "health.watchdog_interval_ms must be non-zero".to_string(),
            ));
        }

        for seed in &config.scene.layers {
            if !(0.0..=1.0).contains(&seed.opacity) {
                return Err(ConfigError::ValidationError(format!(
                    "Layer {} has opacity {} outside [0.0, 1.0]",
                    seed.id, seed.opacity
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_load_without_any_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_with(&dir.path().join("missing.toml"), None, no_env).unwrap();
        assert_eq!(config, CompositorConfig::default());
    }

    #[test]
    fn test_user_file_overrides_system_file() {
        let dir = TempDir::new().unwrap();
        let system = write_file(
            &dir,
            "system.toml",
            "[display]\nwidth = 1920\nheight = 720\nname = \"wayland-0\"\n",
        );
        let user = write_file(&dir, "user.toml", "[display]\nwidth = 800\n");

        let config = ConfigLoader::load_with(&system, Some(&user), no_env).unwrap();
        assert_eq!(config.display.width, 800);
        assert_eq!(config.display.height, 720);
        assert_eq!(config.display.name, "wayland-0");
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        let user = write_file(&dir, "user.toml", "[logging]\nlevel = \"warn\"\n");
        let env: HashMap<&str, &str> = [
            (ENV_DISPLAY_HEIGHT, "600"),
            (ENV_PLUGIN_PATH, "/usr/lib/ivi/plugins"),
            (ENV_LOG_LEVEL, "DEBUG"),
        ]
        .into_iter()
        .collect();

        let config = ConfigLoader::load_with(&dir.path().join("none.toml"), Some(&user), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.display.height, 600);
        assert_eq!(config.plugins.directory, Some(PathBuf::from("/usr/lib/ivi/plugins")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_env_number_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = ConfigLoader::load_with(&dir.path().join("none.toml"), None, |k| {
            (k == ENV_DISPLAY_WIDTH).then(|| "wide".to_string())
        });
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::InvalidEnvironment { .. }))
        ));
    }

    #[test]
    fn test_unparsable_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let user = write_file(&dir, "user.toml", "[display\nwidth = ");
        let result = ConfigLoader::load_with(&dir.path().join("none.toml"), Some(&user), no_env);
        assert!(matches!(result, Err(CoreError::Config(ConfigError::ParseError(_)))));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = TempDir::new().unwrap();
        let user = write_file(&dir, "user.toml", "[display]\ndepth = 32\n");
        let result = ConfigLoader::load_with(&dir.path().join("none.toml"), Some(&user), no_env);
        assert!(matches!(result, Err(CoreError::Config(ConfigError::ParseError(_)))));
    }

    #[rstest]
    #[case("[logging]\nlevel = \"verbose\"\n")]
    #[case("[logging]\nformat = \"xml\"\n")]
    #[case("[display]\nwidth = 0\n")]
    #[case("[health]\nwatchdog_interval_ms = 0\n")]
    #[case("[[scene.layers]]\nid = 1\nwidth = 10\nheight = 10\nopacity = 1.5\n")]
    fn test_validation_failures(#[case] content: &str) {
        let dir = TempDir::new().unwrap();
        let user = write_file(&dir, "user.toml", content);
        let result = ConfigLoader::load_with(&dir.path().join("none.toml"), Some(&user), no_env);
        assert!(
            matches!(result, Err(CoreError::Config(ConfigError::ValidationError(_)))),
            "expected validation error for {:?}, got {:?}",
            content,
            result
        );
    }

    #[test]
    fn test_scene_tables_are_merged_from_user_file() {
        let dir = TempDir::new().unwrap();
        let user = write_file(
            &dir,
            "user.toml",
            "[[scene.layers]]\nid = 1000\nwidth = 800\nheight = 480\nvisible = false\n",
        );
        let config = ConfigLoader::load_with(&dir.path().join("none.toml"), Some(&user), no_env).unwrap();
        assert_eq!(config.scene.layers.len(), 1);
        assert!(!config.scene.layers[0].visible);
        assert_eq!(config.scene.layers[0].screen, 0);
    }
}
