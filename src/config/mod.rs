//! Configuration management for `beans`.
//!
//! Configuration is loaded from a `.beans.yml` file found by searching
//! upward from the working directory (or named with `--config`). The data
//! directory is resolved with this precedence:
//! - `--beans-path` flag
//! - `BEANS_PATH` environment variable
//! - `beans.path` from the config file, relative to the file's directory

use std::fs;
use std::path::{Path, PathBuf};

use beans_lib::{BeansError, IdConfig, IdGenerator, Result};
use serde::{Deserialize, Serialize};

/// Name of the config file searched for.
pub const CONFIG_FILE_NAME: &str = ".beans.yml";

/// Environment variable overriding the data directory.
pub const BEANS_PATH_ENV: &str = "BEANS_PATH";

/// Default data directory name.
pub const DEFAULT_BEANS_DIR: &str = ".beans";

/// Settings of the `beans:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeansSection {
    pub path: String,
    pub prefix: String,
    pub id_length: usize,
    pub default_status: String,
    pub default_type: String,
}

impl Default for BeansSection {
    fn default() -> Self {
        Self {
            path: DEFAULT_BEANS_DIR.to_string(),
            prefix: String::new(),
            id_length: beans_lib::id::DEFAULT_ID_LENGTH,
            default_status: "open".to_string(),
            default_type: "task".to_string(),
        }
    }
}

/// Contents of `.beans.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub beans: BeansSection,
    pub statuses: Vec<String>,
    pub types: Vec<String>,
    pub priorities: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            beans: BeansSection::default(),
            statuses: to_strings(&["open", "in-progress", "done"]),
            types: to_strings(&["milestone", "epic", "feature", "bug", "task"]),
            priorities: to_strings(&["critical", "high", "normal", "low", "deferred"]),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Config {
    /// Default config with an ID prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.beans.prefix = prefix.into();
        config
    }

    /// Read and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Yaml` if it does not parse,
    /// or `Config` if the values are inconsistent.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&contents)?
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config as YAML.
    ///
    /// # Errors
    ///
    /// Returns `Yaml` or `Io` on failure.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Check that the defaults are members of their allowed sets.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.statuses.is_empty() {
            return Err(BeansError::Config("statuses cannot be empty".to_string()));
        }
        if self.beans.id_length == 0 {
            return Err(BeansError::Config(
                "beans.id_length must be at least 1".to_string(),
            ));
        }
        if self.beans.prefix.contains(beans_lib::id::SLUG_SEPARATOR) {
            return Err(BeansError::Config(format!(
                "beans.prefix '{}' cannot contain '{}'",
                self.beans.prefix,
                beans_lib::id::SLUG_SEPARATOR
            )));
        }
        if !self.statuses.contains(&self.beans.default_status) {
            return Err(BeansError::Config(format!(
                "beans.default_status '{}' is not in statuses",
                self.beans.default_status
            )));
        }
        if !self.types.is_empty()
            && !self.beans.default_type.is_empty()
            && !self.types.contains(&self.beans.default_type)
        {
            return Err(BeansError::Config(format!(
                "beans.default_type '{}' is not in types",
                self.beans.default_type
            )));
        }
        Ok(())
    }

    /// ID generator for this configuration.
    #[must_use]
    pub fn id_generator(&self) -> IdGenerator {
        IdGenerator::new(IdConfig {
            length: self.beans.id_length,
            ..IdConfig::with_prefix(self.beans.prefix.clone())
        })
    }
}

/// Search `start` and its ancestors for `.beans.yml`.
#[must_use]
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub beans_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Configuration plus the resolved data directory.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    /// The config file used, if one was found.
    pub config_file: Option<PathBuf>,
    pub beans_dir: PathBuf,
}

/// Resolve configuration for `cwd`, reading `BEANS_PATH` from the
/// environment.
///
/// # Errors
///
/// See [`resolve_with_env`].
pub fn resolve(overrides: &CliOverrides, cwd: &Path) -> Result<ResolvedConfig> {
    resolve_with_env(overrides, cwd, std::env::var(BEANS_PATH_ENV).ok())
}

/// Resolve configuration with an explicit `BEANS_PATH` value.
///
/// # Errors
///
/// Returns `Config` if `--config` names a missing file, or any error from
/// [`Config::load`].
pub fn resolve_with_env(
    overrides: &CliOverrides,
    cwd: &Path,
    env_beans_path: Option<String>,
) -> Result<ResolvedConfig> {
    let config_file = match &overrides.config_path {
        Some(path) => {
            let path = absolutize(cwd, path);
            if !path.is_file() {
                return Err(BeansError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path)
        }
        None => find_config_file(cwd),
    };

    let config = match &config_file {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let beans_dir = if let Some(path) = &overrides.beans_path {
        absolutize(cwd, path)
    } else if let Some(path) = env_beans_path.filter(|p| !p.trim().is_empty()) {
        absolutize(cwd, Path::new(&path))
    } else {
        let base = config_file
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(cwd);
        absolutize(base, Path::new(&config.beans.path))
    };

    tracing::debug!(
        beans_dir = %beans_dir.display(),
        config = ?config_file,
        "Resolved configuration"
    );

    Ok(ResolvedConfig {
        config,
        config_file,
        beans_dir,
    })
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    dunce::canonicalize(&joined).unwrap_or(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
        assert_eq!(Config::default().beans.path, ".beans");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "beans:\n  prefix: app-\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.beans.prefix, "app-");
        assert_eq!(config.beans.id_length, 4);
        assert_eq!(config.statuses, vec!["open", "in-progress", "done"]);
    }

    #[test]
    fn test_invalid_default_status_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "beans:\n  default_status: todo\n").unwrap();
        assert!(matches!(Config::load(&path), Err(BeansError::Config(_))));
    }

    #[test]
    fn test_prefix_with_separator_rejected() {
        let config = Config::with_prefix("app--");
        assert!(matches!(config.validate(), Err(BeansError::Config(_))));
        assert!(Config::with_prefix("app-").validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        let config = Config::with_prefix("proj-");
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_upward_search_resolves_relative_path() {
        let temp = TempDir::new().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        fs::write(root.join(CONFIG_FILE_NAME), "beans:\n  path: issues\n").unwrap();
        let nested = root.join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let resolved = resolve_with_env(&CliOverrides::default(), &nested, None).unwrap();
        assert_eq!(resolved.config_file, Some(root.join(CONFIG_FILE_NAME)));
        assert_eq!(resolved.beans_dir, root.join("issues"));
    }

    #[test]
    fn test_path_precedence() {
        let temp = TempDir::new().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();

        let from_env =
            resolve_with_env(&CliOverrides::default(), &root, Some("env-dir".to_string()))
                .unwrap();
        assert_eq!(from_env.beans_dir, root.join("env-dir"));

        let overrides = CliOverrides {
            beans_path: Some(PathBuf::from("flag-dir")),
            ..Default::default()
        };
        let from_flag = resolve_with_env(&overrides, &root, Some("env-dir".to_string())).unwrap();
        assert_eq!(from_flag.beans_dir, root.join("flag-dir"));

        let fallback = resolve_with_env(&CliOverrides::default(), &root, None).unwrap();
        assert_eq!(fallback.beans_dir, root.join(".beans"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("nope.yml")),
            ..Default::default()
        };
        assert!(resolve_with_env(&overrides, temp.path(), None).is_err());
    }

    #[test]
    fn test_id_generator_uses_prefix_and_length() {
        let mut config = Config::with_prefix("x-");
        config.beans.id_length = 6;
        let id = config.id_generator().generate(|_| false).unwrap();
        assert!(id.starts_with("x-"));
        assert_eq!(id.len(), 8);
    }
}
