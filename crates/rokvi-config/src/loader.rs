//! Host settings and layered application sources.
//!
//! # Design
//! - Host settings (environment, content root) are resolved first and drive
//!   which settings files participate in the application layer.
//! - Application sources, lowest precedence first: `appsettings.yaml`,
//!   `appsettings.{environment}.yaml`, `ROKVI__` environment variables,
//!   explicit overrides from the command line.
//! - Binding happens once; the returned options are never reloaded.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use config::{Config, File};
use tracing::debug;

use crate::defaults::{APP_ENV_PREFIX, APP_ENV_SEPARATOR, APPLICATION_NAME, SETTINGS_FILE_STEM};
use crate::environment::Environment;
use crate::error::{ConfigError, ConfigResult};
use crate::model::ApplicationOptions;

/// Keys whose textual values are split on commas into lists.
const LIST_KEYS: &[&str] = &["logging.write_to"];

/// Bootstrap-phase configuration resolved before application sources load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    /// Runtime environment tag.
    pub environment: Environment,
    /// Application name attached to log events.
    pub application_name: String,
    /// Directory searched for settings files.
    pub content_root: PathBuf,
}

impl HostSettings {
    /// Resolve host settings from optional raw values.
    ///
    /// A missing environment defaults to [`Environment::Production`]; a missing
    /// content root defaults to the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironment`] for unknown environment
    /// names and [`ConfigError::ContentRoot`] when the working directory cannot
    /// be determined.
    pub fn resolve(environment: Option<&str>, content_root: Option<PathBuf>) -> ConfigResult<Self> {
        let environment = environment
            .map(str::parse::<Environment>)
            .transpose()?
            .unwrap_or_default();
        let content_root = match content_root {
            Some(path) => path,
            None => env::current_dir()
                .map_err(|source| ConfigError::ContentRoot { path: None, source })?,
        };
        Ok(Self {
            environment,
            application_name: APPLICATION_NAME.to_string(),
            content_root,
        })
    }

    /// Replace the environment tag.
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}

/// Override value supplied outside the settings files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// Scalar value, coerced by the binder.
    Text(String),
    /// List value.
    List(Vec<String>),
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Layered application configuration sources.
#[derive(Debug, Clone)]
pub struct ConfigurationSources {
    content_root: PathBuf,
    environment: Environment,
    variables: Option<HashMap<String, String>>,
    overrides: Vec<(String, SettingValue)>,
}

impl ConfigurationSources {
    /// Sources rooted at the host's content root and environment.
    #[must_use]
    pub fn new(settings: &HostSettings) -> Self {
        Self {
            content_root: settings.content_root.clone(),
            environment: settings.environment,
            variables: None,
            overrides: Vec::new(),
        }
    }

    /// Read environment variables from `variables` instead of the process.
    #[must_use]
    pub fn with_environment_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Add an override with the highest precedence.
    ///
    /// Keys use `Section.key` or `Section:key` form and are matched
    /// case-insensitively.
    #[must_use]
    pub fn with_override(mut self, key: &str, value: impl Into<SettingValue>) -> Self {
        self.overrides.push((normalise_key(key), value.into()));
        self
    }

    /// Add a raw `KEY=VALUE` override as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when the argument has no `=`
    /// or an empty key.
    pub fn with_raw_override(self, raw: &str) -> ConfigResult<Self> {
        let (key, value) = parse_override(raw)?;
        Ok(self.with_override(&key, value))
    }

    /// Settings files considered, lowest precedence first.
    #[must_use]
    pub fn settings_files(&self) -> Vec<PathBuf> {
        settings_files(&self.content_root, self.environment)
    }

    /// Assemble and bind the layered sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Source`] when a source cannot be read or the
    /// merged tree does not bind to [`ApplicationOptions`].
    pub fn load(&self) -> ConfigResult<ApplicationOptions> {
        let mut builder = Config::builder();
        for path in self.settings_files() {
            debug!(path = %path.display(), "adding settings file source");
            builder = builder.add_source(File::from(path).required(false));
        }

        let mut environment = config::Environment::with_prefix(APP_ENV_PREFIX)
            .prefix_separator(APP_ENV_SEPARATOR)
            .separator(APP_ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }
        if let Some(variables) = &self.variables {
            environment = environment.source(Some(variables.clone()));
        }
        builder = builder.add_source(environment);

        for (key, value) in &self.overrides {
            builder = match value {
                SettingValue::Text(text) => builder.set_override(key.as_str(), text.as_str()),
                SettingValue::List(items) => builder.set_override(key.as_str(), items.clone()),
            }
            .map_err(|source| ConfigError::layering("config.override", source))?;
        }

        let merged = builder
            .build()
            .map_err(|source| ConfigError::layering("config.build", source))?;
        merged
            .try_deserialize::<ApplicationOptions>()
            .map_err(|source| ConfigError::layering("config.bind", source))
    }
}

/// Load application options from `sources`.
///
/// # Errors
///
/// Propagates [`ConfigurationSources::load`] failures.
pub fn load_application_options(sources: &ConfigurationSources) -> ConfigResult<ApplicationOptions> {
    sources.load()
}

fn settings_files(content_root: &Path, environment: Environment) -> Vec<PathBuf> {
    vec![
        content_root.join(format!("{SETTINGS_FILE_STEM}.yaml")),
        content_root.join(format!("{SETTINGS_FILE_STEM}.{environment}.yaml")),
    ]
}

fn normalise_key(key: &str) -> String {
    key.trim().replace(':', ".").to_ascii_lowercase()
}

fn parse_override(raw: &str) -> ConfigResult<(String, SettingValue)> {
    let invalid = || ConfigError::InvalidOverride {
        value: raw.to_string(),
    };
    let (key, value) = raw.split_once('=').ok_or_else(invalid)?;
    let key = normalise_key(key);
    if key.is_empty() {
        return Err(invalid());
    }
    let value = if LIST_KEYS.contains(&key.as_str()) {
        SettingValue::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )
    } else {
        SettingValue::Text(value.to_string())
    };
    Ok((key, value))
}
