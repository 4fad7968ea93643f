use std::{
    borrow::Cow,
    fmt, io,
    path::{Path, PathBuf},
};

use rust_cli_config::builder::{ConfigBuilder, DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Overrides the configuration directory when set.
const CONFIGURATION_DIR_ENV_NAME: &str = "RECONCILER_CONFIGURATION_DIR";

const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

const ENV_PREFIX: &str = "APP";

const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested keys, e.g. `APP_RECONCILER__MASTER_REGION`.
const ENV_SEPARATOR: &str = "__";

const LIST_SEPARATOR: &str = ",";

/// Implemented by top-level configuration structures loadable through [`load_config`].
pub trait Config {
    /// Keys whose environment variable values are split on commas.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

#[derive(Debug, Clone, Copy)]
enum ConfigFileKind {
    Base,
    Environment(Environment),
}

impl ConfigFileKind {
    fn stem(&self) -> Cow<'static, str> {
        match self {
            ConfigFileKind::Base => Cow::Borrowed("base"),
            ConfigFileKind::Environment(env) => Cow::Borrowed(env.as_str()),
        }
    }
}

impl fmt::Display for ConfigFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFileKind::Base => f.write_str("base configuration"),
            ConfigFileKind::Environment(env) => write!(f, "{env} environment configuration"),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("could not locate {kind_description} in `{directory}`; attempted: {attempted}")]
    ConfigurationFileMissing {
        kind_description: String,
        directory: PathBuf,
        attempted: String,
    },

    #[error("failed to load {kind_description} from `{path}`: {source}")]
    ConfigurationFileLoad {
        kind_description: String,
        path: PathBuf,
        source: rust_cli_config::ConfigError,
    },

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] rust_cli_config::ConfigError),

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to build configuration: {0}")]
    Builder(#[source] rust_cli_config::ConfigError),
}

/// Loads `T` from the configuration directory and the process environment.
///
/// Reads `base.(yaml|yml|json)` and `{environment}.(yaml|yml|json)` from `./configuration` (or
/// the directory named by `RECONCILER_CONFIGURATION_DIR`), then applies `APP_`-prefixed
/// environment variables. Nested keys are separated by `__`.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let configuration_directory = configuration_directory()?;
    let environment = Environment::load()?;

    load_config_from(&configuration_directory, environment)
}

/// Same as [`load_config`] with an explicit directory and environment.
pub fn load_config_from<T>(directory: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let base_file = find_configuration_file(directory, ConfigFileKind::Base)?;
    let environment_file =
        find_configuration_file(directory, ConfigFileKind::Environment(environment))?;

    let mut environment_source = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if !T::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR);

        for key in T::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    let builder = rust_cli_config::Config::builder()
        .add_source(rust_cli_config::File::from(base_file.clone()));
    validate_source(&builder, ConfigFileKind::Base, &base_file)?;

    let builder = builder.add_source(rust_cli_config::File::from(environment_file.clone()));
    validate_source(
        &builder,
        ConfigFileKind::Environment(environment),
        &environment_file,
    )?;

    builder
        .add_source(environment_source)
        .build()
        .map_err(LoadConfigError::Builder)?
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

fn configuration_directory() -> Result<PathBuf, LoadConfigError> {
    if let Ok(directory) = std::env::var(CONFIGURATION_DIR_ENV_NAME) {
        return Ok(PathBuf::from(directory));
    }

    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;

    Ok(base_path.join(CONFIGURATION_DIR))
}

fn find_configuration_file(
    directory: &Path,
    kind: ConfigFileKind,
) -> Result<PathBuf, LoadConfigError> {
    let stem = kind.stem();
    let mut attempted_paths = Vec::with_capacity(CONFIG_FILE_EXTENSIONS.len());

    for extension in CONFIG_FILE_EXTENSIONS {
        let path = directory.join(format!("{stem}.{extension}"));
        if path.is_file() {
            return Ok(path);
        }

        attempted_paths.push(format!("`{}`", path.display()));
    }

    Err(LoadConfigError::ConfigurationFileMissing {
        kind_description: kind.to_string(),
        directory: directory.to_path_buf(),
        attempted: attempted_paths.join(", "),
    })
}

/// Builds the sources added so far to pin parse failures on the file that caused them.
fn validate_source(
    builder: &ConfigBuilder<DefaultState>,
    kind: ConfigFileKind,
    path: &Path,
) -> Result<(), LoadConfigError> {
    builder
        .clone()
        .build()
        .map(|_| ())
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            kind_description: kind.to_string(),
            path: path.to_path_buf(),
            source,
        })
}
