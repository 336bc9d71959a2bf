use std::{
    collections::HashMap,
    fs::{create_dir_all, File},
    io::{prelude::*, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use shellexpand::tilde;

use crate::{
    error::Error, internal_prelude::*, setting_defaults::*, task::OUTPUT_TRUNCATION_MARKER,
};

/// The environment variable that can be set to overwrite pacer's config path.
pub const PACER_CONFIG_PATH_ENV: &str = "PACER_CONFIG_PATH";

/// The name of the task store file inside the data directory.
pub const STORE_FILE_NAME: &str = "tasks.properties";

/// All settings that describe where pacer keeps its files.
#[derive(PartialEq, Eq, Clone, Debug, Default, Deserialize, Serialize)]
pub struct Shared {
    /// Don't access this property directly, but rather use the getter with the same name.
    /// It's only public to allow proper integration testing.
    ///
    /// The directory that is used for all of pacer's data. \
    /// I.e. the task store and the execution logs.
    pub data_directory: Option<PathBuf>,
}

/// All settings which are used by the execution engine.
#[derive(PartialEq, Eq, Clone, Debug, Deserialize, Serialize)]
pub struct Engine {
    /// The timeout in seconds for tasks that don't specify their own timeout.
    /// A value of `0` disables the fallback timeout completely.
    #[serde(default = "default_timeout")]
    pub default_timeout: u64,
    /// The maximum amount of output bytes that's kept per task execution.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// How often the scheduler checks for due tasks.
    #[serde(default = "default_scheduler_interval_millis")]
    pub scheduler_interval_millis: u64,
    /// How long a process tree gets to react to SIGTERM before it's killed for good.
    #[serde(default = "default_kill_grace_millis")]
    pub kill_grace_millis: u64,
    /// Environment variables that will be injected into all executed processes.
    /// A task's own environment variables take precedence.
    #[serde(default = "Default::default")]
    pub env_vars: HashMap<String, String>,
    /// The command that should be used for task execution.
    ///
    /// Unix default:
    /// `vec!["sh", "-c", "{{ pacer_command_string }}"]`.
    ///
    /// Windows default:
    /// `vec!["cmd", "/C", "{{ pacer_command_string }}"]`
    pub shell_command: Option<Vec<String>>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            default_timeout: default_timeout(),
            max_output_bytes: default_max_output_bytes(),
            scheduler_interval_millis: default_scheduler_interval_millis(),
            kill_grace_millis: default_kill_grace_millis(),
            env_vars: HashMap::new(),
            shell_command: None,
        }
    }
}

/// The parent settings struct. \
/// This contains all other setting structs.
#[derive(PartialEq, Eq, Clone, Default, Debug, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "Default::default")]
    pub engine: Engine,
    #[serde(default = "Default::default")]
    pub shared: Shared,
    #[serde(default = "HashMap::new")]
    pub profiles: HashMap<String, NestedSettings>,
}

/// The nested settings struct for profiles. \
/// In contrast to the normal `Settings` struct, this struct doesn't allow profiles.
/// That way we prevent nested profiles and problems with self-referencing structs.
#[derive(PartialEq, Eq, Clone, Debug, Deserialize, Serialize)]
pub struct NestedSettings {
    #[serde(default = "Default::default")]
    pub engine: Engine,
    #[serde(default = "Default::default")]
    pub shared: Shared,
}

pub fn default_configuration_directory() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pacer"))
}

/// Get the default config directory.
/// If no config can be found, fallback to the current directory.
pub fn configuration_directories() -> Vec<PathBuf> {
    if let Some(config_dir) = default_configuration_directory() {
        vec![config_dir, PathBuf::from(".")]
    } else {
        vec![PathBuf::from(".")]
    }
}

/// Little helper which expands a given path's `~` characters to a fully qualified path.
pub fn expand_home(old_path: &Path) -> PathBuf {
    PathBuf::from(tilde(&old_path.to_string_lossy()).into_owned())
}

impl Shared {
    pub fn data_directory(&self) -> PathBuf {
        if let Some(path) = &self.data_directory {
            expand_home(path)
        } else if let Some(path) = dirs::data_local_dir() {
            path.join("pacer")
        } else {
            PathBuf::from("./pacer")
        }
    }

    /// The file the task definitions are persisted to.
    pub fn store_path(&self) -> PathBuf {
        self.data_directory().join(STORE_FILE_NAME)
    }

    /// The directory that receives one log file per task execution.
    pub fn log_directory(&self) -> PathBuf {
        self.data_directory().join("logs")
    }
}

impl Engine {
    /// Resolve the timeout of a task.
    ///
    /// A task timeout of `0` falls back to [Engine::default_timeout].
    /// `None` means that the task may run forever.
    pub fn effective_timeout(&self, task_timeout: u64) -> Option<Duration> {
        let seconds = if task_timeout > 0 {
            task_timeout
        } else {
            self.default_timeout
        };

        (seconds > 0).then(|| Duration::from_secs(seconds))
    }

    /// The output cap never drops below the size of the truncation marker.
    pub fn output_cap(&self) -> usize {
        self.max_output_bytes.max(OUTPUT_TRUNCATION_MARKER.len())
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler_interval_millis.max(1))
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_millis)
    }
}

impl Settings {
    /// Try to read existing config files, while using default values for non-existing fields.
    /// If successful, this will return a full config as well as a boolean on whether we found an
    /// existing configuration file or not.
    ///
    /// The default local config locations depends on the current target.
    pub fn read(from_file: &Option<PathBuf>) -> Result<(Settings, bool), Error> {
        // If no explicit path is provided, we look for the PACER_CONFIG_PATH env variable.
        let from_file = from_file
            .clone()
            .or_else(|| std::env::var(PACER_CONFIG_PATH_ENV).map(PathBuf::from).ok());

        // Load the config from a very specific file path
        if let Some(path) = &from_file {
            // A missing explicit config is fine, it'll be created with default values.
            if !path.exists() {
                info!("No config file at {path:?}. Use default config.");
                return Ok((Settings::default(), false));
            }

            let file = File::open(path)
                .map_err(|err| Error::IoPathError(path.clone(), "opening config file", err))?;
            let reader = BufReader::new(file);

            let settings = serde_yaml::from_reader(reader)
                .map_err(|err| Error::ConfigDeserialization(err.to_string()))?;
            return Ok((settings, true));
        };

        info!("Parsing config files");

        let config_dirs = configuration_directories();
        for directory in config_dirs.into_iter() {
            let path = directory.join("pacer.yml");
            info!("Checking path: {path:?}");

            // Check if the file exists and parse it.
            if path.exists() && path.is_file() {
                info!("Found config file at: {path:?}");

                // Open the file in read-only mode with buffer.
                let file = File::open(&path)
                    .map_err(|err| Error::IoPathError(path, "opening config file.", err))?;
                let reader = BufReader::new(file);

                let settings = serde_yaml::from_reader(reader)
                    .map_err(|err| Error::ConfigDeserialization(err.to_string()))?;
                return Ok((settings, true));
            }
        }

        info!("No config file found. Use default config.");
        // Return a default configuration if we couldn't find a file.
        Ok((Settings::default(), false))
    }

    /// Save the current configuration as a file to the given path. \
    /// If no path is given, the default configuration path will be used. \
    /// The file is then written to the main configuration directory of the respective OS.
    pub fn save(&self, path: &Option<PathBuf>) -> Result<(), Error> {
        let config_path = if let Some(path) = path {
            path.clone()
        } else if let Ok(path) = std::env::var(PACER_CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else if let Some(path) = default_configuration_directory() {
            path.join("pacer.yml")
        } else {
            return Err(Error::Generic(
                "Failed to resolve default config directory. User home cannot be determined."
                    .into(),
            ));
        };
        let config_dir = config_path
            .parent()
            .ok_or_else(|| Error::InvalidPath("Couldn't resolve config directory".into()))?;

        // Create the config dir, if it doesn't exist yet
        if !config_dir.exists() {
            create_dir_all(config_dir).map_err(|err| {
                Error::IoPathError(config_dir.to_path_buf(), "creating config dir", err)
            })?;
        }

        let content = match serde_yaml::to_string(self) {
            Ok(content) => content,
            Err(error) => {
                return Err(Error::Generic(format!(
                    "Configuration file serialization failed:\n{error}"
                )))
            }
        };
        let mut file = File::create(&config_path).map_err(|err| {
            Error::IoPathError(config_path.clone(), "creating settings file", err)
        })?;
        file.write_all(content.as_bytes())
            .map_err(|err| Error::IoPathError(config_path, "writing settings file", err))?;

        Ok(())
    }

    /// Try to load a profile. Error if it doesn't exist.
    pub fn load_profile(&mut self, profile: &str) -> Result<(), Error> {
        let profile = self.profiles.remove(profile).ok_or_else(|| {
            Error::ConfigDeserialization(format!("Couldn't find profile with name \"{profile}\""))
        })?;

        self.engine = profile.engine;
        self.shared = profile.shared;

        Ok(())
    }
}
