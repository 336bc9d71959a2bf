//! The on-disk representation of all task definitions.
//!
//! Tasks are stored in a flat `key=value` text file, which stays readable and editable by hand:
//!
//! ```text
//! version=1
//! count=1
//! task.0.id=3
//! task.0.name=Backup
//! task.0.command=rsync -a ~/docs /mnt/backup
//! task.0.interval=3600
//! task.0.enabled=true
//! task.0.working_directory=
//! task.0.timeout=120
//! task.0.env.count=1
//! task.0.env.0.key=RSYNC_PASSWORD
//! task.0.env.0.value=hunter2
//! ```
//!
//! Only the task definition is stored. The run state is runtime-only.
use std::{
    collections::{BTreeMap, HashMap},
    fs::{create_dir_all, read_to_string, rename, write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Mutex,
};

use crate::{
    error::Error,
    internal_prelude::*,
    task::{Task, TaskStatus},
};

pub const STORE_VERSION: u32 = 1;

/// Reads and writes the task store file.
///
/// All file operations go through a single lock, which prevents interleaved writes when
/// multiple threads persist the task list at the same time.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl Store {
    pub fn new(path: PathBuf) -> Self {
        Store {
            path,
            io_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all tasks from disk.
    ///
    /// Returns `Ok(None)` if there's no store file yet.
    pub fn load(&self) -> Result<Option<Vec<Task>>, Error> {
        let _guard = self.io_lock.lock().unwrap_or_else(|poison| poison.into_inner());

        if !self.path.exists() {
            info!("Couldn't find task store at location: {:?}", self.path);
            return Ok(None);
        }

        let content = read_to_string(&self.path)
            .map_err(|err| Error::IoPathError(self.path.clone(), "reading task store", err))?;

        deserialize_tasks(&content).map(Some)
    }

    /// Save the given tasks to disk, replacing the previous content.
    ///
    /// The content is written to a temporary file first, which then replaces the real file.
    /// That way a crash during the write never leaves a half-written store behind.
    pub fn save<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Result<(), Error> {
        let serialized = serialize_tasks(tasks);
        let _guard = self.io_lock.lock().unwrap_or_else(|poison| poison.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                create_dir_all(parent).map_err(|err| {
                    Error::IoPathError(parent.to_path_buf(), "creating data directory", err)
                })?;
            }
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".partial");
        let temp = PathBuf::from(temp);

        write(&temp, serialized)
            .map_err(|err| Error::IoPathError(temp.clone(), "writing temporary store", err))?;
        rename(&temp, &self.path)
            .map_err(|err| Error::IoPathError(self.path.clone(), "replacing task store", err))?;

        debug!("Task store saved at: {:?}", self.path);

        Ok(())
    }
}

/// Serialize the definitions of all given tasks.
pub fn serialize_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> String {
    let tasks: Vec<&Task> = tasks.into_iter().collect();

    let mut lines = vec![
        "# pacer task store".to_string(),
        format!("version={STORE_VERSION}"),
        format!("count={}", tasks.len()),
    ];

    for (index, task) in tasks.iter().enumerate() {
        let prefix = format!("task.{index}");
        let working_directory = task
            .working_directory
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();

        lines.push(format!("{prefix}.id={}", task.id));
        lines.push(format!("{prefix}.name={}", escape(&task.name)));
        lines.push(format!("{prefix}.command={}", escape(&task.command)));
        lines.push(format!("{prefix}.interval={}", task.interval));
        lines.push(format!("{prefix}.enabled={}", task.enabled));
        lines.push(format!(
            "{prefix}.working_directory={}",
            escape(&working_directory)
        ));
        lines.push(format!("{prefix}.timeout={}", task.timeout));
        lines.push(format!("{prefix}.env.count={}", task.envs.len()));
        for (env_index, (key, value)) in task.envs.iter().enumerate() {
            lines.push(format!("{prefix}.env.{env_index}.key={}", escape(key)));
            lines.push(format!("{prefix}.env.{env_index}.value={}", escape(value)));
        }
    }

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Deserialize task definitions.
///
/// Every task comes back in [TaskStatus::Pending] without any run state.
/// Any malformed line, missing entry or duplicate id fails the whole document.
pub fn deserialize_tasks(content: &str) -> Result<Vec<Task>, Error> {
    let entries = parse_entries(content)?;

    if let Some(version) = entries.get("version") {
        let version: u32 = parse_value("version", version)?;
        if version > STORE_VERSION {
            return Err(Error::StoreEntry {
                key: "version".into(),
                reason: format!("unsupported store version {version}"),
            });
        }
    }

    let count: usize = required(&entries, "count")?;
    // Every task consists of at least one entry.
    if count > entries.len() {
        return Err(Error::StoreEntry {
            key: "count".into(),
            reason: format!("{count} tasks announced, but only {} entries exist", entries.len()),
        });
    }
    let mut tasks = Vec::with_capacity(count);
    let mut seen_ids = HashMap::new();

    for index in 0..count {
        let prefix = format!("task.{index}");
        let id: usize = required(&entries, &format!("{prefix}.id"))?;
        if let Some(previous) = seen_ids.insert(id, index) {
            return Err(Error::StoreEntry {
                key: format!("{prefix}.id"),
                reason: format!("id {id} is already used by task.{previous}"),
            });
        }

        let working_directory: String =
            optional(&entries, &format!("{prefix}.working_directory"))?.unwrap_or_default();

        let env_count: usize = optional(&entries, &format!("{prefix}.env.count"))?.unwrap_or(0);
        let mut envs = BTreeMap::new();
        for env_index in 0..env_count {
            let key: String = required(&entries, &format!("{prefix}.env.{env_index}.key"))?;
            let value: String = required(&entries, &format!("{prefix}.env.{env_index}.value"))?;
            envs.insert(key, value);
        }

        tasks.push(Task {
            id,
            name: required(&entries, &format!("{prefix}.name"))?,
            command: required(&entries, &format!("{prefix}.command"))?,
            interval: optional(&entries, &format!("{prefix}.interval"))?.unwrap_or(0),
            enabled: optional(&entries, &format!("{prefix}.enabled"))?.unwrap_or(true),
            working_directory: (!working_directory.is_empty())
                .then(|| PathBuf::from(working_directory)),
            timeout: optional(&entries, &format!("{prefix}.timeout"))?.unwrap_or(0),
            envs,
            status: TaskStatus::Pending,
            last_run_at: None,
            output: String::new(),
            output_truncated: false,
            last_error: String::new(),
        });
    }

    Ok(tasks)
}

/// Split the document into unescaped key/value pairs.
fn parse_entries(content: &str) -> Result<HashMap<String, String>, Error> {
    let mut entries = HashMap::new();

    for (number, line) in content.lines().enumerate() {
        let line_number = number + 1;
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::StoreFormat {
                line: line_number,
                reason: "expected a 'key=value' pair".into(),
            });
        };

        let key = key.trim();
        let value = unescape(value).map_err(|reason| Error::StoreFormat {
            line: line_number,
            reason,
        })?;

        if entries.insert(key.to_string(), value).is_some() {
            return Err(Error::StoreFormat {
                line: line_number,
                reason: format!("duplicate key '{key}'"),
            });
        }
    }

    Ok(entries)
}

fn required<T: FromStr>(entries: &HashMap<String, String>, key: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    match entries.get(key) {
        Some(value) => parse_value(key, value),
        None => Err(Error::StoreEntry {
            key: key.to_string(),
            reason: "missing".into(),
        }),
    }
}

fn optional<T: FromStr>(entries: &HashMap<String, String>, key: &str) -> Result<Option<T>, Error>
where
    T::Err: std::fmt::Display,
{
    entries
        .get(key)
        .map(|value| parse_value(key, value))
        .transpose()
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| Error::StoreEntry {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

/// Values are single-line. Backslashes and line breaks are escaped.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape(value: &str) -> Result<String, String> {
    let mut unescaped = String::with_capacity(value.len());
    let mut characters = value.chars();
    while let Some(character) = characters.next() {
        if character != '\\' {
            unescaped.push(character);
            continue;
        }

        match characters.next() {
            Some('\\') => unescaped.push('\\'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some(other) => return Err(format!("unknown escape sequence '\\{other}'")),
            None => return Err("dangling escape character at end of line".into()),
        }
    }

    Ok(unescaped)
}
