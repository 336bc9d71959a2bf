//! Execution logs.
//!
//! Every finished execution of a task is written to its own file in the log directory.
//! Files are never overwritten, which makes the log directory a full history of all runs.
use std::{
    fs::{create_dir_all, read_dir, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::prelude::*;

use crate::{error::Error, internal_prelude::*, task::Task};

/// The maximum amount of characters of a task's name that end up in a log file name.
const MAX_NAME_LENGTH: usize = 40;

/// How often we try to find a free file name, before giving up.
const MAX_COLLISION_RETRIES: usize = 1000;

/// Write the result of a task's last execution into a new log file.
///
/// The file name is built from the task's id, its sanitized name and the current timestamp.
/// Should that file already exist, a counter suffix is added.
pub fn write_execution_log(task: &Task, log_directory: &Path) -> Result<PathBuf, Error> {
    if !log_directory.exists() {
        create_dir_all(log_directory).map_err(|err| {
            Error::IoPathError(log_directory.to_path_buf(), "creating log directory", err)
        })?;
    }

    let now = Local::now();
    let stem = format!(
        "{}_{}_{}",
        task.id,
        sanitize_name(&task.name),
        now.format("%Y%m%d_%H%M%S_%3f")
    );

    let (path, mut file) = create_unique_file(log_directory, &stem)?;
    file.write_all(format_execution_log(task, now).as_bytes())
        .map_err(|err| Error::IoPathError(path.clone(), "writing execution log", err))?;

    debug!("Wrote execution log of task {} to {path:?}", task.id);

    Ok(path)
}

/// Render the content of an execution log.
pub fn format_execution_log(task: &Task, date: DateTime<Local>) -> String {
    let last_run = task
        .last_run_at
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut content = format!(
        "== Task #{} - {} ==\n\
        Date: {}\n\
        Command: {}\n\
        Interval (s): {}\n\
        Status: {}\n\
        Last run: {}\n\n",
        task.id,
        task.name,
        date.format("%Y-%m-%d %H:%M:%S"),
        task.command,
        task.interval,
        task.status,
        last_run,
    );

    if !task.output.is_empty() {
        content.push_str("[OUTPUT]\n");
        content.push_str(&task.output);
        if !task.output.ends_with('\n') {
            content.push('\n');
        }
    }

    if !task.last_error.is_empty() {
        if !task.output.is_empty() {
            content.push('\n');
        }
        content.push_str("[ERROR]\n");
        content.push_str(&task.last_error);
        content.push('\n');
    }

    content
}

/// Make a task name safe to be used inside a file name.
///
/// Everything that isn't alphanumeric, `-` or `_` is replaced by `_`.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .take(MAX_NAME_LENGTH)
        .map(|character| {
            if character.is_alphanumeric() || character == '-' || character == '_' {
                character
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "task".to_string()
    } else {
        sanitized
    }
}

/// Return all execution logs of a task, oldest first.
pub fn list_execution_logs(task_id: usize, log_directory: &Path) -> Result<Vec<PathBuf>, Error> {
    if !log_directory.exists() {
        return Ok(Vec::new());
    }

    let entries = read_dir(log_directory)
        .map_err(|err| Error::IoPathError(log_directory.to_path_buf(), "reading log dir", err))?;

    let prefix = format!("{task_id}_");
    let mut logs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| Error::IoError("reading log directory entry".into(), err))?
            .path();

        let is_task_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".log"));
        if is_task_log {
            logs.push(path);
        }
    }

    // The timestamp is part of the file name, the file's modification time is the tie breaker.
    logs.sort_by_cached_key(|path| {
        let modified = path.metadata().and_then(|meta| meta.modified()).ok();
        (modified, path.clone())
    });

    Ok(logs)
}

/// Exclusively create a new file, adding a numeric suffix until a free name has been found.
fn create_unique_file(directory: &Path, stem: &str) -> Result<(PathBuf, File), Error> {
    for attempt in 0..MAX_COLLISION_RETRIES {
        let file_name = if attempt == 0 {
            format!("{stem}.log")
        } else {
            format!("{stem}_{attempt}.log")
        };
        let path = directory.join(file_name);

        match File::options().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(Error::IoPathError(path, "creating execution log", err)),
        }
    }

    Err(Error::Generic(format!(
        "Couldn't find a free log file name for {stem:?}"
    )))
}
