use std::{collections::BTreeMap, path::PathBuf};

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::Error;

/// Appended once to a task's output as soon as the output cap has been reached.
pub const OUTPUT_TRUNCATION_MARKER: &str = "\n[... output truncated ...]\n";

/// Commands that are known to keep running until they're stopped from outside.
const LONG_RUNNING_PATTERNS: &[&str] = &[
    "ping -t",
    "tail -f",
    "tail -F",
    "tail --follow",
    "journalctl -f",
    "docker logs -f",
    "kubectl logs -f",
];

/// Interactive or endless programs, matched against the first word of each command segment.
const LONG_RUNNING_PROGRAMS: &[&str] = &["top", "htop", "watch", "yes", "less", "more"];

/// The status of a task's run-state.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Display, Serialize, Deserialize)]
pub enum TaskStatus {
    /// The task hasn't been run yet or its last run has been cancelled.
    #[default]
    Pending,
    /// A process of the task is currently being supervised.
    Running,
    /// The last run exited with exit code 0.
    Finished,
    /// The last run failed, timed out or couldn't be spawned.
    Failed,
}

/// Representation of a task.
///
/// The definition (name, command, interval, options) is persisted across restarts.
/// The run state (`status`, `last_run_at`, `output`, `last_error`) only lives in memory.
#[derive(PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Task {
    pub id: usize,
    pub name: String,
    pub command: String,
    /// Seconds between automatic runs. `0` means the task is only run manually.
    pub interval: u64,
    pub enabled: bool,
    pub working_directory: Option<PathBuf>,
    /// Timeout in seconds. `0` falls back to the engine's default timeout.
    pub timeout: u64,
    pub envs: BTreeMap<String, String>,
    pub status: TaskStatus,
    pub last_run_at: Option<DateTime<Local>>,
    pub output: String,
    /// Whether the truncation marker has already been appended to `output`.
    pub output_truncated: bool,
    pub last_error: String,
}

impl Task {
    /// Create a new task with normalized input.
    /// Whitespace is trimmed and negative intervals are clamped to `0`.
    pub fn new(name: &str, command: &str, interval: i64) -> Task {
        Task {
            id: 0,
            name: name.trim().to_string(),
            command: command.trim().to_string(),
            interval: clamp_seconds(interval),
            enabled: true,
            working_directory: None,
            timeout: 0,
            envs: BTreeMap::new(),
            status: TaskStatus::Pending,
            last_run_at: None,
            output: String::new(),
            output_truncated: false,
            last_error: String::new(),
        }
    }

    /// A convenience function used to duplicate a task.
    /// The definition is copied, the run state starts from scratch.
    pub fn from_task(task: &Task) -> Task {
        Task {
            id: 0,
            name: task.name.clone(),
            command: task.command.clone(),
            interval: task.interval,
            enabled: task.enabled,
            working_directory: task.working_directory.clone(),
            timeout: task.timeout,
            envs: task.envs.clone(),
            status: TaskStatus::Pending,
            last_run_at: None,
            output: String::new(),
            output_truncated: false,
            last_error: String::new(),
        }
    }

    /// Whether the task is having a running process managed by the engine.
    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    /// Whether the scheduler should trigger this task at the given point in time.
    ///
    /// Tasks that never ran are due immediately.
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        if !self.enabled || self.interval == 0 || self.is_running() {
            return false;
        }

        match self.last_run_at {
            None => true,
            Some(last_run) => {
                let elapsed = now.signed_duration_since(last_run).num_seconds();
                elapsed >= 0 && elapsed as u64 >= self.interval
            }
        }
    }

    /// Switch the task into running mode and forget everything about the previous run.
    pub fn start_run(&mut self) {
        self.status = TaskStatus::Running;
        self.output.clear();
        self.output_truncated = false;
        self.last_error.clear();
    }

    /// Append a single line of process output, respecting the output cap.
    ///
    /// Once the cap is hit, the output is cut so that the truncation marker still fits
    /// and all following lines are dropped.
    /// Returns whether the output changed.
    pub fn append_output(&mut self, line: &str, cap: usize) -> bool {
        if self.output_truncated {
            return false;
        }

        if self.output.len() + line.len() + 1 <= cap {
            self.output.push_str(line);
            self.output.push('\n');
            return true;
        }

        let mut keep = cap
            .saturating_sub(OUTPUT_TRUNCATION_MARKER.len())
            .min(self.output.len());
        while !self.output.is_char_boundary(keep) {
            keep -= 1;
        }
        self.output.truncate(keep);
        self.output.push_str(OUTPUT_TRUNCATION_MARKER);
        self.output_truncated = true;

        true
    }

    /// Overwrite the task's definition with the given edit.
    /// The run state is left untouched.
    pub fn apply_edit(&mut self, edit: TaskEdit) {
        self.name = edit.name.trim().to_string();
        self.command = edit.command.trim().to_string();
        self.interval = clamp_seconds(edit.interval);
        self.enabled = edit.enabled;
        self.working_directory = edit
            .working_directory
            .filter(|path| !path.as_os_str().is_empty());
        self.timeout = clamp_seconds(edit.timeout);
        self.envs = edit.envs;
    }
}

/// We use a custom `Debug` implementation for [Task], as the `envs` and `output` fields just
/// have too much info in them and make the log output much too verbose.
///
/// Furthermore, there might be secrets in the environment, resulting in a possible leak if
/// users copy-paste their log output for debugging.
impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("command", &self.command)
            .field("interval", &self.interval)
            .field("enabled", &self.enabled)
            .field("working_directory", &self.working_directory)
            .field("timeout", &self.timeout)
            .field("envs", &"hidden")
            .field("status", &self.status)
            .field("last_run_at", &self.last_run_at)
            .field("output", &format_args!("{} bytes", self.output.len()))
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// The full, editable definition of a task.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct TaskEdit {
    pub name: String,
    pub command: String,
    pub interval: i64,
    pub enabled: bool,
    pub working_directory: Option<PathBuf>,
    pub timeout: i64,
    pub envs: BTreeMap<String, String>,
}

impl TaskEdit {
    /// Pre-fill an edit with the current definition of a task.
    pub fn from_task(task: &Task) -> TaskEdit {
        TaskEdit {
            name: task.name.clone(),
            command: task.command.clone(),
            interval: task.interval.try_into().unwrap_or(i64::MAX),
            enabled: task.enabled,
            working_directory: task.working_directory.clone(),
            timeout: task.timeout.try_into().unwrap_or(i64::MAX),
            envs: task.envs.clone(),
        }
    }

    /// Strict validation for front-ends that want to reject input instead of normalizing it.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidTask("the name must not be empty".into()));
        }
        if self.command.trim().is_empty() {
            return Err(Error::InvalidTask("the command must not be empty".into()));
        }
        if self.interval < 0 {
            return Err(Error::InvalidTask("the interval must not be negative".into()));
        }
        if self.timeout < 0 {
            return Err(Error::InvalidTask("the timeout must not be negative".into()));
        }
        if self.envs.keys().any(|key| key.is_empty() || key.contains('=')) {
            return Err(Error::InvalidTask(
                "environment variable names must be non-empty and must not contain '='".into(),
            ));
        }

        Ok(())
    }
}

/// Negative durations don't make any sense. Treat them as `0`.
pub fn clamp_seconds(seconds: i64) -> u64 {
    seconds.max(0) as u64
}

/// Check whether a command usually never terminates on its own.
///
/// Front-ends use this to warn users that such a command should get an interval and rely on
/// its timeout, instead of being started manually and left hanging.
pub fn looks_long_running(command: &str) -> bool {
    let command = command.trim();
    if LONG_RUNNING_PATTERNS
        .iter()
        .any(|pattern| command.contains(pattern))
    {
        return true;
    }

    command
        .split(['|', ';', '&'])
        .filter_map(|segment| segment.split_whitespace().next())
        .map(|program| {
            let program = program.rsplit(['/', '\\']).next().unwrap_or(program);
            program.trim_end_matches(".exe").to_lowercase()
        })
        .any(|program| LONG_RUNNING_PROGRAMS.contains(&program.as_str()))
}
