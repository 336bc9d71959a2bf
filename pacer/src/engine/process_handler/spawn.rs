use std::{future::pending, process::Stdio, time::Duration};

use chrono::Local;
use command_group::AsyncCommandGroup;
use pacer_lib::task::{Task, TaskStatus};
use tokio::{select, sync::mpsc, task::JoinSet, time::sleep};
use tokio_util::sync::CancellationToken;

use super::{
    kill::{force_kill, stop_child},
    output::read_lines,
    ExecutionEnd,
};
use crate::{
    engine::Engine,
    internal_prelude::*,
    process_helper::compile_shell_command,
};

/// The amount of lines that may be buffered between the output readers and the supervisor.
const OUTPUT_CHANNEL_SIZE: usize = 256;

/// Everything the supervisor reacts to while a process is running.
enum Event {
    Cancelled,
    TimedOut,
    Line(Option<String>),
    Exited(std::io::Result<std::process::ExitStatus>),
}

impl Engine {
    /// Start a new execution of a task.
    ///
    /// Nothing happens if the task doesn't exist, is disabled or is already running.
    /// Returns whether an execution has been started.
    pub fn run(&self, task_id: usize) -> bool {
        let mut state = self.inner.lock_state();
        if self.inner.token.is_cancelled() {
            warn!("The engine is shutting down, not starting task {task_id}");
            return false;
        }

        let Some(task) = state.tasks.get(&task_id) else {
            warn!("Tried to start non-existing task: {task_id}");
            return false;
        };
        if task.is_running() || state.executions.contains(task_id) {
            debug!("Task {task_id} is already running");
            return false;
        }
        if !task.enabled {
            info!("Task {task_id} is disabled and won't be started");
            return false;
        }

        let token = self.inner.token.child_token();
        let generation = state.register_execution(task_id, token.clone());
        let Some(task) = state.tasks.get_mut(&task_id) else {
            return false;
        };
        task.start_run();
        let task = task.clone();

        info!("Starting task {task_id}");
        self.inner.publish(&mut state);
        drop(state);

        let engine = self.clone();
        self.inner.tracker.spawn_on(
            engine.supervise(task, generation, token),
            &self.inner.runtime,
        );

        true
    }

    /// Run a task's process to completion and record the result.
    async fn supervise(self, task: Task, generation: u64, token: CancellationToken) {
        let result = self.execute(&task, generation, &token).await;
        self.finish(task.id, generation, result);
    }

    /// Spawn the process, stream its output and wait until it exits, times out or is cancelled.
    async fn execute(
        &self,
        task: &Task,
        generation: u64,
        token: &CancellationToken,
    ) -> Result<ExecutionEnd> {
        let task_id = task.id;
        let settings = &self.inner.settings;

        let mut command = compile_shell_command(settings, &task.command)?;
        if let Some(path) = &task.working_directory {
            if path.is_dir() {
                command.current_dir(path);
            } else {
                warn!(
                    message = "Working directory doesn't exist, using the engine's directory",
                    task_id,
                    ?path
                );
            }
        }
        command
            .envs(&task.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = tokio::process::Command::from(command)
            .group_spawn()
            .wrap_err_with(|| format!("Failed to spawn command: {}", task.command))?;

        if let Some(pid) = child.id() {
            debug!("Task {task_id} runs with pid {pid}");
            let registered = self
                .inner
                .lock_state()
                .executions
                .set_pid(task_id, generation, pid);
            if !registered {
                debug!("Task {task_id} has been cancelled while spawning");
            }
        }

        // stdout and stderr are combined into a single stream of lines.
        let (sender, mut receiver) = mpsc::channel(OUTPUT_CHANNEL_SIZE);
        let mut readers = JoinSet::new();
        if let Some(stdout) = child.inner().stdout.take() {
            readers.spawn(read_lines(stdout, sender.clone()));
        }
        if let Some(stderr) = child.inner().stderr.take() {
            readers.spawn(read_lines(stderr, sender.clone()));
        }
        drop(sender);

        let timeout = settings.engine.effective_timeout(task.timeout);
        let watchdog = async move {
            match timeout {
                Some(timeout) => sleep(timeout).await,
                None => pending::<()>().await,
            }
        };
        tokio::pin!(watchdog);

        let mut output_open = true;
        let end = loop {
            let event = select! {
                _ = token.cancelled() => Event::Cancelled,
                _ = &mut watchdog => Event::TimedOut,
                line = receiver.recv(), if output_open => Event::Line(line),
                status = child.wait() => Event::Exited(status),
            };

            match event {
                Event::Line(Some(line)) => self.append_output(task_id, generation, &line),
                Event::Line(None) => output_open = false,
                Event::Cancelled => {
                    debug!("Stopping cancelled task {task_id}");
                    stop_child(task_id, &mut child, settings.engine.kill_grace()).await;
                    break ExecutionEnd::Aborted;
                }
                Event::TimedOut => {
                    self.time_out(task_id, generation, timeout.unwrap_or_default());
                    force_kill(task_id, &mut child).await;
                    break ExecutionEnd::Aborted;
                }
                Event::Exited(Ok(status)) => break ExecutionEnd::Exited(status),
                Event::Exited(Err(error)) => {
                    // Make sure nothing is left behind.
                    force_kill(task_id, &mut child).await;
                    return Err(error).wrap_err("Failed to wait for the process");
                }
            }
        };

        if output_open {
            self.drain_output(task_id, generation, &mut receiver).await;
        }
        readers.abort_all();

        Ok(end)
    }

    /// Mark a task as timed out.
    fn time_out(&self, task_id: usize, generation: u64, timeout: Duration) {
        let mut state = self.inner.lock_state();
        if !state.executions.is_current(task_id, generation) {
            return;
        }
        let Some(task) = state.tasks.get_mut(&task_id) else {
            return;
        };
        if !task.is_running() {
            return;
        }

        task.status = TaskStatus::Failed;
        task.last_error = format!("Timeout after {}s", timeout.as_secs());
        task.last_run_at = Some(Local::now());
        info!("Task {task_id} timed out after {timeout:?}");

        self.inner.publish(&mut state);
    }
}
