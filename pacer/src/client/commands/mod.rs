//! This module contains the logic for all commands.
//!
//! Simple commands, that map directly to a single engine operation, are handled right in here.
//! Everything else has its own file.
use pacer_lib::task::Task;
use tokio_util::sync::CancellationToken;

use crate::{
    client::{
        cli::SubCommand,
        display::{build_status_table, format_task_details, print_error, print_success},
        OutputStyle,
    },
    engine::Engine,
    internal_prelude::*,
};

mod add;
mod edit;
mod logs;
mod run;
mod serve;

/// Execute a single subcommand against the engine.
pub async fn handle_command(
    engine: &Engine,
    style: &OutputStyle,
    subcommand: SubCommand,
) -> Result<()> {
    match subcommand {
        SubCommand::Add {
            command,
            name,
            interval,
            timeout,
            working_directory,
            envs,
            disabled,
            print_task_id,
        } => add::add_task(
            engine,
            style,
            add::AddOptions {
                command: command.join(" "),
                name,
                interval,
                timeout,
                working_directory,
                envs,
                disabled,
                print_task_id,
            },
        ),
        SubCommand::Edit {
            task_id,
            name,
            command,
            interval,
            timeout,
            working_directory,
            unset_working_directory,
            envs,
            unset_envs,
        } => edit::edit(
            engine,
            style,
            task_id,
            edit::EditOptions {
                name,
                command,
                interval,
                timeout,
                working_directory,
                unset_working_directory,
                envs,
                unset_envs,
            },
        ),
        SubCommand::Duplicate { task_id } => {
            let Some(task) = engine.duplicate(task_id) else {
                bail!("There's no task with id {task_id}");
            };
            print_success(
                style,
                &format!("Duplicated task {task_id} as new task {}", task.id),
            );
            Ok(())
        }
        SubCommand::Remove { task_ids } => {
            for_each_task(style, &task_ids, "Removed", |id| engine.remove(id))
        }
        SubCommand::Enable { task_ids } => for_each_task(style, &task_ids, "Enabled", |id| {
            engine.set_enabled(id, true)
        }),
        SubCommand::Disable { task_ids } => for_each_task(style, &task_ids, "Disabled", |id| {
            engine.set_enabled(id, false)
        }),
        SubCommand::Status { json } => {
            let tasks = engine.list();
            if json {
                println!("{}", serde_json::to_string(&tasks)?);
            } else if tasks.is_empty() {
                println!("There are no tasks yet. Add one with `pacer add`.");
            } else {
                println!("{}", build_status_table(&tasks, style));
            }
            Ok(())
        }
        SubCommand::Show { task_id, json } => {
            let task = get_task(engine, task_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                println!("{}", format_task_details(&task, style));
            }
            Ok(())
        }
        SubCommand::Logs {
            task_id,
            list,
            last,
        } => logs::print_logs(engine, task_id, list, last),
        SubCommand::Run { task_id } => run::run_in_foreground(engine, style, task_id).await,
        SubCommand::Serve => serve::serve(engine).await,
    }
}

/// Get a task or fail with a proper error message.
fn get_task(engine: &Engine, task_id: usize) -> Result<Task> {
    engine
        .get(task_id)
        .ok_or_else(|| color_eyre::eyre::eyre!("There's no task with id {task_id}"))
}

/// Apply an operation to multiple tasks and report the result for each of them.
fn for_each_task<F>(style: &OutputStyle, task_ids: &[usize], action: &str, operation: F) -> Result<()>
where
    F: Fn(usize) -> bool,
{
    let mut missing = Vec::new();
    for task_id in task_ids {
        if operation(*task_id) {
            print_success(style, &format!("{action} task {task_id}"));
        } else {
            missing.push(task_id.to_string());
        }
    }

    if !missing.is_empty() {
        print_error(
            style,
            &format!("The following tasks don't exist: {}", missing.join(", ")),
        );
        bail!("Some tasks couldn't be found");
    }

    Ok(())
}

/// Get a token that's cancelled as soon as the user presses Ctrl-C or a SIGTERM arrives.
fn interrupt_token() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .wrap_err("Failed to install the interrupt handler")?;

    Ok(token)
}
