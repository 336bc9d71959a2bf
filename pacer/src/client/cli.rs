use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum, ValueHint};

#[derive(Parser, Debug, Clone)]
pub enum SubCommand {
    /// Add a new task.
    ///
    /// Commands are executed via your system shell.
    /// This means that the command needs proper shell escaping.
    /// The safest way to preserve shell escaping is to surround your command with quotes, for
    /// example:
    ///
    /// pacer add --interval 60 'ls $HOME && echo \"Some string\"'
    #[command(trailing_var_arg = true)]
    Add {
        /// The command to be added.
        #[arg(required = true, num_args(1..), value_hint = ValueHint::CommandWithArguments)]
        command: Vec<String>,

        /// The name of the task. Defaults to the command.
        #[arg(short, long)]
        name: Option<String>,

        /// Run the task automatically every N seconds. `0` means manual runs only.
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        interval: i64,

        /// Kill the task after N seconds. `0` uses the configured default timeout.
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        timeout: i64,

        /// Specify the working directory of the task.
        #[arg(name = "working-directory", short = 'w', long, value_hint = ValueHint::DirPath)]
        working_directory: Option<PathBuf>,

        /// Environment variables for the task, in the form of `KEY=VALUE`.
        #[arg(short, long = "env", value_parser = parse_env_var)]
        envs: Vec<(String, String)>,

        /// Create the task in disabled state.
        #[arg(short, long)]
        disabled: bool,

        /// Only print the task id instead of a text.
        #[arg(short, long)]
        print_task_id: bool,
    },

    /// Edit the definition of an existing task.
    ///
    /// Only the given properties are changed.
    Edit {
        /// The id of the task.
        task_id: usize,

        /// The new name of the task.
        #[arg(short, long)]
        name: Option<String>,

        /// The new command of the task.
        #[arg(short, long)]
        command: Option<String>,

        /// The new interval in seconds.
        #[arg(short, long, allow_negative_numbers = true)]
        interval: Option<i64>,

        /// The new timeout in seconds.
        #[arg(short, long, allow_negative_numbers = true)]
        timeout: Option<i64>,

        /// The new working directory.
        #[arg(short = 'w', long, value_hint = ValueHint::DirPath, conflicts_with = "unset_working_directory")]
        working_directory: Option<PathBuf>,

        /// Let the task run in the engine's directory again.
        #[arg(long)]
        unset_working_directory: bool,

        /// Set environment variables, in the form of `KEY=VALUE`.
        #[arg(short, long = "env", value_parser = parse_env_var)]
        envs: Vec<(String, String)>,

        /// Remove environment variables.
        #[arg(short, long = "unset-env")]
        unset_envs: Vec<String>,
    },

    /// Create a copy of a task with a fresh run state.
    Duplicate {
        /// The id of the task that should be copied.
        task_id: usize,
    },

    /// Remove tasks. Running tasks are cancelled first.
    #[command(alias("rm"))]
    Remove {
        /// The task ids to be removed.
        #[arg(required = true)]
        task_ids: Vec<usize>,
    },

    /// Enable tasks, so they can be run manually and by the scheduler.
    Enable {
        #[arg(required = true)]
        task_ids: Vec<usize>,
    },

    /// Disable tasks. Disabled tasks are never started.
    Disable {
        #[arg(required = true)]
        task_ids: Vec<usize>,
    },

    /// Display the current status of all tasks.
    Status {
        /// Print the task list as json.
        #[arg(short, long)]
        json: bool,
    },

    /// Display all details of a single task.
    Show {
        task_id: usize,

        /// Print the task as json.
        #[arg(short, long)]
        json: bool,
    },

    /// Print the execution logs of a task.
    ///
    /// By default, only the most recent execution log is shown.
    Logs {
        task_id: usize,

        /// Only list the paths of all execution logs.
        #[arg(short, long)]
        list: bool,

        /// Print the last N execution logs.
        #[arg(short = 'n', long, default_value_t = 1)]
        last: usize,
    },

    /// Run a task in the foreground and print its output while it's running.
    ///
    /// Ctrl-C cancels the execution.
    Run {
        task_id: usize,
    },

    /// Run the scheduler, which starts interval tasks whenever they're due.
    ///
    /// Runs until Ctrl-C is pressed. All running tasks are cancelled on exit.
    Serve,
}

#[derive(Parser, ValueEnum, Debug, Clone, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Never,
    Always,
}

#[derive(Parser, Debug)]
#[command(name = "pacer", about = "Run shell commands on demand or on an interval", author, version)]
pub struct CliArguments {
    /// Verbose mode (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Colorize the output; auto enables color output when connected to a tty.
    #[arg(long, value_enum, default_value = "auto")]
    pub color: ColorChoice,

    /// If provided, pacer only uses this config file.
    ///
    /// This path can also be set via the "PACER_CONFIG_PATH" environment variable.
    /// The commandline option overwrites the environment variable!
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// The name of the profile that should be loaded from your config file.
    #[arg(short, long)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub cmd: Option<SubCommand>,
}

fn parse_env_var(src: &str) -> Result<(String, String), String> {
    let Some((key, value)) = src.split_once('=') else {
        return Err("expected the form KEY=VALUE".into());
    };
    if key.is_empty() {
        return Err("the variable name must not be empty".into());
    }

    Ok((key.to_string(), value.to_string()))
}
