use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use pacer::{
    client::{
        cli::{CliArguments, SubCommand},
        handle_command, OutputStyle,
    },
    Engine,
};
use pacer_lib::settings::Settings;
use tracing::warn;

/// This is the main entry point of pacer.
///
/// At first we do some basic setup:
/// - Parse the cli
/// - Initialize logging
/// - Read the config
///
/// Once all this is done, the [Engine] is created, which restores all persisted tasks, and the
/// requested subcommand is executed against it.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse commandline options.
    let opt = CliArguments::parse();

    // Init the logger and set the verbosity level depending on the `-v` flags.
    pacer::tracing::install_tracing(opt.verbose)?;
    color_eyre::install()?;

    // Try to read settings from the configuration file.
    let (mut settings, config_found) =
        Settings::read(&opt.config).wrap_err("Failed to read configuration.")?;

    // We couldn't find a configuration file.
    // This probably means that pacer has been started for the first time and we have to create a
    // default config file once.
    if !config_found {
        if let Err(error) = settings.save(&opt.config) {
            warn!("Failed saving config file: {error:?}");
        }
    };

    // Load any requested profile.
    if let Some(profile) = &opt.profile {
        settings.load_profile(profile)?;
    }

    // If no subcommand is given, we default to the `status` subcommand without any arguments.
    let subcommand = opt.cmd.unwrap_or(SubCommand::Status { json: false });

    let style = OutputStyle::new(&opt.color);
    let engine = Engine::new(settings).wrap_err("Failed to initialize the engine.")?;

    handle_command(&engine, &style, subcommand).await
}
