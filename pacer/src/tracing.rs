use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    field::MakeExt,
    fmt::{format::FmtSpan, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::internal_prelude::*;

/// Install the global tracing subscriber.
///
/// `verbosity` is the amount of `-v` flags. It's only applied to pacer's own crates, everything
/// else stays at `warn`. `RUST_LOG` takes precedence if it's set.
pub fn install_tracing(verbosity: u8) -> Result<()> {
    let (level, pretty) = level_from_verbosity(verbosity);
    let timer = ChronoLocal::new("%H:%M:%S%.3f".into());

    type GenericLayer<S> = Box<dyn Layer<S> + Send + Sync>;
    let fmt_layer: GenericLayer<_> = if pretty {
        Box::new(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_timer(timer)
                .with_target(true)
                .with_thread_names(true)
                .with_span_events(FmtSpan::ACTIVE)
                .with_writer(std::io::stderr),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .map_fmt_fields(|fields| fields.debug_alt())
                .with_timer(timer)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
    };

    let builder = EnvFilter::builder().with_default_directive(LevelFilter::WARN.into());
    let filter_layer = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        builder
            .from_env()
            .wrap_err("RUST_LOG env variable is invalid")?
    } else {
        builder
            .parse(format!("pacer={level},pacer_lib={level}"))
            .wrap_err("Failed to build log filter")?
    };

    tracing_subscriber::Registry::default()
        .with(fmt_layer.with_filter(filter_layer))
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    Ok(())
}

/// Map the amount of `-v` flags to a log level.
/// Anything beyond `-vvv` additionally switches to the pretty, multi-line format.
fn level_from_verbosity(verbosity: u8) -> (LevelFilter, bool) {
    match verbosity {
        0 => (LevelFilter::WARN, false),
        1 => (LevelFilter::INFO, false),
        2 => (LevelFilter::DEBUG, false),
        3 => (LevelFilter::TRACE, false),
        _ => (LevelFilter::TRACE, true),
    }
}
