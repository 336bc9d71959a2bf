use super::interrupt_token;
use crate::{engine::Engine, internal_prelude::*};

/// Run the scheduler in the foreground until Ctrl-C is pressed.
pub async fn serve(engine: &Engine) -> Result<()> {
    let interrupted = interrupt_token()?;

    engine.start_scheduler();
    println!(
        "Scheduling {} tasks. Press Ctrl-C to stop.",
        engine.list().len()
    );

    interrupted.cancelled().await;
    info!("Received interrupt, shutting down");

    engine.shutdown();
    engine.wait().await;

    Ok(())
}
