//! Ctrl+C handling
//!
//! The sync loop is synchronous, so the signal is awaited on a small
//! current-thread runtime in its own thread. The first press asks the
//! running job to stop between directories; the second exits at once.

use std::thread;

use dirsync_core::CancelFlag;
use tokio::runtime::Builder;

use crate::error::Result;

/// Exit status for an aborted run (128 + SIGINT).
const ABORT_STATUS: i32 = 130;

/// Start listening for Ctrl+C on behalf of `cancel`.
pub fn install(cancel: CancelFlag) -> Result<()> {
    thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!("Ctrl+C handling unavailable: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if cancel.is_cancelled() {
                        eprintln!("Aborted");
                        std::process::exit(ABORT_STATUS);
                    }
                    tracing::warn!("Interrupt received, stopping after the current directory (Ctrl+C again to abort)");
                    cancel.cancel();
                }
            });
        })?;

    Ok(())
}
