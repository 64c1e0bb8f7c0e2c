//! Graceful Ctrl+C handling.
//!
//! The scan and probe phases poll a shared flag and stop cleanly when it is
//! set; the run then exits with code 130. Destructive batches are not
//! cancellable after confirmation beyond their per-file failure tolerance,
//! so the flag is only consulted before any mutation begins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Install the Ctrl+C handler and return the shared shutdown flag.
///
/// Installation failure (e.g. in environments without signal support) is
/// logged and tolerated; the returned flag simply never fires.
#[must_use]
pub fn install() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping...");
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        log::warn!("Could not install Ctrl+C handler: {e}");
    }
    flag
}
