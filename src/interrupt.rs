//! Process-wide interrupt handling
//!
//! Operations register best-effort cleanup actions for transient state they
//! own (staging directories of in-flight key generation, for example). On
//! SIGINT/SIGTERM the registered actions run once and the process exits with
//! status 130. The interrupted step is not resumed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::error::{Result, fs as fs_error};

/// Exit status after an interrupt (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

type Action = Box<dyn FnOnce() + Send>;

static REGISTRY: OnceLock<Mutex<Vec<(u64, Action)>>> = OnceLock::new();
static NEXT_ID: AtomicU64 = AtomicU64::new(0);
static CLEANED_UP: AtomicBool = AtomicBool::new(false);

fn registry() -> &'static Mutex<Vec<(u64, Action)>> {
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

/// Deregisters its action when dropped
#[must_use = "the cleanup action is removed as soon as the handle is dropped"]
#[derive(Debug)]
pub struct CleanupHandle {
    id: u64,
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        if let Ok(mut actions) = registry().lock() {
            actions.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Register an action to run on interrupt while the handle is alive
pub fn register(action: impl FnOnce() + Send + 'static) -> CleanupHandle {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut actions) = registry().lock() {
        actions.push((id, Box::new(action)));
    }
    CleanupHandle { id }
}

/// Remove `path` (a directory tree) on interrupt while the handle is alive
pub fn remove_on_interrupt(path: impl Into<PathBuf>) -> CleanupHandle {
    let path = path.into();
    register(move || {
        if path.exists() {
            let _ = std::fs::remove_dir_all(&path);
        }
    })
}

/// Run every registered action, at most once per process
pub fn run_cleanup() {
    if CLEANED_UP.swap(true, Ordering::SeqCst) {
        return;
    }

    let actions = match registry().lock() {
        Ok(mut actions) => std::mem::take(&mut *actions),
        Err(_) => return,
    };
    if !actions.is_empty() {
        tracing::debug!("Running {} cleanup action(s)", actions.len());
    }
    // Most recently registered first
    for (_, action) in actions.into_iter().rev() {
        action();
    }
}

/// Clean up and exit with the interrupt status
pub fn terminate() -> ! {
    run_cleanup();
    std::process::exit(INTERRUPTED_EXIT_CODE);
}

/// Start the background signal listener
pub fn install_handler() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .map_err(|e| fs_error::io_error(format!("Failed to start signal listener: {e}")))?;

    std::thread::Builder::new()
        .name("berth-signals".to_string())
        .spawn(move || {
            runtime.block_on(wait_for_signal());
            eprintln!();
            tracing::warn!("Interrupted, cleaning up");
            terminate();
        })
        .map_err(|e| fs_error::io_error(format!("Failed to start signal listener: {e}")))?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::debug!("SIGTERM listener unavailable: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
pub(crate) fn reset_for_tests() {
    CLEANED_UP.store(false, Ordering::SeqCst);
    if let Ok(mut actions) = registry().lock() {
        actions.clear();
    }
}
