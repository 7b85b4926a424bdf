//! Per-execution watchdog
//!
//! Owns a spawned child and kills it if the foreground read has not
//! signalled completion before the deadline. The child is expected to lead
//! its own process group, which is killed with it so that background
//! processes it started cannot keep the result pipe open.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Single-shot timer bound to one child process
pub struct Watchdog {
    fired: Arc<AtomicBool>,
    expired: Arc<Notify>,
    done: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Watchdog {
    /// Start watching `child`. `label` only appears in logs.
    pub fn start(timeout: Duration, mut child: Child, label: impl Into<String>) -> Self {
        let label = label.into();
        let fired = Arc::new(AtomicBool::new(false));
        let expired = Arc::new(Notify::new());
        let (done, completed) = oneshot::channel::<()>();

        let flag = fired.clone();
        let expiry = expired.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                // A dropped sender counts as completion too.
                _ = completed => {}
                _ = tokio::time::sleep(timeout) => {
                    flag.store(true, Ordering::SeqCst);
                    expiry.notify_one();
                    debug!("{} exceeded {:?}, killing child", label, timeout);
                    kill_group(child.id(), &label);
                    if let Err(e) = child.kill().await {
                        warn!("failed to kill child for {}: {}", label, e);
                    }
                }
            }
        });

        Self {
            fired,
            expired,
            done: Some(done),
            handle,
        }
    }

    /// Whether the deadline passed and the child was (or is being) killed.
    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Resolves once the deadline has passed. Only one caller may wait.
    pub async fn expired(&self) {
        self.expired.notified().await
    }

    /// Signal completion. The background task is joined when it ends on that
    /// signal; once it has fired it may still be reaping the child, so it is
    /// detached instead.
    pub async fn finish(mut self) -> bool {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }

        let fired = self.fired();
        if !fired {
            let _ = self.handle.await;
        }
        fired
    }
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>, label: &str) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        debug!("failed to kill process group of {}: {}", label, e);
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>, _label: &str) {}
