//! Time-based progress for work whose length can't be predicted.
//!
//! The bar is cosmetic: it climbs quickly to 85%, slows towards 95% and
//! holds there until the task reports completion. It never says 100% early.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Seconds spent on the fast linear climb
const RAMP_SECS: f64 = 8.0;
/// Where the fast climb ends
const RAMP_PERCENT: f64 = 85.0;
/// The indicator never passes this until the task is done
const HOLD_PERCENT: f64 = 95.0;
/// Time constant of the slow approach from 85 to 95
const DECAY_SECS: f64 = 15.0;

const TICK: Duration = Duration::from_millis(100);

/// Simulated completion percentage after `elapsed`
pub fn simulated_percent(elapsed: Duration) -> u64 {
    let t = elapsed.as_secs_f64();
    let pct = if t < RAMP_SECS {
        RAMP_PERCENT * t / RAMP_SECS
    } else {
        let tail = HOLD_PERCENT - RAMP_PERCENT;
        RAMP_PERCENT + tail * (1.0 - (-(t - RAMP_SECS) / DECAY_SECS).exp())
    };
    pct.round().min(HOLD_PERCENT) as u64
}

/// Work running on its own thread, with a cancellation flag it can poll
pub struct BackgroundTask<T> {
    handle: JoinHandle<T>,
    cancel: Arc<AtomicBool>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Spawn `work`, handing it the shared cancel flag
    pub fn spawn<F>(cancel: Arc<AtomicBool>, work: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) -> T + Send + 'static,
    {
        let flag = cancel.clone();
        let handle = std::thread::spawn(move || work(flag));
        Self { handle, cancel }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the task to stop at its next safe point
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Block until the task is done
    pub fn join(self) -> Result<T> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("background task panicked"))
    }
}

/// Run `work` in the background and show a simulated progress bar until it
/// finishes. With `enabled == false` this just waits for the result.
pub fn run_with_progress<T, F>(
    label: &str,
    enabled: bool,
    cancel: Arc<AtomicBool>,
    work: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(Arc<AtomicBool>) -> T + Send + 'static,
{
    let task = BackgroundTask::spawn(cancel, work);

    if !enabled {
        return task.join();
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━░"),
    );
    pb.set_message(label.to_string());

    let start = Instant::now();
    while !task.is_finished() {
        pb.set_position(simulated_percent(start.elapsed()));
        std::thread::sleep(TICK);
    }

    pb.set_position(100);
    pb.finish_and_clear();
    task.join()
}
