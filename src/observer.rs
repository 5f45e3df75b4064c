//! # Pool Controller
//!
//! A dedicated low-priority thread that samples queue depth on a fixed
//! cadence and feeds the result back into the worker set the facade owns:
//! a bounded hysteresis counter drives growth and shrinkage, and one worker
//! per cycle is promoted or demoted a single priority step.
//!
//! The asymmetry is deliberate damping: five consecutive busy cycles grow
//! the pool by one, ten consecutive idle cycles shrink it by one, and the
//! pool never shrinks below a quarter of its ceiling.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::error::PoolError;
use crate::os;
use crate::pool::PoolShared;
use crate::priority::Priority;

/// Counter ceiling: consecutive busy cycles needed before growing.
const PERF_CEILING: i32 = 5;
/// Counter floor: consecutive idle cycles needed before shrinking.
const PERF_FLOOR: i32 = -10;
/// Smoothing factor for the diagnostic loop-frequency estimate.
const LOOP_HZ_ALPHA: f64 = 0.2;

/// Controller-local statistics. Owned by the observer loop, reset pieces
/// each cycle, never shared with workers.
pub(crate) struct ObserverStats {
    initialized: bool,
    perf_counter: i32,
    last_update: Instant,
    loop_hz: f64,
}

impl ObserverStats {
    fn new() -> Self {
        Self {
            initialized: false,
            perf_counter: 0,
            last_update: Instant::now(),
            loop_hz: 0.0,
        }
    }

    /// Update the smoothed loop frequency. Diagnostic only; control
    /// decisions never read it.
    fn tick(&mut self, now: Instant) {
        if self.initialized {
            let dt = now.duration_since(self.last_update).as_secs_f64();
            if dt > 0.0 {
                let hz = 1.0 / dt;
                self.loop_hz = if self.loop_hz == 0.0 {
                    hz
                } else {
                    LOOP_HZ_ALPHA * hz + (1.0 - LOOP_HZ_ALPHA) * self.loop_hz
                };
            }
        } else {
            self.initialized = true;
        }
        self.last_update = now;
    }

    /// Bounded adjustment: +1 towards the ceiling when the queue has a
    /// backlog, -1 towards the floor when it is empty.
    fn adjust_counter(&mut self, backlog: bool) {
        self.perf_counter = if backlog {
            (self.perf_counter + 1).min(PERF_CEILING)
        } else {
            (self.perf_counter - 1).max(PERF_FLOOR)
        };
    }
}

/// Handle to the controller thread. Owned by the pool facade; exists only
/// for autoscaling construction modes.
pub(crate) struct Observer {
    handle: Option<JoinHandle<()>>,
    stop_tx: flume::Sender<()>,
}

impl Observer {
    pub(crate) fn spawn(shared: Arc<PoolShared>) -> Result<Observer, PoolError> {
        let (stop_tx, stop_rx) = flume::bounded(1);
        let name = format!("{}-observer", shared.config.thread_name_prefix);
        let handle = std::thread::Builder::new()
            .name(name)
            .spawn(move || run(shared, stop_rx))
            .map_err(|e| {
                PoolError::ThreadSetup(format!("failed to spawn observer thread: {}", e))
            })?;
        Ok(Observer {
            handle: Some(handle),
            stop_tx,
        })
    }

    /// Signal the controller loop to stop and wait for its thread to exit.
    pub(crate) fn stop(mut self) -> std::thread::Result<()> {
        let _ = self.stop_tx.try_send(());
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

/// Controller loop. The cadence sleep doubles as the stop signal: a message
/// or a disconnect on `stop_rx` ends the loop, a timeout runs one cycle.
fn run(shared: Arc<PoolShared>, stop_rx: flume::Receiver<()>) {
    os::set_current_thread_priority(Priority::BelowNormal);
    debug!("observer started");

    let mut stats = ObserverStats::new();
    loop {
        match stop_rx.recv_timeout(shared.config.observer_cadence) {
            Ok(()) | Err(flume::RecvTimeoutError::Disconnected) => break,
            Err(flume::RecvTimeoutError::Timeout) => {}
        }
        if shared.cancel.is_cancelled() {
            break;
        }
        cycle(&shared, &mut stats);
    }

    debug!(loop_hz = stats.loop_hz, "observer stopped");
}

/// One observation cycle: statistics, counter, priority step, pool size.
fn cycle(shared: &PoolShared, stats: &mut ObserverStats) {
    stats.tick(Instant::now());

    let backlog = !shared.queue.is_empty();
    stats.adjust_counter(backlog);
    trace!(
        backlog,
        counter = stats.perf_counter,
        "observer cycle"
    );

    shared.reap_exited();

    let mut workers = shared.workers.lock().unwrap();

    // Priority rebalancing: one worker, one step per cycle.
    if backlog {
        if let Some(worker) = workers
            .iter()
            .find(|w| w.shared().priority() < Priority::Normal)
        {
            worker.shared().promote();
            trace!(
                worker_id = worker.id(),
                priority = %worker.shared().priority(),
                "promoted worker"
            );
        }
    } else if let Some(worker) = workers.iter().find(|w| {
        matches!(
            w.shared().priority(),
            Priority::Normal | Priority::BelowNormal
        )
    }) {
        worker.shared().demote();
        trace!(
            worker_id = worker.id(),
            priority = %worker.shared().priority(),
            "demoted worker"
        );
    }

    // Pool-size rebalancing, gated on the hysteresis counter.
    let max = shared.max_threads.load(std::sync::atomic::Ordering::Relaxed);
    if stats.perf_counter >= PERF_CEILING && workers.len() < max {
        match shared.spawn_worker(Priority::Normal) {
            Ok(worker) => {
                info!(
                    worker_id = worker.id(),
                    pool_size = workers.len() + 1,
                    "grew pool"
                );
                workers.push(worker);
                stats.perf_counter = 0;
            }
            // Spawn failure is not fatal to the controller; the counter is
            // left pinned so the next cycle retries immediately.
            Err(e) => warn!(error = %e, "failed to grow pool"),
        }
    } else if stats.perf_counter <= PERF_FLOOR && workers.len() > shared.scale_floor() {
        // Retire the most-recently-added worker. If it is mid-job it stops
        // after that job; its handle moves to the retired list until the
        // thread reports its exit.
        if let Some(worker) = workers.pop() {
            worker.stop();
            shared.queue.notify_all();
            info!(
                worker_id = worker.id(),
                pool_size = workers.len(),
                "shrank pool"
            );
            shared.retired.lock().unwrap().push(worker);
        }
        stats.perf_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_counter_saturates_at_bounds() {
        let mut stats = ObserverStats::new();
        for _ in 0..20 {
            stats.adjust_counter(true);
        }
        assert_eq!(stats.perf_counter, PERF_CEILING);
        for _ in 0..40 {
            stats.adjust_counter(false);
        }
        assert_eq!(stats.perf_counter, PERF_FLOOR);
    }

    #[test]
    fn test_shrink_needs_more_signals_than_grow() {
        // The asymmetry is the damping contract: quicker to grow under load
        // than to give capacity back.
        assert!(PERF_CEILING < -PERF_FLOOR);
    }

    #[test]
    fn test_loop_frequency_smoothing() {
        let mut stats = ObserverStats::new();
        let start = Instant::now();
        stats.tick(start);
        assert_eq!(stats.loop_hz, 0.0);
        stats.tick(start + Duration::from_millis(100));
        let first = stats.loop_hz;
        assert!((first - 10.0).abs() < 0.5);
        stats.tick(start + Duration::from_millis(200));
        // Smoothed, not replaced.
        assert!(stats.loop_hz > 0.0);
        assert!((stats.loop_hz - 10.0).abs() < 2.0);
    }
}
