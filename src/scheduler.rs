//! Fixed-cadence tick driver.
//!
//! The callback is awaited inline, so ticks never overlap. A tick that runs
//! past its slot pushes the next one back instead of triggering a burst of
//! catch-up ticks. Cancellation is only observed between ticks.

use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Scheduler {
    cadence: Duration,
    run_immediately: bool,
}

impl Scheduler {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            run_immediately: false,
        }
    }

    /// Fire the first tick right away instead of after one cadence.
    pub fn run_immediately(mut self, enabled: bool) -> Self {
        self.run_immediately = enabled;
        self
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Run `tick` at every cadence until `stop` is cancelled. Returns the
    /// number of ticks run.
    pub async fn run<F, Fut>(&self, stop: CancellationToken, mut tick: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let start = if self.run_immediately {
            Instant::now()
        } else {
            Instant::now() + self.cadence
        };
        let mut interval = time::interval_at(start, self.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = interval.tick() => {
                    tick().await;
                    ticks += 1;
                }
            }
        }
        ticks
    }
}

/// Resolve once SIGINT or SIGTERM arrives.
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_runs_until_cancelled() {
        let stop = CancellationToken::new();
        let count = Arc::new(AtomicU64::new(0));

        let scheduler = Scheduler::new(Duration::from_millis(10)).run_immediately(true);
        let stopper = stop.clone();
        let counter = count.clone();
        let ticks = scheduler
            .run(stop.clone(), move || {
                let counter = counter.clone();
                let stopper = stopper.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                        stopper.cancel();
                    }
                }
            })
            .await;

        assert_eq!(ticks, 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_tick() {
        let stop = CancellationToken::new();
        stop.cancel();

        let scheduler = Scheduler::new(Duration::from_millis(5)).run_immediately(true);
        let ticks = scheduler.run(stop, || async {}).await;
        assert_eq!(ticks, 0);
    }

    #[tokio::test]
    async fn test_waits_one_cadence_by_default() {
        let stop = CancellationToken::new();
        let scheduler = Scheduler::new(Duration::from_secs(3600));

        let stopper = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            stopper.cancel();
        });

        let ticks = scheduler.run(stop, || async {}).await;
        assert_eq!(ticks, 0);
    }

    #[tokio::test]
    async fn test_ticks_do_not_overlap() {
        let stop = CancellationToken::new();
        let running = Arc::new(AtomicU64::new(0));
        let overlaps = Arc::new(AtomicU64::new(0));
        let done = Arc::new(AtomicU64::new(0));

        let scheduler = Scheduler::new(Duration::from_millis(2)).run_immediately(true);
        let (r, o, d, s) = (running.clone(), overlaps.clone(), done.clone(), stop.clone());
        scheduler
            .run(stop.clone(), move || {
                let (r, o, d, s) = (r.clone(), o.clone(), d.clone(), s.clone());
                async move {
                    if r.fetch_add(1, Ordering::SeqCst) > 0 {
                        o.fetch_add(1, Ordering::SeqCst);
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    r.fetch_sub(1, Ordering::SeqCst);
                    if d.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                        s.cancel();
                    }
                }
            })
            .await;

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }
}
