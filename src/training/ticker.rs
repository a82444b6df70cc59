use std::{ops::ControlFlow, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// Shortest period a ticker accepts; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A cancellable repeating task running on the current Tokio runtime.
///
/// The first tick fires one full period after [`Ticker::spawn`], then every period
/// after that. The task ends when the callback returns [`ControlFlow::Break`], when
/// [`Ticker::cancel`] is called, or when the ticker is dropped.
#[derive(Debug)]
pub struct Ticker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the repeating task.
    ///
    /// # Args
    /// * `period` - Time between two ticks.
    /// * `on_tick` - Called once per tick.
    ///
    /// # Panics
    /// If called outside of a Tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if on_tick().is_break() {
                            break;
                        }
                    }
                }
            }

            log::trace!("ticker task finished");
        });

        Self { token, handle }
    }

    /// Stops the task. No tick starts after this returns.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true once the task has stopped, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    fn counting(limit: u32) -> (Arc<AtomicU32>, impl FnMut() -> ControlFlow<()> + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let on_tick = move || {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        (count, on_tick)
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let (count, on_tick) = counting(u32::MAX);
        let _ticker = Ticker::spawn(Duration::from_millis(100), on_tick);

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn break_ends_the_task() {
        let (count, on_tick) = counting(3);
        let ticker = Ticker::spawn(Duration::from_millis(10), on_tick);

        time::sleep(Duration::from_millis(105)).await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(ticker.is_finished());
        assert!(!ticker.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_stop_ticking() {
        let (count, on_tick) = counting(u32::MAX);
        let ticker = Ticker::spawn(Duration::from_millis(10), on_tick);

        time::sleep(Duration::from_millis(25)).await;
        ticker.cancel();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(ticker.is_finished());

        let (count, on_tick) = counting(u32::MAX);
        drop(Ticker::spawn(Duration::from_millis(10), on_tick));
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
