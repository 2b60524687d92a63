use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// A timer task that runs a callback once its duration elapses, unless cancelled first.
#[derive(Debug)]
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start<F, Fut>(duration: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_expire().await;
        });
        Self { handle }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// One running countdown per key (a chat, in the bot).
#[derive(Debug)]
pub struct Countdowns<K> {
    running: Mutex<HashMap<K, Countdown>>,
}

impl<K: Eq + Hash> Default for Countdowns<K> {
    fn default() -> Self {
        Self {
            running: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> Countdowns<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a countdown for `key`, cancelling the one already running for it.
    pub fn start<F, Fut>(&self, key: K, duration: Duration, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let countdown = Countdown::start(duration, on_expire);
        if let Some(previous) = self.lock().insert(key, countdown) {
            previous.cancel();
        }
    }

    /// Stops the countdown for `key`. Returns whether one was running.
    pub fn cancel(&self, key: &K) -> bool {
        match self.lock().remove(key) {
            Some(countdown) => {
                countdown.cancel();
                true
            }
            None => false,
        }
    }

    /// Forgets the countdown for `key` without aborting it.
    /// Called from the expiring task itself, which must keep running.
    pub fn release(&self, key: &K) {
        self.lock().remove(key);
    }

    pub fn is_running(&self, key: &K) -> bool {
        self.lock().get(key).is_some_and(|c| !c.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Countdown>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_callback(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_duration() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(Duration::from_secs(120), counter_callback(&fired));

        tokio::time::sleep(Duration::from_secs(119)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(countdown.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_countdown_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(Duration::from_secs(5), counter_callback(&fired));
        countdown.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_a_key_replaces_the_old_countdown() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdowns = Countdowns::new();

        countdowns.start(1, Duration::from_secs(5), counter_callback(&fired));
        countdowns.start(1, Duration::from_secs(20), counter_callback(&fired));
        assert!(countdowns.is_running(&1));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_by_key() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdowns = Countdowns::new();

        countdowns.start("chat", Duration::from_secs(5), counter_callback(&fired));
        assert!(countdowns.cancel(&"chat"));
        assert!(!countdowns.cancel(&"chat"));
        assert!(!countdowns.is_running(&"chat"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn release_keeps_the_task_alive() {
        let fired = Arc::new(AtomicUsize::new(0));
        let countdowns = Countdowns::new();

        countdowns.start(7u64, Duration::from_secs(5), counter_callback(&fired));
        countdowns.release(&7);
        assert!(!countdowns.is_running(&7));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
