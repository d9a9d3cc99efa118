//! Snapshot producers shared by live-query adapters.
//!
//! Two change-detection strategies: [`watch_snapshots`] re-runs a fetch each
//! time a change counter moves (push), and [`poll_snapshots`] re-runs it on a
//! fixed interval (pull). Both rely on [`SnapshotSender`] to drop snapshots
//! identical to the previous one.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::domain::ports::LiveQueryError;
use crate::domain::{SnapshotSender, SubscriberGone, Subscription};

async fn deliver<T>(
    tx: &mut SnapshotSender<T>,
    result: Result<Vec<T>, LiveQueryError>,
) -> Result<(), SubscriberGone>
where
    T: Clone + PartialEq,
{
    match result {
        Ok(snapshot) => tx.publish(snapshot).await,
        Err(err) => {
            tracing::warn!(error = %err, "live query fetch failed");
            tx.fail(err).await
        }
    }
}

/// Emit a snapshot now and again after every change notification.
pub fn watch_snapshots<T, F, Fut>(mut changes: watch::Receiver<u64>, fetch: F) -> Subscription<T>
where
    T: Clone + PartialEq + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, LiveQueryError>> + Send + 'static,
{
    Subscription::spawn(move |mut tx| async move {
        loop {
            if deliver(&mut tx, fetch().await).await.is_err() {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    })
}

/// Shortest interval [`poll_snapshots`] will tick at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Emit a snapshot now and then once per `interval`, never faster than
/// [`MIN_POLL_INTERVAL`].
pub fn poll_snapshots<T, F, Fut>(interval: Duration, fetch: F) -> Subscription<T>
where
    T: Clone + PartialEq + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, LiveQueryError>> + Send + 'static,
{
    Subscription::spawn(move |mut tx| async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if deliver(&mut tx, fetch().await).await.is_err() {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn watch_refetches_after_change() {
        let (changes, rx) = watch::channel(0_u64);
        let source = Arc::new(AtomicU32::new(1));
        let reader = Arc::clone(&source);
        let mut sub = watch_snapshots(rx, move || {
            let reader = Arc::clone(&reader);
            async move { Ok(vec![reader.load(Ordering::SeqCst)]) }
        });

        assert_eq!(sub.next().await, Some(Ok(vec![1])));
        source.store(2, Ordering::SeqCst);
        changes.send_modify(|v| *v += 1);
        assert_eq!(sub.next().await, Some(Ok(vec![2])));
    }

    #[tokio::test]
    async fn watch_ends_when_change_source_closes() {
        let (changes, rx) = watch::channel(0_u64);
        let mut sub = watch_snapshots(rx, || async { Ok(vec![0_u8]) });
        assert_eq!(sub.next().await, Some(Ok(vec![0])));
        drop(changes);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn poll_emits_only_changed_snapshots() {
        let source = Arc::new(AtomicU32::new(0));
        let reader = Arc::clone(&source);
        let mut sub = poll_snapshots(Duration::from_millis(5), move || {
            let n = reader.fetch_add(1, Ordering::SeqCst);
            async move { Ok(vec![n / 2]) }
        });
        assert_eq!(sub.next().await, Some(Ok(vec![0])));
        assert_eq!(sub.next().await, Some(Ok(vec![1])));
        assert!(source.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn zero_poll_interval_still_emits() {
        let mut sub = poll_snapshots(Duration::ZERO, || async { Ok(vec![1_u8]) });
        assert_eq!(sub.next().await, Some(Ok(vec![1])));
    }
}
