//! Cancellable streams of live-query snapshots.
//!
//! A [`Subscription`] owns the task that produces its snapshots. Closing or
//! dropping the subscription aborts that task, so adapters never keep polling
//! or listening on behalf of a client that has gone away.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::TraceId;
use super::ports::LiveQueryError;

/// One item of a live query: a full snapshot or a failure.
pub type Snapshot<T> = Result<Vec<T>, LiveQueryError>;

const BUFFER: usize = 16;

/// The receiving side of a producer task has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberGone;

/// Producer handle that forwards snapshots and drops exact repeats.
#[derive(Debug)]
pub struct SnapshotSender<T> {
    tx: mpsc::Sender<Snapshot<T>>,
    last: Option<Vec<T>>,
}

impl<T: Clone + PartialEq> SnapshotSender<T> {
    /// Forward `snapshot` unless it equals the last one delivered.
    pub async fn publish(&mut self, snapshot: Vec<T>) -> Result<(), SubscriberGone> {
        if self.last.as_ref() == Some(&snapshot) {
            return Ok(());
        }
        self.last = Some(snapshot.clone());
        self.tx.send(Ok(snapshot)).await.map_err(|_| SubscriberGone)
    }

    /// Forward a failure. The next snapshot is always delivered afterwards.
    pub async fn fail(&mut self, error: LiveQueryError) -> Result<(), SubscriberGone> {
        self.last = None;
        self.tx.send(Err(error)).await.map_err(|_| SubscriberGone)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Cancellable stream of snapshots.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::Receiver<Snapshot<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Spawn `producer` on the runtime and return the stream it feeds.
    ///
    /// The producer inherits the caller's trace id.
    pub fn spawn<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(SnapshotSender<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(BUFFER);
        let work = producer(SnapshotSender { tx, last: None });
        let task = match TraceId::current() {
            Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, work)),
            None => tokio::spawn(work),
        };
        Self {
            rx,
            task: Some(task),
        }
    }
}

impl<T> Subscription<T> {
    /// Stop the producer. Buffered snapshots can still be drained.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }

    /// Whether [`Subscription::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Snapshot<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
