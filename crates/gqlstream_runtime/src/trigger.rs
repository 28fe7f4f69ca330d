//! Trigger channel: a bounded-wait rendezvous between whoever paces an
//! operation and the producer suspended on it.
//!
//! A suspended producer registers one waiter on both the continue lane and
//! the complete lane. A signal hands its trigger to the oldest live waiter of
//! its lane; because both lanes share the waiter, one suspension consumes
//! exactly one trigger. Signals never buffer: if no producer shows up within
//! the configured timeout the trigger is dropped with a diagnostic. A trigger
//! handed to a wait that is abandoned before it resumes goes back to the
//! channel and wakes the next wait.

use crate::config::EngineConfig;
use crate::error::TriggerError;
use crate::operation::OperationContext;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tracing::{trace, warn};

/// The two external signals that pace a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Release the next envelope.
    Continue,
    /// End the operation without emitting anything.
    Complete,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::Complete => f.write_str("complete"),
        }
    }
}

/// Why a suspended producer woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Continue,
    Complete,
    Cancelled,
}

impl From<TriggerKind> for Wake {
    fn from(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Continue => Self::Continue,
            TriggerKind::Complete => Self::Complete,
        }
    }
}

type Waiter = Arc<Mutex<Option<oneshot::Sender<TriggerKind>>>>;

struct Lane {
    waiters: Mutex<VecDeque<Waiter>>,
    registered: Notify,
    // Serializes signals so each lane delivers in call order.
    turn: tokio::sync::Mutex<()>,
}

impl Lane {
    fn new() -> Self {
        Self {
            waiters: Mutex::new(VecDeque::new()),
            registered: Notify::new(),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    fn push(&self, waiter: Waiter) {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(waiter);
        self.registered.notify_waiters();
    }

    fn remove(&self, waiter: &Waiter) {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|w| !Arc::ptr_eq(w, waiter));
    }

    /// Pops waiters until one still has an open sender.
    fn pop_live(&self) -> Option<oneshot::Sender<TriggerKind>> {
        let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(waiter) = waiters.pop_front() {
            let sender = waiter.lock().unwrap_or_else(PoisonError::into_inner).take();
            match sender {
                Some(sender) if !sender.is_closed() => return Some(sender),
                _ => continue,
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct Inner {
    continue_lane: Lane,
    complete_lane: Lane,
    // Triggers recovered from abandoned waits, oldest first.
    recovered: Mutex<VecDeque<TriggerKind>>,
    timeout: Duration,
}

impl Inner {
    fn recover(&self, kind: TriggerKind) {
        self.recovered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(kind);
    }

    fn take_recovered(&self) -> Option<TriggerKind> {
        self.recovered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn lane(&self, kind: TriggerKind) -> &Lane {
        match kind {
            TriggerKind::Continue => &self.continue_lane,
            TriggerKind::Complete => &self.complete_lane,
        }
    }
}

/// Removes a waiter from both lanes however the wait ends.
struct Registration<'a> {
    inner: &'a Inner,
    waiter: Waiter,
    rx: oneshot::Receiver<TriggerKind>,
    settled: bool,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.inner.continue_lane.remove(&self.waiter);
        self.inner.complete_lane.remove(&self.waiter);
        if self.settled {
            return;
        }

        // The wait was dropped mid-flight. Close first so no signal can slip
        // in after the check.
        self.rx.close();
        if let Ok(kind) = self.rx.try_recv() {
            trace!(trigger = %kind, "recovered trigger from abandoned wait");
            self.inner.recover(kind);
        }
    }
}

/// Continue/complete triggers shared between a driver and the producers it
/// paces. Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct TriggerChannel {
    inner: Arc<Inner>,
}

impl TriggerChannel {
    /// Creates a channel whose signals wait at most `timeout` for a consumer.
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                continue_lane: Lane::new(),
                complete_lane: Lane::new(),
                recovered: Mutex::new(VecDeque::new()),
                timeout,
            }),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.trigger_timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Delivers one continuation trigger.
    pub async fn send_continue(&self) -> Result<(), TriggerError> {
        self.signal(TriggerKind::Continue).await
    }

    /// Delivers one completion trigger.
    pub async fn send_complete(&self) -> Result<(), TriggerError> {
        self.signal(TriggerKind::Complete).await
    }

    /// Hands `kind` to a suspended producer, waiting at most the channel
    /// timeout for one to appear.
    ///
    /// `Ok` means the trigger was handed to a suspended wait, not that an
    /// envelope was emitted: if that wait's operation is cancelled before it
    /// resumes, cancellation wins and the trigger produces nothing. An
    /// undelivered trigger is logged and reported, never buffered.
    pub async fn signal(&self, kind: TriggerKind) -> Result<(), TriggerError> {
        let lane = self.inner.lane(kind);
        let handoff = async {
            let _turn = lane.turn.lock().await;
            loop {
                let registered = lane.registered.notified();
                tokio::pin!(registered);
                registered.as_mut().enable();

                while let Some(sender) = lane.pop_live() {
                    if sender.send(kind).is_ok() {
                        return;
                    }
                }
                registered.await;
            }
        };

        let waited = self.inner.timeout;
        if tokio::time::timeout(waited, handoff).await.is_ok() {
            trace!(trigger = %kind, "trigger delivered");
            return Ok(());
        }

        warn!(
            trigger = %kind,
            waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            "no active consumer"
        );
        Err(TriggerError::NoActiveConsumer { kind, waited })
    }

    /// Suspends until a trigger arrives or `ctx` is cancelled.
    ///
    /// Cancellation wins over a trigger that is ready at the same time.
    pub async fn wait(&self, ctx: &OperationContext) -> Wake {
        if ctx.is_cancelled() {
            return Wake::Cancelled;
        }

        if let Some(kind) = self.inner.take_recovered() {
            trace!(trigger = %kind, "resuming with recovered trigger");
            return Wake::from(kind);
        }

        let (tx, rx) = oneshot::channel();
        let mut registration = Registration {
            inner: &self.inner,
            waiter: Arc::new(Mutex::new(Some(tx))),
            rx,
            settled: false,
        };
        self.inner
            .continue_lane
            .push(Arc::clone(&registration.waiter));
        self.inner
            .complete_lane
            .push(Arc::clone(&registration.waiter));

        let wake = tokio::select! {
            biased;
            () = ctx.cancelled() => Wake::Cancelled,
            received = &mut registration.rx => match received {
                Ok(kind) => Wake::from(kind),
                Err(_) => Wake::Cancelled,
            },
        };
        registration.settled = true;
        drop(registration);
        wake
    }

    /// Number of producers currently suspended on this channel.
    pub fn waiting(&self) -> usize {
        self.inner.continue_lane.len()
    }
}

impl fmt::Debug for TriggerChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerChannel")
            .field("timeout", &self.inner.timeout)
            .field("waiting", &self.waiting())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use tokio::time::Instant;

    fn op() -> OperationContext {
        OperationContext::new(OperationKind::Subscription, "subscription { name }")
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_without_consumer_gives_up() {
        let channel = TriggerChannel::new(Duration::from_secs(1));
        let started = Instant::now();

        let err = channel.send_continue().await.unwrap_err();

        assert_eq!(
            err,
            TriggerError::NoActiveConsumer {
                kind: TriggerKind::Continue,
                waited: Duration::from_secs(1),
            }
        );
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_reaches_waiting_producer() {
        let channel = TriggerChannel::new(Duration::from_secs(1));
        let ctx = op();

        let driver = tokio::spawn({
            let channel = channel.clone();
            async move { channel.send_complete().await }
        });

        assert_eq!(channel.wait(&ctx).await, Wake::Complete);
        assert!(driver.await.unwrap().is_ok());
        assert_eq!(channel.waiting(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_trigger_per_wait() {
        let channel = TriggerChannel::new(Duration::from_secs(1));
        let ctx = op();

        let next = tokio::spawn({
            let channel = channel.clone();
            async move { channel.send_continue().await }
        });
        let complete = tokio::spawn({
            let channel = channel.clone();
            async move { channel.send_complete().await }
        });

        let first = channel.wait(&ctx).await;
        let second = channel.wait(&ctx).await;

        let mut wakes = vec![first, second];
        wakes.sort_by_key(|w| format!("{w:?}"));
        assert_eq!(wakes, vec![Wake::Complete, Wake::Continue]);
        assert!(next.await.unwrap().is_ok());
        assert!(complete.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_unblocks_wait() {
        let channel = TriggerChannel::new(Duration::from_millis(100));
        let ctx = op();

        let canceller = tokio::spawn({
            let token = ctx.cancellation_token().clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                token.cancel();
            }
        });

        assert_eq!(channel.wait(&ctx).await, Wake::Cancelled);
        canceller.await.unwrap();

        assert_eq!(channel.waiting(), 0);
        assert!(channel.send_continue().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_does_not_register() {
        let channel = TriggerChannel::new(Duration::from_millis(100));
        let ctx = op();
        ctx.cancel();

        assert_eq!(channel.wait(&ctx).await, Wake::Cancelled);
        assert_eq!(channel.waiting(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_wait_returns_trigger() {
        let channel = TriggerChannel::new(Duration::from_millis(100));
        let ctx = op();

        let wait = channel.wait(&ctx);
        tokio::pin!(wait);
        assert!(futures::poll!(&mut wait).is_pending());
        assert_eq!(channel.waiting(), 1);

        assert!(channel.send_continue().await.is_ok());
        drop(wait);
        assert_eq!(channel.waiting(), 0);

        let started = Instant::now();
        assert_eq!(channel.wait(&ctx).await, Wake::Continue);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(channel.inner.take_recovered().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_after_handoff_discards_trigger() {
        let channel = TriggerChannel::new(Duration::from_millis(100));
        let ctx = op();

        let wait = channel.wait(&ctx);
        tokio::pin!(wait);
        assert!(futures::poll!(&mut wait).is_pending());

        assert!(channel.send_continue().await.is_ok());
        ctx.cancel();
        assert_eq!(wait.await, Wake::Cancelled);

        let fresh = op();
        let next = tokio::time::timeout(Duration::from_millis(50), channel.wait(&fresh)).await;
        assert!(next.is_err());
    }
}
