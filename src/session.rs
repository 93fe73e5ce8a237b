//! # Overlay session
//!
//! [`SkySession`] wires the orientation estimator to the asynchronous world on a tokio
//! runtime:
//!
//! - platform orientation events are pushed into an `mpsc` channel and consumed by a task
//!   that owns the [`OrientationEstimator`];
//! - every accepted sample publishes a new [`OrientationReading`] on a `watch` channel, so
//!   the renderer always reads the latest value and never queues stale ones;
//! - a sensor permission request, when the platform needs one, is awaited by the same task
//!   before any event is consumed, and events that arrived in the meantime are discarded;
//! - the astronomical refresh runs on its own interval task
//!   ([`SkySession::spawn_refresh`]).
//!
//! [`SkySession::shutdown`] stops every task, including one still waiting for a permission
//! answer that will never come. Dropping the session aborts whatever is still running.
//!
//! ```rust
//! use skylens::orientation::estimator::EstimatorParams;
//! use skylens::orientation::RawOrientationEvent;
//! use skylens::session::SkySession;
//!
//! # tokio_test_main();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test_main() {
//! let (mut session, events) = SkySession::start(EstimatorParams::default(), None);
//! events.send(RawOrientationEvent::absolute(120.0, 95.0, 0.0)).await.unwrap();
//! drop(events);
//!
//! let last = session.shutdown().await;
//! assert_eq!(last.heading(), Some(120.0));
//! # }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::constants::DEFAULT_REFRESH_PERIOD_S;
use crate::orientation::estimator::{
    EstimatorParams, IngestOutcome, OrientationEstimator, OrientationReading,
};
use crate::orientation::RawOrientationEvent;
use crate::skylens_errors::SkylensError;

/// Buffered orientation events before producers wait.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Answer of the platform to a sensor permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionResponse {
    Granted,
    Denied,
}

/// Period of the astronomical refresh.
pub fn default_refresh_period() -> Duration {
    Duration::from_secs_f64(DEFAULT_REFRESH_PERIOD_S)
}

/// Running overlay: orientation task, refresh tasks and their shutdown signal.
#[derive(Debug)]
pub struct SkySession {
    readings: watch::Receiver<OrientationReading>,
    shutdown_tx: watch::Sender<bool>,
    estimator_task: Option<JoinHandle<()>>,
    refresh_tasks: Vec<JoinHandle<()>>,
}

impl SkySession {
    /// Start the orientation task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// Arguments
    /// -----------------
    /// * `params`: estimator configuration.
    /// * `permission`: answer to the sensor permission request, when the platform requires
    ///   one. A dropped sender counts as a denial, and so does a missing receiver when
    ///   `params.requires_permission` is set. Events sent before the answer is known are
    ///   discarded.
    ///
    /// Return
    /// ----------
    /// * The session, and the sender platform code pushes raw orientation events into.
    pub fn start(
        params: EstimatorParams,
        permission: Option<oneshot::Receiver<PermissionResponse>>,
    ) -> (Self, mpsc::Sender<RawOrientationEvent>) {
        let estimator = OrientationEstimator::new(params);
        let (readings_tx, readings) = watch::channel(estimator.reading());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        log::debug!("starting sky session with {}", estimator.params());
        let estimator_task = tokio::spawn(run_estimator(
            estimator,
            events_rx,
            permission,
            readings_tx,
            shutdown_rx,
        ));

        let session = SkySession {
            readings,
            shutdown_tx,
            estimator_task: Some(estimator_task),
            refresh_tasks: Vec::new(),
        };
        (session, events_tx)
    }

    /// Latest published orientation.
    pub fn latest(&self) -> OrientationReading {
        *self.readings.borrow()
    }

    /// A receiver notified on every new reading.
    pub fn subscribe(&self) -> watch::Receiver<OrientationReading> {
        self.readings.clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Run `refresh` every `period` until shutdown. The first call happens immediately.
    ///
    /// Return
    /// ----------
    /// * `SessionClosed` after shutdown, `InvalidSceneParameter` for a zero period.
    pub fn spawn_refresh<F>(&mut self, period: Duration, mut refresh: F) -> Result<(), SkylensError>
    where
        F: FnMut() + Send + 'static,
    {
        if self.is_closed() {
            return Err(SkylensError::SessionClosed);
        }
        if period.is_zero() {
            return Err(SkylensError::InvalidSceneParameter(
                "refresh period must be positive".into(),
            ));
        }

        let mut shutdown = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => refresh(),
                }
            }
        });
        self.refresh_tasks.push(handle);
        Ok(())
    }

    /// Stop every task and wait for them.
    ///
    /// Events already queued are consumed first. Calling it again is a no-op.
    ///
    /// Return
    /// ----------
    /// * The last published reading.
    pub async fn shutdown(&mut self) -> OrientationReading {
        self.shutdown_tx.send_replace(true);

        let tasks = self
            .estimator_task
            .take()
            .into_iter()
            .chain(std::mem::take(&mut self.refresh_tasks));
        for task in tasks {
            if let Err(err) = task.await {
                log::warn!("session task ended abnormally: {err}");
            }
        }
        log::debug!("sky session stopped");
        self.latest()
    }
}

impl Drop for SkySession {
    fn drop(&mut self) {
        for task in self.estimator_task.iter().chain(self.refresh_tasks.iter()) {
            task.abort();
        }
    }
}

/// Resolve the permission request. Return false when shutdown came first.
async fn await_permission(
    estimator: &mut OrientationEstimator,
    permission: Option<oneshot::Receiver<PermissionResponse>>,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let Some(answer) = permission else {
        log::warn!("sensor permission required but no request was issued");
        estimator.deny();
        return true;
    };

    estimator.request_pending();
    tokio::select! {
        biased;
        response = answer => {
            match response {
                Ok(PermissionResponse::Granted) => estimator.grant(),
                Ok(PermissionResponse::Denied) | Err(_) => estimator.deny(),
            }
            true
        }
        _ = shutdown.changed() => false,
    }
}

/// Drop the events buffered before the permission answer. Returns how many were dropped.
fn discard_pending(events: &mut mpsc::Receiver<RawOrientationEvent>) -> usize {
    std::iter::from_fn(|| events.try_recv().ok()).count()
}

async fn run_estimator(
    mut estimator: OrientationEstimator,
    mut events: mpsc::Receiver<RawOrientationEvent>,
    permission: Option<oneshot::Receiver<PermissionResponse>>,
    readings: watch::Sender<OrientationReading>,
    mut shutdown: watch::Receiver<bool>,
) {
    if estimator.params().requires_permission {
        estimator.request_pending();
        readings.send_replace(estimator.reading());
        if !await_permission(&mut estimator, permission, &mut shutdown).await {
            log::debug!("session closed while waiting for sensor permission");
            return;
        }
        let dropped = discard_pending(&mut events);
        if dropped > 0 {
            log::debug!("discarded {dropped} orientation events received before the permission answer");
        }
        readings.send_replace(estimator.reading());
    }

    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => {
                    if estimator.ingest(&event) == IngestOutcome::Accepted {
                        readings.send_replace(estimator.reading());
                    }
                }
                None => break,
            },
            _ = shutdown.changed() => break,
        }
    }
}
