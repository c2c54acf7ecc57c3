//! Sequential package install queue
//!
//! Packages are installed strictly one at a time, in submission order, against
//! a [`PackageService`] that only offers submit-then-poll. The drain loop runs
//! as a tokio task and never blocks: it sleeps between completion checks and
//! between requests, so other work on the same runtime keeps running.
//!
//! # Drain cycle
//!
//! ```text
//! Idle/Done ──submit──▶ Dispatching ──▶ Polling ──complete──▶ report
//!     ▲                      ▲                                  │
//!     │                      └──────── Cooldown ◀── more queued ┤
//!     └──────────────────────────────────────── queue empty ────┘
//! ```
//!
//! Failures are reported and the loop moves on; nothing is retried or rolled
//! back. A handle that never completes stalls the queue: there is no timeout.

use crate::package_service::{PackageService, RequestHandle, RequestStatus};
use crate::types::PackageIdentifier;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strum::Display;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Delays used by the drain loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTiming {
    /// Sleep between two completion checks of the in-flight request
    pub poll_interval: Duration,
    /// Sleep between the end of one request and the start of the next
    pub cooldown: Duration,
}

impl Default for QueueTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            cooldown: Duration::from_millis(1000),
        }
    }
}

/// Where the drain loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DrainState {
    /// Never started
    Idle,
    /// Handing the head of the queue to the service
    Dispatching,
    /// Waiting for the in-flight request to complete
    Polling,
    /// Pausing before the next request
    Cooldown,
    /// Queue drained; a new submit starts another cycle
    Done,
}

/// Outcome of one install request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    Installed {
        requested: PackageIdentifier,
        resolved: String,
    },
    Failed {
        requested: PackageIdentifier,
        message: String,
    },
}

impl InstallEvent {
    pub fn requested(&self) -> &PackageIdentifier {
        match self {
            Self::Installed { requested, .. } | Self::Failed { requested, .. } => requested,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

impl fmt::Display for InstallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed { resolved, .. } => write!(f, "Installed: {resolved}"),
            Self::Failed { message, .. } => write!(f, "ERROR!!!! {message}"),
        }
    }
}

/// Receiving end of the install outcome stream
pub type InstallEvents = mpsc::UnboundedReceiver<InstallEvent>;

/// Lifecycle of a dequeued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstallStatus {
    Pending,
    Succeeded,
    Failed,
}

/// The single in-flight request; dropped once its outcome is reported
struct InstallRequest<H> {
    id: PackageIdentifier,
    handle: H,
    status: InstallStatus,
}

impl<H: RequestHandle> InstallRequest<H> {
    fn new(id: PackageIdentifier, handle: H) -> Self {
        Self {
            id,
            handle,
            status: InstallStatus::Pending,
        }
    }

    /// Check the handle once; true when a terminal status was recorded
    fn poll(&mut self) -> bool {
        if self.status == InstallStatus::Pending && self.handle.is_complete() {
            self.status = match self.handle.status() {
                RequestStatus::Success => InstallStatus::Succeeded,
                RequestStatus::InProgress | RequestStatus::Failure => InstallStatus::Failed,
            };
        }
        self.status != InstallStatus::Pending
    }

    fn into_event(self) -> InstallEvent {
        match self.status {
            InstallStatus::Succeeded => InstallEvent::Installed {
                resolved: self.handle.resolved_id().unwrap_or_else(|| self.id.to_string()),
                requested: self.id,
            },
            InstallStatus::Pending | InstallStatus::Failed => InstallEvent::Failed {
                message: self
                    .handle
                    .error_message()
                    .unwrap_or_else(|| format!("Install of {} failed", self.id)),
                requested: self.id,
            },
        }
    }
}

#[derive(Debug)]
struct QueueState {
    pending: VecDeque<PackageIdentifier>,
    drain: DrainState,
    draining: bool,
}

struct Shared<S> {
    service: S,
    timing: QueueTiming,
    state: Mutex<QueueState>,
    events: mpsc::UnboundedSender<InstallEvent>,
    idle: watch::Sender<bool>,
}

/// FIFO install queue with a single in-flight request.
///
/// Cloning yields another handle to the same queue.
pub struct PackageInstallQueue<S: PackageService> {
    shared: Arc<Shared<S>>,
}

impl<S: PackageService> Clone for PackageInstallQueue<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: PackageService> PackageInstallQueue<S> {
    /// Create an empty queue and the stream its outcomes are reported on
    pub fn new(service: S, timing: QueueTiming) -> (Self, InstallEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        let (idle, _) = watch::channel(true);

        let shared = Shared {
            service,
            timing,
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                drain: DrainState::Idle,
                draining: false,
            }),
            events,
            idle,
        };

        (
            Self {
                shared: Arc::new(shared),
            },
            rx,
        )
    }

    /// Append packages to the tail of the queue.
    ///
    /// Starts the drain loop if it is not already running; otherwise the new
    /// packages wait behind everything queued before them. An empty batch does
    /// nothing. Never waits on the service.
    ///
    /// Outside a tokio runtime the packages are queued but no drain starts;
    /// the next `submit` made from within a runtime picks them up.
    pub fn submit<I>(&self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<PackageIdentifier>,
    {
        let runtime = tokio::runtime::Handle::try_current();
        {
            let mut state = self.shared.lock();
            let before = state.pending.len();
            state.pending.extend(ids.into_iter().map(Into::into));
            let added = state.pending.len() - before;

            if added == 0 {
                debug!("Empty install batch submitted, nothing to do");
                return;
            }
            info!("Queued {} package(s), {} pending", added, state.pending.len());

            if state.draining {
                return;
            }
            if let Err(e) = &runtime {
                error!(
                    "Cannot start install queue without an async runtime: {}; {} package(s) left pending",
                    e,
                    state.pending.len()
                );
                return;
            }
            state.draining = true;
            state.drain = DrainState::Dispatching;
            self.shared.idle.send_replace(false);
        }

        if let Ok(runtime) = runtime {
            runtime.spawn(Arc::clone(&self.shared).drain());
        }
    }

    pub fn state(&self) -> DrainState {
        self.shared.lock().drain
    }

    /// Packages queued but not yet dispatched
    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// True when nothing is queued or in flight
    pub fn is_idle(&self) -> bool {
        !self.shared.lock().draining
    }

    /// Wait until the queue is empty and no request is in flight
    pub async fn wait_idle(&self) {
        let mut idle = self.shared.idle.subscribe();
        // The sender lives as long as `self`, so this only returns on idle
        let _ = idle.wait_for(|idle| *idle).await;
    }
}

impl<S: PackageService> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_drain(&self, drain: DrainState) {
        self.lock().drain = drain;
    }

    async fn drain(self: Arc<Self>) {
        debug!("Install queue drain started");

        loop {
            let next = {
                let mut state = self.lock();
                let next = state.pending.pop_front();
                if next.is_some() {
                    state.drain = DrainState::Dispatching;
                }
                next
            };
            let Some(id) = next else {
                // Only reachable if the queue was emptied before the first dequeue
                self.finish_if_empty();
                return;
            };

            info!("Installing package {}", id);
            let handle = self.service.submit(&id);
            let mut request = InstallRequest::new(id, handle);

            self.set_drain(DrainState::Polling);
            while !request.poll() {
                tokio::time::sleep(self.timing.poll_interval).await;
            }

            let event = request.into_event();
            if event.is_success() {
                info!("{}", event);
            } else {
                error!("{}", event);
            }
            // A dropped receiver only means nobody is listening
            let _ = self.events.send(event);

            if self.finish_if_empty() {
                return;
            }
            self.set_drain(DrainState::Cooldown);
            tokio::time::sleep(self.timing.cooldown).await;
        }
    }

    /// End the drain when nothing is left; true if it ended.
    ///
    /// Checked under the same lock `submit` appends under, so a package is
    /// either seen here or starts a fresh drain.
    fn finish_if_empty(&self) -> bool {
        let mut state = self.lock();
        if !state.pending.is_empty() {
            return false;
        }
        state.drain = DrainState::Done;
        state.draining = false;
        self.idle.send_replace(true);
        debug!("Install queue drained");
        true
    }
}
