use super::capability::ServiceCapability;
use super::stats::{LifecycleStats, StatsCounters};
use super::types::{LifecycleRequest, LifecycleResult, ServiceState};
use crate::error::ServiceError;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Serializes start/stop requests for a single foreground service.
///
/// Calls are blocking. Transitions run one at a time behind `transition`;
/// the current state lives in a watch channel so it can be read (or
/// observed) at any moment, including while a transition is in flight.
pub struct ServiceLifecycleController<S: ServiceCapability> {
    capability: S,
    transition: Mutex<()>,
    state: watch::Sender<ServiceState>,
    stats: StatsCounters,
}

impl<S: ServiceCapability> ServiceLifecycleController<S> {
    /// Create a controller in the `Stopped` state
    pub fn new(capability: S) -> Self {
        let (state, _) = watch::channel(ServiceState::Stopped);
        Self {
            capability,
            transition: Mutex::new(()),
            state,
            stats: StatsCounters::default(),
        }
    }

    pub fn capability(&self) -> &S {
        &self.capability
    }

    /// Current service state
    pub fn state(&self) -> ServiceState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running()
    }

    /// Receive every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> LifecycleStats {
        self.stats.snapshot()
    }

    /// Dispatch a request to `start` or `stop`
    pub fn handle(&self, request: LifecycleRequest, context: &S::Context) -> LifecycleResult {
        match request {
            LifecycleRequest::Start => self.start(context),
            LifecycleRequest::Stop => self.stop(context),
        }
    }

    /// Start the service.
    ///
    /// A no-op when the service is already starting or running.
    pub fn start(&self, context: &S::Context) -> LifecycleResult {
        let _guard = self.transition.lock();

        let current = self.state();
        if matches!(current, ServiceState::Starting | ServiceState::Running) {
            debug!("Start requested while {}, nothing to do", current);
            self.stats.record_no_op();
            return LifecycleResult::ok();
        }

        info!("Starting foreground service (from {})", current);
        self.set_state(ServiceState::Starting);
        self.stats.record_begin();

        match Self::invoke(|| self.capability.begin_service(context)) {
            Ok(()) => {
                self.set_state(ServiceState::Running);
                info!("Foreground service started");
                LifecycleResult::ok()
            }
            Err(e) => self.fail("start", e),
        }
    }

    /// Stop the service.
    ///
    /// A no-op when the service is already stopping or stopped.
    pub fn stop(&self, context: &S::Context) -> LifecycleResult {
        let _guard = self.transition.lock();

        let current = self.state();
        if matches!(current, ServiceState::Stopping | ServiceState::Stopped) {
            debug!("Stop requested while {}, nothing to do", current);
            self.stats.record_no_op();
            return LifecycleResult::ok();
        }

        info!("Stopping foreground service (from {})", current);
        self.set_state(ServiceState::Stopping);
        self.stats.record_end();

        match Self::invoke(|| self.capability.end_service(context)) {
            Ok(()) => {
                self.set_state(ServiceState::Stopped);
                info!("Foreground service stopped");
                LifecycleResult::ok()
            }
            Err(e) => self.fail("stop", e),
        }
    }

    /// Stop the service as part of host shutdown.
    ///
    /// On success the controller is back in `Stopped`; on failure it stays in
    /// `Failed` so the next `start` or `stop` can recover.
    pub fn shutdown(&self, context: &S::Context) -> LifecycleResult {
        info!("Shutting down lifecycle controller");
        let result = self.stop(context);
        if result.success {
            info!("Lifecycle controller shut down cleanly");
        } else {
            error!(
                "Lifecycle controller shutdown failed: {}",
                result.message.as_deref().unwrap_or("unknown error")
            );
        }
        result
    }

    fn fail(&self, operation: &str, error: ServiceError) -> LifecycleResult {
        let reason = error.message().to_string();
        warn!("Failed to {} foreground service: {}", operation, reason);
        self.stats.record_failure();
        self.set_state(ServiceState::Failed(reason.clone()));
        LifecycleResult::failed(reason)
    }

    fn set_state(&self, state: ServiceState) {
        debug!("Service state changed to: {}", state);
        self.state.send_replace(state);
    }

    /// Run a capability call, turning a panic into an ordinary failure
    fn invoke<F>(call: F) -> Result<(), ServiceError>
    where
        F: FnOnce() -> Result<(), ServiceError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(result) => result,
            Err(payload) => Err(ServiceError::operation_failed(panic_message(&*payload))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "service capability panicked".to_string()
    }
}
