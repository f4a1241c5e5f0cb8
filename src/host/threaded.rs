use super::context::{HostContext, ServiceRun};
use super::workload::ServiceWorkload;
use crate::error::ServiceError;
use crate::lifecycle::ServiceCapability;
use parking_lot::Mutex;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Builds the runtime for a service thread, given the thread name
pub type RuntimeFactory = Arc<dyn Fn(&str) -> io::Result<Runtime> + Send + Sync>;

struct ActiveService {
    run_id: Uuid,
    shutdown: CancellationToken,
    thread: JoinHandle<()>,
    finished: mpsc::Receiver<()>,
}

enum ExitOutcome {
    Exited,
    Panicked,
    TimedOut(ActiveService),
}

/// A start that failed, possibly leaving a thread that has not exited yet
struct StartFailure {
    error: ServiceError,
    lingering: Option<ActiveService>,
}

impl StartFailure {
    fn new(error: ServiceError) -> Self {
        Self {
            error,
            lingering: None,
        }
    }
}

/// Runs a [`ServiceWorkload`] on its own thread with its own tokio runtime.
///
/// At most one service thread is tracked at a time. A thread that misses the
/// stop timeout stays tracked until it actually exits, so `begin_service`
/// keeps failing and `end_service` can be retried. `end_service` succeeds
/// when nothing is running.
pub struct ThreadedServiceHost<W: ServiceWorkload> {
    name: String,
    workload: Arc<W>,
    stop_timeout: Duration,
    runtime_factory: RuntimeFactory,
    active: Mutex<Option<ActiveService>>,
}

impl<W: ServiceWorkload> ThreadedServiceHost<W> {
    pub fn new<S: Into<String>>(name: S, workload: W, stop_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            workload: Arc::new(workload),
            stop_timeout,
            runtime_factory: Arc::new(default_runtime),
            active: Mutex::new(None),
        }
    }

    /// Replace how the service runtime is built
    pub fn with_runtime_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> io::Result<Runtime> + Send + Sync + 'static,
    {
        self.runtime_factory = Arc::new(factory);
        self
    }

    /// True while a service thread is alive
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map(|active| !active.thread.is_finished())
            .unwrap_or(false)
    }

    /// Id of the current run, if any
    pub fn current_run(&self) -> Option<Uuid> {
        self.active
            .lock()
            .as_ref()
            .filter(|active| !active.thread.is_finished())
            .map(|active| active.run_id)
    }

    fn spawn(&self, context: &HostContext) -> Result<ActiveService, StartFailure> {
        let run = ServiceRun::new(context.clone());
        let run_id = run.id;
        let shutdown = CancellationToken::new();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
        let (finished_tx, finished_rx) = mpsc::channel::<()>();

        let workload = Arc::clone(&self.workload);
        let factory = Arc::clone(&self.runtime_factory);
        let token = shutdown.clone();
        let thread_name = format!("{}-service", self.name);

        let thread = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                // Dropped on every exit path, panics included
                let _finished = finished_tx;

                let runtime = match factory(&thread_name) {
                    Ok(runtime) => {
                        let _ = ready_tx.send(Ok(()));
                        runtime
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("failed to create runtime: {}", e)));
                        return;
                    }
                };

                runtime.block_on(async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            info!(run_id = %run_id, "Stop signal received");
                        }
                        result = workload.run(run, token.clone()) => match result {
                            Ok(()) => info!(run_id = %run_id, "Service workload finished"),
                            Err(e) => error!(run_id = %run_id, "Service workload failed: {}", e),
                        }
                    }
                });

                runtime.shutdown_timeout(Duration::from_secs(1));
            })
            .map_err(|e| {
                StartFailure::new(ServiceError::operation_failed(format!(
                    "failed to spawn service thread: {}",
                    e
                )))
            })?;

        let service = ActiveService {
            run_id,
            shutdown,
            thread,
            finished: finished_rx,
        };

        match ready_rx.recv_timeout(self.stop_timeout) {
            Ok(Ok(())) => Ok(service),
            Ok(Err(message)) => {
                let _ = service.thread.join();
                Err(StartFailure::new(ServiceError::operation_failed(message)))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    run_id = %run_id,
                    "Service runtime not ready within {:?}, cancelling",
                    self.stop_timeout
                );
                service.shutdown.cancel();
                let error = ServiceError::operation_failed(format!(
                    "service runtime did not become ready within {:?}",
                    self.stop_timeout
                ));
                match self.wait_for_exit(service) {
                    ExitOutcome::TimedOut(service) => Err(StartFailure {
                        error,
                        lingering: Some(service),
                    }),
                    _ => Err(StartFailure::new(error)),
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = service.thread.join();
                Err(StartFailure::new(ServiceError::operation_failed(
                    "service thread exited during startup",
                )))
            }
        }
    }

    fn wait_for_exit(&self, service: ActiveService) -> ExitOutcome {
        match service.finished.recv_timeout(self.stop_timeout) {
            Err(mpsc::RecvTimeoutError::Timeout) => ExitOutcome::TimedOut(service),
            _ => match service.thread.join() {
                Ok(()) => ExitOutcome::Exited,
                Err(_) => ExitOutcome::Panicked,
            },
        }
    }
}

impl<W: ServiceWorkload> ServiceCapability for ThreadedServiceHost<W> {
    type Context = HostContext;

    fn begin_service(&self, context: &HostContext) -> Result<(), ServiceError> {
        let mut active = self.active.lock();

        if let Some(existing) = active.take() {
            if !existing.thread.is_finished() {
                let run_id = existing.run_id;
                *active = Some(existing);
                return Err(ServiceError::operation_failed(format!(
                    "service is already running (run {})",
                    run_id
                )));
            }
            debug!(run_id = %existing.run_id, "Reaping finished service thread");
            let _ = existing.thread.join();
        }

        match self.spawn(context) {
            Ok(service) => {
                info!(
                    run_id = %service.run_id,
                    "Service '{}' thread started",
                    context.service_name
                );
                *active = Some(service);
                Ok(())
            }
            Err(failure) => {
                *active = failure.lingering;
                Err(failure.error)
            }
        }
    }

    fn end_service(&self, context: &HostContext) -> Result<(), ServiceError> {
        let mut active = self.active.lock();
        let Some(service) = active.take() else {
            debug!("Service '{}' is not running", context.service_name);
            return Ok(());
        };

        let run_id = service.run_id;
        info!(run_id = %run_id, "Sending stop signal to service '{}'", context.service_name);
        service.shutdown.cancel();

        match self.wait_for_exit(service) {
            ExitOutcome::Exited => {
                info!(run_id = %run_id, "Service '{}' thread stopped", context.service_name);
                Ok(())
            }
            ExitOutcome::Panicked => Err(ServiceError::operation_failed("service thread panicked")),
            ExitOutcome::TimedOut(service) => {
                warn!(
                    run_id = %run_id,
                    "Service thread did not exit within {:?}",
                    self.stop_timeout
                );
                *active = Some(service);
                Err(ServiceError::operation_failed(format!(
                    "service did not stop within {:?}",
                    self.stop_timeout
                )))
            }
        }
    }
}

fn default_runtime(thread_name: &str) -> io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(thread_name)
        .build()
}
