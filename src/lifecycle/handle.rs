use super::capability::ServiceCapability;
use super::controller::ServiceLifecycleController;
use super::types::{LifecycleRequest, LifecycleResult, ServiceState};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

/// Async front for a [`ServiceLifecycleController`].
///
/// Each request runs on the blocking pool so a slow host call never stalls
/// the async runtime.
pub struct AsyncLifecycleHandle<S: ServiceCapability + 'static> {
    controller: Arc<ServiceLifecycleController<S>>,
    context: Arc<S::Context>,
}

impl<S: ServiceCapability + 'static> Clone for AsyncLifecycleHandle<S> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            context: Arc::clone(&self.context),
        }
    }
}

impl<S: ServiceCapability + 'static> AsyncLifecycleHandle<S> {
    pub fn new(controller: Arc<ServiceLifecycleController<S>>, context: Arc<S::Context>) -> Self {
        Self {
            controller,
            context,
        }
    }

    pub async fn start(&self) -> LifecycleResult {
        self.request(LifecycleRequest::Start).await
    }

    pub async fn stop(&self) -> LifecycleResult {
        self.request(LifecycleRequest::Stop).await
    }

    pub async fn shutdown(&self) -> LifecycleResult {
        let controller = Arc::clone(&self.controller);
        let context = Arc::clone(&self.context);
        Self::run_blocking(move || controller.shutdown(&context)).await
    }

    pub async fn request(&self, request: LifecycleRequest) -> LifecycleResult {
        let controller = Arc::clone(&self.controller);
        let context = Arc::clone(&self.context);
        Self::run_blocking(move || controller.handle(request, &context)).await
    }

    pub fn state(&self) -> ServiceState {
        self.controller.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.controller.subscribe()
    }

    pub fn controller(&self) -> &Arc<ServiceLifecycleController<S>> {
        &self.controller
    }

    async fn run_blocking<F>(call: F) -> LifecycleResult
    where
        F: FnOnce() -> LifecycleResult + Send + 'static,
    {
        match tokio::task::spawn_blocking(call).await {
            Ok(result) => result,
            Err(e) => {
                error!("Lifecycle task failed: {}", e);
                LifecycleResult::failed(format!("lifecycle task failed: {}", e))
            }
        }
    }
}
