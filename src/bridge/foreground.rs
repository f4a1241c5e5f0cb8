use super::channel::MethodChannel;
use super::message::{MethodCall, MethodResponse};
use crate::lifecycle::{LifecycleResult, ServiceCapability, ServiceLifecycleController};
use crate::logs::LogQueue;
use serde_json::Value;
use std::sync::Arc;

pub const START_FOREGROUND_SERVICE: &str = "startForegroundService";
pub const STOP_FOREGROUND_SERVICE: &str = "stopForegroundService";
pub const IS_FOREGROUND_SERVICE_RUNNING: &str = "isForegroundServiceRunning";
pub const GET_SERVICE_LOGS: &str = "getServiceLogs";

/// Error code for every lifecycle failure reported over the bridge
pub const SERVICE_ERROR: &str = "SERVICE_ERROR";

/// Wires a lifecycle controller onto a method channel
pub struct ForegroundServiceBridge<S: ServiceCapability + 'static> {
    controller: Arc<ServiceLifecycleController<S>>,
    context: Arc<S::Context>,
    logs: Option<Arc<LogQueue>>,
}

impl<S: ServiceCapability + 'static> ForegroundServiceBridge<S> {
    pub fn new(controller: Arc<ServiceLifecycleController<S>>, context: Arc<S::Context>) -> Self {
        Self {
            controller,
            context,
            logs: None,
        }
    }

    /// Expose `getServiceLogs`, draining this queue on every call
    pub fn with_log_queue(mut self, logs: Arc<LogQueue>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn register(self, channel: &mut MethodChannel) {
        let (controller, context) = (Arc::clone(&self.controller), Arc::clone(&self.context));
        channel.register(START_FOREGROUND_SERVICE, move |_: &MethodCall| {
            lifecycle_response(controller.start(&context), "start")
        });

        let (controller, context) = (Arc::clone(&self.controller), Arc::clone(&self.context));
        channel.register(STOP_FOREGROUND_SERVICE, move |_: &MethodCall| {
            lifecycle_response(controller.stop(&context), "stop")
        });

        let controller = Arc::clone(&self.controller);
        channel.register(IS_FOREGROUND_SERVICE_RUNNING, move |_: &MethodCall| {
            MethodResponse::success(controller.is_running())
        });

        if let Some(logs) = self.logs {
            channel.register(GET_SERVICE_LOGS, move |_: &MethodCall| {
                let lines: Vec<Value> = logs
                    .drain()
                    .into_iter()
                    .map(|entry| Value::String(entry.line))
                    .collect();
                MethodResponse::success(lines)
            });
        }
    }
}

fn lifecycle_response(result: LifecycleResult, action: &str) -> MethodResponse {
    if result.success {
        MethodResponse::success(true)
    } else {
        MethodResponse::error(
            SERVICE_ERROR,
            format!(
                "Failed to {} foreground service: {}",
                action,
                result.message.unwrap_or_default()
            ),
        )
    }
}
