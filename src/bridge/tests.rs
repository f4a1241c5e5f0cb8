use super::*;
use crate::error::ServiceError;
use crate::lifecycle::{ServiceCapability, ServiceLifecycleController, ServiceState};
use crate::logs::LogQueue;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct ScriptedCapability {
    begin_calls: AtomicUsize,
    begin_error: Mutex<Option<String>>,
    end_error: Mutex<Option<String>>,
}

impl ServiceCapability for ScriptedCapability {
    type Context = ();

    fn begin_service(&self, _context: &()) -> Result<(), ServiceError> {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);
        match self.begin_error.lock().take() {
            Some(message) => Err(ServiceError::operation_failed(message)),
            None => Ok(()),
        }
    }

    fn end_service(&self, _context: &()) -> Result<(), ServiceError> {
        match self.end_error.lock().take() {
            Some(message) => Err(ServiceError::operation_failed(message)),
            None => Ok(()),
        }
    }
}

fn create_channel() -> (
    MethodChannel,
    Arc<ServiceLifecycleController<ScriptedCapability>>,
    Arc<LogQueue>,
) {
    let controller = Arc::new(ServiceLifecycleController::new(
        ScriptedCapability::default(),
    ));
    let logs = Arc::new(LogQueue::new(16));
    let mut channel = MethodChannel::new("com.example.wstunnel_gui/foreground_service");
    ForegroundServiceBridge::new(Arc::clone(&controller), Arc::new(()))
        .with_log_queue(Arc::clone(&logs))
        .register(&mut channel);
    (channel, controller, logs)
}

#[test]
fn test_registered_methods() {
    let (channel, _, _) = create_channel();
    assert_eq!(
        channel.methods(),
        vec![
            GET_SERVICE_LOGS,
            IS_FOREGROUND_SERVICE_RUNNING,
            START_FOREGROUND_SERVICE,
            STOP_FOREGROUND_SERVICE,
        ]
    );
    assert_eq!(channel.name(), "com.example.wstunnel_gui/foreground_service");
}

#[test]
fn test_start_and_stop_commands() {
    let (channel, controller, _) = create_channel();

    let response = channel.dispatch(&MethodCall::new(START_FOREGROUND_SERVICE));
    assert_eq!(response, MethodResponse::success(true));
    assert_eq!(controller.state(), ServiceState::Running);

    let response = channel.dispatch(&MethodCall::new(IS_FOREGROUND_SERVICE_RUNNING));
    assert_eq!(response, MethodResponse::success(true));

    let response = channel.dispatch(&MethodCall::new(STOP_FOREGROUND_SERVICE));
    assert_eq!(response, MethodResponse::success(true));
    assert_eq!(controller.state(), ServiceState::Stopped);
}

#[test]
fn test_start_failure_reports_service_error() {
    let (channel, controller, _) = create_channel();
    *controller.capability().begin_error.lock() = Some("permission denied".to_string());

    let response = channel.dispatch(&MethodCall::new(START_FOREGROUND_SERVICE));
    assert_eq!(
        response,
        MethodResponse::error(
            SERVICE_ERROR,
            "Failed to start foreground service: permission denied"
        )
    );
    assert_eq!(
        controller.state(),
        ServiceState::Failed("permission denied".to_string())
    );
}

#[test]
fn test_stop_failure_reports_service_error() {
    let (channel, controller, _) = create_channel();
    channel.dispatch(&MethodCall::new(START_FOREGROUND_SERVICE));
    *controller.capability().end_error.lock() = Some("not permitted".to_string());

    let response = channel.dispatch(&MethodCall::new(STOP_FOREGROUND_SERVICE));
    match response {
        MethodResponse::Error { code, message, .. } => {
            assert_eq!(code, SERVICE_ERROR);
            assert_eq!(message, "Failed to stop foreground service: not permitted");
        }
        other => panic!("Unexpected response: {:?}", other),
    }
}

#[test]
fn test_unknown_command_is_not_implemented() {
    let (channel, controller, _) = create_channel();
    let call = MethodCall::new("pause");

    match channel.classify(&call) {
        Dispatch::Unsupported(unsupported) => {
            assert_eq!(unsupported.method, "pause");
            assert_eq!(unsupported.to_string(), "method 'pause' is not implemented");
        }
        Dispatch::Handler(_) => panic!("'pause' should not have a handler"),
    }

    let response = channel.dispatch(&call);
    assert!(response.is_not_implemented());
    assert_eq!(controller.state(), ServiceState::Stopped);
    assert_eq!(controller.capability().begin_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_repeated_start_calls_host_once() {
    let (channel, controller, _) = create_channel();

    assert!(channel
        .dispatch(&MethodCall::new(START_FOREGROUND_SERVICE))
        .is_success());
    assert!(channel
        .dispatch(&MethodCall::new(START_FOREGROUND_SERVICE))
        .is_success());
    assert_eq!(controller.capability().begin_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_get_service_logs_drains_queue() {
    let (channel, _, logs) = create_channel();
    logs.push("first");
    logs.push("second");

    let response = channel.dispatch(&MethodCall::new(GET_SERVICE_LOGS));
    assert_eq!(response, MethodResponse::success(json!(["first", "second"])));
    assert!(logs.is_empty());
}

#[test]
fn test_custom_handler_registration() {
    let mut channel = MethodChannel::new("test");
    let replaced = channel.register("echo", |call: &MethodCall| {
        MethodResponse::success(call.arguments.clone())
    });
    assert!(replaced.is_none());
    assert!(channel.is_registered("echo"));

    let call = MethodCall::new("echo").with_arguments(json!({"port": 1080}));
    assert_eq!(
        channel.dispatch(&call),
        MethodResponse::success(json!({"port": 1080}))
    );
}

#[test]
fn test_method_call_parsing() {
    let call = MethodCall::parse("  startForegroundService \n").unwrap();
    assert_eq!(call, MethodCall::new(START_FOREGROUND_SERVICE));

    let call = MethodCall::parse(r#"{"method": "stopForegroundService"}"#).unwrap();
    assert_eq!(call.method, STOP_FOREGROUND_SERVICE);
    assert!(call.arguments.is_null());

    assert!(MethodCall::parse("{not json").is_err());
}

#[test]
fn test_response_serialization() {
    let value = serde_json::to_value(MethodResponse::success(true)).unwrap();
    assert_eq!(value, json!({"status": "success", "result": true}));

    let value =
        serde_json::to_value(MethodResponse::error(SERVICE_ERROR, "Failed to start")).unwrap();
    assert_eq!(
        value,
        json!({"status": "error", "code": "SERVICE_ERROR", "message": "Failed to start"})
    );

    let value = serde_json::to_value(MethodResponse::not_implemented()).unwrap();
    assert_eq!(value, json!({"status": "not_implemented"}));
}
