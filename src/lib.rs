pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod logs;

pub use bridge::{ForegroundServiceBridge, MethodCall, MethodChannel, MethodResponse};
pub use config::ServiceConfig;
pub use error::{Result, ServiceError, WstunnelServiceError};
pub use host::{HeartbeatWorkload, HostContext, ServiceWorkload, ThreadedServiceHost};
pub use lifecycle::{
    AsyncLifecycleHandle, LifecycleRequest, LifecycleResult, LifecycleStats, ServiceCapability,
    ServiceLifecycleController, ServiceState,
};
pub use logs::{LogEntry, LogQueue, LogQueueMakeWriter};
