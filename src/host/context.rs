use crate::config::{ServiceConfig, TunnelConfig};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Host environment handed to the service host on every call
#[derive(Debug, Clone)]
pub struct HostContext {
    pub service_name: String,
    pub tunnel: TunnelConfig,
}

impl HostContext {
    pub fn new<S: Into<String>>(service_name: S, tunnel: TunnelConfig) -> Self {
        Self {
            service_name: service_name.into(),
            tunnel,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.service.name.clone(), config.tunnel.clone())
    }

    /// `address:port` of the local SOCKS5 listener
    pub fn local_endpoint(&self) -> String {
        format!("{}:{}", self.tunnel.local_address, self.tunnel.local_port)
    }
}

/// One run of the service, from `begin_service` to its thread exiting
#[derive(Debug, Clone)]
pub struct ServiceRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub context: HostContext,
}

impl ServiceRun {
    pub fn new(context: HostContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            context,
        }
    }
}
