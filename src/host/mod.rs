//! Service host that keeps the tunnel alive on a dedicated runtime thread.

mod context;
mod threaded;
mod workload;


pub use context::{HostContext, ServiceRun};
pub use threaded::{RuntimeFactory, ThreadedServiceHost};
pub use workload::{HeartbeatWorkload, ServiceWorkload};
