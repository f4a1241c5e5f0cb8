//! Service lifecycle control.
//!
//! [`ServiceLifecycleController`] owns the single [`ServiceState`] of the
//! foreground service and drives it through a [`ServiceCapability`]. All
//! transitions are serialized; a caller that arrives while another transition
//! is in flight blocks until it resolves and is then evaluated against the
//! resolved state.

mod capability;
mod controller;
mod handle;
mod stats;
mod types;


pub use capability::ServiceCapability;
pub use controller::ServiceLifecycleController;
pub use handle::AsyncLifecycleHandle;
pub use stats::LifecycleStats;
pub use types::{LifecycleRequest, LifecycleResult, ServiceState};
