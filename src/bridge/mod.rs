//! Method bridge between a front end (UI shell, CLI) and native service
//! control.
//!
//! Calls are routed through a per-channel dispatch table. A method with no
//! registered handler yields [`MethodResponse::NotImplemented`], never an
//! error.

mod channel;
mod foreground;
mod message;

#[cfg(test)]
mod tests;

pub use channel::{Dispatch, MethodChannel, MethodHandler, UnsupportedCommand};
pub use foreground::{
    ForegroundServiceBridge, GET_SERVICE_LOGS, IS_FOREGROUND_SERVICE_RUNNING, SERVICE_ERROR,
    START_FOREGROUND_SERVICE, STOP_FOREGROUND_SERVICE,
};
pub use message::{MethodCall, MethodResponse};
